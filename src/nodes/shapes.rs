//! Basic shapes and paths.
//!
//! Geometric attributes are kept as unresolved [`Length`]s because
//! percentages depend on the viewport in effect at render time. Point lists
//! and path data do not, so `polyline`, `polygon` and `path` keep a lazily
//! computed [`SvgShape`] instead.

use std::borrow::Cow;

use glam::DVec2;

use super::{
    HasShape, Marker, NodeId, NodeKind, Presentation, Ref, Renderable, SceneTree, SvgNode,
};
use crate::attributes::AttributeView;
use crate::errors::RenderError;
use crate::geometry::{PathData, SvgShape};
use crate::renderer::{RenderContext, Renderer};
use crate::types::{BBox, Length};

/// `marker-start`, `marker-mid` and `marker-end` of a shape
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MarkerRefs {
    pub start: Option<Ref<Marker>>,
    pub mid: Option<Ref<Marker>>,
    pub end: Option<Ref<Marker>>,
}

impl MarkerRefs {
    fn build(attrs: &AttributeView<'_>) -> MarkerRefs {
        MarkerRefs {
            start: attrs.resolve_url_inherited("marker-start"),
            mid: attrs.resolve_url_inherited("marker-mid"),
            end: attrs.resolve_url_inherited("marker-end"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.mid.is_none() && self.end.is_none()
    }
}

/// Shared render body: the outline, then its markers.
fn render_shape(
    shape: &dyn HasShape,
    markers: Option<&MarkerRefs>,
    id: NodeId,
    ctx: &RenderContext,
    renderer: &mut Renderer<'_>,
) -> Result<(), RenderError> {
    let path = shape.shape(id, renderer.tree(), ctx)?;
    renderer.draw_shape(&path, ctx);
    if let Some(markers) = markers {
        renderer.draw_markers(&path, markers, ctx)?;
    }
    Ok(())
}

/// Implements `SvgNode` and `Renderable` for a shape.
macro_rules! shape_node {
    ($ty:ident, $kind:expr, markers: $markers:tt) => {
        impl SvgNode for $ty {
            fn kind(&self) -> NodeKind {
                $kind(self)
            }

            fn build(&mut self, attrs: &AttributeView<'_>) {
                self.presentation = Presentation::build(attrs);
                self.build_geometry(attrs);
            }

            fn as_renderable(&self) -> Option<&dyn Renderable> {
                Some(self)
            }

            fn as_shape(&self) -> Option<&dyn HasShape> {
                Some(self)
            }
        }

        impl Renderable for $ty {
            presentation_accessors!();

            fn render(
                &self,
                id: NodeId,
                ctx: &RenderContext,
                renderer: &mut Renderer<'_>,
            ) -> Result<(), RenderError> {
                render_shape(self, shape_node!(@markers self, $markers), id, ctx, renderer)
            }
        }
    };
    (@markers $self:ident, true) => {
        Some(&$self.markers)
    };
    (@markers $self:ident, false) => {
        None
    };
}

// ============================================================================
// rect, circle, ellipse
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Rect {
    pub presentation: Presentation,
    pub x: Length,
    pub y: Length,
    pub width: Length,
    pub height: Length,
    pub rx: Option<Length>,
    pub ry: Option<Length>,
}

impl Rect {
    fn build_geometry(&mut self, attrs: &AttributeView<'_>) {
        self.x = attrs.length("x").unwrap_or_default();
        self.y = attrs.length("y").unwrap_or_default();
        self.width = attrs.length("width").unwrap_or_default();
        self.height = attrs.length("height").unwrap_or_default();
        self.rx = attrs.length("rx").filter(|l| l.value >= 0.0);
        self.ry = attrs.length("ry").filter(|l| l.value >= 0.0);
    }
}

shape_node!(Rect, |_: &Rect| NodeKind::Rect, markers: false);

impl HasShape for Rect {
    fn shape(
        &self,
        _id: NodeId,
        _tree: &SceneTree,
        ctx: &RenderContext,
    ) -> Result<Cow<'_, PathData>, RenderError> {
        let m = &ctx.measure;
        let (w, h) = (self.width.resolve_width(m), self.height.resolve_height(m));
        if w <= 0.0 || h <= 0.0 {
            return Ok(Cow::Owned(PathData::new()));
        }
        let (x, y) = (self.x.resolve_width(m), self.y.resolve_height(m));
        // A missing radius takes the other one
        let rx = self.rx.or(self.ry).map_or(0.0, |r| r.resolve_width(m));
        let ry = self.ry.or(self.rx).map_or(0.0, |r| r.resolve_height(m));
        let (rx, ry) = (rx.min(w / 2.0), ry.min(h / 2.0));
        let path = if rx > 0.0 && ry > 0.0 {
            PathData::rounded_rect(x, y, w, h, rx, ry)
        } else {
            PathData::rect(x, y, w, h)
        };
        Ok(Cow::Owned(path))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Circle {
    pub presentation: Presentation,
    pub cx: Length,
    pub cy: Length,
    pub r: Length,
}

impl Circle {
    fn build_geometry(&mut self, attrs: &AttributeView<'_>) {
        self.cx = attrs.length("cx").unwrap_or_default();
        self.cy = attrs.length("cy").unwrap_or_default();
        self.r = attrs.length("r").unwrap_or_default();
    }
}

shape_node!(Circle, |_: &Circle| NodeKind::Circle, markers: false);

impl HasShape for Circle {
    fn shape(
        &self,
        _id: NodeId,
        _tree: &SceneTree,
        ctx: &RenderContext,
    ) -> Result<Cow<'_, PathData>, RenderError> {
        let m = &ctx.measure;
        let r = self.r.resolve_length(m);
        if r <= 0.0 {
            return Ok(Cow::Owned(PathData::new()));
        }
        let center = DVec2::new(self.cx.resolve_width(m), self.cy.resolve_height(m));
        Ok(Cow::Owned(PathData::ellipse(center.x, center.y, r, r)))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ellipse {
    pub presentation: Presentation,
    pub cx: Length,
    pub cy: Length,
    pub rx: Option<Length>,
    pub ry: Option<Length>,
}

impl Ellipse {
    fn build_geometry(&mut self, attrs: &AttributeView<'_>) {
        self.cx = attrs.length("cx").unwrap_or_default();
        self.cy = attrs.length("cy").unwrap_or_default();
        self.rx = attrs.length("rx");
        self.ry = attrs.length("ry");
    }
}

shape_node!(Ellipse, |_: &Ellipse| NodeKind::Ellipse, markers: false);

impl HasShape for Ellipse {
    fn shape(
        &self,
        _id: NodeId,
        _tree: &SceneTree,
        ctx: &RenderContext,
    ) -> Result<Cow<'_, PathData>, RenderError> {
        let m = &ctx.measure;
        let rx = self.rx.or(self.ry).map_or(0.0, |r| r.resolve_width(m));
        let ry = self.ry.or(self.rx).map_or(0.0, |r| r.resolve_height(m));
        if rx <= 0.0 || ry <= 0.0 {
            return Ok(Cow::Owned(PathData::new()));
        }
        Ok(Cow::Owned(PathData::ellipse(
            self.cx.resolve_width(m),
            self.cy.resolve_height(m),
            rx,
            ry,
        )))
    }
}

// ============================================================================
// line, polyline, polygon, path
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Line {
    pub presentation: Presentation,
    pub markers: MarkerRefs,
    pub x1: Length,
    pub y1: Length,
    pub x2: Length,
    pub y2: Length,
}

impl Line {
    fn build_geometry(&mut self, attrs: &AttributeView<'_>) {
        self.markers = MarkerRefs::build(attrs);
        self.x1 = attrs.length("x1").unwrap_or_default();
        self.y1 = attrs.length("y1").unwrap_or_default();
        self.x2 = attrs.length("x2").unwrap_or_default();
        self.y2 = attrs.length("y2").unwrap_or_default();
    }
}

shape_node!(Line, |_: &Line| NodeKind::Line, markers: true);

impl HasShape for Line {
    fn shape(
        &self,
        _id: NodeId,
        _tree: &SceneTree,
        ctx: &RenderContext,
    ) -> Result<Cow<'_, PathData>, RenderError> {
        let m = &ctx.measure;
        Ok(Cow::Owned(
            PathData::new()
                .m(self.x1.resolve_width(m), self.y1.resolve_height(m))
                .l(self.x2.resolve_width(m), self.y2.resolve_height(m)),
        ))
    }
}

/// `polyline`, or `polygon` when closed
#[derive(Clone, Debug, Default)]
pub struct Polyline {
    pub presentation: Presentation,
    pub markers: MarkerRefs,
    pub closed: bool,
    pub shape: SvgShape,
}

impl Polyline {
    pub fn new(closed: bool) -> Self {
        Polyline {
            closed,
            ..Default::default()
        }
    }

    fn build_geometry(&mut self, attrs: &AttributeView<'_>) {
        self.markers = MarkerRefs::build(attrs);
        let numbers = attrs.number_list("points");
        // An odd trailing coordinate is ignored
        let points = numbers
            .chunks_exact(2)
            .map(|pair| DVec2::new(pair[0], pair[1]))
            .collect();
        self.shape = SvgShape::from_points(points, self.closed);
    }
}

shape_node!(
    Polyline,
    |p: &Polyline| if p.closed { NodeKind::Polygon } else { NodeKind::Polyline },
    markers: true
);

impl HasShape for Polyline {
    fn shape(
        &self,
        _id: NodeId,
        _tree: &SceneTree,
        _ctx: &RenderContext,
    ) -> Result<Cow<'_, PathData>, RenderError> {
        Ok(Cow::Borrowed(self.shape.path()))
    }

    fn bounds(&self, _id: NodeId, _tree: &SceneTree, _ctx: &RenderContext) -> Result<BBox, RenderError> {
        Ok(self.shape.bounds())
    }

    fn path_length(
        &self,
        _id: NodeId,
        _tree: &SceneTree,
        _ctx: &RenderContext,
    ) -> Result<f64, RenderError> {
        Ok(self.shape.length())
    }
}

#[derive(Clone, Debug, Default)]
pub struct Path {
    pub presentation: Presentation,
    pub markers: MarkerRefs,
    pub shape: SvgShape,
}

impl Path {
    fn build_geometry(&mut self, attrs: &AttributeView<'_>) {
        self.markers = MarkerRefs::build(attrs);
        self.shape = SvgShape::from_path_data(attrs.get("d").unwrap_or_default());
    }
}

shape_node!(Path, |_: &Path| NodeKind::Path, markers: true);

impl HasShape for Path {
    fn shape(
        &self,
        _id: NodeId,
        _tree: &SceneTree,
        _ctx: &RenderContext,
    ) -> Result<Cow<'_, PathData>, RenderError> {
        Ok(Cow::Borrowed(self.shape.path()))
    }

    fn bounds(&self, _id: NodeId, _tree: &SceneTree, _ctx: &RenderContext) -> Result<BBox, RenderError> {
        Ok(self.shape.bounds())
    }

    fn path_length(
        &self,
        _id: NodeId,
        _tree: &SceneTree,
        _ctx: &RenderContext,
    ) -> Result<f64, RenderError> {
        Ok(self.shape.length())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::RawElement;
    use crate::parser::NameRegistry;
    use crate::renderer::RenderOptions;
    use crate::types::{Size, Unit};

    fn build<T: SvgNode>(mut node: T, tag: &str, attrs: &[(&str, &str)]) -> T {
        let elements = vec![RawElement {
            tag: tag.into(),
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            parent: None,
        }];
        let registry = NameRegistry::default();
        node.build(&AttributeView::new(NodeId::new(0), &elements, &registry));
        node
    }

    fn ctx() -> RenderContext {
        RenderContext::root(Size::new(200.0, 100.0), &RenderOptions::default())
    }

    #[test]
    fn rect_resolves_percentages_against_viewport() {
        let rect = build(
            Rect::default(),
            "rect",
            &[("x", "10%"), ("width", "50%"), ("height", "20")],
        );
        assert_eq!(rect.width, Length::new(50.0, Unit::Percent));
        let bounds = rect.bounds(NodeId::new(0), &SceneTree::new(), &ctx()).unwrap();
        assert_eq!(bounds, BBox::from_rect(20.0, 0.0, 100.0, 20.0));
    }

    #[test]
    fn zero_sized_rect_has_no_outline() {
        let rect = build(Rect::default(), "rect", &[("width", "0"), ("height", "20")]);
        let path = rect.shape(NodeId::new(0), &SceneTree::new(), &ctx()).unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn rect_radius_defaults_to_the_other_and_clamps() {
        let rect = build(
            Rect::default(),
            "rect",
            &[("width", "10"), ("height", "4"), ("rx", "3")],
        );
        let path = rect.shape(NodeId::new(0), &SceneTree::new(), &ctx()).unwrap();
        let bounds = path.bounds();
        assert!((bounds.width() - 10.0).abs() < 1e-6);
        assert!((bounds.height() - 4.0).abs() < 1e-6);
        assert!(path.segments().len() > 5);
    }

    #[test]
    fn polygon_reports_its_kind_and_closes() {
        let polygon = build(Polyline::new(true), "polygon", &[("points", "0,0 10,0 10,10 5")]);
        assert_eq!(polygon.kind(), NodeKind::Polygon);
        let length = polygon
            .path_length(NodeId::new(0), &SceneTree::new(), &ctx())
            .unwrap();
        assert!((length - (20.0 + 200.0_f64.sqrt())).abs() < 1e-9);
    }

    #[test]
    fn path_shape_is_lazy() {
        let path = build(Path::default(), "path", &[("d", "M0 0 L30 40")]);
        assert!(!path.shape.is_computed());
        let length = path.path_length(NodeId::new(0), &SceneTree::new(), &ctx()).unwrap();
        assert!((length - 50.0).abs() < 1e-9);
        assert!(path.shape.is_computed());
    }

    #[test]
    fn circle_radius_uses_normed_diagonal() {
        let circle = build(Circle::default(), "circle", &[("r", "10%")]);
        let bounds = circle.bounds(NodeId::new(0), &SceneTree::new(), &ctx()).unwrap();
        let expected = 0.1 * ((200.0_f64 * 200.0 + 100.0 * 100.0) / 2.0).sqrt();
        assert!((bounds.width() - 2.0 * expected).abs() < 1e-6);
    }
}
