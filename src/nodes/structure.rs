//! Structural elements: `svg`, `g`, `a`, `defs`, `symbol`, `use`, and the
//! descriptive elements that never render.

use glam::{DAffine2, DVec2};

use super::{AnyRenderable, Node, NodeId, NodeKind, Presentation, Ref, Renderable, SvgNode};
use crate::attributes::{AttributeView, FillRule};
use crate::errors::RenderError;
use crate::geometry::{MeasureContext, PathData, PreserveAspectRatio, ViewBox};
use crate::renderer::{RenderContext, Renderer};
use crate::types::{Length, Size, Unit};

/// Intrinsic size used when neither dimensions nor a view box are given
pub const DEFAULT_SIZE: f64 = 100.0;

const FULL: Length = Length::new(100.0, Unit::Percent);

fn view_box_attributes(attrs: &AttributeView<'_>) -> (Option<ViewBox>, PreserveAspectRatio) {
    let view_box = attrs.get("viewBox").and_then(ViewBox::parse);
    let par = attrs
        .get("preserveAspectRatio")
        .and_then(PreserveAspectRatio::parse)
        .unwrap_or_default();
    (view_box, par)
}

// ============================================================================
// svg
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Svg {
    pub presentation: Presentation,
    pub x: Length,
    pub y: Length,
    pub width: Option<Length>,
    pub height: Option<Length>,
    pub view_box: Option<ViewBox>,
    pub preserve_aspect_ratio: PreserveAspectRatio,
}

impl SvgNode for Svg {
    fn kind(&self) -> NodeKind {
        NodeKind::Svg
    }

    fn build(&mut self, attrs: &AttributeView<'_>) {
        self.presentation = Presentation::build(attrs);
        self.x = attrs.length("x").unwrap_or_default();
        self.y = attrs.length("y").unwrap_or_default();
        self.width = attrs.length("width").filter(|l| l.value >= 0.0);
        self.height = attrs.length("height").filter(|l| l.value >= 0.0);
        (self.view_box, self.preserve_aspect_ratio) = view_box_attributes(attrs);
    }

    fn as_renderable(&self) -> Option<&dyn Renderable> {
        Some(self)
    }
}

impl Svg {
    /// Size of the document when used as the root.
    ///
    /// Absolute `width`/`height` win. A missing one follows the view box
    /// aspect ratio, or takes the view box size. Without either the size is
    /// 100x100. Percentages have nothing to refer to and count as missing.
    pub fn intrinsic_size(&self, em: f64) -> Size {
        let measure = MeasureContext::new(Size::new(DEFAULT_SIZE, DEFAULT_SIZE), em);
        let absolute = |l: Option<Length>| l.filter(|l| !l.is_percentage());
        let width = absolute(self.width).map(|l| l.resolve_width(&measure));
        let height = absolute(self.height).map(|l| l.resolve_height(&measure));
        match (width, height, self.view_box) {
            (Some(w), Some(h), _) => Size::new(w, h),
            (Some(w), None, Some(vb)) => Size::new(w, w * vb.h / vb.w),
            (None, Some(h), Some(vb)) => Size::new(h * vb.w / vb.h, h),
            (None, None, Some(vb)) => vb.size(),
            (w, h, None) => Size::new(w.unwrap_or(DEFAULT_SIZE), h.unwrap_or(DEFAULT_SIZE)),
        }
    }

    /// Transform from this element's content to its parent's user space,
    /// and the viewport it establishes.
    pub fn viewport_transform(&self, viewport: Size, origin: DVec2) -> (DAffine2, Size) {
        let place = DAffine2::from_translation(origin);
        match &self.view_box {
            Some(vb) => (place * self.preserve_aspect_ratio.transform(vb, viewport), vb.size()),
            None => (place, viewport),
        }
    }
}

impl Renderable for Svg {
    presentation_accessors!();

    fn render(
        &self,
        id: NodeId,
        ctx: &RenderContext,
        renderer: &mut Renderer<'_>,
    ) -> Result<(), RenderError> {
        let m = &ctx.measure;
        let nested = renderer.tree().parent(id).is_some();
        let (origin, viewport) = if nested {
            let size = Size::new(
                self.width.unwrap_or(FULL).resolve_width(m),
                self.height.unwrap_or(FULL).resolve_height(m),
            );
            (DVec2::new(self.x.resolve_width(m), self.y.resolve_height(m)), size)
        } else {
            (DVec2::ZERO, m.viewport)
        };
        if viewport.w <= 0.0 || viewport.h <= 0.0 {
            return Ok(());
        }
        let (transform, content_viewport) = self.viewport_transform(viewport, origin);

        let surface = renderer.surface();
        if nested {
            surface.clip(
                &PathData::rect(origin.x, origin.y, viewport.w, viewport.h),
                FillRule::NonZero,
            );
        }
        surface.concat(transform);
        let content = ctx.concat(transform).with_viewport(content_viewport);
        renderer.render_children(id, &content)
    }
}

// ============================================================================
// g, a, defs
// ============================================================================

/// `g` and `a`
#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    pub kind: NodeKind,
    pub presentation: Presentation,
}

impl Group {
    pub fn new(kind: NodeKind) -> Self {
        Group {
            kind,
            presentation: Presentation::default(),
        }
    }
}

impl SvgNode for Group {
    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn build(&mut self, attrs: &AttributeView<'_>) {
        self.presentation = Presentation::build(attrs);
    }

    fn as_renderable(&self) -> Option<&dyn Renderable> {
        Some(self)
    }
}

impl Renderable for Group {
    presentation_accessors!();

    fn render(
        &self,
        id: NodeId,
        ctx: &RenderContext,
        renderer: &mut Renderer<'_>,
    ) -> Result<(), RenderError> {
        renderer.render_children(id, ctx)
    }
}

/// Resource container; never rendered itself
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Defs;

impl SvgNode for Defs {
    fn kind(&self) -> NodeKind {
        NodeKind::Defs
    }

    fn build(&mut self, _attrs: &AttributeView<'_>) {}
}

// ============================================================================
// symbol, use
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Symbol {
    pub presentation: Presentation,
    pub view_box: Option<ViewBox>,
    pub preserve_aspect_ratio: PreserveAspectRatio,
}

impl SvgNode for Symbol {
    fn kind(&self) -> NodeKind {
        NodeKind::Symbol
    }

    fn build(&mut self, attrs: &AttributeView<'_>) {
        self.presentation = Presentation::build(attrs);
        (self.view_box, self.preserve_aspect_ratio) = view_box_attributes(attrs);
    }

    fn as_renderable(&self) -> Option<&dyn Renderable> {
        Some(self)
    }
}

impl Renderable for Symbol {
    presentation_accessors!();

    /// A symbol reached without an instance size fills the viewport.
    fn render(
        &self,
        id: NodeId,
        ctx: &RenderContext,
        renderer: &mut Renderer<'_>,
    ) -> Result<(), RenderError> {
        self.render_instance(id, ctx.measure.viewport, ctx, renderer)
    }
}

impl Symbol {
    /// Draw the symbol content into a viewport of `size`, as instantiated
    /// by `use`.
    pub fn render_instance(
        &self,
        id: NodeId,
        size: Size,
        ctx: &RenderContext,
        renderer: &mut Renderer<'_>,
    ) -> Result<(), RenderError> {
        let Some(vb) = &self.view_box else {
            return renderer.render_children(id, ctx);
        };
        if size.w <= 0.0 || size.h <= 0.0 {
            return Ok(());
        }
        let transform = self.preserve_aspect_ratio.transform(vb, size);
        let surface = renderer.surface();
        surface.clip(&PathData::rect(0.0, 0.0, size.w, size.h), FillRule::NonZero);
        surface.concat(transform);
        let content = ctx.concat(transform).with_viewport(vb.size());
        renderer.render_children(id, &content)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Use {
    pub presentation: Presentation,
    pub x: Length,
    pub y: Length,
    pub width: Option<Length>,
    pub height: Option<Length>,
    pub href: Option<Ref<AnyRenderable>>,
}

impl SvgNode for Use {
    fn kind(&self) -> NodeKind {
        NodeKind::Use
    }

    fn build(&mut self, attrs: &AttributeView<'_>) {
        self.presentation = Presentation::build(attrs);
        self.x = attrs.length("x").unwrap_or_default();
        self.y = attrs.length("y").unwrap_or_default();
        self.width = attrs.length("width").filter(|l| l.value >= 0.0);
        self.height = attrs.length("height").filter(|l| l.value >= 0.0);
        self.href = attrs.resolve_href();
    }

    fn as_renderable(&self) -> Option<&dyn Renderable> {
        Some(self)
    }
}

impl Renderable for Use {
    presentation_accessors!();

    /// A `use` with a dangling reference draws nothing.
    fn is_visible(&self) -> bool {
        self.presentation.geometry.visible && self.href.is_some()
    }

    fn render(
        &self,
        _id: NodeId,
        ctx: &RenderContext,
        renderer: &mut Renderer<'_>,
    ) -> Result<(), RenderError> {
        let Some(target) = self.href else {
            return Ok(());
        };
        let m = &ctx.measure;
        let offset = DVec2::new(self.x.resolve_width(m), self.y.resolve_height(m));
        renderer.surface().translate(offset);
        let ctx = ctx.concat(DAffine2::from_translation(offset));

        let tree = renderer.tree();
        renderer.with_reference(target.id(), "use", |r| match tree.resolve(target) {
            Node::Symbol(symbol) => {
                let size = Size::new(
                    self.width.unwrap_or(FULL).resolve_width(m),
                    self.height.unwrap_or(FULL).resolve_height(m),
                );
                let symbol_ctx = ctx.derive(symbol);
                if !symbol.is_visible() || symbol_ctx.opacity <= 0.0 {
                    return Ok(());
                }
                r.surface().save();
                let result = symbol.render_instance(target.id(), size, &symbol_ctx, r);
                r.surface().restore();
                result
            }
            _ => r.render_node(target.id(), &ctx),
        })
    }
}

// ============================================================================
// title, desc, metadata, style
// ============================================================================

/// An element kept for its character data only
#[derive(Clone, Debug, PartialEq)]
pub struct Descriptive {
    pub kind: NodeKind,
}

impl Descriptive {
    pub fn new(kind: NodeKind) -> Self {
        Descriptive { kind }
    }
}

impl SvgNode for Descriptive {
    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn build(&mut self, _attrs: &AttributeView<'_>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn svg(width: Option<f64>, height: Option<f64>, view_box: Option<ViewBox>) -> Svg {
        Svg {
            width: width.map(Length::px),
            height: height.map(Length::px),
            view_box,
            ..Default::default()
        }
    }

    #[test]
    fn intrinsic_size_prefers_dimensions() {
        let vb = Some(ViewBox::new(0.0, 0.0, 40.0, 20.0));
        assert_eq!(svg(Some(10.0), Some(30.0), vb).intrinsic_size(16.0), Size::new(10.0, 30.0));
        assert_eq!(svg(Some(10.0), None, vb).intrinsic_size(16.0), Size::new(10.0, 5.0));
        assert_eq!(svg(None, Some(10.0), vb).intrinsic_size(16.0), Size::new(20.0, 10.0));
        assert_eq!(svg(None, None, vb).intrinsic_size(16.0), Size::new(40.0, 20.0));
        assert_eq!(svg(None, None, None).intrinsic_size(16.0), Size::new(100.0, 100.0));
    }

    #[test]
    fn percentage_dimensions_count_as_missing() {
        let doc = Svg {
            width: Some(Length::new(50.0, Unit::Percent)),
            height: Some(Length::px(20.0)),
            ..Default::default()
        };
        assert_eq!(doc.intrinsic_size(16.0), Size::new(100.0, 20.0));
    }

    #[test]
    fn viewport_transform_maps_view_box() {
        let doc = svg(None, None, Some(ViewBox::new(0.0, 0.0, 10.0, 10.0)));
        let (t, content) = doc.viewport_transform(Size::new(100.0, 100.0), DVec2::ZERO);
        assert_eq!(t.transform_point2(DVec2::new(5.0, 5.0)), DVec2::new(50.0, 50.0));
        assert_eq!(content, Size::new(10.0, 10.0));
    }

    #[test]
    fn dangling_use_is_invisible() {
        assert!(!Use::default().is_visible());
    }
}
