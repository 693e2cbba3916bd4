//! Markers: symbols drawn at the vertices of `path`, `line`, `polyline` and
//! `polygon`.

use std::str::FromStr;

use glam::{DAffine2, DVec2};

use super::{NodeId, NodeKind, Presentation, Renderable, SvgNode};
use crate::attributes::{AttributeView, FillRule};
use crate::errors::RenderError;
use crate::geometry::{MarkerOrientation, PathData, PreserveAspectRatio, ViewBox};
use crate::renderer::{RenderContext, Renderer};
use crate::types::{Length, NumericError, Size};

/// `markerUnits`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MarkerUnits {
    /// Scaled by the stroke width of the referencing shape
    #[default]
    StrokeWidth,
    UserSpaceOnUse,
}

impl FromStr for MarkerUnits {
    type Err = NumericError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "strokeWidth" => Ok(MarkerUnits::StrokeWidth),
            "userSpaceOnUse" => Ok(MarkerUnits::UserSpaceOnUse),
            _ => Err(NumericError::Malformed),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub presentation: Presentation,
    pub ref_x: Length,
    pub ref_y: Length,
    pub width: Length,
    pub height: Length,
    pub units: MarkerUnits,
    pub orientation: MarkerOrientation,
    pub view_box: Option<ViewBox>,
    pub preserve_aspect_ratio: PreserveAspectRatio,
}

impl Default for Marker {
    fn default() -> Self {
        Marker {
            presentation: Presentation::default(),
            ref_x: Length::ZERO,
            ref_y: Length::ZERO,
            width: Length::px(3.0),
            height: Length::px(3.0),
            units: MarkerUnits::StrokeWidth,
            orientation: MarkerOrientation::default(),
            view_box: None,
            preserve_aspect_ratio: PreserveAspectRatio::default(),
        }
    }
}

impl SvgNode for Marker {
    fn kind(&self) -> NodeKind {
        NodeKind::Marker
    }

    fn build(&mut self, attrs: &AttributeView<'_>) {
        self.presentation = Presentation::build(attrs);
        self.ref_x = attrs.length("refX").unwrap_or_default();
        self.ref_y = attrs.length("refY").unwrap_or_default();
        self.width = attrs
            .length("markerWidth")
            .filter(|l| l.value >= 0.0)
            .unwrap_or(Length::px(3.0));
        self.height = attrs
            .length("markerHeight")
            .filter(|l| l.value >= 0.0)
            .unwrap_or(Length::px(3.0));
        self.units = attrs.enum_value("markerUnits").unwrap_or_default();
        self.orientation = attrs.enum_value("orient").unwrap_or_default();
        self.view_box = attrs.get("viewBox").and_then(ViewBox::parse);
        self.preserve_aspect_ratio = attrs
            .get("preserveAspectRatio")
            .and_then(PreserveAspectRatio::parse)
            .unwrap_or_default();
    }
}

impl Renderable for Marker {
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

impl Marker {
    /// Transform from marker content space to the shape's user space for a
    /// marker at `vertex`, rotated by `angle`. Also returns the clip
    /// rectangle in the rotated, scaled frame.
    pub fn placement(
        &self,
        vertex: DVec2,
        angle: f64,
        stroke_width: f64,
        ctx: &RenderContext,
    ) -> (DAffine2, DAffine2, PathData) {
        let m = &ctx.measure;
        let size = Size::new(self.width.resolve_width(m), self.height.resolve_height(m));
        let scale = match self.units {
            MarkerUnits::StrokeWidth => stroke_width,
            MarkerUnits::UserSpaceOnUse => 1.0,
        };
        let frame = DAffine2::from_translation(vertex)
            * DAffine2::from_angle(angle)
            * DAffine2::from_scale(DVec2::splat(scale));

        let view = match &self.view_box {
            Some(vb) => self.preserve_aspect_ratio.transform(vb, size),
            None => DAffine2::IDENTITY,
        };
        let reference = view.transform_point2(DVec2::new(
            self.ref_x.resolve_width(m),
            self.ref_y.resolve_height(m),
        ));
        let content = DAffine2::from_translation(-reference) * view;
        let clip = PathData::rect(-reference.x, -reference.y, size.w, size.h);
        (frame, content, clip)
    }

    /// Draw the marker content at one vertex.
    ///
    /// Content starts from a fresh paint context layered with the marker's
    /// own presentation attributes, and is clipped to the marker viewport.
    pub fn render_at(
        &self,
        id: NodeId,
        vertex: DVec2,
        angle: f64,
        stroke_width: f64,
        ctx: &RenderContext,
        renderer: &mut Renderer<'_>,
    ) -> Result<(), RenderError> {
        let size_ctx = ctx.for_resource();
        let (frame, content, clip) = self.placement(vertex, angle, stroke_width, &size_ctx);
        if clip.bounds().width() <= 0.0 || clip.bounds().height() <= 0.0 {
            return Ok(());
        }
        let mut marker_ctx = size_ctx.concat(frame * content).derive(self);
        if let Some(vb) = &self.view_box {
            marker_ctx = marker_ctx.with_viewport(vb.size());
        }

        let surface = renderer.surface();
        surface.save();
        surface.concat(frame);
        surface.clip(&clip, FillRule::NonZero);
        surface.concat(content);
        let result = renderer.render_children(id, &marker_ctx);
        renderer.surface().restore();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RenderOptions;

    fn ctx() -> RenderContext {
        RenderContext::root(Size::new(100.0, 100.0), &RenderOptions::default())
    }

    #[test]
    fn stroke_width_units_scale_the_frame() {
        let marker = Marker::default();
        let (frame, content, _) = marker.placement(DVec2::new(10.0, 10.0), 0.0, 2.0, &ctx());
        let p = (frame * content).transform_point2(DVec2::new(1.0, 0.0));
        assert_eq!(p, DVec2::new(12.0, 10.0));
    }

    #[test]
    fn reference_point_lands_on_vertex() {
        let marker = Marker {
            ref_x: Length::px(5.0),
            ref_y: Length::px(5.0),
            width: Length::px(10.0),
            height: Length::px(10.0),
            view_box: Some(ViewBox::new(0.0, 0.0, 20.0, 20.0)),
            units: MarkerUnits::UserSpaceOnUse,
            ..Default::default()
        };
        let (frame, content, clip) =
            marker.placement(DVec2::new(50.0, 50.0), std::f64::consts::FRAC_PI_2, 1.0, &ctx());
        let p = (frame * content).transform_point2(DVec2::new(5.0, 5.0));
        assert!((p - DVec2::new(50.0, 50.0)).length() < 1e-9);
        // Viewport is 10x10 with the reference point (2.5, 2.5) at the origin
        assert_eq!(clip.bounds().min, DVec2::new(-2.5, -2.5));
    }

    #[test]
    fn units_keywords() {
        assert_eq!("userSpaceOnUse".parse::<MarkerUnits>(), Ok(MarkerUnits::UserSpaceOnUse));
        assert!("stroke-width".parse::<MarkerUnits>().is_err());
    }
}
