//! Capability traits implemented by node kinds.
//!
//! A node exposes a capability through the `as_*` accessors of
//! [`super::SvgNode`]; kinds that lack it return `None`. Clip, mask, filter
//! and transform live together in [`GeometryContext`], which every
//! renderable kind carries.

use std::borrow::Cow;

use glam::{DAffine2, DVec2};

use super::{ClipPath, Filter, Mask, NodeId, Ref, SceneTree};
use crate::attributes::transform::parse_transform_origin;
use crate::attributes::{AttributeView, FontSpec, PaintContext};
use crate::errors::RenderError;
use crate::geometry::{MeasureContext, PathData};
use crate::renderer::text::GlyphCursor;
use crate::renderer::{RenderContext, Renderer};
use crate::types::{BBox, Length};

/// Transform, clipping, masking, filtering and visibility of one element
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryContext {
    pub transform: Option<DAffine2>,
    pub transform_origin: Option<(Length, Length)>,
    pub clip_path: Option<Ref<ClipPath>>,
    pub mask: Option<Ref<Mask>>,
    pub filter: Option<Ref<Filter>>,
    pub visible: bool,
}

impl Default for GeometryContext {
    fn default() -> Self {
        GeometryContext {
            transform: None,
            transform_origin: None,
            clip_path: None,
            mask: None,
            filter: None,
            visible: true,
        }
    }
}

impl GeometryContext {
    pub fn build(attrs: &AttributeView<'_>) -> GeometryContext {
        let visibility = attrs
            .get_inherited("visibility")
            .is_none_or(|v| v.trim() == "visible");
        let displayed = attrs.get("display").is_none_or(|v| v.trim() != "none");
        GeometryContext {
            transform: attrs.transform("transform"),
            transform_origin: attrs.get("transform-origin").and_then(parse_transform_origin),
            clip_path: attrs.resolve_url("clip-path"),
            mask: attrs.resolve_url("mask"),
            filter: attrs.resolve_url("filter"),
            visible: visibility && displayed,
        }
    }

    /// The element transform with `transform-origin` applied.
    pub fn user_transform(&self, measure: &MeasureContext) -> Option<DAffine2> {
        let transform = self.transform?;
        let Some((ox, oy)) = self.transform_origin else {
            return Some(transform);
        };
        let origin = DVec2::new(ox.resolve_width(measure), oy.resolve_height(measure));
        Some(
            DAffine2::from_translation(origin)
                * transform
                * DAffine2::from_translation(-origin),
        )
    }
}

/// The presentation attributes every renderable element carries
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Presentation {
    pub geometry: GeometryContext,
    pub paint: PaintContext,
    pub font: FontSpec,
}

impl Presentation {
    pub fn build(attrs: &AttributeView<'_>) -> Presentation {
        Presentation {
            geometry: GeometryContext::build(attrs),
            paint: PaintContext::build(attrs),
            font: FontSpec::build(attrs),
        }
    }
}

/// A node that draws itself onto a surface
pub trait Renderable {
    fn geometry(&self) -> &GeometryContext;

    fn paint(&self) -> &PaintContext;

    fn font(&self) -> &FontSpec;

    fn is_visible(&self) -> bool {
        self.geometry().visible
    }

    /// Draw the node. `ctx` is already composed for this node and the
    /// surface already carries its transform, clip, mask and layer.
    fn render(
        &self,
        id: NodeId,
        ctx: &RenderContext,
        renderer: &mut Renderer<'_>,
    ) -> Result<(), RenderError>;
}

/// A node with an outline in its own user space
pub trait HasShape {
    fn shape(
        &self,
        id: NodeId,
        tree: &SceneTree,
        ctx: &RenderContext,
    ) -> Result<Cow<'_, PathData>, RenderError>;

    fn bounds(&self, id: NodeId, tree: &SceneTree, ctx: &RenderContext) -> Result<BBox, RenderError> {
        Ok(self.shape(id, tree, ctx)?.bounds())
    }

    fn path_length(
        &self,
        id: NodeId,
        tree: &SceneTree,
        ctx: &RenderContext,
    ) -> Result<f64, RenderError> {
        Ok(self.shape(id, tree, ctx)?.length())
    }
}

/// A container taking part in text layout (`text`, `tspan`, `textPath`)
pub trait TextSegment {
    /// Derive the cursor the children of this segment are laid out with.
    fn create_local_cursor(
        &self,
        tree: &SceneTree,
        ctx: &RenderContext,
        current: &GlyphCursor,
    ) -> Result<GlyphCursor, RenderError>;

    /// Merge the children's final cursor back into the caller's.
    fn clean_up_local_cursor(&self, current: &mut GlyphCursor, local: GlyphCursor);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Size;

    #[test]
    fn transform_origin_wraps_transform() {
        let geometry = GeometryContext {
            transform: Some(DAffine2::from_scale(DVec2::splat(2.0))),
            transform_origin: Some((Length::px(10.0), Length::px(10.0))),
            ..Default::default()
        };
        let measure = MeasureContext::new(Size::new(100.0, 100.0), 16.0);
        let t = geometry.user_transform(&measure).unwrap();
        // The origin is a fixed point
        assert_eq!(t.transform_point2(DVec2::new(10.0, 10.0)), DVec2::new(10.0, 10.0));
        assert_eq!(t.transform_point2(DVec2::ZERO), DVec2::new(-10.0, -10.0));
    }

    #[test]
    fn default_geometry_is_visible() {
        assert!(GeometryContext::default().visible);
        assert!(GeometryContext::default().user_transform(&MeasureContext::default()).is_none());
    }
}
