//! Clip paths, masks and filters.
//!
//! None of these paint where they appear. Other elements reference them
//! through `clip-path`, `mask` and `filter`, and the renderer applies them
//! around the referencing element.

use std::str::FromStr;

use glam::{DAffine2, DVec2};

use super::{Node, NodeId, NodeKind, SceneTree, SvgNode};
use crate::attributes::{AttributeView, FillRule};
use crate::errors::RenderError;
use crate::geometry::{MeasureContext, PathData};
use crate::log::debug;
use crate::renderer::{FilterEffect, RenderContext, Renderer};
use crate::types::{BBox, Length, NumericError, Size, Unit};

/// `clipPathUnits`, `maskUnits`, `gradientUnits` and friends
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoordinateUnits {
    UserSpaceOnUse,
    ObjectBoundingBox,
}

impl FromStr for CoordinateUnits {
    type Err = NumericError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "userSpaceOnUse" => Ok(CoordinateUnits::UserSpaceOnUse),
            "objectBoundingBox" => Ok(CoordinateUnits::ObjectBoundingBox),
            _ => Err(NumericError::Malformed),
        }
    }
}

/// Maps the unit square onto `bounds`.
pub(crate) fn bounding_box_transform(bounds: &BBox) -> DAffine2 {
    DAffine2::from_translation(bounds.min)
        * DAffine2::from_scale(DVec2::new(bounds.width(), bounds.height()))
}

/// The x/y/width/height region shared by masks and filters; the defaults
/// extend the element bounds by 10% on every side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectRegion {
    pub x: Length,
    pub y: Length,
    pub width: Length,
    pub height: Length,
}

impl Default for EffectRegion {
    fn default() -> Self {
        EffectRegion {
            x: Length::new(-10.0, Unit::Percent),
            y: Length::new(-10.0, Unit::Percent),
            width: Length::new(120.0, Unit::Percent),
            height: Length::new(120.0, Unit::Percent),
        }
    }
}

impl EffectRegion {
    fn build(attrs: &AttributeView<'_>) -> EffectRegion {
        let defaults = EffectRegion::default();
        EffectRegion {
            x: attrs.length("x").unwrap_or(defaults.x),
            y: attrs.length("y").unwrap_or(defaults.y),
            width: attrs.length("width").unwrap_or(defaults.width),
            height: attrs.length("height").unwrap_or(defaults.height),
        }
    }

    /// The region in the referencing element's user space.
    pub fn resolve(&self, units: CoordinateUnits, bounds: &BBox, measure: &MeasureContext) -> BBox {
        match units {
            CoordinateUnits::ObjectBoundingBox => {
                if bounds.is_empty() {
                    return BBox::new();
                }
                let unit = MeasureContext::new(Size::new(1.0, 1.0), measure.em);
                let fraction = BBox::from_rect(
                    self.x.resolve_width(&unit),
                    self.y.resolve_height(&unit),
                    self.width.resolve_width(&unit),
                    self.height.resolve_height(&unit),
                );
                fraction.transformed(&bounding_box_transform(bounds))
            }
            CoordinateUnits::UserSpaceOnUse => BBox::from_rect(
                self.x.resolve_width(measure),
                self.y.resolve_height(measure),
                self.width.resolve_width(measure),
                self.height.resolve_height(measure),
            ),
        }
    }
}

// ============================================================================
// clipPath
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct ClipPath {
    pub units: CoordinateUnits,
    pub transform: Option<DAffine2>,
    pub clip_rule: FillRule,
}

impl Default for ClipPath {
    fn default() -> Self {
        ClipPath {
            units: CoordinateUnits::UserSpaceOnUse,
            transform: None,
            clip_rule: FillRule::NonZero,
        }
    }
}

impl SvgNode for ClipPath {
    fn kind(&self) -> NodeKind {
        NodeKind::ClipPath
    }

    fn build(&mut self, attrs: &AttributeView<'_>) {
        self.units = attrs
            .enum_value("clipPathUnits")
            .unwrap_or(CoordinateUnits::UserSpaceOnUse);
        self.transform = attrs.transform("transform");
        self.clip_rule = attrs
            .get_inherited("clip-rule")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or_default();
    }
}

impl ClipPath {
    /// Union of the visible child outlines, in the referencing element's
    /// user space.
    pub fn clip_shape(
        &self,
        id: NodeId,
        tree: &SceneTree,
        ctx: &RenderContext,
        target_bounds: &BBox,
    ) -> Result<PathData, RenderError> {
        let mut clip = PathData::new();
        for &child in tree.children(id) {
            if let Some(outline) = clip_child_outline(child, tree, ctx)? {
                clip.append(&outline);
            }
        }

        let mut transform = self.transform.unwrap_or(DAffine2::IDENTITY);
        if self.units == CoordinateUnits::ObjectBoundingBox {
            if target_bounds.is_empty() {
                return Ok(PathData::new());
            }
            transform = bounding_box_transform(target_bounds) * transform;
        }
        Ok(clip.transformed(&transform))
    }
}

/// Outline of one `clipPath` child in the clip path's user space. A `use`
/// contributes the shape it references, moved by its offset.
fn clip_child_outline(
    child: NodeId,
    tree: &SceneTree,
    ctx: &RenderContext,
) -> Result<Option<PathData>, RenderError> {
    let node = tree.node(child);
    let Some(renderable) = node.as_renderable() else {
        return Ok(None);
    };
    if !renderable.is_visible() {
        return Ok(None);
    }
    let child_ctx = ctx.derive(renderable);
    let mut placement = renderable
        .geometry()
        .user_transform(&child_ctx.measure)
        .unwrap_or(DAffine2::IDENTITY);

    let (shape_id, shape, shape_ctx) = match node {
        Node::Use(link) => {
            let Some(target) = link.href else {
                return Ok(None);
            };
            let target_node = tree.resolve(target);
            let (Some(shape), Some(target_renderable)) =
                (target_node.as_shape(), target_node.as_renderable())
            else {
                debug!(
                    target = target_node.kind().tag_name(),
                    "clip path content must be a shape, skipping use"
                );
                return Ok(None);
            };
            if !target_renderable.is_visible() {
                return Ok(None);
            }
            let m = &child_ctx.measure;
            let offset = DVec2::new(link.x.resolve_width(m), link.y.resolve_height(m));
            let target_ctx = child_ctx.derive(target_renderable);
            placement = placement
                * DAffine2::from_translation(offset)
                * target_renderable
                    .geometry()
                    .user_transform(&target_ctx.measure)
                    .unwrap_or(DAffine2::IDENTITY);
            (target.id(), shape, target_ctx)
        }
        _ => match node.as_shape() {
            Some(shape) => (child, shape, child_ctx),
            None => return Ok(None),
        },
    };
    let outline = shape.shape(shape_id, tree, &shape_ctx)?;
    Ok(Some(outline.transformed(&placement)))
}

// ============================================================================
// mask
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct Mask {
    pub units: CoordinateUnits,
    pub content_units: CoordinateUnits,
    pub region: EffectRegion,
}

impl Default for Mask {
    fn default() -> Self {
        Mask {
            units: CoordinateUnits::ObjectBoundingBox,
            content_units: CoordinateUnits::UserSpaceOnUse,
            region: EffectRegion::default(),
        }
    }
}

impl SvgNode for Mask {
    fn kind(&self) -> NodeKind {
        NodeKind::Mask
    }

    fn build(&mut self, attrs: &AttributeView<'_>) {
        self.units = attrs
            .enum_value("maskUnits")
            .unwrap_or(CoordinateUnits::ObjectBoundingBox);
        self.content_units = attrs
            .enum_value("maskContentUnits")
            .unwrap_or(CoordinateUnits::UserSpaceOnUse);
        self.region = EffectRegion::build(attrs);
    }
}

impl Mask {
    /// Draw the mask content between `push_mask` and `commit_mask`.
    ///
    /// Content starts from a fresh paint context and is clipped to the mask
    /// region.
    pub fn render_content(
        &self,
        id: NodeId,
        ctx: &RenderContext,
        target_bounds: &BBox,
        renderer: &mut Renderer<'_>,
    ) -> Result<(), RenderError> {
        let region = self.region.resolve(self.units, target_bounds, &ctx.measure);
        if region.is_empty() {
            return Ok(());
        }
        let mut content_ctx = ctx.for_resource();
        let surface = renderer.surface();
        surface.save();
        surface.clip(
            &PathData::rect(region.min.x, region.min.y, region.width(), region.height()),
            FillRule::NonZero,
        );
        if self.content_units == CoordinateUnits::ObjectBoundingBox {
            let transform = bounding_box_transform(target_bounds);
            surface.concat(transform);
            content_ctx = content_ctx.concat(transform);
        }
        let result = renderer.render_children(id, &content_ctx);
        renderer.surface().restore();
        result
    }
}

// ============================================================================
// filter
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub units: CoordinateUnits,
    pub primitive_units: CoordinateUnits,
    pub region: EffectRegion,
}

impl Default for Filter {
    fn default() -> Self {
        Filter {
            units: CoordinateUnits::ObjectBoundingBox,
            primitive_units: CoordinateUnits::UserSpaceOnUse,
            region: EffectRegion::default(),
        }
    }
}

impl SvgNode for Filter {
    fn kind(&self) -> NodeKind {
        NodeKind::Filter
    }

    fn build(&mut self, attrs: &AttributeView<'_>) {
        self.units = attrs
            .enum_value("filterUnits")
            .unwrap_or(CoordinateUnits::ObjectBoundingBox);
        self.primitive_units = attrs
            .enum_value("primitiveUnits")
            .unwrap_or(CoordinateUnits::UserSpaceOnUse);
        self.region = EffectRegion::build(attrs);
    }
}

impl Filter {
    pub fn effect(&self, target_bounds: &BBox, measure: &MeasureContext) -> FilterEffect {
        FilterEffect {
            region: self.region.resolve(self.units, target_bounds, measure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_region_extends_bounds_by_ten_percent() {
        let bounds = BBox::from_rect(0.0, 0.0, 100.0, 50.0);
        let region =
            EffectRegion::default().resolve(CoordinateUnits::ObjectBoundingBox, &bounds, &MeasureContext::default());
        assert!((region.min.x + 10.0).abs() < 1e-9);
        assert!((region.min.y + 5.0).abs() < 1e-9);
        assert!((region.width() - 120.0).abs() < 1e-9);
        assert!((region.height() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn user_space_region_uses_viewport() {
        let region = EffectRegion {
            x: Length::px(5.0),
            y: Length::px(5.0),
            width: Length::new(50.0, Unit::Percent),
            height: Length::px(10.0),
        };
        let measure = MeasureContext::new(Size::new(200.0, 100.0), 16.0);
        let resolved = region.resolve(CoordinateUnits::UserSpaceOnUse, &BBox::new(), &measure);
        assert_eq!(resolved, BBox::from_rect(5.0, 5.0, 100.0, 10.0));
    }

    #[test]
    fn units_keywords() {
        assert_eq!(
            "objectBoundingBox".parse::<CoordinateUnits>(),
            Ok(CoordinateUnits::ObjectBoundingBox)
        );
        assert!("objectboundingbox".parse::<CoordinateUnits>().is_err());
    }
}
