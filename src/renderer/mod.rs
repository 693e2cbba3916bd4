//! Scene rendering.
//!
//! The [`Renderer`] walks a built [`SceneTree`] and issues drawing
//! operations on a [`Surface`]. Each renderable node is drawn in the same
//! order of steps:
//!
//! 1. skip it when invisible, compose its [`RenderContext`], and skip it
//!    when the composed opacity is zero
//! 2. save the surface and concatenate the node transform
//! 3. apply `clip-path`, then `mask`
//! 4. open a layer for group opacity or a filter
//! 5. let the node draw itself
//! 6. close whatever step 3 and 4 opened and restore
//!
//! References (`use`, markers, clip paths, masks) are followed through a
//! stack of active targets so a cyclic document fails with
//! [`RenderError::ReferenceCycle`] instead of recursing forever.

pub mod context;
pub mod paint;
pub mod surface;
pub mod text;

use std::sync::Arc;

use crate::errors::RenderError;
use crate::geometry::{MarkerType, PathData};
use crate::log::trace;
use crate::nodes::shapes::MarkerRefs;
use crate::nodes::{Node, NodeId, Renderable, SceneTree, SvgNode};
use crate::types::{BBox, Size};

pub use context::{RenderContext, StrokeStyle};
pub use surface::{
    Command, FilterEffect, GradientPaint, GradientShape, GradientStop, RecordingSurface, Surface,
    SurfacePaint,
};
pub use text::{
    FontMetrics, GlyphCursor, GlyphRun, PositionedGlyph, ProportionalMetrics, TextAnchor,
};

/// Font size used when the document declares none
pub const DEFAULT_FONT_SIZE: f64 = 16.0;

// ============================================================================
// Options
// ============================================================================

/// Settings for one render call
#[derive(Clone, Debug)]
pub struct RenderOptions {
    /// Size of the outermost viewport; defaults to the document's own size
    pub viewport: Option<Size>,
    pub default_font_size: f64,
    pub font_metrics: Arc<dyn FontMetrics>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            viewport: None,
            default_font_size: DEFAULT_FONT_SIZE,
            font_metrics: Arc::new(ProportionalMetrics),
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_viewport(mut self, viewport: Size) -> Self {
        self.viewport = Some(viewport);
        self
    }

    pub fn with_default_font_size(mut self, size: f64) -> Self {
        self.default_font_size = size;
        self
    }

    pub fn with_font_metrics(mut self, metrics: impl FontMetrics + 'static) -> Self {
        self.font_metrics = Arc::new(metrics);
        self
    }
}

// ============================================================================
// Renderer
// ============================================================================

/// Walks a scene tree onto a surface
pub struct Renderer<'a> {
    tree: &'a SceneTree,
    surface: &'a mut dyn Surface,
    /// Reference targets currently being drawn
    active: Vec<NodeId>,
}

impl<'a> Renderer<'a> {
    pub fn new(tree: &'a SceneTree, surface: &'a mut dyn Surface) -> Self {
        Renderer {
            tree,
            surface,
            active: Vec::new(),
        }
    }

    pub fn tree(&self) -> &'a SceneTree {
        self.tree
    }

    pub fn surface(&mut self) -> &mut dyn Surface {
        &mut *self.surface
    }

    /// Draw node `id` and its subtree under `parent`'s context.
    pub fn render_node(&mut self, id: NodeId, parent: &RenderContext) -> Result<(), RenderError> {
        let tree = self.tree;
        let node = tree.node(id);
        let Some(renderable) = node.as_renderable() else {
            return Ok(());
        };
        if !renderable.is_visible() {
            return Ok(());
        }
        let ctx = parent.derive(renderable);
        if ctx.opacity <= 0.0 {
            return Ok(());
        }
        trace!(tag = node.kind().tag_name(), id = id.index(), "render");

        self.surface.save();
        if let Some(transform) = renderable.geometry().user_transform(&ctx.measure) {
            self.surface.concat(transform);
        }
        let result = self.render_with_effects(id, renderable, &ctx);
        self.surface.restore();
        result
    }

    fn render_with_effects(
        &mut self,
        id: NodeId,
        renderable: &dyn Renderable,
        ctx: &RenderContext,
    ) -> Result<(), RenderError> {
        let tree = self.tree;
        let geometry = renderable.geometry();
        let needs_bounds =
            geometry.clip_path.is_some() || geometry.mask.is_some() || geometry.filter.is_some();
        let bounds = if needs_bounds {
            node_bounds(tree, id, ctx)?
        } else {
            BBox::new()
        };

        if let Some(clip) = geometry.clip_path {
            if let Node::ClipPath(clip_path) = tree.resolve(clip) {
                let path = self.with_reference(clip.id(), "clipPath", |r| {
                    clip_path.clip_shape(clip.id(), r.tree, ctx, &bounds)
                })?;
                self.surface.clip(&path, clip_path.clip_rule);
            }
        }

        let mask = geometry.mask.and_then(|m| match tree.resolve(m) {
            Node::Mask(mask) => Some((m.id(), mask)),
            _ => None,
        });
        if let Some((mask_id, mask)) = mask {
            self.surface.push_mask();
            self.with_reference(mask_id, "mask", |r| {
                mask.render_content(mask_id, ctx, &bounds, r)
            })?;
            self.surface.commit_mask();
        }

        let filter = geometry.filter.and_then(|f| match tree.resolve(f) {
            Node::Filter(filter) => Some(filter.effect(&bounds, &ctx.measure)),
            _ => None,
        });
        let own_opacity = renderable.paint().opacity.unwrap_or(1.0);
        let layered = own_opacity < 1.0 || filter.is_some();
        if layered {
            self.surface.push_layer(own_opacity, filter.as_ref());
        }

        let result = renderable.render(id, ctx, self);

        if layered {
            self.surface.pop_layer();
        }
        if mask.is_some() {
            self.surface.pop_mask();
        }
        result
    }

    /// Draw the children of `id` that paint where they appear.
    pub fn render_children(&mut self, id: NodeId, ctx: &RenderContext) -> Result<(), RenderError> {
        let tree = self.tree;
        for &child in tree.children(id) {
            if tree.node(child).kind().paints_in_place() {
                self.render_node(child, ctx)?;
            }
        }
        Ok(())
    }

    /// Run `f` with `target` marked active; re-entering it is a cycle.
    pub fn with_reference<R>(
        &mut self,
        target: NodeId,
        tag: &'static str,
        f: impl FnOnce(&mut Self) -> Result<R, RenderError>,
    ) -> Result<R, RenderError> {
        if self.active.contains(&target) {
            return Err(RenderError::ReferenceCycle { tag });
        }
        self.active.push(target);
        let result = f(self);
        self.active.pop();
        result
    }

    /// Fill then stroke `path` with the paints of `ctx`.
    pub fn draw_shape(&mut self, path: &PathData, ctx: &RenderContext) {
        if path.is_empty() {
            return;
        }
        let bounds = path.bounds();
        if let Some(fill) = paint::resolve_paint(self.tree, &ctx.fill, ctx.fill_opacity, &bounds, ctx)
        {
            self.surface.fill(path, &fill, ctx.fill_rule);
        }
        let stroke = ctx.stroke_style();
        if stroke.width <= 0.0 {
            return;
        }
        if let Some(paint) =
            paint::resolve_paint(self.tree, &ctx.stroke, ctx.stroke_opacity, &bounds, ctx)
        {
            self.surface.stroke(path, &paint, &stroke);
        }
    }

    /// Paint one laid out glyph run with the fill of `ctx`.
    pub fn draw_glyph_run(&mut self, run: &GlyphRun, ctx: &RenderContext, bounds: &BBox) {
        if let Some(fill) = paint::resolve_paint(self.tree, &ctx.fill, ctx.fill_opacity, bounds, ctx)
        {
            self.surface.draw_glyph_run(run, &fill);
        }
    }

    /// Place the markers of a shape at the vertices of `path`.
    pub fn draw_markers(
        &mut self,
        path: &PathData,
        markers: &MarkerRefs,
        ctx: &RenderContext,
    ) -> Result<(), RenderError> {
        if markers.is_empty() {
            return Ok(());
        }
        let tree = self.tree;
        let vertices = path.vertices();
        let stroke_width = ctx.stroke_style().width;
        let last = vertices.len().saturating_sub(1);
        for (index, vertex) in vertices.iter().enumerate() {
            let (ty, marker) = match index {
                0 => (MarkerType::Start, markers.start),
                i if i == last => (MarkerType::End, markers.end),
                _ => (MarkerType::Mid, markers.mid),
            };
            let Some(marker) = marker else {
                continue;
            };
            let Node::Marker(node) = tree.resolve(marker) else {
                continue;
            };
            let angle = node
                .orientation
                .orientation_for(ty, vertex.tangent_in, vertex.tangent_out);
            self.with_reference(marker.id(), "marker", |r| {
                node.render_at(marker.id(), vertex.point, angle, stroke_width, ctx, r)
            })?;
        }
        Ok(())
    }
}

/// Bounds of node `id` in its own user space (its transform excluded).
///
/// Shapes report their outline bounds; containers the union of their
/// painted children, each under its transform.
pub fn node_bounds(tree: &SceneTree, id: NodeId, ctx: &RenderContext) -> Result<BBox, RenderError> {
    let node = tree.node(id);
    if let Some(shape) = node.as_shape() {
        return shape.bounds(id, tree, ctx);
    }
    let mut bounds = BBox::new();
    for &child in tree.children(id) {
        let child_node = tree.node(child);
        if !child_node.kind().paints_in_place() {
            continue;
        }
        let Some(renderable) = child_node.as_renderable() else {
            continue;
        };
        if !renderable.is_visible() {
            continue;
        }
        let child_ctx = ctx.derive(renderable);
        let child_bounds = node_bounds(tree, child, &child_ctx)?;
        let child_bounds = match renderable.geometry().user_transform(&child_ctx.measure) {
            Some(transform) => child_bounds.transformed(&transform),
            None => child_bounds,
        };
        bounds.union(&child_bounds);
    }
    Ok(bounds)
}
