//! Text elements: `text`, `tspan`, `textPath` and character data.
//!
//! Layout itself lives in [`crate::renderer::text`]. The nodes here only
//! decide how a segment's cursor is derived from its parent's and merged
//! back afterwards.

use std::borrow::Cow;
use std::sync::Arc;

use glam::DVec2;

use super::{
    AnyShape, HasShape, NodeId, NodeKind, Presentation, Ref, Renderable, SceneTree, SvgNode,
    TextSegment,
};
use crate::attributes::AttributeView;
use crate::errors::RenderError;
use crate::geometry::PathData;
use crate::renderer::text::{self, GlyphCursor, PathTrack, TextAnchor};
use crate::renderer::{RenderContext, Renderer};
use crate::types::{Length, Unit};

/// `x`, `y`, `dx` and `dy` of a positioned text element. Only the first
/// value of each list is used.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextPosition {
    pub x: Option<Length>,
    pub y: Option<Length>,
    pub dx: Option<Length>,
    pub dy: Option<Length>,
}

impl TextPosition {
    fn build(attrs: &AttributeView<'_>) -> TextPosition {
        let first = |name: &str| attrs.length_list(name).first().copied();
        TextPosition {
            x: first("x"),
            y: first("y"),
            dx: first("dx"),
            dy: first("dy"),
        }
    }

    /// Apply to `pen`: absolute coordinates replace, deltas add.
    fn apply(&self, mut pen: DVec2, ctx: &RenderContext) -> DVec2 {
        let m = &ctx.measure;
        if let Some(x) = self.x {
            pen.x = x.resolve_width(m);
        }
        if let Some(y) = self.y {
            pen.y = y.resolve_height(m);
        }
        pen.x += self.dx.map_or(0.0, |dx| dx.resolve_width(m));
        pen.y += self.dy.map_or(0.0, |dy| dy.resolve_height(m));
        pen
    }
}

// ============================================================================
// text
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Text {
    pub presentation: Presentation,
    pub position: TextPosition,
    pub anchor: TextAnchor,
}

impl SvgNode for Text {
    fn kind(&self) -> NodeKind {
        NodeKind::Text
    }

    fn build(&mut self, attrs: &AttributeView<'_>) {
        self.presentation = Presentation::build(attrs);
        self.position = TextPosition::build(attrs);
        self.anchor = attrs
            .get_inherited("text-anchor")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or_default();
    }

    fn as_renderable(&self) -> Option<&dyn Renderable> {
        Some(self)
    }

    fn as_shape(&self) -> Option<&dyn HasShape> {
        Some(self)
    }

    fn as_text_segment(&self) -> Option<&dyn TextSegment> {
        Some(self)
    }
}

impl Renderable for Text {
    presentation_accessors!();

    fn render(
        &self,
        id: NodeId,
        ctx: &RenderContext,
        renderer: &mut Renderer<'_>,
    ) -> Result<(), RenderError> {
        text::render_text(renderer, id, self, self.anchor, ctx)
    }
}

/// The glyph boxes, so text can take part in clip paths.
impl HasShape for Text {
    fn shape(
        &self,
        id: NodeId,
        tree: &SceneTree,
        ctx: &RenderContext,
    ) -> Result<Cow<'_, PathData>, RenderError> {
        text::text_outline(tree, id, self, self.anchor, ctx).map(Cow::Owned)
    }
}

impl TextSegment for Text {
    fn create_local_cursor(
        &self,
        _tree: &SceneTree,
        ctx: &RenderContext,
        current: &GlyphCursor,
    ) -> Result<GlyphCursor, RenderError> {
        Ok(GlyphCursor {
            pen: self.position.apply(DVec2::ZERO, ctx),
            bounds: current.bounds,
            font: ctx.font.clone(),
            track: None,
            after_space: true,
        })
    }

    fn clean_up_local_cursor(&self, current: &mut GlyphCursor, local: GlyphCursor) {
        current.pen = local.pen;
        current.bounds = local.bounds;
        current.after_space = local.after_space;
    }
}

// ============================================================================
// tspan
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TSpan {
    pub presentation: Presentation,
    pub position: TextPosition,
}

impl SvgNode for TSpan {
    fn kind(&self) -> NodeKind {
        NodeKind::TSpan
    }

    fn build(&mut self, attrs: &AttributeView<'_>) {
        self.presentation = Presentation::build(attrs);
        self.position = TextPosition::build(attrs);
    }

    fn as_renderable(&self) -> Option<&dyn Renderable> {
        Some(self)
    }

    fn as_text_segment(&self) -> Option<&dyn TextSegment> {
        Some(self)
    }
}

impl Renderable for TSpan {
    presentation_accessors!();

    /// Outside a text container a span has nothing to lay out against.
    fn render(
        &self,
        _id: NodeId,
        _ctx: &RenderContext,
        _renderer: &mut Renderer<'_>,
    ) -> Result<(), RenderError> {
        Ok(())
    }
}

/// A span continues where its parent left off and hands everything back:
/// pen, bounds, space state, and the position along an enclosing path.
impl TextSegment for TSpan {
    fn create_local_cursor(
        &self,
        _tree: &SceneTree,
        ctx: &RenderContext,
        current: &GlyphCursor,
    ) -> Result<GlyphCursor, RenderError> {
        Ok(GlyphCursor {
            pen: self.position.apply(current.pen, ctx),
            font: ctx.font.clone(),
            ..current.clone()
        })
    }

    fn clean_up_local_cursor(&self, current: &mut GlyphCursor, local: GlyphCursor) {
        *current = GlyphCursor {
            font: current.font.clone(),
            ..local
        };
    }
}

// ============================================================================
// textPath
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextPath {
    pub presentation: Presentation,
    pub href: Option<Ref<AnyShape>>,
    pub start_offset: Length,
}

impl SvgNode for TextPath {
    fn kind(&self) -> NodeKind {
        NodeKind::TextPath
    }

    fn build(&mut self, attrs: &AttributeView<'_>) {
        self.presentation = Presentation::build(attrs);
        self.href = attrs.resolve_href();
        self.start_offset = attrs.length("startOffset").unwrap_or_default();
    }

    fn as_renderable(&self) -> Option<&dyn Renderable> {
        Some(self)
    }

    fn as_text_segment(&self) -> Option<&dyn TextSegment> {
        Some(self)
    }
}

impl Renderable for TextPath {
    presentation_accessors!();

    fn render(
        &self,
        _id: NodeId,
        _ctx: &RenderContext,
        _renderer: &mut Renderer<'_>,
    ) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Glyphs follow the referenced shape's outline. Only the glyph bounds
/// flow back to the parent; the pen stays where the path started.
impl TextSegment for TextPath {
    fn create_local_cursor(
        &self,
        tree: &SceneTree,
        ctx: &RenderContext,
        current: &GlyphCursor,
    ) -> Result<GlyphCursor, RenderError> {
        let path = match self.href {
            Some(target) => {
                let node = tree.resolve(target);
                match node.as_shape() {
                    Some(shape) => {
                        let outline = shape.shape(target.id(), tree, ctx)?;
                        match node.as_renderable().and_then(|r| r.geometry().user_transform(&ctx.measure)) {
                            Some(transform) => outline.transformed(&transform),
                            None => outline.into_owned(),
                        }
                    }
                    None => PathData::new(),
                }
            }
            // No path, no glyphs
            None => PathData::new(),
        };
        let offset = match self.start_offset.unit {
            Unit::Percent => path.length() * self.start_offset.value / 100.0,
            _ => self.start_offset.resolve_length(&ctx.measure),
        };
        Ok(GlyphCursor {
            pen: current.pen,
            bounds: current.bounds,
            font: ctx.font.clone(),
            track: Some(PathTrack {
                path: Arc::new(path),
                offset,
            }),
            after_space: current.after_space,
        })
    }

    fn clean_up_local_cursor(&self, current: &mut GlyphCursor, local: GlyphCursor) {
        current.bounds = local.bounds;
        current.after_space = local.after_space;
    }
}

// ============================================================================
// character data
// ============================================================================

/// A run of character data, stored as written
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CharData {
    text: String,
}

impl CharData {
    pub fn new(text: impl Into<String>) -> Self {
        CharData { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn push_str(&mut self, more: &str) {
        self.text.push_str(more);
    }
}

impl SvgNode for CharData {
    fn kind(&self) -> NodeKind {
        NodeKind::CharData
    }

    fn build(&mut self, _attrs: &AttributeView<'_>) {}
}
