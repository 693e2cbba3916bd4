//! Text layout.
//!
//! Text is laid out in two passes over the same segment tree. The first pass
//! only measures: it advances a [`GlyphCursor`] through every run and
//! accumulates the glyph bounds. The anchor offset follows from the measured
//! width, and the second pass repeats the walk with a fresh cursor under the
//! shifted transform, this time handing every run to the surface.
//!
//! Both passes share [`layout_segment`]; only the [`GlyphSink`] differs.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use glam::{DAffine2, DVec2};

use super::{RenderContext, Renderer};
use crate::attributes::ResolvedFont;
use crate::errors::RenderError;
use crate::geometry::PathData;
use crate::nodes::{Node, NodeId, SceneTree, SvgNode, TextSegment};
use crate::types::{BBox, NumericError};

// ============================================================================
// Font metrics
// ============================================================================

/// Glyph measurements in user units.
///
/// Rasterizing back ends plug in real font data here; the default is
/// [`ProportionalMetrics`].
pub trait FontMetrics: Send + Sync + fmt::Debug {
    /// Horizontal advance of `ch`.
    fn advance(&self, ch: char, font: &ResolvedFont) -> f64;

    /// Distance from the baseline to the top of the glyph box.
    fn ascent(&self, font: &ResolvedFont) -> f64 {
        font.size * 0.8
    }

    /// Distance from the baseline to the bottom of the glyph box.
    fn descent(&self, font: &ResolvedFont) -> f64 {
        font.size * 0.2
    }
}

/// Average advances of the printable ASCII range (0x20..=0x7e) of a
/// proportional sans-serif face, in hundredths of half an em.
#[rustfmt::skip]
const ADVANCE_TABLE: [u8; 95] = [
    45,  55,  62, 115,  90, 132, 125,  40,  55,  55,  71, 115,  45,  48,  45,  50,
    91,  91,  91,  91,  91,  91,  91,  91,  91,  91,  50,  50, 120, 120, 120,  78,
    142, 102, 105, 110, 115, 105,  98, 105, 125,  58,  58, 107,  95, 145, 125, 115,
    95, 115, 107,  95,  97, 118, 102, 150, 100,  93, 100,  58,  50,  58, 119,  72,
    72,  86,  92,  80,  92,  85,  52,  92,  92,  47,  47,  88,  48, 135,  92,  86,
    92,  92,  69,  75,  58,  92,  80, 121,  81,  80,  76,  91,  49,  91, 118,
];

/// Advance used outside the table
const DEFAULT_ADVANCE: u8 = 100;

/// Table-driven metrics, good enough for layout without font files
#[derive(Debug, Default, Clone, Copy)]
pub struct ProportionalMetrics;

impl FontMetrics for ProportionalMetrics {
    fn advance(&self, ch: char, font: &ResolvedFont) -> f64 {
        let code = ch as u32;
        let hundredths = if (0x20..=0x7e).contains(&code) {
            ADVANCE_TABLE[(code - 0x20) as usize]
        } else {
            DEFAULT_ADVANCE
        };
        let weight = if font.weight >= 600.0 { 1.05 } else { 1.0 };
        f64::from(hundredths) / 200.0 * font.size * font.stretch * weight
    }
}

// ============================================================================
// Cursor and glyph runs
// ============================================================================

/// Position along the path of an enclosing `textPath`
#[derive(Clone, Debug)]
pub struct PathTrack {
    pub path: Arc<PathData>,
    /// Distance along `path` where the next glyph starts
    pub offset: f64,
}

/// Mutable layout state threaded through a text subtree
#[derive(Clone, Debug)]
pub struct GlyphCursor {
    /// Baseline origin of the next glyph
    pub pen: DVec2,
    /// Union of the boxes of every visible glyph laid out so far
    pub bounds: BBox,
    pub font: ResolvedFont,
    pub track: Option<PathTrack>,
    /// The last character laid out was a space; collapses runs of them
    pub after_space: bool,
}

impl GlyphCursor {
    pub fn new(font: ResolvedFont) -> Self {
        GlyphCursor {
            pen: DVec2::ZERO,
            bounds: BBox::new(),
            font,
            track: None,
            after_space: true,
        }
    }
}

/// One placed glyph
#[derive(Clone, Debug, PartialEq)]
pub struct PositionedGlyph {
    pub ch: char,
    /// Baseline origin in the text's user space
    pub origin: DVec2,
    /// Rotation about `origin`, radians
    pub angle: f64,
    pub advance: f64,
}

/// Consecutive glyphs sharing one font
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphRun {
    pub glyphs: Vec<PositionedGlyph>,
    pub font: ResolvedFont,
}

impl GlyphRun {
    pub fn text(&self) -> String {
        self.glyphs.iter().map(|g| g.ch).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// The glyph boxes as closed rectangles, spaces excluded.
    pub fn outline(&self, metrics: &dyn FontMetrics) -> PathData {
        let ascent = metrics.ascent(&self.font);
        let descent = metrics.descent(&self.font);
        let mut path = PathData::new();
        for glyph in self.glyphs.iter().filter(|g| g.ch != ' ') {
            let placement = DAffine2::from_angle_translation(glyph.angle, glyph.origin);
            let cell = PathData::rect(0.0, -ascent, glyph.advance, ascent + descent);
            path.append(&cell.transformed(&placement));
        }
        path
    }
}

/// Lay out `text` at the cursor, advancing it.
///
/// Newlines and tabs count as spaces, leading spaces and runs of spaces
/// collapse. Spaces move the pen but do not grow the bounds. On a path
/// glyphs are centered on their arc position; glyphs falling off either end
/// of the path are dropped.
pub fn layout_glyph_run(text: &str, cursor: &mut GlyphCursor, ctx: &RenderContext) -> GlyphRun {
    let font = &ctx.font;
    let ascent = ctx.metrics.ascent(font);
    let descent = ctx.metrics.descent(font);
    let mut glyphs = Vec::new();

    for raw in text.chars() {
        let ch = if raw.is_whitespace() { ' ' } else { raw };
        let is_space = ch == ' ';
        if is_space && cursor.after_space {
            continue;
        }
        let advance = ctx.metrics.advance(ch, font);
        let cell = BBox::from_rect(0.0, -ascent, advance, ascent + descent);

        match cursor.track.as_mut() {
            None => {
                let origin = cursor.pen;
                if !is_space {
                    cursor
                        .bounds
                        .union(&cell.transformed(&DAffine2::from_translation(origin)));
                }
                glyphs.push(PositionedGlyph {
                    ch,
                    origin,
                    angle: 0.0,
                    advance,
                });
                cursor.pen.x += advance;
            }
            Some(track) => {
                let middle = track.offset + advance / 2.0;
                track.offset += advance;
                if let Some((point, angle)) = track.path.point_at_length(middle) {
                    let origin = point - DVec2::from_angle(angle) * (advance / 2.0);
                    if !is_space {
                        let placement = DAffine2::from_angle_translation(angle, origin);
                        cursor.bounds.union(&cell.transformed(&placement));
                    }
                    glyphs.push(PositionedGlyph {
                        ch,
                        origin,
                        angle,
                        advance,
                    });
                }
            }
        }
        cursor.after_space = is_space;
    }

    GlyphRun {
        glyphs,
        font: font.clone(),
    }
}

// ============================================================================
// Segment walk
// ============================================================================

/// Receives the runs produced by a layout pass.
pub trait GlyphSink {
    fn glyph_run(&mut self, run: GlyphRun, ctx: &RenderContext) -> Result<(), RenderError>;
}

/// Sink of the measuring pass
struct Measure;

impl GlyphSink for Measure {
    fn glyph_run(&mut self, _run: GlyphRun, _ctx: &RenderContext) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Sink of the painting pass
struct Paint<'r, 'a> {
    renderer: &'r mut Renderer<'a>,
    bounds: BBox,
}

impl GlyphSink for Paint<'_, '_> {
    fn glyph_run(&mut self, run: GlyphRun, ctx: &RenderContext) -> Result<(), RenderError> {
        self.renderer.draw_glyph_run(&run, ctx, &self.bounds);
        Ok(())
    }
}

/// Collects glyph boxes, for clipping with text
struct Outline {
    path: PathData,
}

impl GlyphSink for Outline {
    fn glyph_run(&mut self, run: GlyphRun, ctx: &RenderContext) -> Result<(), RenderError> {
        self.path.append(&run.outline(ctx.metrics.as_ref()));
        Ok(())
    }
}

/// Lay out the children of segment `id` in document order.
pub fn layout_segment(
    tree: &SceneTree,
    id: NodeId,
    segment: &dyn TextSegment,
    cursor: &mut GlyphCursor,
    ctx: &RenderContext,
    sink: &mut dyn GlyphSink,
) -> Result<(), RenderError> {
    let mut local = segment.create_local_cursor(tree, ctx, cursor)?;
    for &child in tree.children(id) {
        let node = tree.node(child);
        if let Node::CharData(chars) = node {
            let run = layout_glyph_run(chars.text(), &mut local, ctx);
            if !run.is_empty() {
                sink.glyph_run(run, ctx)?;
            }
            continue;
        }
        let (Some(nested), Some(renderable)) = (node.as_text_segment(), node.as_renderable())
        else {
            return Err(RenderError::UnsupportedTextSegment {
                tag: node.kind().tag_name(),
            });
        };
        if !renderable.is_visible() {
            continue;
        }
        let child_ctx = ctx.derive(renderable);
        layout_segment(tree, child, nested, &mut local, &child_ctx, sink)?;
    }
    segment.clean_up_local_cursor(cursor, local);
    Ok(())
}

/// `text-anchor`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

impl TextAnchor {
    /// Horizontal shift applied to a layout of the given width.
    pub fn offset(self, width: f64) -> f64 {
        match self {
            TextAnchor::Start => 0.0,
            TextAnchor::Middle => -width / 2.0,
            TextAnchor::End => -width,
        }
    }
}

impl FromStr for TextAnchor {
    type Err = NumericError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "start" => Ok(TextAnchor::Start),
            "middle" => Ok(TextAnchor::Middle),
            "end" => Ok(TextAnchor::End),
            _ => Err(NumericError::Malformed),
        }
    }
}

/// Run the measuring pass and return the bounds of the whole layout.
pub fn measure_text(
    tree: &SceneTree,
    id: NodeId,
    segment: &dyn TextSegment,
    ctx: &RenderContext,
) -> Result<BBox, RenderError> {
    let mut cursor = GlyphCursor::new(ctx.font.clone());
    layout_segment(tree, id, segment, &mut cursor, ctx, &mut Measure)?;
    Ok(cursor.bounds)
}

/// Measure, anchor, then paint the text rooted at `id`.
pub fn render_text(
    renderer: &mut Renderer<'_>,
    id: NodeId,
    segment: &dyn TextSegment,
    anchor: TextAnchor,
    ctx: &RenderContext,
) -> Result<(), RenderError> {
    let tree = renderer.tree();
    let bounds = measure_text(tree, id, segment, ctx)?;
    let shift = DVec2::new(anchor.offset(bounds.width()), 0.0);
    let shifted = ctx.concat(DAffine2::from_translation(shift));
    let painted = bounds.transformed(&DAffine2::from_translation(shift));

    renderer.surface().save();
    renderer.surface().translate(shift);
    let mut cursor = GlyphCursor::new(ctx.font.clone());
    let mut sink = Paint {
        renderer: &mut *renderer,
        bounds: painted,
    };
    let result = layout_segment(tree, id, segment, &mut cursor, &shifted, &mut sink);
    renderer.surface().restore();
    result
}

/// Glyph boxes of the anchored layout, in the text's user space.
pub fn text_outline(
    tree: &SceneTree,
    id: NodeId,
    segment: &dyn TextSegment,
    anchor: TextAnchor,
    ctx: &RenderContext,
) -> Result<PathData, RenderError> {
    let bounds = measure_text(tree, id, segment, ctx)?;
    let mut cursor = GlyphCursor::new(ctx.font.clone());
    let mut sink = Outline {
        path: PathData::new(),
    };
    layout_segment(tree, id, segment, &mut cursor, ctx, &mut sink)?;
    let shift = DAffine2::from_translation(DVec2::new(anchor.offset(bounds.width()), 0.0));
    Ok(sink.path.transformed(&shift))
}
