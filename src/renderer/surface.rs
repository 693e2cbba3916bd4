//! Drawing surfaces.
//!
//! A [`Surface`] is the boundary to a rasterizer or vector back end. The
//! scene renderer issues fully resolved drawing operations: paths are in the
//! current user space, paints are concrete colors or gradient descriptions,
//! and grouping effects (opacity, masks, filters) arrive as balanced
//! push/pop pairs.
//!
//! [`RecordingSurface`] keeps every operation, together with the transform it
//! was issued under, for tests and for replay into another surface.

use glam::{DAffine2, DVec2};

use super::context::StrokeStyle;
use super::text::GlyphRun;
use crate::attributes::FillRule;
use crate::geometry::PathData;
use crate::nodes::paint_server::SpreadMethod;
use crate::types::{BBox, Color};

// ============================================================================
// Paints
// ============================================================================

/// A gradient color stop; `color` already includes `stop-opacity`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    pub offset: f64,
    pub color: Color,
}

/// Geometry of a gradient in gradient space
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GradientShape {
    Linear {
        start: DVec2,
        end: DVec2,
    },
    Radial {
        center: DVec2,
        radius: f64,
        focus: DVec2,
    },
}

/// A fully resolved gradient
#[derive(Clone, Debug, PartialEq)]
pub struct GradientPaint {
    pub shape: GradientShape,
    /// At least two stops, offsets non-decreasing within 0..=1
    pub stops: Vec<GradientStop>,
    pub spread: SpreadMethod,
    /// Gradient space to user space
    pub transform: DAffine2,
    /// Multiplied into every stop color
    pub opacity: f64,
}

/// What a fill or stroke is painted with
#[derive(Clone, Debug, PartialEq)]
pub enum SurfacePaint {
    Color(Color),
    Gradient(GradientPaint),
}

/// A filter application. Primitives are left to the back end; the scene
/// only fixes the region they may paint into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterEffect {
    pub region: BBox,
}

// ============================================================================
// Surface
// ============================================================================

/// Drawing back end
pub trait Surface {
    /// Push the transform and clip.
    fn save(&mut self);

    /// Pop what the matching [`Surface::save`] pushed.
    fn restore(&mut self);

    /// Current user space to device space transform.
    fn transform(&self) -> DAffine2;

    fn set_transform(&mut self, transform: DAffine2);

    fn concat(&mut self, transform: DAffine2) {
        let combined = self.transform() * transform;
        self.set_transform(combined);
    }

    fn translate(&mut self, offset: DVec2) {
        self.concat(DAffine2::from_translation(offset));
    }

    /// Intersect the clip with `path`.
    fn clip(&mut self, path: &PathData, rule: FillRule);

    /// Start an isolated group composited with `opacity` and, optionally,
    /// a filter.
    fn push_layer(&mut self, opacity: f64, filter: Option<&FilterEffect>);

    fn pop_layer(&mut self);

    /// Start recording mask content.
    fn push_mask(&mut self);

    /// End mask content; what follows is masked by it.
    fn commit_mask(&mut self);

    /// Stop applying the mask.
    fn pop_mask(&mut self);

    fn fill(&mut self, path: &PathData, paint: &SurfacePaint, rule: FillRule);

    fn stroke(&mut self, path: &PathData, paint: &SurfacePaint, stroke: &StrokeStyle);

    fn draw_glyph_run(&mut self, run: &GlyphRun, paint: &SurfacePaint);
}

// ============================================================================
// Recording surface
// ============================================================================

/// One recorded surface operation
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Save,
    Restore,
    Clip {
        path: PathData,
        rule: FillRule,
        transform: DAffine2,
    },
    PushLayer {
        opacity: f64,
        filter: Option<FilterEffect>,
    },
    PopLayer,
    PushMask,
    CommitMask,
    PopMask,
    Fill {
        path: PathData,
        paint: SurfacePaint,
        rule: FillRule,
        transform: DAffine2,
    },
    Stroke {
        path: PathData,
        paint: SurfacePaint,
        stroke: StrokeStyle,
        transform: DAffine2,
    },
    GlyphRun {
        run: GlyphRun,
        paint: SurfacePaint,
        transform: DAffine2,
    },
}

impl Command {
    /// Short name, for compact test assertions.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Save => "save",
            Command::Restore => "restore",
            Command::Clip { .. } => "clip",
            Command::PushLayer { .. } => "push-layer",
            Command::PopLayer => "pop-layer",
            Command::PushMask => "push-mask",
            Command::CommitMask => "commit-mask",
            Command::PopMask => "pop-mask",
            Command::Fill { .. } => "fill",
            Command::Stroke { .. } => "stroke",
            Command::GlyphRun { .. } => "glyphs",
        }
    }
}

/// A surface that records instead of drawing
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    commands: Vec<Command>,
    transform: DAffine2,
    saved: Vec<DAffine2>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }

    /// Command names in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.commands.iter().map(Command::name).collect()
    }

    /// Drawing commands only (fills, strokes and glyph runs).
    pub fn draws(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter().filter(|c| {
            matches!(
                c,
                Command::Fill { .. } | Command::Stroke { .. } | Command::GlyphRun { .. }
            )
        })
    }

    /// Re-issue every recorded command on `target`.
    pub fn replay(&self, target: &mut dyn Surface) {
        for command in &self.commands {
            match command {
                Command::Save => target.save(),
                Command::Restore => target.restore(),
                Command::Clip {
                    path,
                    rule,
                    transform,
                } => {
                    target.set_transform(*transform);
                    target.clip(path, *rule);
                }
                Command::PushLayer { opacity, filter } => target.push_layer(*opacity, filter.as_ref()),
                Command::PopLayer => target.pop_layer(),
                Command::PushMask => target.push_mask(),
                Command::CommitMask => target.commit_mask(),
                Command::PopMask => target.pop_mask(),
                Command::Fill {
                    path,
                    paint,
                    rule,
                    transform,
                } => {
                    target.set_transform(*transform);
                    target.fill(path, paint, *rule);
                }
                Command::Stroke {
                    path,
                    paint,
                    stroke,
                    transform,
                } => {
                    target.set_transform(*transform);
                    target.stroke(path, paint, stroke);
                }
                Command::GlyphRun {
                    run,
                    paint,
                    transform,
                } => {
                    target.set_transform(*transform);
                    target.draw_glyph_run(run, paint);
                }
            }
        }
    }
}

impl Surface for RecordingSurface {
    fn save(&mut self) {
        self.saved.push(self.transform);
        self.commands.push(Command::Save);
    }

    fn restore(&mut self) {
        if let Some(transform) = self.saved.pop() {
            self.transform = transform;
        }
        self.commands.push(Command::Restore);
    }

    fn transform(&self) -> DAffine2 {
        self.transform
    }

    fn set_transform(&mut self, transform: DAffine2) {
        self.transform = transform;
    }

    fn clip(&mut self, path: &PathData, rule: FillRule) {
        self.commands.push(Command::Clip {
            path: path.clone(),
            rule,
            transform: self.transform,
        });
    }

    fn push_layer(&mut self, opacity: f64, filter: Option<&FilterEffect>) {
        self.commands.push(Command::PushLayer {
            opacity,
            filter: filter.copied(),
        });
    }

    fn pop_layer(&mut self) {
        self.commands.push(Command::PopLayer);
    }

    fn push_mask(&mut self) {
        self.commands.push(Command::PushMask);
    }

    fn commit_mask(&mut self) {
        self.commands.push(Command::CommitMask);
    }

    fn pop_mask(&mut self) {
        self.commands.push(Command::PopMask);
    }

    fn fill(&mut self, path: &PathData, paint: &SurfacePaint, rule: FillRule) {
        self.commands.push(Command::Fill {
            path: path.clone(),
            paint: paint.clone(),
            rule,
            transform: self.transform,
        });
    }

    fn stroke(&mut self, path: &PathData, paint: &SurfacePaint, stroke: &StrokeStyle) {
        self.commands.push(Command::Stroke {
            path: path.clone(),
            paint: paint.clone(),
            stroke: stroke.clone(),
            transform: self.transform,
        });
    }

    fn draw_glyph_run(&mut self, run: &GlyphRun, paint: &SurfacePaint) {
        self.commands.push(Command::GlyphRun {
            run: run.clone(),
            paint: paint.clone(),
            transform: self.transform,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restore_pops_transform() {
        let mut surface = RecordingSurface::new();
        surface.save();
        surface.translate(DVec2::new(5.0, 5.0));
        surface.concat(DAffine2::from_scale(DVec2::splat(2.0)));
        assert_eq!(
            surface.transform().transform_point2(DVec2::ONE),
            DVec2::new(7.0, 7.0)
        );
        surface.restore();
        assert_eq!(surface.transform(), DAffine2::IDENTITY);
        assert_eq!(surface.names(), vec!["save", "restore"]);
    }

    #[test]
    fn draws_capture_current_transform() {
        let mut surface = RecordingSurface::new();
        surface.translate(DVec2::new(3.0, 0.0));
        let path = PathData::rect(0.0, 0.0, 1.0, 1.0);
        surface.fill(&path, &SurfacePaint::Color(Color::BLACK), FillRule::NonZero);
        let Some(Command::Fill { transform, .. }) = surface.draws().next() else {
            panic!("expected a fill");
        };
        assert_eq!(transform.translation, DVec2::new(3.0, 0.0));
    }

    #[test]
    fn replay_reproduces_commands() {
        let mut surface = RecordingSurface::new();
        surface.save();
        surface.push_layer(0.5, None);
        surface.fill(
            &PathData::rect(0.0, 0.0, 2.0, 2.0),
            &SurfacePaint::Color(Color::rgb(1, 2, 3)),
            FillRule::EvenOdd,
        );
        surface.pop_layer();
        surface.restore();

        let mut copy = RecordingSurface::new();
        surface.replay(&mut copy);
        assert_eq!(copy.commands(), surface.commands());
    }
}
