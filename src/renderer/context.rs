//! Render context composition.
//!
//! A [`RenderContext`] is the inherited environment a node renders with.
//! Each renderable node derives its own from its parent's by layering its
//! declared paint, font, opacity and transform on top; anything it leaves
//! unspecified is inherited.

use std::fmt;
use std::sync::Arc;

use glam::DAffine2;

use super::RenderOptions;
use super::text::FontMetrics;
use crate::attributes::{FillRule, LineCap, LineJoin, Paint, ResolvedFont};
use crate::geometry::MeasureContext;
use crate::nodes::Renderable;
use crate::types::{Color, Length, Size};

/// Resolved stroke geometry in user units
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeStyle {
    pub width: f64,
    pub dash_array: Vec<f64>,
    pub dash_offset: f64,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: f64,
}

/// Per-node rendering environment
#[derive(Clone)]
pub struct RenderContext {
    /// User space to surface space, accumulated from the root
    pub transform: DAffine2,
    pub measure: MeasureContext,
    pub font: ResolvedFont,
    pub fill: Paint,
    pub stroke: Paint,
    pub color: Color,
    pub fill_opacity: f64,
    pub stroke_opacity: f64,
    /// Product of all group opacities down to this node
    pub opacity: f64,
    pub stroke_width: Length,
    pub dash_array: Vec<Length>,
    pub dash_offset: Length,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: f64,
    pub fill_rule: FillRule,
    pub metrics: Arc<dyn FontMetrics>,
}

impl fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("transform", &self.transform)
            .field("measure", &self.measure)
            .field("font", &self.font)
            .field("fill", &self.fill)
            .field("stroke", &self.stroke)
            .field("opacity", &self.opacity)
            .finish_non_exhaustive()
    }
}

impl RenderContext {
    /// Initial context for a document rendered into `viewport`.
    pub fn root(viewport: Size, options: &RenderOptions) -> RenderContext {
        RenderContext {
            transform: DAffine2::IDENTITY,
            measure: MeasureContext::new(viewport, options.default_font_size),
            font: ResolvedFont::with_size(options.default_font_size),
            fill: Paint::Color(Color::BLACK),
            stroke: Paint::None,
            color: Color::BLACK,
            fill_opacity: 1.0,
            stroke_opacity: 1.0,
            opacity: 1.0,
            stroke_width: Length::px(1.0),
            dash_array: Vec::new(),
            dash_offset: Length::ZERO,
            line_cap: LineCap::default(),
            line_join: LineJoin::default(),
            miter_limit: 4.0,
            fill_rule: FillRule::default(),
            metrics: options.font_metrics.clone(),
        }
    }

    /// Compose the context of `node` from this (parent) context.
    pub fn derive(&self, node: &dyn Renderable) -> RenderContext {
        let paint = node.paint();
        let font = self.font.derive(node.font(), &self.measure);
        let measure = self.measure.with_em(font.size);
        let transform = match node.geometry().user_transform(&measure) {
            Some(t) => self.transform * t,
            None => self.transform,
        };

        RenderContext {
            transform,
            measure,
            font,
            fill: paint.fill.clone().unwrap_or_else(|| self.fill.clone()),
            stroke: paint.stroke.clone().unwrap_or_else(|| self.stroke.clone()),
            color: paint.color.unwrap_or(self.color),
            fill_opacity: paint.fill_opacity.unwrap_or(self.fill_opacity),
            stroke_opacity: paint.stroke_opacity.unwrap_or(self.stroke_opacity),
            opacity: self.opacity * paint.opacity.unwrap_or(1.0),
            stroke_width: paint.stroke_width.unwrap_or(self.stroke_width),
            dash_array: paint
                .dash_array
                .clone()
                .unwrap_or_else(|| self.dash_array.clone()),
            dash_offset: paint.dash_offset.unwrap_or(self.dash_offset),
            line_cap: paint.line_cap.unwrap_or(self.line_cap),
            line_join: paint.line_join.unwrap_or(self.line_join),
            miter_limit: paint.miter_limit.unwrap_or(self.miter_limit),
            fill_rule: paint.fill_rule.unwrap_or(self.fill_rule),
            metrics: self.metrics.clone(),
        }
    }

    /// Context for content of a resource element (marker, mask): the
    /// accumulated transform and viewport are kept, paint and font restart
    /// from their initial values.
    pub fn for_resource(&self) -> RenderContext {
        RenderContext {
            transform: self.transform,
            measure: self.measure,
            font: ResolvedFont::with_size(self.measure.em),
            fill: Paint::Color(Color::BLACK),
            stroke: Paint::None,
            color: Color::BLACK,
            fill_opacity: 1.0,
            stroke_opacity: 1.0,
            opacity: self.opacity,
            stroke_width: Length::px(1.0),
            dash_array: Vec::new(),
            dash_offset: Length::ZERO,
            line_cap: LineCap::default(),
            line_join: LineJoin::default(),
            miter_limit: 4.0,
            fill_rule: FillRule::default(),
            metrics: self.metrics.clone(),
        }
    }

    /// Append `t` to the accumulated transform.
    pub fn concat(&self, t: DAffine2) -> RenderContext {
        RenderContext {
            transform: self.transform * t,
            ..self.clone()
        }
    }

    /// Establish a new viewport for percentage lengths.
    pub fn with_viewport(&self, viewport: Size) -> RenderContext {
        RenderContext {
            measure: self.measure.with_viewport(viewport),
            ..self.clone()
        }
    }

    pub fn stroke_style(&self) -> StrokeStyle {
        let dash_array: Vec<f64> = self
            .dash_array
            .iter()
            .map(|l| l.resolve_length(&self.measure))
            .collect();
        // All-zero dash arrays render solid
        let dash_array = if dash_array.iter().all(|d| *d == 0.0) {
            Vec::new()
        } else if dash_array.len() % 2 == 1 {
            dash_array.repeat(2)
        } else {
            dash_array
        };
        StrokeStyle {
            width: self.stroke_width.resolve_length(&self.measure),
            dash_array,
            dash_offset: self.dash_offset.resolve_length(&self.measure),
            line_cap: self.line_cap,
            line_join: self.line_join,
            miter_limit: self.miter_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{FontSize, FontSpec, PaintContext};
    use crate::errors::RenderError;
    use crate::nodes::{GeometryContext, NodeId};
    use crate::renderer::Renderer;
    use glam::DVec2;

    struct Stub {
        geometry: GeometryContext,
        paint: PaintContext,
        font: FontSpec,
    }

    impl Renderable for Stub {
        fn geometry(&self) -> &GeometryContext {
            &self.geometry
        }
        fn paint(&self) -> &PaintContext {
            &self.paint
        }
        fn font(&self) -> &FontSpec {
            &self.font
        }
        fn render(&self, _: NodeId, _: &RenderContext, _: &mut Renderer<'_>) -> Result<(), RenderError> {
            Ok(())
        }
    }

    fn root() -> RenderContext {
        RenderContext::root(Size::new(200.0, 100.0), &RenderOptions::default())
    }

    #[test]
    fn unspecified_properties_inherit() {
        let parent = RenderContext {
            fill: Paint::Color(Color::rgb(1, 2, 3)),
            ..root()
        };
        let child = parent.derive(&Stub {
            geometry: GeometryContext::default(),
            paint: PaintContext {
                stroke: Some(Paint::CurrentColor),
                ..Default::default()
            },
            font: FontSpec::default(),
        });
        assert_eq!(child.fill, Paint::Color(Color::rgb(1, 2, 3)));
        assert_eq!(child.stroke, Paint::CurrentColor);
    }

    #[test]
    fn opacity_multiplies() {
        let stub = Stub {
            geometry: GeometryContext::default(),
            paint: PaintContext {
                opacity: Some(0.5),
                ..Default::default()
            },
            font: FontSpec::default(),
        };
        let once = root().derive(&stub);
        let twice = once.derive(&stub);
        assert_eq!(twice.opacity, 0.25);
    }

    #[test]
    fn transforms_accumulate_and_em_follows_font() {
        let stub = Stub {
            geometry: GeometryContext {
                transform: Some(DAffine2::from_translation(DVec2::new(5.0, 0.0))),
                ..Default::default()
            },
            paint: PaintContext::default(),
            font: FontSpec {
                size: Some(FontSize::Keyword(32.0)),
                ..Default::default()
            },
        };
        let ctx = root().derive(&stub).derive(&stub);
        assert_eq!(ctx.transform.translation, DVec2::new(10.0, 0.0));
        assert_eq!(ctx.measure.em, 32.0);
    }

    #[test]
    fn odd_dash_arrays_repeat() {
        let ctx = RenderContext {
            dash_array: vec![Length::px(1.0), Length::px(2.0), Length::px(3.0)],
            ..root()
        };
        assert_eq!(ctx.stroke_style().dash_array, vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);
    }
}
