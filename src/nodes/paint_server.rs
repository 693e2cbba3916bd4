//! Paint servers: gradients, their stops, and solid colors.
//!
//! Gradient attributes stay optional here. Unspecified ones are inherited
//! along the `href` chain when the paint is resolved, see
//! [`crate::renderer::paint`].

use std::str::FromStr;

use glam::DAffine2;

use super::effects::CoordinateUnits;
use super::{AnyGradient, NodeKind, Ref, SvgNode};
use crate::attributes::AttributeView;
use crate::attributes::parser::parse_percentage;
use crate::types::{Color, Length, NumericError};

/// `spreadMethod`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpreadMethod {
    #[default]
    Pad,
    Reflect,
    Repeat,
}

impl FromStr for SpreadMethod {
    type Err = NumericError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pad" => Ok(SpreadMethod::Pad),
            "reflect" => Ok(SpreadMethod::Reflect),
            "repeat" => Ok(SpreadMethod::Repeat),
            _ => Err(NumericError::Malformed),
        }
    }
}

/// Attributes both gradient kinds share
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GradientAttributes {
    pub units: Option<CoordinateUnits>,
    pub transform: Option<DAffine2>,
    pub spread: Option<SpreadMethod>,
    /// Template gradient for stops and unspecified attributes
    pub href: Option<Ref<AnyGradient>>,
}

impl GradientAttributes {
    fn build(attrs: &AttributeView<'_>) -> GradientAttributes {
        GradientAttributes {
            units: attrs.enum_value("gradientUnits"),
            transform: attrs.transform("gradientTransform"),
            spread: attrs.enum_value("spreadMethod"),
            href: attrs.resolve_href(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinearGradient {
    pub attributes: GradientAttributes,
    pub x1: Option<Length>,
    pub y1: Option<Length>,
    pub x2: Option<Length>,
    pub y2: Option<Length>,
}

impl SvgNode for LinearGradient {
    fn kind(&self) -> NodeKind {
        NodeKind::LinearGradient
    }

    fn build(&mut self, attrs: &AttributeView<'_>) {
        self.attributes = GradientAttributes::build(attrs);
        self.x1 = attrs.length("x1");
        self.y1 = attrs.length("y1");
        self.x2 = attrs.length("x2");
        self.y2 = attrs.length("y2");
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RadialGradient {
    pub attributes: GradientAttributes,
    pub cx: Option<Length>,
    pub cy: Option<Length>,
    pub r: Option<Length>,
    pub fx: Option<Length>,
    pub fy: Option<Length>,
}

impl SvgNode for RadialGradient {
    fn kind(&self) -> NodeKind {
        NodeKind::RadialGradient
    }

    fn build(&mut self, attrs: &AttributeView<'_>) {
        self.attributes = GradientAttributes::build(attrs);
        self.cx = attrs.length("cx");
        self.cy = attrs.length("cy");
        self.r = attrs.length("r").filter(|r| r.value >= 0.0);
        self.fx = attrs.length("fx");
        self.fy = attrs.length("fy");
    }
}

/// A gradient color stop
#[derive(Clone, Debug, PartialEq)]
pub struct Stop {
    /// Fraction along the gradient vector, 0..=1
    pub offset: f64,
    pub color: Color,
    pub opacity: f64,
}

impl Default for Stop {
    fn default() -> Self {
        Stop {
            offset: 0.0,
            color: Color::BLACK,
            opacity: 1.0,
        }
    }
}

impl SvgNode for Stop {
    fn kind(&self) -> NodeKind {
        NodeKind::Stop
    }

    fn build(&mut self, attrs: &AttributeView<'_>) {
        self.offset = attrs
            .get("offset")
            .and_then(parse_percentage)
            .unwrap_or(0.0)
            .clamp(0.0, 1.0);
        self.color = paint_color(attrs, "stop-color");
        self.opacity = attrs
            .percentage("stop-opacity")
            .unwrap_or(1.0)
            .clamp(0.0, 1.0);
    }
}

/// `solidColor`: a named single color usable as a paint server
#[derive(Clone, Debug, PartialEq)]
pub struct SolidColor {
    pub color: Color,
    pub opacity: f64,
}

impl Default for SolidColor {
    fn default() -> Self {
        SolidColor {
            color: Color::BLACK,
            opacity: 1.0,
        }
    }
}

impl SvgNode for SolidColor {
    fn kind(&self) -> NodeKind {
        NodeKind::SolidColor
    }

    fn build(&mut self, attrs: &AttributeView<'_>) {
        self.color = paint_color(attrs, "solid-color");
        self.opacity = attrs
            .percentage("solid-opacity")
            .unwrap_or(1.0)
            .clamp(0.0, 1.0);
    }
}

/// A color attribute that also accepts `currentColor`.
fn paint_color(attrs: &AttributeView<'_>, name: &str) -> Color {
    match attrs.get(name).map(str::trim) {
        Some("currentColor") => attrs
            .get_inherited("color")
            .and_then(|c| c.parse().ok())
            .unwrap_or(Color::BLACK),
        Some(value) => value.parse().unwrap_or(Color::BLACK),
        None => Color::BLACK,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::RawElement;
    use crate::nodes::NodeId;
    use crate::parser::NameRegistry;

    fn build_stop(attrs: &[(&str, &str)]) -> Stop {
        let elements = vec![
            RawElement {
                tag: "linearGradient".into(),
                attributes: [("color".to_string(), "#00f".to_string())].into(),
                parent: None,
            },
            RawElement {
                tag: "stop".into(),
                attributes: attrs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                parent: Some(NodeId::new(0)),
            },
        ];
        let registry = NameRegistry::default();
        let mut stop = Stop::default();
        stop.build(&AttributeView::new(NodeId::new(1), &elements, &registry));
        stop
    }

    #[test]
    fn stop_offsets_accept_percentages_and_clamp() {
        assert_eq!(build_stop(&[("offset", "50%")]).offset, 0.5);
        assert_eq!(build_stop(&[("offset", "0.25")]).offset, 0.25);
        assert_eq!(build_stop(&[("offset", "3")]).offset, 1.0);
        assert_eq!(build_stop(&[]).offset, 0.0);
    }

    #[test]
    fn stop_color_and_opacity() {
        let stop = build_stop(&[("stop-color", "#f00"), ("stop-opacity", "0.5")]);
        assert_eq!(stop.color, Color::rgb(255, 0, 0));
        assert_eq!(stop.opacity, 0.5);
        let current = build_stop(&[("stop-color", "currentColor")]);
        assert_eq!(current.color, Color::rgb(0, 0, 255));
    }

    #[test]
    fn spread_keywords() {
        assert_eq!("reflect".parse::<SpreadMethod>(), Ok(SpreadMethod::Reflect));
        assert!("mirror".parse::<SpreadMethod>().is_err());
    }
}
