//! Paint properties: `fill`, `stroke` and their companions.
//!
//! Everything here is optional. `None` means "inherit from the parent
//! context", which is resolved by the render context composer.

use std::fmt;
use std::str::FromStr;

use super::AttributeView;
use super::parser::{parse_length, parse_length_list, parse_percentage, parse_url_reference};
use crate::nodes::{AnyPaintServer, Ref};
use crate::types::{Color, Length, NumericError};

/// A `fill` or `stroke` value
#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    None,
    CurrentColor,
    Color(Color),
    /// Reference to a gradient or solid color node
    Server {
        server: Ref<AnyPaintServer>,
        fallback: Option<Box<Paint>>,
    },
}

impl Paint {
    /// Parse a paint, resolving `url(#id)` through the attribute view.
    ///
    /// Returns `None` for unparsable values and `inherit`, both of which
    /// fall back to the parent's paint.
    pub fn parse(value: &str, attrs: &AttributeView<'_>) -> Option<Paint> {
        let value = value.trim();
        if value.starts_with("url(") {
            let fallback = value
                .split_once(')')
                .map(|(_, rest)| rest.trim())
                .filter(|rest| !rest.is_empty())
                .and_then(Paint::parse_simple);
            let server = parse_url_reference(value).and_then(|id| attrs.resolve_by_id(id));
            return Some(match (server, fallback) {
                (Some(server), fallback) => Paint::Server {
                    server,
                    fallback: fallback.map(Box::new),
                },
                (None, Some(fallback)) => fallback,
                // A dangling reference without fallback paints nothing
                (None, None) => Paint::None,
            });
        }
        Paint::parse_simple(value)
    }

    fn parse_simple(value: &str) -> Option<Paint> {
        match value {
            "none" => Some(Paint::None),
            "currentColor" => Some(Paint::CurrentColor),
            "inherit" => None,
            other => other.parse().ok().map(Paint::Color),
        }
    }
}

macro_rules! keyword_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $kw:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
        pub enum $name {
            #[default]
            $($variant),+
        }

        impl FromStr for $name {
            type Err = NumericError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($kw => Ok($name::$variant),)+
                    _ => Err(NumericError::Malformed),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let kw = match self {
                    $($name::$variant => $kw,)+
                };
                f.write_str(kw)
            }
        }
    };
}

keyword_enum!(
    /// `stroke-linecap`
    LineCap { Butt => "butt", Round => "round", Square => "square" }
);
keyword_enum!(
    /// `stroke-linejoin`
    LineJoin { Miter => "miter", Round => "round", Bevel => "bevel" }
);
keyword_enum!(
    /// `fill-rule` and `clip-rule`
    FillRule { NonZero => "nonzero", EvenOdd => "evenodd" }
);

/// Paint-related presentation attributes of one element
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PaintContext {
    pub fill: Option<Paint>,
    pub stroke: Option<Paint>,
    pub color: Option<Color>,
    pub fill_opacity: Option<f64>,
    pub stroke_opacity: Option<f64>,
    /// Group opacity; not inherited, it multiplies down the tree instead
    pub opacity: Option<f64>,
    pub stroke_width: Option<Length>,
    pub dash_array: Option<Vec<Length>>,
    pub dash_offset: Option<Length>,
    pub line_cap: Option<LineCap>,
    pub line_join: Option<LineJoin>,
    pub miter_limit: Option<f64>,
    pub fill_rule: Option<FillRule>,
}

impl PaintContext {
    pub fn build(attrs: &AttributeView<'_>) -> PaintContext {
        let opacity = |name: &str| {
            attrs
                .get(name)
                .and_then(parse_percentage)
                .map(|v| v.clamp(0.0, 1.0))
        };
        PaintContext {
            fill: attrs.get("fill").and_then(|v| Paint::parse(v, attrs)),
            stroke: attrs.get("stroke").and_then(|v| Paint::parse(v, attrs)),
            color: attrs.get("color").and_then(|v| v.parse().ok()),
            fill_opacity: opacity("fill-opacity"),
            stroke_opacity: opacity("stroke-opacity"),
            opacity: opacity("opacity"),
            stroke_width: attrs
                .get("stroke-width")
                .and_then(parse_length)
                .filter(|l| l.value >= 0.0),
            dash_array: attrs.get("stroke-dasharray").and_then(parse_dash_array),
            dash_offset: attrs.get("stroke-dashoffset").and_then(parse_length),
            line_cap: attrs.enum_value("stroke-linecap"),
            line_join: attrs.enum_value("stroke-linejoin"),
            miter_limit: attrs.float("stroke-miterlimit").filter(|m| *m >= 1.0),
            fill_rule: attrs.enum_value("fill-rule"),
        }
    }
}

/// `none` yields an explicit empty list; negative entries invalidate it.
fn parse_dash_array(s: &str) -> Option<Vec<Length>> {
    if s.trim() == "none" {
        return Some(Vec::new());
    }
    let list = parse_length_list(s);
    if list.is_empty() || list.iter().any(|l| l.value < 0.0) {
        return None;
    }
    Some(list)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_paints() {
        assert_eq!(Paint::parse_simple("none"), Some(Paint::None));
        assert_eq!(Paint::parse_simple("currentColor"), Some(Paint::CurrentColor));
        assert_eq!(
            Paint::parse_simple("#f00"),
            Some(Paint::Color(Color::rgb(255, 0, 0)))
        );
        assert_eq!(Paint::parse_simple("inherit"), None);
        assert_eq!(Paint::parse_simple("bogus"), None);
    }

    #[test]
    fn keyword_enums_round_trip_names() {
        assert_eq!("round".parse::<LineCap>(), Ok(LineCap::Round));
        assert_eq!("evenodd".parse::<FillRule>(), Ok(FillRule::EvenOdd));
        assert_eq!(LineJoin::Bevel.to_string(), "bevel");
        assert!("sharp".parse::<LineJoin>().is_err());
    }

    #[test]
    fn dash_arrays() {
        assert_eq!(parse_dash_array("none"), Some(Vec::new()));
        assert_eq!(
            parse_dash_array("5, 10"),
            Some(vec![Length::px(5.0), Length::px(10.0)])
        );
        assert_eq!(parse_dash_array("5 -1"), None);
    }
}
