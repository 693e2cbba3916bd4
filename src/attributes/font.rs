//! Font properties.
//!
//! [`FontSpec`] holds what one element declares; [`ResolvedFont`] is the
//! fully inherited font a text run is laid out with.

use super::AttributeView;
use super::parser::{parse_float, parse_length, parse_percentage};
use crate::geometry::MeasureContext;
use crate::types::{Length, Unit};

/// Default angle of `oblique` without an explicit angle, in degrees
pub const DEFAULT_OBLIQUE_ANGLE: f64 = 14.0;

/// Size step used by `smaller` and `larger`
const RELATIVE_SIZE_STEP: f64 = 1.2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FontSize {
    Length(Length),
    /// Absolute keyword, already in pixels
    Keyword(f64),
    Smaller,
    Larger,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FontWeight {
    Number(f64),
    Bolder,
    Lighter,
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    /// Slant angle in degrees
    Oblique(f64),
}

/// Font properties declared on one element
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FontSpec {
    pub families: Option<Vec<String>>,
    pub size: Option<FontSize>,
    pub weight: Option<FontWeight>,
    pub style: Option<FontStyle>,
    /// Stretch as a fraction of normal width, `0.5..=2.0`
    pub stretch: Option<f64>,
}

impl FontSpec {
    pub fn build(attrs: &AttributeView<'_>) -> FontSpec {
        FontSpec {
            families: attrs.get("font-family").map(parse_families),
            size: attrs.get("font-size").and_then(parse_font_size),
            weight: attrs.get("font-weight").and_then(parse_font_weight),
            style: attrs.get("font-style").and_then(parse_font_style),
            stretch: attrs.get("font-stretch").and_then(parse_font_stretch),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == FontSpec::default()
    }
}

fn parse_families(s: &str) -> Vec<String> {
    s.split(',')
        .map(|f| f.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
        .filter(|f| !f.is_empty())
        .collect()
}

#[rustfmt::skip]
fn parse_font_size(s: &str) -> Option<FontSize> {
    let size = match s.trim() {
        "xx-small" => FontSize::Keyword(9.0),
        "x-small"  => FontSize::Keyword(10.0),
        "small"    => FontSize::Keyword(13.0),
        "medium"   => FontSize::Keyword(16.0),
        "large"    => FontSize::Keyword(18.0),
        "x-large"  => FontSize::Keyword(24.0),
        "xx-large" => FontSize::Keyword(32.0),
        "smaller"  => FontSize::Smaller,
        "larger"   => FontSize::Larger,
        other => FontSize::Length(parse_length(other).filter(|l| l.value >= 0.0)?),
    };
    Some(size)
}

fn parse_font_weight(s: &str) -> Option<FontWeight> {
    match s.trim() {
        "normal" => Some(FontWeight::Number(400.0)),
        "bold" => Some(FontWeight::Number(700.0)),
        "bolder" => Some(FontWeight::Bolder),
        "lighter" => Some(FontWeight::Lighter),
        other => parse_float(other).map(|w| FontWeight::Number(w.clamp(1.0, 1000.0))),
    }
}

fn parse_font_style(s: &str) -> Option<FontStyle> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("normal") {
        Some(FontStyle::Normal)
    } else if s.eq_ignore_ascii_case("italic") {
        Some(FontStyle::Italic)
    } else if let Some(rest) = s.strip_prefix("oblique") {
        let rest = rest.trim().trim_end_matches("deg");
        Some(FontStyle::Oblique(
            parse_float(rest).unwrap_or(DEFAULT_OBLIQUE_ANGLE),
        ))
    } else {
        None
    }
}

#[rustfmt::skip]
fn parse_font_stretch(s: &str) -> Option<f64> {
    let stretch = match s.trim() {
        "ultra-condensed" => 0.5,
        "extra-condensed" => 0.625,
        "condensed"       => 0.75,
        "semi-condensed"  => 0.875,
        "normal"          => 1.0,
        "semi-expanded"   => 1.125,
        "expanded"        => 1.25,
        "extra-expanded"  => 1.5,
        "ultra-expanded"  => 2.0,
        other => parse_percentage(other)?.clamp(0.5, 2.0),
    };
    Some(stretch)
}

/// A fully resolved font
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedFont {
    pub families: Vec<String>,
    /// Size in user units
    pub size: f64,
    pub weight: f64,
    pub style: FontStyle,
    pub stretch: f64,
}

impl ResolvedFont {
    pub fn with_size(size: f64) -> Self {
        ResolvedFont {
            families: vec!["sans-serif".to_string()],
            size,
            weight: 400.0,
            style: FontStyle::Normal,
            stretch: 1.0,
        }
    }

    /// Apply `spec` on top of this (parent) font. Font-relative sizes
    /// resolve against the parent size; percentages too.
    pub fn derive(&self, spec: &FontSpec, measure: &MeasureContext) -> ResolvedFont {
        let size = match spec.size {
            None => self.size,
            Some(FontSize::Keyword(px)) => px,
            Some(FontSize::Smaller) => self.size / RELATIVE_SIZE_STEP,
            Some(FontSize::Larger) => self.size * RELATIVE_SIZE_STEP,
            Some(FontSize::Length(len)) => match len.unit {
                Unit::Percent => self.size * len.value / 100.0,
                _ => len.resolve_length(&measure.with_em(self.size)),
            },
        };
        let weight = match spec.weight {
            None => self.weight,
            Some(FontWeight::Number(w)) => w,
            Some(FontWeight::Bolder) => bolder(self.weight),
            Some(FontWeight::Lighter) => lighter(self.weight),
        };
        ResolvedFont {
            families: spec.families.clone().unwrap_or_else(|| self.families.clone()),
            size,
            weight,
            style: spec.style.unwrap_or(self.style),
            stretch: spec.stretch.unwrap_or(self.stretch),
        }
    }
}

fn bolder(parent: f64) -> f64 {
    if parent < 350.0 {
        400.0
    } else if parent < 550.0 {
        700.0
    } else {
        parent.max(900.0)
    }
}

fn lighter(parent: f64) -> f64 {
    if parent < 100.0 {
        parent
    } else if parent < 550.0 {
        100.0
    } else if parent < 750.0 {
        400.0
    } else {
        700.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_weight_clamps_numbers() {
        assert_eq!(parse_font_weight("1500"), Some(FontWeight::Number(1000.0)));
        assert_eq!(parse_font_weight("0"), Some(FontWeight::Number(1.0)));
        assert_eq!(parse_font_weight("bold"), Some(FontWeight::Number(700.0)));
        assert_eq!(parse_font_weight("heavy"), None);
    }

    #[test]
    fn oblique_with_and_without_angle() {
        assert_eq!(parse_font_style("oblique"), Some(FontStyle::Oblique(14.0)));
        assert_eq!(parse_font_style("oblique 20deg"), Some(FontStyle::Oblique(20.0)));
        assert_eq!(parse_font_style("ITALIC"), Some(FontStyle::Italic));
    }

    #[test]
    fn stretch_percentages_clamp() {
        assert_eq!(parse_font_stretch("300%"), Some(2.0));
        assert_eq!(parse_font_stretch("condensed"), Some(0.75));
    }

    #[test]
    fn families_strip_quotes() {
        assert_eq!(
            parse_families("'Open Sans', \"Arial\" ,serif"),
            vec!["Open Sans", "Arial", "serif"]
        );
    }

    #[test]
    fn derive_inherits_unspecified_members() {
        let parent = ResolvedFont::with_size(20.0);
        let spec = FontSpec {
            size: Some(FontSize::Length(Length::new(1.5, Unit::Em))),
            weight: Some(FontWeight::Bolder),
            ..Default::default()
        };
        let font = parent.derive(&spec, &MeasureContext::default());
        assert_eq!(font.size, 30.0);
        assert_eq!(font.weight, 700.0);
        assert_eq!(font.families, parent.families);
        assert_eq!(font.style, FontStyle::Normal);
    }

    #[test]
    fn relative_keywords_scale_parent() {
        let parent = ResolvedFont::with_size(12.0);
        let larger = FontSpec {
            size: Some(FontSize::Larger),
            ..Default::default()
        };
        assert!((parent.derive(&larger, &MeasureContext::default()).size - 14.4).abs() < 1e-9);
        let pct = FontSpec {
            size: Some(FontSize::Length(Length::new(50.0, Unit::Percent))),
            ..Default::default()
        };
        assert_eq!(parent.derive(&pct, &MeasureContext::default()).size, 6.0);
    }
}
