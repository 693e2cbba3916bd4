//! Strongly-typed numeric primitives for svgscene.
//!
//! Design goals:
//! - Lengths keep their unit until they are resolved against a
//!   [`MeasureContext`], so percentages and font-relative units stay correct
//!   no matter where a node is rendered
//! - Illegal states unrepresentable (no NaN lengths from the parser)
//! - Geometry uses `glam` double precision vectors

use std::fmt;
use std::str::FromStr;

use glam::{DAffine2, DVec2};

use crate::geometry::MeasureContext;

/// Error type for invalid numeric values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericError {
    /// Value is NaN
    NaN,
    /// Value is infinite
    Infinite,
    /// Value could not be parsed at all
    Malformed,
}

impl fmt::Display for NumericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericError::NaN => write!(f, "value is NaN"),
            NumericError::Infinite => write!(f, "value is infinite"),
            NumericError::Malformed => write!(f, "value is not a number"),
        }
    }
}

impl std::error::Error for NumericError {}

/// Unit suffix of a length literal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Unit {
    /// Unitless user units (treated as pixels)
    #[default]
    Raw,
    Px,
    Pt,
    Pc,
    Mm,
    Cm,
    In,
    Em,
    Ex,
    Percent,
}

impl Unit {
    /// Look up a unit by its (case-insensitive) suffix.
    pub fn from_suffix(suffix: &str) -> Option<Unit> {
        let unit = match suffix.to_ascii_lowercase().as_str() {
            "" => Unit::Raw,
            "px" => Unit::Px,
            "pt" => Unit::Pt,
            "pc" => Unit::Pc,
            "mm" => Unit::Mm,
            "cm" => Unit::Cm,
            "in" => Unit::In,
            "em" => Unit::Em,
            "ex" => Unit::Ex,
            "%" => Unit::Percent,
            _ => return None,
        };
        Some(unit)
    }

    /// Pixels per unit for absolute units (96 dpi).
    fn px_per_unit(self) -> Option<f64> {
        match self {
            Unit::Raw | Unit::Px => Some(1.0),
            Unit::Pt => Some(96.0 / 72.0),
            Unit::Pc => Some(16.0),
            Unit::In => Some(96.0),
            Unit::Cm => Some(96.0 / 2.54),
            Unit::Mm => Some(96.0 / 25.4),
            Unit::Em | Unit::Ex | Unit::Percent => None,
        }
    }
}

/// Which viewport dimension a percentage length refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
    /// Normalized viewport diagonal, used by radii and stroke widths
    Diagonal,
}

/// A length with its unit, resolved to user-space pixels on demand
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Length {
    pub value: f64,
    pub unit: Unit,
}

impl Length {
    pub const ZERO: Length = Length::new(0.0, Unit::Raw);

    /// Create a Length (const-friendly, unchecked).
    #[inline]
    pub const fn new(value: f64, unit: Unit) -> Length {
        Length { value, unit }
    }

    /// Unitless user-space length.
    #[inline]
    pub const fn px(value: f64) -> Length {
        Length::new(value, Unit::Raw)
    }

    /// Create a Length with validation (rejects NaN/infinite)
    pub fn try_new(value: f64, unit: Unit) -> Result<Length, NumericError> {
        if value.is_nan() {
            Err(NumericError::NaN)
        } else if value.is_infinite() {
            Err(NumericError::Infinite)
        } else {
            Ok(Length { value, unit })
        }
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.value == 0.0
    }

    #[inline]
    pub fn is_percentage(self) -> bool {
        self.unit == Unit::Percent
    }

    /// Resolve to user-space pixels.
    pub fn resolve(self, ctx: &MeasureContext, axis: Axis) -> f64 {
        if let Some(factor) = self.unit.px_per_unit() {
            return self.value * factor;
        }
        match self.unit {
            Unit::Em => self.value * ctx.em,
            Unit::Ex => self.value * ctx.ex,
            Unit::Percent => self.value / 100.0 * ctx.axis_length(axis),
            _ => self.value,
        }
    }

    #[inline]
    pub fn resolve_width(self, ctx: &MeasureContext) -> f64 {
        self.resolve(ctx, Axis::Horizontal)
    }

    #[inline]
    pub fn resolve_height(self, ctx: &MeasureContext) -> f64 {
        self.resolve(ctx, Axis::Vertical)
    }

    #[inline]
    pub fn resolve_length(self, ctx: &MeasureContext) -> f64 {
        self.resolve(ctx, Axis::Diagonal)
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.unit {
            Unit::Raw => "",
            Unit::Px => "px",
            Unit::Pt => "pt",
            Unit::Pc => "pc",
            Unit::Mm => "mm",
            Unit::Cm => "cm",
            Unit::In => "in",
            Unit::Em => "em",
            Unit::Ex => "ex",
            Unit::Percent => "%",
        };
        write!(f, "{}{}", self.value, suffix)
    }
}

/// Straight (non-premultiplied) RGBA color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }

    /// Multiply the alpha channel by `factor` (clamped to 0..=1).
    pub fn with_opacity(self, factor: f64) -> Self {
        let alpha = (self.a as f64 * factor.clamp(0.0, 1.0)).round() as u8;
        Color { a: alpha, ..self }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl FromStr for Color {
    type Err = NumericError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex_color(hex).ok_or(NumericError::Malformed);
        }

        let lower = s.to_ascii_lowercase();
        if let Some(inner) = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_rgb_function(inner).ok_or(NumericError::Malformed);
        }

        named_color(&lower).ok_or(NumericError::Malformed)
    }
}

fn parse_hex_color(hex: &str) -> Option<Color> {
    let digit = |i: usize, len: usize| u8::from_str_radix(hex.get(i..i + len)?, 16).ok();
    match hex.len() {
        // Expand short hex: #abc -> #aabbcc
        3 => Some(Color::rgb(digit(0, 1)? * 17, digit(1, 1)? * 17, digit(2, 1)? * 17)),
        4 => Some(Color::rgba(
            digit(0, 1)? * 17,
            digit(1, 1)? * 17,
            digit(2, 1)? * 17,
            digit(3, 1)? * 17,
        )),
        6 => Some(Color::rgb(digit(0, 2)?, digit(2, 2)?, digit(4, 2)?)),
        8 => Some(Color::rgba(digit(0, 2)?, digit(2, 2)?, digit(4, 2)?, digit(6, 2)?)),
        _ => None,
    }
}

fn parse_rgb_function(inner: &str) -> Option<Color> {
    let parts: Vec<&str> = inner
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }

    let channel = |p: &str| -> Option<u8> {
        if let Some(pct) = p.strip_suffix('%') {
            let v: f64 = pct.parse().ok()?;
            Some((v.clamp(0.0, 100.0) * 2.55).round() as u8)
        } else {
            let v: f64 = p.parse().ok()?;
            Some(v.clamp(0.0, 255.0).round() as u8)
        }
    };

    let alpha = match parts.get(3) {
        None => 255,
        Some(p) => {
            let v: f64 = match p.strip_suffix('%') {
                Some(pct) => pct.parse::<f64>().ok()? / 100.0,
                None => p.parse().ok()?,
            };
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }
    };

    Some(Color::rgba(
        channel(parts[0])?,
        channel(parts[1])?,
        channel(parts[2])?,
        alpha,
    ))
}

/// The common subset of CSS named colors.
#[rustfmt::skip]
fn named_color(name: &str) -> Option<Color> {
    let c = match name {
        "black"       => Color::rgb(0, 0, 0),
        "white"       => Color::rgb(255, 255, 255),
        "red"         => Color::rgb(255, 0, 0),
        "green"       => Color::rgb(0, 128, 0),
        "lime"        => Color::rgb(0, 255, 0),
        "blue"        => Color::rgb(0, 0, 255),
        "yellow"      => Color::rgb(255, 255, 0),
        "cyan"        => Color::rgb(0, 255, 255),
        "aqua"        => Color::rgb(0, 255, 255),
        "magenta"     => Color::rgb(255, 0, 255),
        "fuchsia"     => Color::rgb(255, 0, 255),
        "orange"      => Color::rgb(255, 165, 0),
        "purple"      => Color::rgb(128, 0, 128),
        "brown"       => Color::rgb(165, 42, 42),
        "pink"        => Color::rgb(255, 192, 203),
        "gray"        => Color::rgb(128, 128, 128),
        "grey"        => Color::rgb(128, 128, 128),
        "lightgray"   => Color::rgb(211, 211, 211),
        "lightgrey"   => Color::rgb(211, 211, 211),
        "darkgray"    => Color::rgb(169, 169, 169),
        "darkgrey"    => Color::rgb(169, 169, 169),
        "silver"      => Color::rgb(192, 192, 192),
        "maroon"      => Color::rgb(128, 0, 0),
        "olive"       => Color::rgb(128, 128, 0),
        "navy"        => Color::rgb(0, 0, 128),
        "teal"        => Color::rgb(0, 128, 128),
        "gold"        => Color::rgb(255, 215, 0),
        "indigo"      => Color::rgb(75, 0, 130),
        "violet"      => Color::rgb(238, 130, 238),
        "coral"       => Color::rgb(255, 127, 80),
        "salmon"      => Color::rgb(250, 128, 114),
        "khaki"       => Color::rgb(240, 230, 140),
        "crimson"     => Color::rgb(220, 20, 60),
        "tomato"      => Color::rgb(255, 99, 71),
        "steelblue"   => Color::rgb(70, 130, 180),
        "skyblue"     => Color::rgb(135, 206, 235),
        "darkblue"    => Color::rgb(0, 0, 139),
        "darkgreen"   => Color::rgb(0, 100, 0),
        "darkred"     => Color::rgb(139, 0, 0),
        "transparent" => Color::TRANSPARENT,
        _ => return None,
    };
    Some(c)
}

/// 2D size
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Size {
    pub w: f64,
    pub h: f64,
}

impl Size {
    pub const fn new(w: f64, h: f64) -> Self {
        Size { w, h }
    }
}

/// Axis-aligned bounding box in user space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BBox {
    pub min: DVec2,
    pub max: DVec2,
}

impl Default for BBox {
    fn default() -> Self {
        Self::new()
    }
}

impl BBox {
    /// Create an empty bounding box (will expand on first point)
    pub const fn new() -> Self {
        BBox {
            min: DVec2::new(f64::MAX, f64::MAX),
            max: DVec2::new(f64::MIN, f64::MIN),
        }
    }

    pub fn from_rect(x: f64, y: f64, w: f64, h: f64) -> Self {
        BBox {
            min: DVec2::new(x, y),
            max: DVec2::new(x + w, y + h),
        }
    }

    /// Check if the bbox is empty (never expanded)
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// Expand to include a point
    pub fn expand_point(&mut self, p: DVec2) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Expand to include another box
    pub fn union(&mut self, other: &BBox) {
        if other.is_empty() {
            return;
        }
        self.expand_point(other.min);
        self.expand_point(other.max);
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.max.x - self.min.x }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.max.y - self.min.y }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    /// Bounding box of this box's corners after `transform`.
    pub fn transformed(&self, transform: &DAffine2) -> BBox {
        let mut out = BBox::new();
        if self.is_empty() {
            return out;
        }
        for corner in [
            self.min,
            DVec2::new(self.max.x, self.min.y),
            self.max,
            DVec2::new(self.min.x, self.max.y),
        ] {
            out.expand_point(transform.transform_point2(corner));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> MeasureContext {
        MeasureContext::new(Size::new(200.0, 100.0), 16.0)
    }

    // ==================== Length tests ====================

    #[test]
    fn length_try_new_rejects_nan() {
        assert_eq!(Length::try_new(f64::NAN, Unit::Px), Err(NumericError::NaN));
    }

    #[test]
    fn length_try_new_rejects_infinity() {
        assert_eq!(
            Length::try_new(f64::INFINITY, Unit::Raw),
            Err(NumericError::Infinite)
        );
    }

    #[test]
    fn absolute_units_resolve_at_96_dpi() {
        let ctx = ctx();
        assert_eq!(Length::new(1.0, Unit::In).resolve_width(&ctx), 96.0);
        assert_eq!(Length::new(72.0, Unit::Pt).resolve_width(&ctx), 96.0);
        assert!((Length::new(2.54, Unit::Cm).resolve_width(&ctx) - 96.0).abs() < 1e-9);
    }

    #[test]
    fn percentages_use_the_requested_axis() {
        let ctx = ctx();
        let half = Length::new(50.0, Unit::Percent);
        assert_eq!(half.resolve_width(&ctx), 100.0);
        assert_eq!(half.resolve_height(&ctx), 50.0);
    }

    #[test]
    fn em_uses_font_size() {
        assert_eq!(Length::new(2.0, Unit::Em).resolve_width(&ctx()), 32.0);
    }

    #[test]
    fn unit_suffix_is_case_insensitive() {
        assert_eq!(Unit::from_suffix("PX"), Some(Unit::Px));
        assert_eq!(Unit::from_suffix("furlong"), None);
    }

    // ==================== Color tests ====================

    #[test]
    fn parses_hex_colors() {
        assert_eq!("#fff".parse::<Color>(), Ok(Color::rgb(255, 255, 255)));
        assert_eq!("#102030".parse::<Color>(), Ok(Color::rgb(16, 32, 48)));
        assert_eq!("#10203080".parse::<Color>(), Ok(Color::rgba(16, 32, 48, 128)));
    }

    #[test]
    fn parses_rgb_functions() {
        assert_eq!("rgb(1, 2, 3)".parse::<Color>(), Ok(Color::rgb(1, 2, 3)));
        assert_eq!("rgb(100%,0%,0%)".parse::<Color>(), Ok(Color::rgb(255, 0, 0)));
        assert_eq!(
            "rgba(0,0,0,0.5)".parse::<Color>(),
            Ok(Color::rgba(0, 0, 0, 128))
        );
    }

    #[test]
    fn parses_named_colors_case_insensitively() {
        assert_eq!("Red".parse::<Color>(), Ok(Color::rgb(255, 0, 0)));
        assert!("notacolor".parse::<Color>().is_err());
    }

    #[test]
    fn color_opacity_scales_alpha() {
        assert_eq!(Color::BLACK.with_opacity(0.5).a, 128);
        assert_eq!(Color::BLACK.with_opacity(2.0).a, 255);
    }

    // ==================== BBox tests ====================

    #[test]
    fn bbox_new_is_empty() {
        let bb = BBox::new();
        assert!(bb.is_empty());
        assert_eq!(bb.width(), 0.0);
    }

    #[test]
    fn bbox_expand_point() {
        let mut bb = BBox::new();
        bb.expand_point(DVec2::new(1.0, 2.0));
        bb.expand_point(DVec2::new(3.0, 4.0));

        assert!(!bb.is_empty());
        assert_eq!(bb.min, DVec2::new(1.0, 2.0));
        assert_eq!(bb.max, DVec2::new(3.0, 4.0));
        assert_eq!(bb.center(), DVec2::new(2.0, 3.0));
    }

    #[test]
    fn bbox_union_ignores_empty() {
        let mut bb = BBox::from_rect(0.0, 0.0, 1.0, 1.0);
        bb.union(&BBox::new());
        assert_eq!(bb, BBox::from_rect(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn bbox_transformed_covers_rotated_corners() {
        let bb = BBox::from_rect(0.0, 0.0, 2.0, 1.0);
        let rotated = bb.transformed(&DAffine2::from_angle(std::f64::consts::FRAC_PI_2));
        assert!((rotated.width() - 1.0).abs() < 1e-9);
        assert!((rotated.height() - 2.0).abs() < 1e-9);
    }
}
