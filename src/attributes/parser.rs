//! Attribute value parsers.
//!
//! None of these fail: malformed or absent input yields `None` (or an empty
//! list), which callers treat as "unspecified".

use std::str::FromStr;

use pest::Parser;

use super::grammar::{Rule, ValueParser};
use crate::types::{Length, Unit};

/// Split a leading float literal from its suffix.
fn split_number(s: &str) -> Option<(f64, &str)> {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end == digits_start || (end == digits_start + 1 && bytes[digits_start] == b'.') {
        return None;
    }
    // Exponent, but not the `e` of an `em`/`ex` unit
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp = end + 1;
        if exp < bytes.len() && matches!(bytes[exp], b'+' | b'-') {
            exp += 1;
        }
        if exp < bytes.len() && bytes[exp].is_ascii_digit() {
            while exp < bytes.len() && bytes[exp].is_ascii_digit() {
                exp += 1;
            }
            end = exp;
        }
    }
    let value: f64 = s[..end].parse().ok()?;
    Some((value, &s[end..]))
}

pub fn parse_float(s: &str) -> Option<f64> {
    let (value, rest) = split_number(s.trim())?;
    (rest.is_empty() && value.is_finite()).then_some(value)
}

pub fn parse_length(s: &str) -> Option<Length> {
    let (value, suffix) = split_number(s.trim())?;
    let unit = Unit::from_suffix(suffix.trim())?;
    Length::try_new(value, unit).ok()
}

/// Comma and/or whitespace separated lengths (`x="1 2 3"`,
/// `stroke-dasharray`).
pub fn parse_length_list(s: &str) -> Vec<Length> {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .map_while(parse_length)
        .collect()
}

/// A number or percentage, as a fraction (`50%` and `0.5` both give 0.5).
pub fn parse_percentage(s: &str) -> Option<f64> {
    let s = s.trim();
    match s.strip_suffix('%') {
        Some(pct) => parse_float(pct).map(|v| v / 100.0),
        None => parse_float(s),
    }
}

/// An angle in radians. Unitless values are degrees.
pub fn parse_angle(s: &str) -> Option<f64> {
    let (value, suffix) = split_number(s.trim())?;
    let radians = match suffix.trim() {
        "" | "deg" => value.to_radians(),
        "rad" => value,
        "grad" => value * std::f64::consts::PI / 200.0,
        "turn" => value * std::f64::consts::TAU,
        _ => return None,
    };
    Some(radians)
}

/// Any keyword enum implementing `FromStr`.
pub fn parse_enum<T: FromStr>(s: &str) -> Option<T> {
    s.trim().parse().ok()
}

/// Comma and/or whitespace separated numbers. Returns an empty list if any
/// part is malformed.
pub fn parse_number_list(s: &str) -> Vec<f64> {
    let Ok(mut pairs) = ValueParser::parse(Rule::number_list, s) else {
        return Vec::new();
    };
    let Some(list) = pairs.next() else {
        return Vec::new();
    };
    list.into_inner()
        .filter(|p| p.as_rule() == Rule::number)
        .filter_map(|p| p.as_str().parse().ok())
        .collect()
}

/// Extract the id from `url(#id)`, also accepting quoted forms.
pub fn parse_url_reference(s: &str) -> Option<&str> {
    let inner = s.trim().strip_prefix("url(")?.split_once(')')?.0.trim();
    let inner = inner.trim_matches(|c| c == '"' || c == '\'');
    let id = inner.strip_prefix('#')?;
    (!id.is_empty()).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lengths_with_units() {
        assert_eq!(parse_length("10"), Some(Length::px(10.0)));
        assert_eq!(parse_length(" 2.5em "), Some(Length::new(2.5, Unit::Em)));
        assert_eq!(parse_length("50%"), Some(Length::new(50.0, Unit::Percent)));
        assert_eq!(parse_length("1e2px"), Some(Length::new(100.0, Unit::Px)));
        assert_eq!(parse_length("3ex"), Some(Length::new(3.0, Unit::Ex)));
    }

    #[test]
    fn malformed_lengths_are_unspecified() {
        assert_eq!(parse_length(""), None);
        assert_eq!(parse_length("abc"), None);
        assert_eq!(parse_length("10 parsecs"), None);
        assert_eq!(parse_length("."), None);
    }

    #[test]
    fn angles_default_to_degrees() {
        assert!((parse_angle("180").unwrap() - std::f64::consts::PI).abs() < 1e-12);
        assert_eq!(parse_angle("1rad"), Some(1.0));
        assert!((parse_angle("0.5turn").unwrap() - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn percentages_and_fractions() {
        assert_eq!(parse_percentage("50%"), Some(0.5));
        assert_eq!(parse_percentage("0.25"), Some(0.25));
        assert_eq!(parse_percentage("half"), None);
    }

    #[test]
    fn number_lists() {
        assert_eq!(parse_number_list("1,2 3 , 4"), vec![1.0, 2.0, 3.0, 4.0]);
        assert!(parse_number_list("1 2 x").is_empty());
    }

    #[test]
    fn url_references() {
        assert_eq!(parse_url_reference("url(#grad)"), Some("grad"));
        assert_eq!(parse_url_reference("url('#a') red"), Some("a"));
        assert_eq!(parse_url_reference("url(other.svg#a)"), None);
        assert_eq!(parse_url_reference("#a"), None);
    }
}
