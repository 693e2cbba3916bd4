//! `transform`, `gradientTransform` and `transform-origin`.

use glam::{DAffine2, DMat2, DVec2};
use pest::Parser;

use super::grammar::{Rule, ValueParser};
use super::parser::parse_length;
use crate::types::{Length, Unit};

/// Parse a transform list into a single matrix, applied left to right.
pub fn parse_transform(s: &str) -> Option<DAffine2> {
    let list = ValueParser::parse(Rule::transform_list, s).ok()?.next()?;
    let mut result = DAffine2::IDENTITY;
    for item in list.into_inner() {
        let rule = item.as_rule();
        let args: Vec<f64> = item
            .into_inner()
            .filter_map(|p| p.as_str().parse().ok())
            .collect();
        let step = match (rule, args.as_slice()) {
            (Rule::matrix, &[a, b, c, d, e, f]) => DAffine2::from_cols_array(&[a, b, c, d, e, f]),
            (Rule::translate, &[tx]) => DAffine2::from_translation(DVec2::new(tx, 0.0)),
            (Rule::translate, &[tx, ty]) => DAffine2::from_translation(DVec2::new(tx, ty)),
            (Rule::scale, &[s]) => DAffine2::from_scale(DVec2::splat(s)),
            (Rule::scale, &[sx, sy]) => DAffine2::from_scale(DVec2::new(sx, sy)),
            (Rule::rotate, &[angle]) => DAffine2::from_angle(angle.to_radians()),
            (Rule::rotate, &[angle, cx, cy]) => {
                let c = DVec2::new(cx, cy);
                DAffine2::from_translation(c)
                    * DAffine2::from_angle(angle.to_radians())
                    * DAffine2::from_translation(-c)
            }
            (Rule::skew_x, &[angle]) => DAffine2::from_mat2(DMat2::from_cols(
                DVec2::new(1.0, 0.0),
                DVec2::new(angle.to_radians().tan(), 1.0),
            )),
            (Rule::skew_y, &[angle]) => DAffine2::from_mat2(DMat2::from_cols(
                DVec2::new(1.0, angle.to_radians().tan()),
                DVec2::new(0.0, 1.0),
            )),
            _ => return None,
        };
        result = result * step;
    }
    Some(result)
}

/// `transform-origin`: one or two lengths or position keywords.
pub fn parse_transform_origin(s: &str) -> Option<(Length, Length)> {
    let keyword = |w: &str| match w {
        "left" | "top" => Some(Length::new(0.0, Unit::Percent)),
        "center" => Some(Length::new(50.0, Unit::Percent)),
        "right" | "bottom" => Some(Length::new(100.0, Unit::Percent)),
        other => parse_length(other),
    };
    let mut words = s.split_whitespace();
    let x = keyword(words.next()?)?;
    let y = match words.next() {
        Some(w) => keyword(w)?,
        None => Length::new(50.0, Unit::Percent),
    };
    Some((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(s: &str, p: DVec2) -> DVec2 {
        parse_transform(s).unwrap().transform_point2(p)
    }

    #[test]
    fn translate_then_scale() {
        // Rightmost transform applies first
        assert_eq!(apply("translate(10 20) scale(2)", DVec2::ONE), DVec2::new(12.0, 22.0));
    }

    #[test]
    fn rotate_about_point() {
        let p = apply("rotate(180 5 5)", DVec2::ZERO);
        assert!((p - DVec2::new(10.0, 10.0)).length() < 1e-9);
    }

    #[test]
    fn matrix_is_column_major() {
        assert_eq!(apply("matrix(1 0 0 1 7 8)", DVec2::ZERO), DVec2::new(7.0, 8.0));
    }

    #[test]
    fn skew_x() {
        let p = apply("skewX(45)", DVec2::new(0.0, 1.0));
        assert!((p - DVec2::new(1.0, 1.0)).length() < 1e-9);
    }

    #[test]
    fn malformed_list_is_unspecified() {
        assert!(parse_transform("translate(1 2").is_none());
        assert!(parse_transform("rotate(1 2)").is_none());
    }

    #[test]
    fn empty_list_is_identity() {
        assert_eq!(parse_transform(""), Some(DAffine2::IDENTITY));
    }
}
