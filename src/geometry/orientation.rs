//! Marker orientation (`orient` attribute).

use std::f64::consts::PI;
use std::str::FromStr;

use glam::DVec2;

use crate::attributes::parser::parse_angle;
use crate::types::NumericError;

/// Where on a path a marker is placed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerType {
    Start,
    Mid,
    End,
}

/// How a marker is rotated at its vertex
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MarkerOrientation {
    /// Follow the path direction
    Auto,
    /// Like `Auto`, but the start marker points backwards
    AutoStartReverse,
    /// A constant angle in radians
    Angle(f64),
}

impl Default for MarkerOrientation {
    fn default() -> Self {
        MarkerOrientation::Angle(0.0)
    }
}

impl MarkerOrientation {
    /// Rotation in radians for a marker of type `ty`, given the incoming and
    /// outgoing tangents at the vertex.
    pub fn orientation_for(self, ty: MarkerType, d_in: DVec2, d_out: DVec2) -> f64 {
        match self {
            MarkerOrientation::Angle(angle) => angle,
            MarkerOrientation::Auto | MarkerOrientation::AutoStartReverse => match ty {
                MarkerType::Start => {
                    let angle = d_out.y.atan2(d_out.x);
                    if self == MarkerOrientation::AutoStartReverse {
                        angle + PI
                    } else {
                        angle
                    }
                }
                MarkerType::Mid => {
                    let bisector = (d_in + d_out) / 2.0;
                    bisector.y.atan2(bisector.x)
                }
                MarkerType::End => d_in.y.atan2(d_in.x),
            },
        }
    }
}

impl FromStr for MarkerOrientation {
    type Err = NumericError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "auto" => Ok(MarkerOrientation::Auto),
            "auto-start-reverse" => Ok(MarkerOrientation::AutoStartReverse),
            other => parse_angle(other)
                .map(MarkerOrientation::Angle)
                .ok_or(NumericError::Malformed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn auto_start_follows_outgoing_tangent() {
        let angle = MarkerOrientation::Auto.orientation_for(MarkerType::Start, DVec2::ZERO, DVec2::X);
        assert_eq!(angle, 0.0);
    }

    #[test]
    fn auto_start_reverse_points_backwards() {
        let angle = MarkerOrientation::AutoStartReverse.orientation_for(
            MarkerType::Start,
            DVec2::ZERO,
            DVec2::X,
        );
        assert!((angle - PI).abs() < 1e-12);
    }

    #[test]
    fn auto_mid_uses_bisector() {
        let angle = MarkerOrientation::Auto.orientation_for(MarkerType::Mid, DVec2::X, DVec2::Y);
        assert!((angle - FRAC_PI_4).abs() < 1e-12);
        assert_eq!(angle, 0.5f64.atan2(0.5));
    }

    #[test]
    fn auto_end_uses_incoming_tangent() {
        let angle = MarkerOrientation::Auto.orientation_for(MarkerType::End, DVec2::Y, DVec2::ZERO);
        assert!((angle - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn fixed_angle_ignores_tangents() {
        let fixed = MarkerOrientation::Angle(1.25);
        for ty in [MarkerType::Start, MarkerType::Mid, MarkerType::End] {
            assert_eq!(fixed.orientation_for(ty, DVec2::X, DVec2::NEG_Y), 1.25);
        }
    }

    #[test]
    fn parses_orient_attribute() {
        assert_eq!("auto".parse::<MarkerOrientation>(), Ok(MarkerOrientation::Auto));
        assert_eq!(
            "auto-start-reverse".parse::<MarkerOrientation>(),
            Ok(MarkerOrientation::AutoStartReverse)
        );
        let Ok(MarkerOrientation::Angle(a)) = "90".parse::<MarkerOrientation>() else {
            panic!("expected a fixed angle");
        };
        assert!((a - PI / 2.0).abs() < 1e-12);
    }
}
