//! Decoding of the `d` attribute into absolute [`PathData`].
//!
//! Relative commands, shorthand (smooth) curves and elliptical arcs are all
//! normalized here, so the rest of the crate only sees move/line/quad/cubic.

use std::f64::consts::PI;

use glam::DVec2;
use pest::Parser;
use pest::iterators::Pair;

use super::path::PathData;
use crate::attributes::grammar::{Rule, ValueParser};
use crate::log::warn;

/// Parse path data. Everything up to the first malformed command is kept.
pub fn parse_path_data(input: &str) -> PathData {
    let mut out = PathData::new();
    let root = match ValueParser::parse(Rule::path_data, input) {
        Ok(mut pairs) => match pairs.next() {
            Some(pair) => pair,
            None => return out,
        },
        Err(_) => return out,
    };

    if root.as_span().end() < input.trim_end().len() {
        warn!(
            offset = root.as_span().end(),
            "path data has a malformed tail, keeping valid prefix"
        );
    }

    let mut state = DecodeState::default();
    for command in root.into_inner() {
        state.command(command, &mut out);
    }
    out
}

#[derive(Default)]
struct DecodeState {
    pen: DVec2,
    start: DVec2,
    /// Second control point of the previous cubic, for `S`
    last_cubic: Option<DVec2>,
    /// Control point of the previous quad, for `T`
    last_quad: Option<DVec2>,
}

impl DecodeState {
    fn command(&mut self, pair: Pair<'_, Rule>, out: &mut PathData) {
        let rule = pair.as_rule();
        let mut inner = pair.into_inner();
        // Every command rule starts with its letter
        let relative = inner
            .next()
            .map(|letter| letter.as_str().chars().all(|c| c.is_ascii_lowercase()))
            .unwrap_or(false);
        let base = |pen: DVec2| if relative { pen } else { DVec2::ZERO };

        match rule {
            Rule::move_to => {
                for (i, p) in inner.map(pair_point).enumerate() {
                    let p = base(self.pen) + p;
                    if i == 0 {
                        out.move_to(p);
                        self.start = p;
                    } else {
                        // Extra coordinate pairs after a move are implicit lines
                        out.line_to(p);
                    }
                    self.pen = p;
                }
                self.reset_controls();
            }
            Rule::close_path => {
                out.close();
                self.pen = self.start;
                self.reset_controls();
            }
            Rule::line_to => {
                for p in inner.map(pair_point) {
                    self.pen = base(self.pen) + p;
                    out.line_to(self.pen);
                }
                self.reset_controls();
            }
            Rule::h_line_to => {
                for x in inner.map(number) {
                    self.pen.x = if relative { self.pen.x + x } else { x };
                    out.line_to(self.pen);
                }
                self.reset_controls();
            }
            Rule::v_line_to => {
                for y in inner.map(number) {
                    self.pen.y = if relative { self.pen.y + y } else { y };
                    out.line_to(self.pen);
                }
                self.reset_controls();
            }
            Rule::cubic_to => {
                let points: Vec<DVec2> = inner.map(pair_point).collect();
                for chunk in points.chunks_exact(3) {
                    let b = base(self.pen);
                    let (c1, c2, p) = (b + chunk[0], b + chunk[1], b + chunk[2]);
                    out.cubic_to(c1, c2, p);
                    self.pen = p;
                    self.last_cubic = Some(c2);
                }
                self.last_quad = None;
            }
            Rule::smooth_cubic_to => {
                let points: Vec<DVec2> = inner.map(pair_point).collect();
                for chunk in points.chunks_exact(2) {
                    let b = base(self.pen);
                    let c1 = self.reflect(self.last_cubic);
                    let (c2, p) = (b + chunk[0], b + chunk[1]);
                    out.cubic_to(c1, c2, p);
                    self.pen = p;
                    self.last_cubic = Some(c2);
                }
                self.last_quad = None;
            }
            Rule::quad_to => {
                let points: Vec<DVec2> = inner.map(pair_point).collect();
                for chunk in points.chunks_exact(2) {
                    let b = base(self.pen);
                    let (c, p) = (b + chunk[0], b + chunk[1]);
                    out.quad_to(c, p);
                    self.pen = p;
                    self.last_quad = Some(c);
                }
                self.last_cubic = None;
            }
            Rule::smooth_quad_to => {
                for p in inner.map(pair_point) {
                    let c = self.reflect(self.last_quad);
                    let p = base(self.pen) + p;
                    out.quad_to(c, p);
                    self.pen = p;
                    self.last_quad = Some(c);
                }
                self.last_cubic = None;
            }
            Rule::arc_to => {
                for args in inner {
                    let mut it = args.into_inner();
                    let rx = it.next().map(number).unwrap_or_default();
                    let ry = it.next().map(number).unwrap_or_default();
                    let rotation = it.next().map(number).unwrap_or_default();
                    let large_arc = it.next().is_some_and(|f| f.as_str() == "1");
                    let sweep = it.next().is_some_and(|f| f.as_str() == "1");
                    let end = base(self.pen) + it.next().map(pair_point).unwrap_or_default();
                    arc_to(out, self.pen, end, rx, ry, rotation, large_arc, sweep);
                    self.pen = end;
                }
                self.reset_controls();
            }
            _ => unreachable!("path_data only contains command rules"),
        }
    }

    fn reflect(&self, control: Option<DVec2>) -> DVec2 {
        match control {
            Some(c) => 2.0 * self.pen - c,
            None => self.pen,
        }
    }

    fn reset_controls(&mut self) {
        self.last_cubic = None;
        self.last_quad = None;
    }
}

fn number(pair: Pair<'_, Rule>) -> f64 {
    // The grammar only admits valid float literals
    pair.as_str().parse().unwrap_or_default()
}

fn pair_point(pair: Pair<'_, Rule>) -> DVec2 {
    let mut it = pair.into_inner().map(number);
    DVec2::new(it.next().unwrap_or_default(), it.next().unwrap_or_default())
}

/// Append an elliptical arc as a sequence of cubics (endpoint
/// parameterization converted to center parameterization).
#[allow(clippy::too_many_arguments)]
fn arc_to(
    out: &mut PathData,
    from: DVec2,
    to: DVec2,
    rx: f64,
    ry: f64,
    rotation_deg: f64,
    large_arc: bool,
    sweep: bool,
) {
    if from == to {
        return;
    }
    let (mut rx, mut ry) = (rx.abs(), ry.abs());
    if rx == 0.0 || ry == 0.0 {
        out.line_to(to);
        return;
    }

    let phi = rotation_deg.to_radians();
    let (sin_phi, cos_phi) = phi.sin_cos();
    let rotate = |v: DVec2| DVec2::new(cos_phi * v.x - sin_phi * v.y, sin_phi * v.x + cos_phi * v.y);

    let half = (from - to) / 2.0;
    let p1 = DVec2::new(
        cos_phi * half.x + sin_phi * half.y,
        -sin_phi * half.x + cos_phi * half.y,
    );

    // Scale radii up if they cannot span the endpoints
    let lambda = (p1.x * p1.x) / (rx * rx) + (p1.y * p1.y) / (ry * ry);
    if lambda > 1.0 {
        let s = lambda.sqrt();
        rx *= s;
        ry *= s;
    }

    let num = rx * rx * ry * ry - rx * rx * p1.y * p1.y - ry * ry * p1.x * p1.x;
    let den = rx * rx * p1.y * p1.y + ry * ry * p1.x * p1.x;
    let mut coef = (num / den).max(0.0).sqrt();
    if large_arc == sweep {
        coef = -coef;
    }
    let c1 = DVec2::new(coef * rx * p1.y / ry, -coef * ry * p1.x / rx);
    let center = rotate(c1) + (from + to) / 2.0;

    let angle = |u: DVec2, v: DVec2| u.perp_dot(v).atan2(u.dot(v));
    let u = DVec2::new((p1.x - c1.x) / rx, (p1.y - c1.y) / ry);
    let v = DVec2::new((-p1.x - c1.x) / rx, (-p1.y - c1.y) / ry);
    let theta1 = angle(DVec2::X, u);
    let mut delta = angle(u, v);
    if !sweep && delta > 0.0 {
        delta -= 2.0 * PI;
    } else if sweep && delta < 0.0 {
        delta += 2.0 * PI;
    }

    let segments = (delta.abs() / (PI / 2.0)).ceil().max(1.0) as usize;
    let step = delta / segments as f64;
    let k = 4.0 / 3.0 * (step / 4.0).tan();
    let point = |t: f64| center + rotate(DVec2::new(rx * t.cos(), ry * t.sin()));
    let deriv = |t: f64| rotate(DVec2::new(-rx * t.sin(), ry * t.cos()));

    let mut t0 = theta1;
    for i in 0..segments {
        let t1 = t0 + step;
        let p0 = point(t0);
        let p3 = if i + 1 == segments { to } else { point(t1) };
        out.cubic_to(p0 + k * deriv(t0), p3 - k * deriv(t1), p3);
        t0 = t1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PathSegment;

    #[test]
    fn relative_commands_become_absolute() {
        let path = parse_path_data("m10 10 l5 0 v5 h-5 z");
        assert_eq!(
            path.segments(),
            &[
                PathSegment::MoveTo(DVec2::new(10.0, 10.0)),
                PathSegment::LineTo(DVec2::new(15.0, 10.0)),
                PathSegment::LineTo(DVec2::new(15.0, 15.0)),
                PathSegment::LineTo(DVec2::new(10.0, 15.0)),
                PathSegment::Close,
            ]
        );
    }

    #[test]
    fn implicit_line_after_move() {
        let path = parse_path_data("M0 0 10 0 10 10");
        assert_eq!(path.segments().len(), 3);
        assert!(matches!(path.segments()[2], PathSegment::LineTo(_)));
    }

    #[test]
    fn smooth_cubic_reflects_previous_control() {
        let path = parse_path_data("M0 0 C0 10 10 10 10 0 S20 -10 20 0");
        match path.segments()[2] {
            PathSegment::CubicTo(c1, _, _) => assert_eq!(c1, DVec2::new(10.0, -10.0)),
            other => panic!("expected cubic, got {other:?}"),
        }
    }

    #[test]
    fn half_circle_arc_has_expected_length() {
        let path = parse_path_data("M0 0 A10 10 0 0 1 20 0");
        let expected = std::f64::consts::PI * 10.0;
        assert!((path.length() - expected).abs() < 1e-2);
    }

    #[test]
    fn malformed_tail_keeps_prefix() {
        let path = parse_path_data("M0 0 L10 0 L");
        assert_eq!(path.segments().len(), 2);
    }

    #[test]
    fn zero_radius_arc_is_a_line() {
        let path = parse_path_data("M0 0 A0 5 0 0 1 10 0");
        assert_eq!(path.segments()[1], PathSegment::LineTo(DVec2::new(10.0, 0.0)));
    }
}
