//! Path representation, flattening and measurement.

use glam::{DAffine2, DVec2};

use crate::types::BBox;

/// Flattening tolerance used for bounds and path length, in user units.
pub const DEFAULT_TOLERANCE: f64 = 1e-3;

/// Upper bound on the number of line segments a single curve flattens to.
const MAX_SUBDIVISIONS: usize = 1024;

/// Kappa for approximating a quarter ellipse with one cubic.
const KAPPA: f64 = 0.552_284_749_830_793_4;

/// One drawing command with absolute coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(DVec2),
    LineTo(DVec2),
    QuadTo(DVec2, DVec2),
    CubicTo(DVec2, DVec2, DVec2),
    Close,
}

/// A flattened subpath
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polyline {
    pub points: Vec<DVec2>,
    pub closed: bool,
}

impl Polyline {
    pub fn length(&self) -> f64 {
        let open: f64 = self.points.windows(2).map(|w| w[0].distance(w[1])).sum();
        match (self.closed, self.points.first(), self.points.last()) {
            (true, Some(first), Some(last)) => open + last.distance(*first),
            _ => open,
        }
    }
}

/// A vertex of a path together with its incoming and outgoing tangents,
/// as consumed by marker placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathVertex {
    pub point: DVec2,
    pub tangent_in: DVec2,
    pub tangent_out: DVec2,
}

/// Absolute path data
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathData {
    segments: Vec<PathSegment>,
}

impl PathData {
    pub fn new() -> Self {
        Self::default()
    }

    // Chainable builders, used by the basic shapes

    pub fn m(mut self, x: f64, y: f64) -> Self {
        self.move_to(DVec2::new(x, y));
        self
    }

    pub fn l(mut self, x: f64, y: f64) -> Self {
        self.line_to(DVec2::new(x, y));
        self
    }

    pub fn c(mut self, c1: DVec2, c2: DVec2, x: f64, y: f64) -> Self {
        self.cubic_to(c1, c2, DVec2::new(x, y));
        self
    }

    pub fn z(mut self) -> Self {
        self.close();
        self
    }

    pub fn move_to(&mut self, p: DVec2) {
        self.segments.push(PathSegment::MoveTo(p));
    }

    pub fn line_to(&mut self, p: DVec2) {
        self.segments.push(PathSegment::LineTo(p));
    }

    pub fn quad_to(&mut self, c: DVec2, p: DVec2) {
        self.segments.push(PathSegment::QuadTo(c, p));
    }

    pub fn cubic_to(&mut self, c1: DVec2, c2: DVec2, p: DVec2) {
        self.segments.push(PathSegment::CubicTo(c1, c2, p));
    }

    pub fn close(&mut self) {
        self.segments.push(PathSegment::Close);
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn append(&mut self, other: &PathData) {
        self.segments.extend_from_slice(&other.segments);
    }

    pub fn transformed(&self, t: &DAffine2) -> PathData {
        let p = |v: DVec2| t.transform_point2(v);
        let segments = self
            .segments
            .iter()
            .map(|seg| match *seg {
                PathSegment::MoveTo(a) => PathSegment::MoveTo(p(a)),
                PathSegment::LineTo(a) => PathSegment::LineTo(p(a)),
                PathSegment::QuadTo(c, a) => PathSegment::QuadTo(p(c), p(a)),
                PathSegment::CubicTo(c1, c2, a) => PathSegment::CubicTo(p(c1), p(c2), p(a)),
                PathSegment::Close => PathSegment::Close,
            })
            .collect();
        PathData { segments }
    }

    /// Axis-aligned rectangle, clockwise from the top-left corner.
    pub fn rect(x: f64, y: f64, w: f64, h: f64) -> PathData {
        PathData::new()
            .m(x, y)
            .l(x + w, y)
            .l(x + w, y + h)
            .l(x, y + h)
            .z()
    }

    /// Rectangle with elliptical corners; radii must already be clamped.
    pub fn rounded_rect(x: f64, y: f64, w: f64, h: f64, rx: f64, ry: f64) -> PathData {
        if rx <= 0.0 || ry <= 0.0 {
            return PathData::rect(x, y, w, h);
        }
        let (kx, ky) = (rx * KAPPA, ry * KAPPA);
        let (x1, y1) = (x + w, y + h);
        PathData::new()
            .m(x + rx, y)
            .l(x1 - rx, y)
            .c(
                DVec2::new(x1 - rx + kx, y),
                DVec2::new(x1, y + ry - ky),
                x1,
                y + ry,
            )
            .l(x1, y1 - ry)
            .c(
                DVec2::new(x1, y1 - ry + ky),
                DVec2::new(x1 - rx + kx, y1),
                x1 - rx,
                y1,
            )
            .l(x + rx, y1)
            .c(
                DVec2::new(x + rx - kx, y1),
                DVec2::new(x, y1 - ry + ky),
                x,
                y1 - ry,
            )
            .l(x, y + ry)
            .c(
                DVec2::new(x, y + ry - ky),
                DVec2::new(x + rx - kx, y),
                x + rx,
                y,
            )
            .z()
    }

    /// Ellipse as four cubic arcs, starting at the rightmost point.
    pub fn ellipse(cx: f64, cy: f64, rx: f64, ry: f64) -> PathData {
        let (kx, ky) = (rx * KAPPA, ry * KAPPA);
        PathData::new()
            .m(cx + rx, cy)
            .c(
                DVec2::new(cx + rx, cy + ky),
                DVec2::new(cx + kx, cy + ry),
                cx,
                cy + ry,
            )
            .c(
                DVec2::new(cx - kx, cy + ry),
                DVec2::new(cx - rx, cy + ky),
                cx - rx,
                cy,
            )
            .c(
                DVec2::new(cx - rx, cy - ky),
                DVec2::new(cx - kx, cy - ry),
                cx,
                cy - ry,
            )
            .c(
                DVec2::new(cx + kx, cy - ry),
                DVec2::new(cx + rx, cy - ky),
                cx + rx,
                cy,
            )
            .z()
    }

    /// Flatten curves into polylines.
    ///
    /// The number of line segments per curve follows Wang's formula, so the
    /// result only depends on the control points and the tolerance.
    pub fn flatten(&self, tolerance: f64) -> Vec<Polyline> {
        let tolerance = tolerance.max(f64::EPSILON);
        let mut out: Vec<Polyline> = Vec::new();
        let mut current = Polyline::default();
        let mut pen = DVec2::ZERO;
        let mut start = DVec2::ZERO;

        for seg in &self.segments {
            match *seg {
                PathSegment::MoveTo(p) => {
                    if current.points.len() > 1 || current.closed {
                        out.push(std::mem::take(&mut current));
                    }
                    current = Polyline {
                        points: vec![p],
                        closed: false,
                    };
                    pen = p;
                    start = p;
                }
                PathSegment::LineTo(p) => {
                    ensure_started(&mut current, pen);
                    current.points.push(p);
                    pen = p;
                }
                PathSegment::QuadTo(c, p) => {
                    ensure_started(&mut current, pen);
                    let dd = (pen - 2.0 * c + p).length();
                    let n = subdivisions(0.25 * dd, tolerance);
                    for i in 1..=n {
                        let t = i as f64 / n as f64;
                        let mt = 1.0 - t;
                        current.points.push(mt * mt * pen + 2.0 * mt * t * c + t * t * p);
                    }
                    pen = p;
                }
                PathSegment::CubicTo(c1, c2, p) => {
                    ensure_started(&mut current, pen);
                    let dd = (pen - 2.0 * c1 + c2).length().max((c1 - 2.0 * c2 + p).length());
                    let n = subdivisions(0.75 * dd, tolerance);
                    for i in 1..=n {
                        let t = i as f64 / n as f64;
                        current.points.push(cubic_point(pen, c1, c2, p, t));
                    }
                    pen = p;
                }
                PathSegment::Close => {
                    ensure_started(&mut current, pen);
                    current.closed = true;
                    out.push(std::mem::take(&mut current));
                    current.points.push(start);
                    pen = start;
                }
            }
        }
        if current.points.len() > 1 {
            out.push(current);
        }
        out
    }

    /// Bounds of the flattened path.
    pub fn bounds(&self) -> BBox {
        let mut bounds = BBox::new();
        for polyline in self.flatten(DEFAULT_TOLERANCE) {
            for p in polyline.points {
                bounds.expand_point(p);
            }
        }
        // A lone move-to still contributes its point
        if bounds.is_empty() {
            for seg in &self.segments {
                if let PathSegment::MoveTo(p) = seg {
                    bounds.expand_point(*p);
                }
            }
        }
        bounds
    }

    /// Total length of all subpaths.
    pub fn length(&self) -> f64 {
        self.flatten(DEFAULT_TOLERANCE).iter().map(Polyline::length).sum()
    }

    /// Point and tangent angle (radians) at `distance` along the path.
    ///
    /// Returns `None` past the end of the path or for a negative distance.
    pub fn point_at_length(&self, distance: f64) -> Option<(DVec2, f64)> {
        if distance < 0.0 {
            return None;
        }
        let mut remaining = distance;
        for polyline in self.flatten(DEFAULT_TOLERANCE) {
            let mut points = polyline.points.clone();
            if polyline.closed {
                if let Some(first) = points.first().copied() {
                    points.push(first);
                }
            }
            for w in points.windows(2) {
                let seg_len = w[0].distance(w[1]);
                if seg_len == 0.0 {
                    continue;
                }
                if remaining <= seg_len {
                    let dir = (w[1] - w[0]) / seg_len;
                    return Some((w[0] + dir * remaining, dir.y.atan2(dir.x)));
                }
                remaining -= seg_len;
            }
        }
        None
    }

    /// Vertices with in/out tangents, one per segment end point.
    pub fn vertices(&self) -> Vec<PathVertex> {
        let mut vertices: Vec<PathVertex> = Vec::new();
        let mut pen = DVec2::ZERO;
        let mut start = DVec2::ZERO;

        let push_edge = |vertices: &mut Vec<PathVertex>, from: DVec2, to: DVec2, t0, t1| {
            if vertices.is_empty() {
                vertices.push(PathVertex {
                    point: from,
                    tangent_in: DVec2::ZERO,
                    tangent_out: DVec2::ZERO,
                });
            }
            if let Some(last) = vertices.last_mut() {
                if last.tangent_out == DVec2::ZERO {
                    last.tangent_out = t0;
                }
            }
            vertices.push(PathVertex {
                point: to,
                tangent_in: t1,
                tangent_out: DVec2::ZERO,
            });
        };

        for seg in &self.segments {
            match *seg {
                PathSegment::MoveTo(p) => {
                    vertices.push(PathVertex {
                        point: p,
                        tangent_in: DVec2::ZERO,
                        tangent_out: DVec2::ZERO,
                    });
                    pen = p;
                    start = p;
                }
                PathSegment::LineTo(p) => {
                    push_edge(&mut vertices, pen, p, p - pen, p - pen);
                    pen = p;
                }
                PathSegment::QuadTo(c, p) => {
                    let t0 = non_zero_or(c - pen, p - pen);
                    let t1 = non_zero_or(p - c, p - pen);
                    push_edge(&mut vertices, pen, p, t0, t1);
                    pen = p;
                }
                PathSegment::CubicTo(c1, c2, p) => {
                    let t0 = non_zero_or(non_zero_or(c1 - pen, c2 - pen), p - pen);
                    let t1 = non_zero_or(non_zero_or(p - c2, p - c1), p - pen);
                    push_edge(&mut vertices, pen, p, t0, t1);
                    pen = p;
                }
                PathSegment::Close => {
                    push_edge(&mut vertices, pen, start, start - pen, start - pen);
                    pen = start;
                }
            }
        }
        vertices
    }
}

fn ensure_started(polyline: &mut Polyline, pen: DVec2) {
    if polyline.points.is_empty() {
        polyline.points.push(pen);
    }
}

fn subdivisions(scaled_dd: f64, tolerance: f64) -> usize {
    let n = (scaled_dd / tolerance).sqrt().ceil();
    if n.is_finite() {
        (n as usize).clamp(1, MAX_SUBDIVISIONS)
    } else {
        MAX_SUBDIVISIONS
    }
}

fn cubic_point(p0: DVec2, c1: DVec2, c2: DVec2, p1: DVec2, t: f64) -> DVec2 {
    let mt = 1.0 - t;
    mt * mt * mt * p0 + 3.0 * mt * mt * t * c1 + 3.0 * mt * t * t * c2 + t * t * t * p1
}

fn non_zero_or(v: DVec2, fallback: DVec2) -> DVec2 {
    if v == DVec2::ZERO { fallback } else { v }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_length_is_perimeter() {
        let path = PathData::rect(0.0, 0.0, 10.0, 5.0);
        assert!((path.length() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn circle_length_is_close_to_circumference() {
        let path = PathData::ellipse(0.0, 0.0, 10.0, 10.0);
        let expected = 2.0 * std::f64::consts::PI * 10.0;
        // The cubic approximation itself deviates by ~0.03%
        assert!((path.length() - expected).abs() / expected < 1e-3);
    }

    #[test]
    fn length_is_deterministic() {
        let path = PathData::new()
            .m(0.0, 0.0)
            .c(DVec2::new(10.0, 30.0), DVec2::new(40.0, -20.0), 50.0, 10.0);
        assert_eq!(path.length().to_bits(), path.clone().length().to_bits());
    }

    #[test]
    fn bounds_follow_curve_not_control_points() {
        let mut path = PathData::new();
        path.move_to(DVec2::new(0.0, 0.0));
        path.quad_to(DVec2::new(5.0, 10.0), DVec2::new(10.0, 0.0));
        let bounds = path.bounds();
        // The curve peaks at half the control point height
        assert!((bounds.max.y - 5.0).abs() < 1e-2);
    }

    #[test]
    fn point_at_length_walks_segments() {
        let path = PathData::new().m(0.0, 0.0).l(10.0, 0.0).l(10.0, 10.0);
        let (p, angle) = path.point_at_length(15.0).unwrap();
        assert_eq!(p, DVec2::new(10.0, 5.0));
        assert!((angle - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!(path.point_at_length(25.0).is_none());
    }

    #[test]
    fn vertices_carry_tangents() {
        let path = PathData::new().m(0.0, 0.0).l(10.0, 0.0).l(10.0, 10.0);
        let vertices = path.vertices();
        assert_eq!(vertices.len(), 3);
        assert_eq!(vertices[0].tangent_out, DVec2::new(10.0, 0.0));
        assert_eq!(vertices[1].tangent_in, DVec2::new(10.0, 0.0));
        assert_eq!(vertices[1].tangent_out, DVec2::new(0.0, 10.0));
        assert_eq!(vertices[2].tangent_in, DVec2::new(0.0, 10.0));
    }

    #[test]
    fn transformed_moves_every_point() {
        let path = PathData::rect(0.0, 0.0, 1.0, 1.0)
            .transformed(&DAffine2::from_translation(DVec2::new(5.0, 5.0)));
        assert_eq!(path.bounds(), BBox::from_rect(5.0, 5.0, 1.0, 1.0));
    }
}
