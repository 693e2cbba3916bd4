//! Lazily computed, cached shape geometry.
//!
//! Shapes whose outline does not depend on the viewport (`path`,
//! `polyline`, `polygon`) keep their source around and compute path, bounds
//! and length on first access. The cells are `OnceLock`s, so a built tree
//! can be rendered from several threads at once.

use std::sync::OnceLock;

use glam::DVec2;

use super::path::PathData;
use super::path_data::parse_path_data;
use crate::types::BBox;

#[derive(Debug, Clone, Default)]
enum ShapeSource {
    #[default]
    Empty,
    PathData(String),
    Points { points: Vec<DVec2>, closed: bool },
}

/// A shape with compute-once path, bounds and length.
#[derive(Debug, Clone, Default)]
pub struct SvgShape {
    source: ShapeSource,
    path: OnceLock<PathData>,
    bounds: OnceLock<BBox>,
    length: OnceLock<f64>,
}

impl SvgShape {
    /// A shape from a `d` attribute; the string is decoded on first use.
    pub fn from_path_data(d: impl Into<String>) -> Self {
        SvgShape {
            source: ShapeSource::PathData(d.into()),
            ..Default::default()
        }
    }

    /// A polyline (or polygon when `closed`).
    pub fn from_points(points: Vec<DVec2>, closed: bool) -> Self {
        SvgShape {
            source: ShapeSource::Points { points, closed },
            ..Default::default()
        }
    }

    pub fn path(&self) -> &PathData {
        self.path.get_or_init(|| match &self.source {
            ShapeSource::Empty => PathData::new(),
            ShapeSource::PathData(d) => parse_path_data(d),
            ShapeSource::Points { points, closed } => {
                let mut path = PathData::new();
                let mut it = points.iter();
                if let Some(first) = it.next() {
                    path.move_to(*first);
                    for p in it {
                        path.line_to(*p);
                    }
                    if *closed {
                        path.close();
                    }
                }
                path
            }
        })
    }

    pub fn bounds(&self) -> BBox {
        *self.bounds.get_or_init(|| self.path().bounds())
    }

    pub fn length(&self) -> f64 {
        *self.length.get_or_init(|| self.path().length())
    }

    /// Whether the path has been computed yet.
    pub fn is_computed(&self) -> bool {
        self.path.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_is_computed_lazily_once() {
        let shape = SvgShape::from_path_data("M0 0 H10 V10 Z");
        assert!(!shape.is_computed());
        let first = shape.path() as *const PathData;
        assert!(shape.is_computed());
        assert_eq!(first, shape.path() as *const PathData);
    }

    #[test]
    fn polygon_closes_and_measures_perimeter() {
        let shape = SvgShape::from_points(
            vec![DVec2::new(0.0, 0.0), DVec2::new(3.0, 0.0), DVec2::new(3.0, 4.0)],
            true,
        );
        assert!((shape.length() - 12.0).abs() < 1e-9);
        assert_eq!(shape.bounds(), BBox::from_rect(0.0, 0.0, 3.0, 4.0));
    }

    #[test]
    fn empty_shape_has_empty_bounds() {
        let shape = SvgShape::default();
        assert!(shape.bounds().is_empty());
        assert_eq!(shape.length(), 0.0);
    }

    #[test]
    fn shared_across_threads() {
        let shape = std::sync::Arc::new(SvgShape::from_path_data("M0 0 L30 40"));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shape = shape.clone();
                std::thread::spawn(move || shape.length())
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 50.0);
        }
    }
}
