//! Geometry utilities: path data, lazily cached shapes, marker orientation
//! and viewport math.

pub mod orientation;
pub mod path;
pub mod path_data;
pub mod shape;
pub mod view_box;

pub use orientation::{MarkerOrientation, MarkerType};
pub use path::{PathData, PathSegment, PathVertex, Polyline};
pub use path_data::parse_path_data;
pub use shape::SvgShape;
pub use view_box::{Align, PreserveAspectRatio, ViewBox};

use crate::types::{Axis, Size};

/// Normalized diagonal of a viewport: `sqrt((w² + h²) / 2)`.
///
/// The division happens under the root, which keeps one less rounding step
/// than dividing `hypot(w, h)` by `sqrt(2)`.
#[inline]
pub fn normed_diagonal(size: Size) -> f64 {
    ((size.w * size.w + size.h * size.h) / 2.0).sqrt()
}

/// Everything a [`crate::Length`] needs to resolve to user units
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeasureContext {
    /// Size of the nearest viewport (percent reference box)
    pub viewport: Size,
    /// Current font size in user units
    pub em: f64,
    /// x-height, approximated as half the font size
    pub ex: f64,
}

impl MeasureContext {
    pub fn new(viewport: Size, em: f64) -> Self {
        MeasureContext {
            viewport,
            em,
            ex: em / 2.0,
        }
    }

    pub fn with_viewport(self, viewport: Size) -> Self {
        MeasureContext { viewport, ..self }
    }

    pub fn with_em(self, em: f64) -> Self {
        MeasureContext::new(self.viewport, em)
    }

    pub fn normed_diagonal(&self) -> f64 {
        normed_diagonal(self.viewport)
    }

    /// Reference length for percentages along `axis`.
    pub fn axis_length(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.viewport.w,
            Axis::Vertical => self.viewport.h,
            Axis::Diagonal => self.normed_diagonal(),
        }
    }
}

impl Default for MeasureContext {
    fn default() -> Self {
        MeasureContext::new(Size::new(100.0, 100.0), 16.0)
    }
}
