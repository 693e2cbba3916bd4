//! `viewBox` and `preserveAspectRatio`.

use glam::{DAffine2, DVec2};

use super::normed_diagonal;
use crate::attributes::parser::parse_number_list;
use crate::types::Size;

/// The user-space rectangle mapped onto a viewport
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl ViewBox {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        ViewBox { x, y, w, h }
    }

    /// Parse `min-x min-y width height`. Negative or zero extents are
    /// rejected, which disables the view box.
    pub fn parse(s: &str) -> Option<ViewBox> {
        match parse_number_list(s).as_slice() {
            [x, y, w, h] if *w > 0.0 && *h > 0.0 => Some(ViewBox::new(*x, *y, *w, *h)),
            _ => None,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.w, self.h)
    }

    pub fn normed_diagonal(&self) -> f64 {
        normed_diagonal(self.size())
    }
}

/// Alignment of the view box inside the viewport along one axis
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Align {
    Min,
    #[default]
    Mid,
    Max,
}

impl Align {
    fn factor(self) -> f64 {
        match self {
            Align::Min => 0.0,
            Align::Mid => 0.5,
            Align::Max => 1.0,
        }
    }
}

/// Parsed `preserveAspectRatio`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PreserveAspectRatio {
    /// `None` stretches non-uniformly
    pub align: Option<(Align, Align)>,
    /// `slice` covers the viewport, `meet` fits inside it
    pub slice: bool,
}

impl Default for PreserveAspectRatio {
    fn default() -> Self {
        PreserveAspectRatio {
            align: Some((Align::Mid, Align::Mid)),
            slice: false,
        }
    }
}

impl PreserveAspectRatio {
    pub fn parse(s: &str) -> Option<PreserveAspectRatio> {
        let mut words = s.split_whitespace();
        let mut align_word = words.next()?;
        if align_word == "defer" {
            align_word = words.next()?;
        }
        let align = if align_word == "none" {
            None
        } else {
            let axis = |part: &str| match part {
                "Min" => Some(Align::Min),
                "Mid" => Some(Align::Mid),
                "Max" => Some(Align::Max),
                _ => None,
            };
            let rest = align_word.strip_prefix('x')?;
            let (x, y) = rest.split_once('Y')?;
            Some((axis(x)?, axis(y)?))
        };
        let slice = match words.next() {
            None | Some("meet") => false,
            Some("slice") => true,
            Some(_) => return None,
        };
        Some(PreserveAspectRatio { align, slice })
    }

    /// Transform mapping `view_box` into a viewport of `viewport` size at
    /// the origin.
    pub fn transform(&self, view_box: &ViewBox, viewport: Size) -> DAffine2 {
        let sx = viewport.w / view_box.w;
        let sy = viewport.h / view_box.h;
        let origin = DVec2::new(view_box.x, view_box.y);

        let Some((ax, ay)) = self.align else {
            return DAffine2::from_scale(DVec2::new(sx, sy))
                * DAffine2::from_translation(-origin);
        };

        let scale = if self.slice { sx.max(sy) } else { sx.min(sy) };
        let slack = DVec2::new(
            viewport.w - view_box.w * scale,
            viewport.h - view_box.h * scale,
        );
        let offset = DVec2::new(slack.x * ax.factor(), slack.y * ay.factor());
        DAffine2::from_translation(offset)
            * DAffine2::from_scale(DVec2::splat(scale))
            * DAffine2::from_translation(-origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_view_box() {
        assert_eq!(
            ViewBox::parse("0 0 100 50"),
            Some(ViewBox::new(0.0, 0.0, 100.0, 50.0))
        );
        assert_eq!(
            ViewBox::parse("-10,-10,20,20"),
            Some(ViewBox::new(-10.0, -10.0, 20.0, 20.0))
        );
        assert_eq!(ViewBox::parse("0 0 0 10"), None);
        assert_eq!(ViewBox::parse("0 0 10"), None);
    }

    #[test]
    fn parses_preserve_aspect_ratio() {
        let par = PreserveAspectRatio::parse("xMinYMax slice").unwrap();
        assert_eq!(par.align, Some((Align::Min, Align::Max)));
        assert!(par.slice);
        assert_eq!(PreserveAspectRatio::parse("none").unwrap().align, None);
        assert!(PreserveAspectRatio::parse("xFooYMid").is_none());
    }

    #[test]
    fn meet_centers_the_view_box() {
        let vb = ViewBox::new(0.0, 0.0, 10.0, 10.0);
        let t = PreserveAspectRatio::default().transform(&vb, Size::new(200.0, 100.0));
        assert_eq!(t.transform_point2(DVec2::ZERO), DVec2::new(50.0, 0.0));
        assert_eq!(t.transform_point2(DVec2::new(10.0, 10.0)), DVec2::new(150.0, 100.0));
    }

    #[test]
    fn none_stretches() {
        let vb = ViewBox::new(5.0, 5.0, 10.0, 10.0);
        let par = PreserveAspectRatio::parse("none").unwrap();
        let t = par.transform(&vb, Size::new(20.0, 40.0));
        assert_eq!(t.transform_point2(DVec2::new(15.0, 15.0)), DVec2::new(20.0, 40.0));
    }
}
