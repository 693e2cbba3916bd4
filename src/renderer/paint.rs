//! Paint resolution: turns a [`Paint`] into something a surface can draw
//! with, following gradient `href` chains for stops and attributes.

use glam::{DAffine2, DVec2};

use super::RenderContext;
use super::surface::{GradientPaint, GradientShape, GradientStop, SurfacePaint};
use crate::attributes::Paint;
use crate::geometry::MeasureContext;
use crate::log::warn;
use crate::nodes::effects::CoordinateUnits;
use crate::nodes::paint_server::{GradientAttributes, SpreadMethod};
use crate::nodes::{Node, NodeId, SceneTree};
use crate::types::{BBox, Length, Size, Unit};

const HALF: Length = Length::new(50.0, Unit::Percent);
const FULL: Length = Length::new(100.0, Unit::Percent);

enum Resolved {
    Paint(SurfacePaint),
    /// The server exists but paints nothing (no stops, degenerate box)
    Nothing,
    /// The reference is unusable; the fallback applies
    Fallback,
}

/// Resolve `paint` for an element with the given user-space `bounds`.
///
/// `opacity` is the fill or stroke opacity; group opacity is applied by
/// layers, not here. `None` means nothing is drawn.
pub fn resolve_paint(
    tree: &SceneTree,
    paint: &Paint,
    opacity: f64,
    bounds: &BBox,
    ctx: &RenderContext,
) -> Option<SurfacePaint> {
    match paint {
        Paint::None => None,
        Paint::CurrentColor => Some(SurfacePaint::Color(ctx.color.with_opacity(opacity))),
        Paint::Color(color) => Some(SurfacePaint::Color(color.with_opacity(opacity))),
        Paint::Server { server, fallback } => {
            match resolve_server(tree, server.id(), opacity, bounds, ctx) {
                Resolved::Paint(paint) => Some(paint),
                Resolved::Nothing => None,
                Resolved::Fallback => fallback
                    .as_deref()
                    .and_then(|fallback| resolve_paint(tree, fallback, opacity, bounds, ctx)),
            }
        }
    }
}

fn resolve_server(
    tree: &SceneTree,
    server: NodeId,
    opacity: f64,
    bounds: &BBox,
    ctx: &RenderContext,
) -> Resolved {
    match tree.node(server) {
        Node::SolidColor(solid) => Resolved::Paint(SurfacePaint::Color(
            solid.color.with_opacity(solid.opacity * opacity),
        )),
        Node::LinearGradient(_) | Node::RadialGradient(_) => {
            resolve_gradient(tree, server, opacity, bounds, ctx)
        }
        _ => Resolved::Fallback,
    }
}

fn gradient_attributes(node: &Node) -> Option<&GradientAttributes> {
    match node {
        Node::LinearGradient(g) => Some(&g.attributes),
        Node::RadialGradient(g) => Some(&g.attributes),
        _ => None,
    }
}

/// `start` followed by the gradients it inherits from, cycles cut.
pub fn gradient_chain(tree: &SceneTree, start: NodeId) -> Vec<NodeId> {
    let mut chain = vec![start];
    let mut current = start;
    while let Some(next) = gradient_attributes(tree.node(current)).and_then(|a| a.href) {
        if chain.contains(&next.id()) {
            warn!(
                gradient = tree.element_id(start).unwrap_or_default(),
                "gradient href cycle"
            );
            break;
        }
        chain.push(next.id());
        current = next.id();
    }
    chain
}

/// Stops declared directly on `gradient`; offsets are clamped to 0..=1 and
/// made non-decreasing.
pub fn collect_stops(tree: &SceneTree, gradient: NodeId) -> Vec<GradientStop> {
    let mut floor = 0.0_f64;
    tree.children(gradient)
        .iter()
        .filter_map(|child| match tree.node(*child) {
            Node::Stop(stop) => Some(stop),
            _ => None,
        })
        .map(|stop| {
            let offset = stop.offset.clamp(0.0, 1.0).max(floor);
            floor = offset;
            GradientStop {
                offset,
                color: stop.color.with_opacity(stop.opacity),
            }
        })
        .collect()
}

/// First value along the chain.
fn inherited<T>(tree: &SceneTree, chain: &[NodeId], get: impl Fn(&Node) -> Option<T>) -> Option<T> {
    chain.iter().find_map(|id| get(tree.node(*id)))
}

fn inherited_attr<T>(
    tree: &SceneTree,
    chain: &[NodeId],
    get: impl Fn(&GradientAttributes) -> Option<T>,
) -> Option<T> {
    inherited(tree, chain, |node| gradient_attributes(node).and_then(&get))
}

fn resolve_gradient(
    tree: &SceneTree,
    gradient: NodeId,
    opacity: f64,
    bounds: &BBox,
    ctx: &RenderContext,
) -> Resolved {
    let chain = gradient_chain(tree, gradient);
    let stops = chain
        .iter()
        .map(|id| collect_stops(tree, *id))
        .find(|stops| !stops.is_empty())
        .unwrap_or_default();
    let last = match stops.as_slice() {
        [] => return Resolved::Nothing,
        [only] => return Resolved::Paint(SurfacePaint::Color(only.color.with_opacity(opacity))),
        [.., last] => SurfacePaint::Color(last.color.with_opacity(opacity)),
    };

    let units = inherited_attr(tree, &chain, |a| a.units)
        .unwrap_or(CoordinateUnits::ObjectBoundingBox);
    let spread: SpreadMethod = inherited_attr(tree, &chain, |a| a.spread).unwrap_or_default();
    let gradient_transform =
        inherited_attr(tree, &chain, |a| a.transform).unwrap_or(DAffine2::IDENTITY);

    let (measure, units_transform) = match units {
        CoordinateUnits::ObjectBoundingBox => {
            if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
                return Resolved::Nothing;
            }
            (
                MeasureContext::new(Size::new(1.0, 1.0), ctx.measure.em),
                DAffine2::from_translation(bounds.min)
                    * DAffine2::from_scale(DVec2::new(bounds.width(), bounds.height())),
            )
        }
        CoordinateUnits::UserSpaceOnUse => (ctx.measure, DAffine2::IDENTITY),
    };

    let shape = match tree.node(gradient) {
        Node::LinearGradient(_) => {
            let coord = |get: fn(&crate::nodes::LinearGradient) -> Option<Length>, default| {
                inherited(tree, &chain, |node| match node {
                    Node::LinearGradient(g) => get(g),
                    _ => None,
                })
                .unwrap_or(default)
            };
            let start = DVec2::new(
                coord(|g| g.x1, Length::ZERO).resolve_width(&measure),
                coord(|g| g.y1, Length::ZERO).resolve_height(&measure),
            );
            let end = DVec2::new(
                coord(|g| g.x2, FULL).resolve_width(&measure),
                coord(|g| g.y2, Length::ZERO).resolve_height(&measure),
            );
            if start == end {
                return Resolved::Paint(last);
            }
            GradientShape::Linear { start, end }
        }
        Node::RadialGradient(_) => {
            let coord = |get: fn(&crate::nodes::RadialGradient) -> Option<Length>| {
                inherited(tree, &chain, |node| match node {
                    Node::RadialGradient(g) => get(g),
                    _ => None,
                })
            };
            let cx = coord(|g| g.cx).unwrap_or(HALF);
            let cy = coord(|g| g.cy).unwrap_or(HALF);
            let center = DVec2::new(cx.resolve_width(&measure), cy.resolve_height(&measure));
            let focus = DVec2::new(
                coord(|g| g.fx).unwrap_or(cx).resolve_width(&measure),
                coord(|g| g.fy).unwrap_or(cy).resolve_height(&measure),
            );
            let radius = coord(|g| g.r).unwrap_or(HALF).resolve_length(&measure);
            if radius <= 0.0 {
                return Resolved::Paint(last);
            }
            GradientShape::Radial {
                center,
                radius,
                focus,
            }
        }
        _ => return Resolved::Fallback,
    };

    Resolved::Paint(SurfacePaint::Gradient(GradientPaint {
        shape,
        stops,
        spread,
        transform: units_transform * gradient_transform,
        opacity,
    }))
}
