//! Node kinds and the static tag table.

use std::collections::HashMap;
use std::sync::OnceLock;

use super::Node;
use super::effects::{ClipPath, Filter, Mask};
use super::marker::Marker;
use super::paint_server::{LinearGradient, RadialGradient, SolidColor, Stop};
use super::shapes::{Circle, Ellipse, Line, Path, Polyline, Rect};
use super::structure::{Defs, Descriptive, Group, Svg, Symbol, Use};
use super::text::{TSpan, Text, TextPath};

/// Every kind of node a scene tree can hold
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    A,
    Circle,
    ClipPath,
    Defs,
    Desc,
    Ellipse,
    Filter,
    G,
    Line,
    LinearGradient,
    Marker,
    Mask,
    Metadata,
    Path,
    Polygon,
    Polyline,
    RadialGradient,
    Rect,
    SolidColor,
    Stop,
    Style,
    Svg,
    Symbol,
    Text,
    TextPath,
    Title,
    TSpan,
    Use,
    /// Character data inside a text-accepting element
    CharData,
}

type NodeCreateFn = fn() -> Node;

static NODE_CREATORS: OnceLock<HashMap<&'static str, (NodeKind, NodeCreateFn)>> = OnceLock::new();

#[rustfmt::skip]
fn node_creators() -> &'static HashMap<&'static str, (NodeKind, NodeCreateFn)> {
    NODE_CREATORS.get_or_init(|| {
        // Keys are lowercase; lookups lowercase the tag first.
        let table: Vec<(&'static str, NodeKind, NodeCreateFn)> = vec![
            ("a",              NodeKind::A,              || Group::new(NodeKind::A).into()),
            ("circle",         NodeKind::Circle,         || Circle::default().into()),
            ("clippath",       NodeKind::ClipPath,       || ClipPath::default().into()),
            ("defs",           NodeKind::Defs,           || Defs.into()),
            ("desc",           NodeKind::Desc,           || Descriptive::new(NodeKind::Desc).into()),
            ("ellipse",        NodeKind::Ellipse,        || Ellipse::default().into()),
            ("filter",         NodeKind::Filter,         || Filter::default().into()),
            ("g",              NodeKind::G,              || Group::new(NodeKind::G).into()),
            ("line",           NodeKind::Line,           || Line::default().into()),
            ("lineargradient", NodeKind::LinearGradient, || LinearGradient::default().into()),
            ("marker",         NodeKind::Marker,         || Marker::default().into()),
            ("mask",           NodeKind::Mask,           || Mask::default().into()),
            ("metadata",       NodeKind::Metadata,       || Descriptive::new(NodeKind::Metadata).into()),
            ("path",           NodeKind::Path,           || Path::default().into()),
            ("polygon",        NodeKind::Polygon,        || Polyline::new(true).into()),
            ("polyline",       NodeKind::Polyline,       || Polyline::new(false).into()),
            ("radialgradient", NodeKind::RadialGradient, || RadialGradient::default().into()),
            ("rect",           NodeKind::Rect,           || Rect::default().into()),
            ("solidcolor",     NodeKind::SolidColor,     || SolidColor::default().into()),
            ("stop",           NodeKind::Stop,           || Stop::default().into()),
            ("style",          NodeKind::Style,          || Descriptive::new(NodeKind::Style).into()),
            ("svg",            NodeKind::Svg,            || Svg::default().into()),
            ("symbol",         NodeKind::Symbol,         || Symbol::default().into()),
            ("text",           NodeKind::Text,           || Text::default().into()),
            ("textpath",       NodeKind::TextPath,       || TextPath::default().into()),
            ("title",          NodeKind::Title,          || Descriptive::new(NodeKind::Title).into()),
            ("tspan",          NodeKind::TSpan,          || TSpan::default().into()),
            ("use",            NodeKind::Use,            || Use::default().into()),
        ];
        table.into_iter().map(|(name, kind, create)| (name, (kind, create))).collect()
    })
}

/// Instantiate a default node for `tag` (case-insensitive).
pub fn create_node(tag: &str) -> Option<(NodeKind, Node)> {
    let key = tag.to_ascii_lowercase();
    node_creators()
        .get(key.as_str())
        .map(|&(kind, create)| (kind, create()))
}

impl NodeKind {
    /// Canonical tag name
    #[rustfmt::skip]
    pub fn tag_name(self) -> &'static str {
        match self {
            NodeKind::A              => "a",
            NodeKind::Circle         => "circle",
            NodeKind::ClipPath       => "clipPath",
            NodeKind::Defs           => "defs",
            NodeKind::Desc           => "desc",
            NodeKind::Ellipse        => "ellipse",
            NodeKind::Filter         => "filter",
            NodeKind::G              => "g",
            NodeKind::Line           => "line",
            NodeKind::LinearGradient => "linearGradient",
            NodeKind::Marker         => "marker",
            NodeKind::Mask           => "mask",
            NodeKind::Metadata       => "metadata",
            NodeKind::Path           => "path",
            NodeKind::Polygon        => "polygon",
            NodeKind::Polyline       => "polyline",
            NodeKind::RadialGradient => "radialGradient",
            NodeKind::Rect           => "rect",
            NodeKind::SolidColor     => "solidColor",
            NodeKind::Stop           => "stop",
            NodeKind::Style          => "style",
            NodeKind::Svg            => "svg",
            NodeKind::Symbol         => "symbol",
            NodeKind::Text           => "text",
            NodeKind::TextPath       => "textPath",
            NodeKind::Title          => "title",
            NodeKind::TSpan          => "tspan",
            NodeKind::Use            => "use",
            NodeKind::CharData       => "#text",
        }
    }

    /// Elements whose character data is kept
    pub fn accepts_chars(self) -> bool {
        matches!(
            self,
            NodeKind::Text
                | NodeKind::TSpan
                | NodeKind::TextPath
                | NodeKind::Title
                | NodeKind::Desc
                | NodeKind::Style
        )
    }

    pub fn is_text_segment(self) -> bool {
        matches!(self, NodeKind::TSpan | NodeKind::TextPath | NodeKind::CharData)
    }

    pub fn is_text_container(self) -> bool {
        matches!(self, NodeKind::Text | NodeKind::TSpan | NodeKind::TextPath)
    }

    /// Kinds that hold element children. Shapes, `use`, stops and the
    /// descriptive elements are leaves.
    pub fn is_container(self) -> bool {
        self.is_text_container()
            || self.is_gradient()
            || matches!(
                self,
                NodeKind::A
                    | NodeKind::ClipPath
                    | NodeKind::Defs
                    | NodeKind::Filter
                    | NodeKind::G
                    | NodeKind::Marker
                    | NodeKind::Mask
                    | NodeKind::Svg
                    | NodeKind::Symbol
            )
    }

    /// Content model of a parent of this kind.
    pub fn accepts_child(self, child: NodeKind) -> bool {
        if child == NodeKind::CharData {
            return self.accepts_chars();
        }
        if self.is_text_container() {
            return child.is_text_segment();
        }
        match self {
            NodeKind::LinearGradient | NodeKind::RadialGradient => child == NodeKind::Stop,
            _ => self.is_container(),
        }
    }

    pub fn is_shape(self) -> bool {
        matches!(
            self,
            NodeKind::Circle
                | NodeKind::Ellipse
                | NodeKind::Line
                | NodeKind::Path
                | NodeKind::Polygon
                | NodeKind::Polyline
                | NodeKind::Rect
        )
    }

    /// Kinds drawn where they appear in the tree. The rest (symbols,
    /// resources, text segments) are only drawn through a reference or
    /// their container.
    pub fn paints_in_place(self) -> bool {
        self.is_shape()
            || matches!(
                self,
                NodeKind::A | NodeKind::G | NodeKind::Svg | NodeKind::Text | NodeKind::Use
            )
    }

    pub fn is_renderable(self) -> bool {
        self.paints_in_place()
            || matches!(self, NodeKind::Symbol | NodeKind::TSpan | NodeKind::TextPath)
    }

    pub fn is_gradient(self) -> bool {
        matches!(self, NodeKind::LinearGradient | NodeKind::RadialGradient)
    }

    pub fn is_paint_server(self) -> bool {
        self.is_gradient() || self == NodeKind::SolidColor
    }
}
