//! Scene node model.
//!
//! Nodes live in a [`SceneTree`] arena and are addressed by [`NodeId`].
//! Cross references (`href`, `url(#id)`) are stored as typed, non-owning
//! [`Ref`]s that are dereferenced through the tree at render time, so a
//! node can be referenced from many places (and from itself) without
//! ownership cycles.

/// Implements the attribute accessors of [`Renderable`] for a node storing a
/// [`Presentation`] in its `presentation` field.
macro_rules! presentation_accessors {
    () => {
        fn geometry(&self) -> &$crate::nodes::GeometryContext {
            &self.presentation.geometry
        }

        fn paint(&self) -> &$crate::attributes::PaintContext {
            &self.presentation.paint
        }

        fn font(&self) -> &$crate::attributes::FontSpec {
            &self.presentation.font
        }
    };
}

pub mod capabilities;
pub mod effects;
pub mod kind;
pub mod marker;
pub mod paint_server;
pub mod shapes;
pub mod structure;
pub mod text;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use enum_dispatch::enum_dispatch;

use crate::attributes::AttributeView;

pub use capabilities::{GeometryContext, HasShape, Presentation, Renderable, TextSegment};
pub use effects::{ClipPath, Filter, Mask};
pub use kind::{NodeKind, create_node};
pub use marker::Marker;
pub use paint_server::{LinearGradient, RadialGradient, SolidColor, Stop};
pub use shapes::{Circle, Ellipse, Line, Path, Polyline, Rect};
pub use structure::{Defs, Descriptive, Group, Svg, Symbol, Use};
pub use text::{CharData, TSpan, Text, TextPath};

// ============================================================================
// Identity and references
// ============================================================================

/// Index of a node in its [`SceneTree`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub const fn new(index: usize) -> Self {
        NodeId(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

/// Decides which node kinds a [`Ref`] may point at.
pub trait RefTarget {
    fn accepts(kind: NodeKind) -> bool;
}

/// A resolved, type-checked reference to another node.
pub struct Ref<T> {
    id: NodeId,
    _target: PhantomData<fn() -> T>,
}

impl<T> Ref<T> {
    pub(crate) fn new(id: NodeId) -> Self {
        Ref {
            id,
            _target: PhantomData,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Ref<T> {}

impl<T> PartialEq for Ref<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Ref<T> {}

impl<T> Hash for Ref<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ref({})", self.id.0)
    }
}

macro_rules! ref_target {
    ($(#[$meta:meta])* $name:ident => |$kind:ident| $accepts:expr) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub enum $name {}

        impl RefTarget for $name {
            fn accepts($kind: NodeKind) -> bool {
                $accepts
            }
        }
    };
}

ref_target!(
    /// Anything `use` can instantiate
    AnyRenderable => |kind| kind.is_renderable()
);
ref_target!(
    /// Anything with an outline (`textPath` targets)
    AnyShape => |kind| kind.is_shape()
);
ref_target!(
    /// Gradients and solid colors
    AnyPaintServer => |kind| kind.is_paint_server()
);
ref_target!(
    /// Gradients, for stop inheritance
    AnyGradient => |kind| kind.is_gradient()
);

impl RefTarget for ClipPath {
    fn accepts(kind: NodeKind) -> bool {
        kind == NodeKind::ClipPath
    }
}

impl RefTarget for Mask {
    fn accepts(kind: NodeKind) -> bool {
        kind == NodeKind::Mask
    }
}

impl RefTarget for Filter {
    fn accepts(kind: NodeKind) -> bool {
        kind == NodeKind::Filter
    }
}

impl RefTarget for Marker {
    fn accepts(kind: NodeKind) -> bool {
        kind == NodeKind::Marker
    }
}

// ============================================================================
// Node
// ============================================================================

/// Behavior shared by every node kind
#[enum_dispatch]
pub trait SvgNode {
    fn kind(&self) -> NodeKind;

    /// Resolve attributes. Called once per node, after the whole document
    /// has been read, children before parents.
    fn build(&mut self, attrs: &AttributeView<'_>);

    fn as_renderable(&self) -> Option<&dyn Renderable> {
        None
    }

    fn as_shape(&self) -> Option<&dyn HasShape> {
        None
    }

    fn as_text_segment(&self) -> Option<&dyn TextSegment> {
        None
    }
}

/// A scene node of any kind
#[enum_dispatch(SvgNode)]
#[derive(Debug, Clone)]
pub enum Node {
    Svg(Svg),
    Group(Group),
    Defs(Defs),
    Symbol(Symbol),
    Use(Use),
    Descriptive(Descriptive),
    Rect(Rect),
    Circle(Circle),
    Ellipse(Ellipse),
    Line(Line),
    Polyline(Polyline),
    Path(Path),
    LinearGradient(LinearGradient),
    RadialGradient(RadialGradient),
    Stop(Stop),
    SolidColor(SolidColor),
    ClipPath(ClipPath),
    Mask(Mask),
    Filter(Filter),
    Marker(Marker),
    Text(Text),
    TSpan(TSpan),
    TextPath(TextPath),
    CharData(CharData),
}

// ============================================================================
// Scene tree
// ============================================================================

#[derive(Debug, Clone)]
struct Entry {
    node: Node,
    /// Declared id, if it was the first element to claim it
    id: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena holding every node of one document
#[derive(Debug, Clone, Default)]
pub struct SceneTree {
    entries: Vec<Entry>,
}

impl SceneTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a detached node.
    pub fn push(&mut self, node: Node, id: Option<String>) -> NodeId {
        let node_id = NodeId(self.entries.len());
        self.entries.push(Entry {
            node,
            id,
            parent: None,
            children: Vec::new(),
        });
        node_id
    }

    /// Append `child` to `parent`'s children (document order).
    pub fn link(&mut self, parent: NodeId, child: NodeId) {
        self.entries[child.0].parent = Some(parent);
        self.entries[parent.0].children.push(child);
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.entries[id.0].node
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.entries[id.0].node
    }

    pub fn resolve<T>(&self, r: Ref<T>) -> &Node {
        self.node(r.id())
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.entries[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entries[id.0].parent
    }

    pub fn element_id(&self, id: NodeId) -> Option<&str> {
        self.entries[id.0].id.as_deref()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.entries[id.0].children.last().copied()
    }

    /// Structural search for the node that owns `id`.
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.entries
            .iter()
            .position(|e| e.id.as_deref() == Some(id))
            .map(NodeId)
    }

    /// Nodes in post-order (children before parents) starting at `root`.
    pub fn post_order(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.entries.len());
        let mut stack = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                out.push(id);
                continue;
            }
            stack.push((id, true));
            for child in self.children(id).iter().rev() {
                stack.push((*child, false));
            }
        }
        out
    }

    /// Concatenated character data below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.post_order(id) {
            if let Node::CharData(chars) = self.node(node) {
                out.push_str(chars.text());
            }
        }
        out
    }

    /// An indented outline of the subtree at `id`, one node per line.
    pub fn outline(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![(id, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            out.push_str(&"  ".repeat(depth));
            match self.node(node) {
                Node::CharData(chars) => out.push_str(&format!("{:?}", chars.text())),
                other => {
                    out.push_str(other.kind().tag_name());
                    if let Some(element_id) = self.element_id(node) {
                        out.push_str(&format!(" #{element_id}"));
                    }
                }
            }
            out.push('\n');
            for child in self.children(node).iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
        out
    }
}
