//! Loaded documents.

use crate::errors::RenderError;
use crate::geometry::ViewBox;
use crate::log::debug;
use crate::nodes::{Node, NodeId, NodeKind, SceneTree, SvgNode};
use crate::renderer::{DEFAULT_FONT_SIZE, RenderContext, RenderOptions, Renderer, Surface};
use crate::nodes::structure::DEFAULT_SIZE;
use crate::types::Size;

/// A fully built scene tree and its root
#[derive(Debug, Clone)]
pub struct Document {
    tree: SceneTree,
    root: NodeId,
}

impl Document {
    pub(crate) fn new(tree: SceneTree, root: NodeId) -> Self {
        Document { tree, root }
    }

    pub fn root(&self) -> &Node {
        self.tree.node(self.root)
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn tree(&self) -> &SceneTree {
        &self.tree
    }

    /// Intrinsic size of the document. Roots other than `svg` get the
    /// default 100x100.
    pub fn size(&self) -> Size {
        match self.root() {
            Node::Svg(svg) => svg.intrinsic_size(DEFAULT_FONT_SIZE),
            _ => Size::new(DEFAULT_SIZE, DEFAULT_SIZE),
        }
    }

    pub fn view_box(&self) -> Option<ViewBox> {
        match self.root() {
            Node::Svg(svg) => svg.view_box,
            _ => None,
        }
    }

    /// Text of the first `title` directly below the root.
    pub fn title(&self) -> Option<String> {
        self.tree
            .children(self.root)
            .iter()
            .find(|child| self.tree.node(**child).kind() == NodeKind::Title)
            .map(|title| self.tree.text_content(*title).trim().to_string())
    }

    /// Node owning the declared `id`.
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree.find_by_id(id)
    }

    /// Indented outline of the whole tree.
    pub fn outline(&self) -> String {
        self.tree.outline(self.root)
    }

    /// Draw the document onto `surface`.
    ///
    /// The document fills `options.viewport`, or its own size when none is
    /// given.
    pub fn render(&self, surface: &mut dyn Surface, options: &RenderOptions) -> Result<(), RenderError> {
        let viewport = options.viewport.unwrap_or_else(|| self.size());
        debug!(width = viewport.w, height = viewport.h, "render document");
        let ctx = RenderContext::root(viewport, options);
        Renderer::new(&self.tree, surface).render_node(self.root, &ctx)
    }
}
