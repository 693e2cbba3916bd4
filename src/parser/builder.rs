//! Two-phase document construction.
//!
//! Phase one runs while the markup is read: every start tag becomes a node
//! with its raw attributes and is linked under the enclosing element, and
//! every declared id is registered. Nothing is resolved yet, so references
//! may point forward.
//!
//! Phase two runs once the input is exhausted. Every node is built from its
//! attributes in post-order (children before parents) with the complete
//! [`NameRegistry`] available, after which the raw attributes and the
//! registry are dropped.

use std::collections::HashMap;

use super::{LoaderOptions, NameRegistry};
use crate::attributes::{AttributeView, RawElement};
use crate::document::Document;
use crate::log::{debug, trace, warn};
use crate::nodes::{CharData, Node, NodeId, NodeKind, SceneTree, SvgNode, create_node};

/// An element whose end tag has not been seen yet
#[derive(Debug)]
struct OpenElement {
    node: NodeId,
    kind: NodeKind,
    tag: String,
}

pub(crate) struct DocumentBuilder<'o> {
    options: &'o LoaderOptions,
    tree: SceneTree,
    /// Raw attributes, indexed like the tree
    elements: Vec<RawElement>,
    registry: NameRegistry,
    stack: Vec<OpenElement>,
    root: Option<NodeId>,
    /// Depth inside an ignored subtree; 0 when not skipping
    skip_depth: usize,
}

impl<'o> DocumentBuilder<'o> {
    pub(crate) fn new(options: &'o LoaderOptions) -> Self {
        DocumentBuilder {
            options,
            tree: SceneTree::new(),
            elements: Vec::new(),
            registry: NameRegistry::default(),
            stack: Vec::new(),
            root: None,
            skip_depth: 0,
        }
    }

    fn push_node(&mut self, node: Node, id: Option<String>, element: RawElement) -> NodeId {
        let node_id = self.tree.push(node, id);
        self.elements.push(element);
        node_id
    }

    pub(crate) fn start_element(&mut self, tag: &str, attributes: HashMap<String, String>) {
        if self.skip_depth > 0 {
            self.skip_depth += 1;
            return;
        }
        if self.root.is_some() && self.stack.is_empty() {
            warn!(tag, "element after the document root ignored");
            self.skip_depth = 1;
            return;
        }
        if self.stack.len() >= self.options.max_depth {
            warn!(tag, max_depth = self.options.max_depth, "nesting too deep, skipping subtree");
            self.skip_depth = 1;
            return;
        }
        let Some((kind, node)) = create_node(tag) else {
            debug!(tag, "unsupported element, skipping subtree");
            self.skip_depth = 1;
            return;
        };

        let owned_id = match attributes.get("id") {
            Some(id) if self.registry.contains(id) => {
                warn!(id = id.as_str(), tag, "duplicate id ignored");
                None
            }
            Some(id) => Some(id.clone()),
            None => None,
        };
        let parent = self.stack.last().map(|open| (open.node, open.kind));
        let node_id = self.push_node(
            node,
            owned_id.clone(),
            RawElement {
                tag: tag.to_string(),
                attributes,
                parent: parent.map(|(id, _)| id),
            },
        );
        if let Some(id) = owned_id {
            self.registry.register(&id, node_id, kind);
        }

        match parent {
            Some((parent_id, parent_kind)) if parent_kind.accepts_child(kind) => {
                self.tree.link(parent_id, node_id);
            }
            Some((_, parent_kind)) => {
                warn!(
                    parent = parent_kind.tag_name(),
                    child = kind.tag_name(),
                    "element not allowed here, dropped from the tree"
                );
            }
            None => self.root = Some(node_id),
        }

        self.stack.push(OpenElement {
            node: node_id,
            kind,
            tag: tag.to_string(),
        });
    }

    pub(crate) fn end_element(&mut self, tag: &str) {
        if self.skip_depth > 0 {
            self.skip_depth -= 1;
            return;
        }
        match self.stack.last() {
            Some(open) if open.tag == tag => {
                self.stack.pop();
            }
            Some(open) => {
                warn!(expected = open.tag.as_str(), found = tag, "mismatched end tag ignored");
            }
            None => {}
        }
    }

    /// Character data goes to the innermost open element, when it keeps
    /// any. Consecutive runs merge into one node.
    pub(crate) fn characters(&mut self, text: &str) {
        if self.skip_depth > 0 || text.is_empty() {
            return;
        }
        let Some(open) = self.stack.last() else {
            return;
        };
        if !open.kind.accepts_chars() {
            return;
        }
        let parent = open.node;
        if let Some(last) = self.tree.last_child(parent) {
            if let Node::CharData(chars) = self.tree.node_mut(last) {
                chars.push_str(text);
                return;
            }
        }
        let node_id = self.push_node(
            CharData::new(text).into(),
            None,
            RawElement {
                tag: NodeKind::CharData.tag_name().to_string(),
                attributes: HashMap::new(),
                parent: Some(parent),
            },
        );
        self.tree.link(parent, node_id);
    }

    /// Run the build pass. Returns `None` when no root element was seen.
    pub(crate) fn finish(mut self) -> Option<Document> {
        let root = self.root?;
        if !self.stack.is_empty() {
            debug!(open = self.stack.len(), "input ended inside open elements");
        }

        let mut order = self.tree.post_order(root);
        // Elements rejected by their parent's content model are not in the
        // tree but still get built, so references to them stay valid.
        let mut reachable = vec![false; self.tree.len()];
        for id in &order {
            reachable[id.index()] = true;
        }
        order.extend(
            (0..self.tree.len())
                .rev()
                .map(NodeId::new)
                .filter(|id| !reachable[id.index()]),
        );

        for id in order {
            let view = AttributeView::new(id, &self.elements, &self.registry);
            let node = self.tree.node_mut(id);
            trace!(tag = node.kind().tag_name(), id = id.index(), "build");
            node.build(&view);
        }

        debug!(
            nodes = self.tree.len(),
            ids = self.registry.len(),
            "document built"
        );
        Some(Document::new(self.tree, root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn unknown_elements_drop_their_subtree() {
        let options = LoaderOptions::default();
        let mut builder = DocumentBuilder::new(&options);
        builder.start_element("svg", attrs(&[]));
        builder.start_element("foreignObject", attrs(&[]));
        builder.start_element("rect", attrs(&[("id", "hidden")]));
        builder.end_element("rect");
        builder.end_element("foreignObject");
        builder.start_element("circle", attrs(&[]));
        builder.end_element("circle");
        builder.end_element("svg");
        let doc = builder.finish().unwrap();
        assert_eq!(doc.tree().len(), 2);
        assert!(doc.tree().find_by_id("hidden").is_none());
    }

    #[test]
    fn character_runs_coalesce() {
        let options = LoaderOptions::default();
        let mut builder = DocumentBuilder::new(&options);
        builder.start_element("svg", attrs(&[]));
        builder.characters("  \n  ");
        builder.start_element("text", attrs(&[]));
        builder.characters("a");
        builder.characters("&");
        builder.characters("b");
        builder.end_element("text");
        builder.end_element("svg");
        let doc = builder.finish().unwrap();
        // Whitespace directly in <svg> is not kept
        assert_eq!(doc.tree().len(), 3);
        assert_eq!(doc.tree().text_content(doc.root_id()), "a&b");
    }

    #[test]
    fn depth_limit_skips_deeper_elements() {
        let options = LoaderOptions::default().with_max_depth(2);
        let mut builder = DocumentBuilder::new(&options);
        builder.start_element("svg", attrs(&[]));
        builder.start_element("g", attrs(&[]));
        builder.start_element("g", attrs(&[]));
        builder.end_element("g");
        builder.end_element("g");
        builder.end_element("svg");
        let doc = builder.finish().unwrap();
        assert_eq!(doc.tree().len(), 2);
    }

    #[test]
    fn no_root_means_no_document() {
        let options = LoaderOptions::default();
        let mut builder = DocumentBuilder::new(&options);
        builder.start_element("html", attrs(&[]));
        builder.start_element("svg", attrs(&[]));
        builder.end_element("svg");
        builder.end_element("html");
        assert!(builder.finish().is_none());
    }
}
