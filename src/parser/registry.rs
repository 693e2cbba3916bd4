//! Document-wide id table.

use std::collections::HashMap;

use crate::nodes::{NodeId, NodeKind};

/// Maps declared `id`s to nodes while a document is being built.
///
/// The first element to declare an id owns it; later duplicates are
/// ignored. The table is dropped once the build pass has resolved every
/// reference.
#[derive(Clone, Debug, Default)]
pub struct NameRegistry {
    names: HashMap<String, (NodeId, NodeKind)>,
}

impl NameRegistry {
    /// Claim `id` for `node`. Returns `false` if the id was already taken.
    pub fn register(&mut self, id: &str, node: NodeId, kind: NodeKind) -> bool {
        if self.names.contains_key(id) {
            return false;
        }
        self.names.insert(id.to_string(), (node, kind));
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.names.contains_key(id)
    }

    pub fn lookup(&self, id: &str) -> Option<(NodeId, NodeKind)> {
        self.names.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
