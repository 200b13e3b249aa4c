//! Citation Tree Container
//!
//! The [`CitationTree`] is the full node collection for one workspace plus a
//! pointer to the node the user is currently "at". It is the unit of
//! persistence: every committed mutation replaces the whole tree under the
//! `citationTree` storage key.

use crate::models::{Node, NodeId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The full citation collection for one workspace.
///
/// `nodes` is keyed by id for lookups (order of the vector is not meaningful
/// for storage; display order comes from each node's `children` array).
/// `current_node_id` parents the next captured citation and drives UI
/// highlighting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationTree {
    /// All nodes, deleted ones included
    #[serde(default)]
    pub nodes: Vec<Node>,

    /// The node the user is currently "at" (`None` = root)
    #[serde(default)]
    pub current_node_id: Option<NodeId>,
}

impl CitationTree {
    /// An empty tree with no current node
    pub fn empty() -> Self {
        Self::default()
    }

    /// Decode a persisted tree value.
    ///
    /// A value that is not tree-shaped (missing or non-array `nodes`, or
    /// nodes that do not decode) yields an empty tree: no structural
    /// assumption about such data can be trusted, so this is a reset rather
    /// than a partial repair. The reset is logged as a warning.
    pub fn from_value(value: Value) -> Self {
        let tree_shaped = value
            .get("nodes")
            .map(Value::is_array)
            .unwrap_or(false);
        if !tree_shaped {
            tracing::warn!("Persisted citation tree is not tree-shaped, resetting to empty");
            return Self::empty();
        }

        match serde_json::from_value(value) {
            Ok(tree) => tree,
            Err(e) => {
                tracing::warn!("Persisted citation tree failed to decode, resetting to empty: {e}");
                Self::empty()
            }
        }
    }

    /// Look up a node by id
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Look up a node by id, mutably
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Whether a node with the given id exists (deleted or not)
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }
}
