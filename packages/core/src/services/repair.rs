//! Tree Validation and Repair
//!
//! The tree stores the parent-child relationship twice (`parent_id` and the
//! parent's `children` array), and whole-tree read-modify-write operations
//! can race. This module scans a loaded tree for the structural damage that
//! can result - dangling parent references, children arrays that disagree
//! with `parent_id` links, an invalid current-node pointer - and heals it.
//!
//! Repair is run when a sidebar loads a tree, before display. It is
//! idempotent: running it on an already-valid tree performs no mutation.
//!
//! # Repair Steps
//!
//! 1. Re-root orphans: a node whose `parent_id` names a missing node gets
//!    `parent_id = None`. Only the node whose reference actually dangles is
//!    re-rooted; its own descendants keep pointing at it, so the whole
//!    broken chain becomes reachable from the root again in one pass.
//! 2. Reconcile children arrays against `parent_id` links in both
//!    directions: drop listed ids that do not correspond to an existing node
//!    with a matching `parent_id` (duplicates included), add nodes whose
//!    `parent_id` points here but are missing from the list.
//! 3. Clear a current-node pointer that references no existing node. A
//!    pointer at a *deleted* node is left alone - deletion-awareness is a
//!    display concern, not a structural one.
//!
//! Input that is not tree-shaped at all is reset to an empty tree at the
//! decode boundary ([`CitationTree::from_value`]); no structural assumption
//! about such data can be trusted.

use crate::auth::AuthProvider;
use crate::models::{CitationTree, NodeId};
use crate::storage::{LocalStore, WriteOrigin};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Outcome of an integrity scan.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairResult {
    /// The (possibly repaired) tree
    pub tree: CitationTree,

    /// Whether any repair was applied
    pub repaired: bool,

    /// Human-readable description of each repair, for diagnostics
    pub repairs: Vec<String>,
}

impl RepairResult {
    fn clean(tree: CitationTree) -> Self {
        Self {
            tree,
            repaired: false,
            repairs: Vec::new(),
        }
    }
}

/// Scan a tree for structural corruption and repair it.
///
/// Idempotent: a second run over the result reports `repaired = false`.
pub fn repair_tree_integrity(mut tree: CitationTree) -> RepairResult {
    let mut repairs: Vec<String> = Vec::new();

    let known_ids: HashSet<NodeId> = tree.nodes.iter().map(|n| n.id).collect();

    // Step 1: re-root nodes whose parent reference dangles. Descendants of a
    // re-rooted node still point at it, so each broken chain is recovered as
    // a unit without re-deriving the diagnostic per generation.
    for node in tree.nodes.iter_mut() {
        if let Some(parent_id) = node.parent_id {
            if !known_ids.contains(&parent_id) {
                let repair = format!(
                    "Re-rooted node {} (parent {} does not exist)",
                    node.id, parent_id
                );
                tracing::warn!("{repair}");
                repairs.push(repair);
                node.parent_id = None;
            }
        }
    }

    // Step 2: reconcile children arrays with parent_id links, both ways
    let parent_of: HashMap<NodeId, Option<NodeId>> =
        tree.nodes.iter().map(|n| (n.id, n.parent_id)).collect();
    let mut expected_children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for node in &tree.nodes {
        if let Some(parent_id) = node.parent_id {
            expected_children.entry(parent_id).or_default().push(node.id);
        }
    }

    for index in 0..tree.nodes.len() {
        let parent_id = tree.nodes[index].id;
        let mut seen: HashSet<NodeId> = HashSet::new();
        let mut reconciled: Vec<NodeId> = Vec::new();

        for &child_id in &tree.nodes[index].children {
            let points_here = parent_of.get(&child_id) == Some(&Some(parent_id));
            if !points_here {
                let repair = format!(
                    "Removed child {} from node {} (no matching node with that parent)",
                    child_id, parent_id
                );
                tracing::warn!("{repair}");
                repairs.push(repair);
            } else if !seen.insert(child_id) {
                let repair =
                    format!("Removed duplicate child {} from node {}", child_id, parent_id);
                tracing::warn!("{repair}");
                repairs.push(repair);
            } else {
                reconciled.push(child_id);
            }
        }

        for child_id in expected_children.get(&parent_id).into_iter().flatten() {
            if seen.insert(*child_id) {
                let repair = format!(
                    "Added missing child {} to node {}",
                    child_id, parent_id
                );
                tracing::warn!("{repair}");
                repairs.push(repair);
                reconciled.push(*child_id);
            }
        }

        if reconciled != tree.nodes[index].children {
            tree.nodes[index].children = reconciled;
        }
    }

    // Step 3: a current-node pointer at a missing node is cleared; a pointer
    // at a deleted node is tolerated
    if let Some(current) = tree.current_node_id {
        if !known_ids.contains(&current) {
            let repair = format!("Cleared current node pointer ({} does not exist)", current);
            tracing::warn!("{repair}");
            repairs.push(repair);
            tree.current_node_id = None;
        }
    }

    let repaired = !repairs.is_empty();
    RepairResult {
        tree,
        repaired,
        repairs,
    }
}

/// Loads the tree, repairs it, and persists any fix.
pub struct RepairService {
    store: Arc<LocalStore>,
    auth: Arc<dyn AuthProvider>,
}

impl RepairService {
    pub fn new(store: Arc<LocalStore>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { store, auth }
    }

    /// Run an integrity scan over the persisted tree.
    ///
    /// When a repair was applied, the fixed tree is persisted with a
    /// repair-tagged write (so listeners do not mistake it for a user edit),
    /// and - if a user is signed in - `lastModified` is stamped so the next
    /// sync cycle carries the fix to the remote copy.
    pub async fn repair_and_persist(&self) -> RepairResult {
        let tree = match self.store.load_tree().await {
            Ok(tree) => tree,
            Err(e) => {
                tracing::error!("Failed to load citation tree for integrity check: {e}");
                return RepairResult::clean(CitationTree::empty());
            }
        };

        let result = repair_tree_integrity(tree);
        if !result.repaired {
            return result;
        }

        tracing::info!(
            repairs = result.repairs.len(),
            "Citation tree repaired, persisting"
        );
        if let Err(e) = self.store.save_tree(&result.tree, WriteOrigin::Repair).await {
            tracing::error!("Failed to persist repaired citation tree: {e}");
            return result;
        }
        if self.auth.is_logged_in() {
            if let Err(e) = self.store.touch_last_modified().await {
                tracing::warn!("Failed to stamp lastModified after repair: {e}");
            }
        }

        result
    }
}
