//! Business Services
//!
//! This module contains the core business logic services:
//!
//! - `TreeService` - citation-tree mutations and display queries
//! - `RepairService` / `repair_tree_integrity` - structural integrity
//!   scanning and self-healing
//! - `SyncEngine` - last-write-wins reconciliation against the remote store
//! - `sanitize` - remote payload cleaning (explicitly-missing values)
//!
//! Services coordinate between the storage layer and the extension UI,
//! implementing the tree's invariants and the sync decision rules.

pub mod error;
pub mod repair;
pub mod sanitize;
pub mod sync;
pub mod tree_service;

pub use error::SyncError;
pub use repair::{repair_tree_integrity, RepairResult, RepairService};
pub use sanitize::{sanitize, sanitize_document, FieldValue};
pub use sync::{SyncEngine, SyncOutcome, SyncStatus};
pub use tree_service::{
    find_node, get_child_nodes, get_descendants, get_root_nodes, get_visible_nodes,
    is_descendant, NewCitation, TreeService,
};
