//! Data Models
//!
//! This module contains the core data structures used throughout CiteTree:
//!
//! - `Node` - One captured citation with provenance metadata and tree links
//! - `CitationTree` - The full node set plus the current-node pointer
//!
//! The tree stores the parent-child relationship in both directions
//! (`parent_id` and `children`); the services layer is responsible for
//! keeping the two in agreement.

mod node;
mod tree;

pub use node::{Annotation, ImageAttachment, Node, NodeId};
pub use tree::CitationTree;
