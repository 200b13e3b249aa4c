//! Node Data Structures
//!
//! This module defines the core `Node` struct for CiteTree's citation tree:
//! one captured citation with provenance metadata, tree-position links, and
//! optional annotations and image attachments.
//!
//! # Architecture
//!
//! - **Integer ids**: Ids are allocated from a persisted monotonic counter and
//!   are never reused, even after deletion.
//! - **Dual hierarchy representation**: Both `parent_id` and the parent's
//!   `children` array store the relationship; the repair service reconciles
//!   the two directions when they drift apart.
//! - **Soft delete**: Deleted nodes are flagged, never removed, so that ids
//!   and child links stay referentially valid.
//!
//! # Examples
//!
//! ```rust
//! use citetree_core::models::Node;
//!
//! // Capture a root-level citation
//! let node = Node::new(
//!     1,
//!     "Rust ships a new release every six weeks.".to_string(),
//!     Some("https://blog.rust-lang.org/".to_string()),
//!     Some("Rust Blog".to_string()),
//!     None,
//! );
//! assert!(node.parent_id.is_none());
//! assert!(!node.deleted);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier for a node within a citation tree.
///
/// Allocated from the persisted `nodeCounter` key, monotonically increasing,
/// stable for the lifetime of the node.
pub type NodeId = u64;

/// Serde helper: skip serializing a `false` flag (absent means not deleted)
fn is_false(value: &bool) -> bool {
    !*value
}

/// A text annotation attached to a captured citation.
///
/// Annotations are ordered by insertion and may carry a reference to a
/// recorded audio clip captured alongside the text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    /// Identifier unique within the owning node's annotation list
    pub id: u64,

    /// Annotation text
    pub text: String,

    /// Creation timestamp
    pub timestamp: DateTime<Utc>,

    /// Optional URL of a recorded audio clip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

/// An image captured with a citation, stored as an embedded payload
/// (typically a data URL produced by the capture surface).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAttachment {
    /// Image source (data URL or remote URL)
    pub src: String,

    /// Capture timestamp
    pub timestamp: DateTime<Utc>,
}

/// One captured citation in the tree.
///
/// # Fields
///
/// - `id`: Counter-allocated identifier, unique within the tree
/// - `text`: Captured content (required, may be long)
/// - `url` / `title` / `timestamp`: Provenance metadata
/// - `parent_id`: Parent node id; `None` means root-level
/// - `children`: Ordered child ids; insertion order is display order
/// - `deleted` / `deleted_at`: Soft-delete marker; deleted nodes stay in the
///   tree for referential integrity and are filtered at display time
/// - `annotations` / `images`: Optional captured extras
///
/// # Invariants
///
/// After every committed mutation:
///
/// 1. A non-null `parent_id` references an existing node in the same tree
///    (orphans are repaired back to root by the repair service).
/// 2. `children` and `parent_id` agree in both directions.
/// 3. The tree is acyclic; no node is its own ancestor.
/// 4. `id` is stable for the lifetime of the node; soft delete never renumbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique identifier within the tree
    pub id: NodeId,

    /// Captured text content
    pub text: String,

    /// Source page URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Source page title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Creation timestamp (ISO-8601 on the wire)
    pub timestamp: DateTime<Utc>,

    /// Parent node id (`None` = root-level)
    pub parent_id: Option<NodeId>,

    /// Ordered child ids; insertion order is display order
    #[serde(default)]
    pub children: Vec<NodeId>,

    /// Soft-delete flag; deleted nodes are excluded from display and search
    #[serde(default, skip_serializing_if = "is_false")]
    pub deleted: bool,

    /// When the node was soft-deleted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,

    /// Ordered text/audio annotations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,

    /// Embedded image payloads
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageAttachment>,
}

impl Node {
    /// Create a new citation node with a freshly allocated id.
    ///
    /// # Arguments
    ///
    /// * `id` - Id allocated from the persisted node counter
    /// * `text` - Captured text content
    /// * `url` - Source page URL
    /// * `title` - Source page title
    /// * `parent_id` - Parent node (usually the tree's current node)
    pub fn new(
        id: NodeId,
        text: String,
        url: Option<String>,
        title: Option<String>,
        parent_id: Option<NodeId>,
    ) -> Self {
        Self {
            id,
            text,
            url,
            title,
            timestamp: Utc::now(),
            parent_id,
            children: Vec::new(),
            deleted: false,
            deleted_at: None,
            annotations: Vec::new(),
            images: Vec::new(),
        }
    }

    /// Whether the node should appear in display and search results
    pub fn is_visible(&self) -> bool {
        !self.deleted
    }
}
