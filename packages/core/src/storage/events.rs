//! Storage Change Events
//!
//! This module defines the events emitted by [`LocalStore`](super::LocalStore)
//! when the citation tree is written. Events follow the observer pattern:
//! UI surfaces and the sync layer subscribe without coupling to the storage
//! implementation.
//!
//! # Write Origins
//!
//! Every tree write carries a [`WriteOrigin`] describing where the write came
//! from and what reaction it permits. This is what prevents feedback loops:
//! a write performed by the sync engine must not be reinterpreted as a fresh
//! local edit and re-uploaded forever, and a highlight-only change must not
//! force a full re-render in every open sidebar.
//!
//! | Origin    | Full reload | Highlight update | Eligible to trigger sync |
//! |-----------|-------------|------------------|--------------------------|
//! | `Content` | yes         | yes              | yes                      |
//! | `UiOnly`  | no          | yes              | no                       |
//! | `Sync`    | no          | no               | no                       |
//! | `Repair`  | yes         | no               | no                       |
//!
//! A repaired tree must be redisplayed by every open sidebar, or they keep
//! showing the corrupt structure; repair writes reach the remote copy via a
//! direct `lastModified` stamp instead of the sync-eligibility predicate.
//!
//! Events are emitted on a tokio broadcast channel, allowing multiple
//! subscribers to receive them asynchronously.

use crate::models::CitationTree;
use serde::{Deserialize, Serialize};

/// Where a citation-tree write originated, and therefore how listeners
/// should react to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WriteOrigin {
    /// A genuine content change (capture, move, delete, annotation)
    Content,

    /// A UI-level change only (current-node highlight moved)
    UiOnly,

    /// The sync engine wrote a downloaded tree
    Sync,

    /// The repair service persisted an integrity fix
    Repair,
}

impl WriteOrigin {
    /// Whether listeners should fully reload their view of the tree
    pub fn triggers_reload(&self) -> bool {
        matches!(self, WriteOrigin::Content | WriteOrigin::Repair)
    }

    /// Whether the write counts as a local edit eligible to schedule a sync
    pub fn triggers_sync(&self) -> bool {
        matches!(self, WriteOrigin::Content)
    }

    /// Whether listeners may react with a highlight-only update instead of
    /// a full reload
    pub fn updates_highlight_only(&self) -> bool {
        matches!(self, WriteOrigin::UiOnly)
    }

    /// String label for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteOrigin::Content => "content",
            WriteOrigin::UiOnly => "uiOnly",
            WriteOrigin::Sync => "sync",
            WriteOrigin::Repair => "repair",
        }
    }
}

/// Events emitted by the local store when persisted state changes.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// The citation tree was replaced
    TreeWritten {
        origin: WriteOrigin,
        tree: CitationTree,
    },
}

impl StoreEvent {
    /// The origin tag carried by the event
    pub fn origin(&self) -> WriteOrigin {
        match self {
            StoreEvent::TreeWritten { origin, .. } => *origin,
        }
    }
}
