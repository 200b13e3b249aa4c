//! Service Layer Error Types
//!
//! Tree operations surface failures as boolean/`Option` signals with logged
//! context (the sidebar calls them from event handlers and never wants an
//! error to propagate). The sync engine, by contrast, reports structured
//! errors to its status listeners; those are defined here.

use crate::storage::StorageError;
use thiserror::Error;

/// Sync reconciliation errors
///
/// Any of these aborts the current sync cycle. The reentrancy guard is
/// always cleared afterwards and the next scheduled cycle retries; there is
/// no backoff or retry limit.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Local storage failed while reading or writing sync state
    #[error("Local storage failed during sync: {0}")]
    Storage(#[from] StorageError),

    /// The remote store rejected a read or write
    #[error("Remote store operation failed: {context}")]
    Remote { context: String },

    /// The sync payload could not be encoded
    #[error("Failed to encode sync payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl SyncError {
    /// Create a remote failure with context
    pub fn remote(context: impl Into<String>) -> Self {
        Self::Remote {
            context: context.into(),
        }
    }
}
