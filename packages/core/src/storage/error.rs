//! Storage Error Types
//!
//! This module defines error types for local storage operations. Remote
//! store failures are wrapped at the sync layer instead (see
//! `services::error`).

use thiserror::Error;

/// Local storage operation errors
///
/// Covers backend read/write failures and value encoding problems. Service
/// operations catch these at their boundary, log an operation-specific
/// message, and surface a failure signal to the caller. Decode problems are
/// not errors at this layer: unreadable persisted values are reset or
/// treated as absent where they are loaded.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The underlying key-value backend rejected the operation
    #[error("Storage backend operation failed: {context}")]
    Backend { context: String },

    /// Failed to encode a value for persistence
    #[error("Failed to serialize value for key '{key}': {source}")]
    Serialization {
        key: String,
        source: serde_json::Error,
    },
}

impl StorageError {
    /// Create a backend error with context
    pub fn backend(context: impl Into<String>) -> Self {
        Self::Backend {
            context: context.into(),
        }
    }

    /// Create a serialization error for a key
    pub fn serialization(key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            key: key.into(),
            source,
        }
    }
}
