//! RemoteStore Trait - Remote Document Store Abstraction
//!
//! This module defines the `RemoteStore` trait that abstracts the per-user
//! remote document store the sync engine reconciles against, plus the
//! [`RemoteDocument`] wire shape.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: Every remote call is a network call and may suspend
//!    indefinitely; the sync engine bounds the damage with its reentrancy
//!    guard, not with timeouts.
//! 2. **Raw JSON at the seam**: `get`/`set` trade `serde_json::Value` so a
//!    partially-corrupt cloud record can be inspected and tolerated instead
//!    of failing wholesale at decode time.
//! 3. **Error Handling**: Uses `anyhow::Result` for flexible error context;
//!    the sync engine converts failures into its own error type and an
//!    `Error` status broadcast.
//!
//! The write API of the real backing store rejects explicitly-missing field
//! values (as opposed to `null`, which it accepts); payloads are run through
//! the sanitizer in `services::sanitize` before every `set`.

use crate::models::CitationTree;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// The per-user document reconciled by the sync engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDocument {
    /// The whole citation tree (last-write-wins unit)
    pub citation_tree: CitationTree,

    /// Node counter, so downloaded trees keep allocating unique ids
    pub node_counter: u64,

    /// When this copy was last modified (drives the reconciliation table)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,

    /// Email of the owning user, for support tooling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

/// Abstraction over the remote per-user document store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch the document stored for a user, if one exists.
    async fn get(&self, uid: &str) -> Result<Option<Value>>;

    /// Replace the document stored for a user.
    ///
    /// The payload must be sanitized (no explicitly-missing values) before
    /// calling; real backends reject such payloads outright.
    async fn set(&self, uid: &str, document: Value) -> Result<()>;

    /// Delete the document stored for a user.
    async fn delete(&self, uid: &str) -> Result<()>;
}

/// In-memory `RemoteStore` for tests and offline embedding.
///
/// Supports an artificial read delay and call counting so tests can exercise
/// the sync engine's concurrency guard against a slow remote.
#[derive(Debug, Default)]
pub struct MemoryRemoteStore {
    documents: RwLock<HashMap<String, Value>>,
    get_delay: Option<Duration>,
    get_calls: AtomicUsize,
    set_calls: AtomicUsize,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every `get` by the given duration (simulates a slow network)
    pub fn with_get_delay(delay: Duration) -> Self {
        Self {
            get_delay: Some(delay),
            ..Self::default()
        }
    }

    /// Number of `get` calls issued so far
    pub fn get_call_count(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// Number of `set` calls issued so far
    pub fn set_call_count(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }

    /// Seed a document directly (test helper)
    pub async fn insert(&self, uid: &str, document: Value) {
        self.documents
            .write()
            .await
            .insert(uid.to_string(), document);
    }

    /// Read a document without counting the call (test helper)
    pub async fn document(&self, uid: &str) -> Option<Value> {
        self.documents.read().await.get(uid).cloned()
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn get(&self, uid: &str) -> Result<Option<Value>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.get_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.documents.read().await.get(uid).cloned())
    }

    async fn set(&self, uid: &str, document: Value) -> Result<()> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        self.documents
            .write()
            .await
            .insert(uid.to_string(), document);
        Ok(())
    }

    async fn delete(&self, uid: &str) -> Result<()> {
        self.documents.write().await.remove(uid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Contract test: documents the remote document wire shape. The cloud
    /// records written by released versions use exactly these camelCase keys.
    #[test]
    fn test_remote_document_serialization_contract() {
        let doc = RemoteDocument {
            citation_tree: CitationTree::empty(),
            node_counter: 12,
            last_modified: None,
            user_email: Some("user@example.com".to_string()),
        };

        let value = serde_json::to_value(&doc).unwrap();
        assert!(value.get("citationTree").is_some());
        assert_eq!(value.get("nodeCounter").unwrap(), 12);
        assert_eq!(value.get("userEmail").unwrap(), "user@example.com");
        // Absent lastModified is omitted, which the reconciliation table
        // treats as "cloud record has no lastModified"
        assert!(value.get("lastModified").is_none());
    }

    #[tokio::test]
    async fn test_memory_remote_store_counts_calls() {
        let store = MemoryRemoteStore::new();
        assert_eq!(store.get("u1").await.unwrap(), None);

        store.set("u1", json!({"a": 1})).await.unwrap();
        assert_eq!(store.get("u1").await.unwrap(), Some(json!({"a": 1})));

        store.delete("u1").await.unwrap();
        assert_eq!(store.get("u1").await.unwrap(), None);

        assert_eq!(store.get_call_count(), 3);
        assert_eq!(store.set_call_count(), 1);
    }
}
