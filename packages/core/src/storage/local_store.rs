//! LocalStore - Typed Wrapper Over the Persisted Keys
//!
//! `LocalStore` wraps a [`KeyValueStore`] backend and exposes typed
//! operations over the four keys the core persists:
//!
//! - `citationTree` - the whole [`CitationTree`]
//! - `nodeCounter` - next node id to allocate (integer, never reused)
//! - `lastModified` - ISO timestamp of the last local content change
//! - `lastSyncTime` - ISO timestamp of the last completed sync
//!
//! Every tree write emits a [`StoreEvent`] on a broadcast channel, tagged
//! with its [`WriteOrigin`], so listeners can decide whether to reload,
//! re-highlight, or schedule a sync.

use crate::models::{CitationTree, NodeId};
use crate::storage::error::StorageError;
use crate::storage::events::{StoreEvent, WriteOrigin};
use crate::storage::key_value::KeyValueStore;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Persisted key names shared with the sidebar surfaces.
pub mod keys {
    pub const CITATION_TREE: &str = "citationTree";
    pub const NODE_COUNTER: &str = "nodeCounter";
    pub const LAST_MODIFIED: &str = "lastModified";
    pub const LAST_SYNC_TIME: &str = "lastSyncTime";
}

/// Broadcast channel capacity for store events.
///
/// 64 provides headroom for bursts of rapid edits (drag-and-drop runs)
/// while limiting memory overhead. Listener lag is acceptable - listeners
/// only care about the latest tree, not historical writes.
const STORE_EVENT_CHANNEL_CAPACITY: usize = 64;

/// Typed local persistence for the citation tree and its bookkeeping keys.
pub struct LocalStore {
    backend: Arc<dyn KeyValueStore>,
    event_tx: broadcast::Sender<StoreEvent>,
}

impl LocalStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        let (event_tx, _) = broadcast::channel(STORE_EVENT_CHANNEL_CAPACITY);
        Self { backend, event_tx }
    }

    /// Subscribe to store events (tree writes tagged with their origin)
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.event_tx.subscribe()
    }

    /// Load the citation tree.
    ///
    /// An absent key yields an empty tree. A persisted value that is not
    /// tree-shaped also yields an empty tree (reset, logged by
    /// [`CitationTree::from_value`]).
    pub async fn load_tree(&self) -> Result<CitationTree, StorageError> {
        let mut values = self.backend.get(&[keys::CITATION_TREE]).await?;
        Ok(match values.remove(keys::CITATION_TREE) {
            Some(value) => CitationTree::from_value(value),
            None => CitationTree::empty(),
        })
    }

    /// Replace the citation tree and notify listeners with the write origin.
    pub async fn save_tree(
        &self,
        tree: &CitationTree,
        origin: WriteOrigin,
    ) -> Result<(), StorageError> {
        let value = serde_json::to_value(tree)
            .map_err(|e| StorageError::serialization(keys::CITATION_TREE, e))?;
        self.backend
            .set(vec![(keys::CITATION_TREE.to_string(), value)])
            .await?;
        tracing::debug!(origin = origin.as_str(), "Citation tree written");

        // No subscribers is fine; the send result only reports that case
        let _ = self.event_tx.send(StoreEvent::TreeWritten {
            origin,
            tree: tree.clone(),
        });
        Ok(())
    }

    /// Read the node counter (next id to allocate). Defaults to 1.
    pub async fn load_node_counter(&self) -> Result<u64, StorageError> {
        let values = self.backend.get(&[keys::NODE_COUNTER]).await?;
        Ok(values
            .get(keys::NODE_COUNTER)
            .and_then(Value::as_u64)
            .unwrap_or(1))
    }

    /// Persist the node counter.
    pub async fn save_node_counter(&self, counter: u64) -> Result<(), StorageError> {
        self.backend
            .set(vec![(keys::NODE_COUNTER.to_string(), Value::from(counter))])
            .await
    }

    /// Allocate the next node id and advance the persisted counter.
    pub async fn allocate_node_id(&self) -> Result<NodeId, StorageError> {
        let id = self.load_node_counter().await?;
        self.save_node_counter(id + 1).await?;
        Ok(id)
    }

    /// Timestamp of the last local content change, if any.
    pub async fn last_modified(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        self.load_timestamp(keys::LAST_MODIFIED).await
    }

    /// Persist an explicit last-modified timestamp (sync download path).
    pub async fn set_last_modified(&self, ts: DateTime<Utc>) -> Result<(), StorageError> {
        self.save_timestamp(keys::LAST_MODIFIED, ts).await
    }

    /// Stamp the last-modified timestamp with the current time.
    pub async fn touch_last_modified(&self) -> Result<DateTime<Utc>, StorageError> {
        let now = Utc::now();
        self.set_last_modified(now).await?;
        Ok(now)
    }

    /// Timestamp of the last completed sync, if any.
    pub async fn last_sync_time(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        self.load_timestamp(keys::LAST_SYNC_TIME).await
    }

    /// Record a completed sync.
    pub async fn set_last_sync_time(&self, ts: DateTime<Utc>) -> Result<(), StorageError> {
        self.save_timestamp(keys::LAST_SYNC_TIME, ts).await
    }

    async fn load_timestamp(&self, key: &str) -> Result<Option<DateTime<Utc>>, StorageError> {
        let values = self.backend.get(&[key]).await?;
        let Some(value) = values.get(key) else {
            return Ok(None);
        };
        match value.as_str().map(DateTime::parse_from_rfc3339) {
            Some(Ok(ts)) => Ok(Some(ts.with_timezone(&Utc))),
            _ => {
                // Treat an unreadable timestamp like an absent one; the sync
                // decision table has a branch for missing timestamps
                tracing::warn!(key, "Persisted timestamp is unreadable, treating as absent");
                Ok(None)
            }
        }
    }

    async fn save_timestamp(&self, key: &str, ts: DateTime<Utc>) -> Result<(), StorageError> {
        self.backend
            .set(vec![(key.to_string(), Value::String(ts.to_rfc3339()))])
            .await
    }
}
