//! KeyValueStore Trait - Local Persistence Abstraction
//!
//! This module defines the `KeyValueStore` trait that abstracts the
//! extension's local key-value persistence API. The trait mirrors the narrow
//! get/set contract of browser extension storage: reads return the values
//! present for the requested keys, writes shallow-merge entries by key.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All methods are async; extension storage and any
//!    other realistic backend suspend on every call.
//! 2. **Whole-value replace**: `set` replaces each named key's value
//!    entirely. There is no field-level merge inside a value - the unit of
//!    atomicity for the citation tree is "whole tree replace".
//! 3. **Error Handling**: Backends report failures as [`StorageError`];
//!    callers at the service layer convert these into logged failure
//!    signals.
//!
//! An in-memory implementation is provided for tests and for embedding the
//! core without a browser host.

use crate::storage::error::StorageError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Abstraction over the extension's local key-value storage.
///
/// Implementations must be `Send + Sync`; callers hold them behind `Arc`
/// and share them across async tasks.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the requested keys.
    ///
    /// Absent keys are omitted from the result map; callers supply their own
    /// defaults for missing keys.
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, StorageError>;

    /// Shallow-merge the entries into the store by key.
    ///
    /// Each named key's value is replaced entirely; keys not named are left
    /// untouched.
    async fn set(&self, entries: Vec<(String, Value)>) -> Result<(), StorageError>;
}

/// In-memory `KeyValueStore` backed by a `HashMap`.
///
/// Used by tests and by embedders that run the core outside a browser host.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    data: RwLock<HashMap<String, Value>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the full store contents (test helper)
    pub async fn snapshot(&self) -> HashMap<String, Value> {
        self.data.read().await.clone()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>, StorageError> {
        let data = self.data.read().await;
        let mut result = HashMap::new();
        for &key in keys {
            if let Some(value) = data.get(key) {
                result.insert(key.to_string(), value.clone());
            }
        }
        Ok(result)
    }

    async fn set(&self, entries: Vec<(String, Value)>) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        for (key, value) in entries {
            data.insert(key, value);
        }
        Ok(())
    }
}
