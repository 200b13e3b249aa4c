//! Storage Layer
//!
//! This module contains the persistence seams of the core:
//!
//! - `KeyValueStore` - narrow async abstraction over the extension's local
//!   key-value storage, with an in-memory implementation
//! - `LocalStore` - typed wrapper over the persisted keys, emitting
//!   origin-tagged change events on every tree write
//! - `RemoteStore` - abstraction over the per-user remote document store
//! - `StoreEvent` / `WriteOrigin` - typed change notifications replacing
//!   sentinel flags on the domain data

pub mod error;
pub mod events;
pub mod key_value;
pub mod local_store;
pub mod remote;

pub use error::StorageError;
pub use events::{StoreEvent, WriteOrigin};
pub use key_value::{KeyValueStore, MemoryKeyValueStore};
pub use local_store::{keys, LocalStore};
pub use remote::{MemoryRemoteStore, RemoteDocument, RemoteStore};
