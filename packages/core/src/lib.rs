//! CiteTree Core Logic Layer
//!
//! This crate provides the citation-tree data model, its mutation
//! operations, the self-healing integrity validator, and the bidirectional
//! last-write-wins sync engine behind the CiteTree browser extension.
//!
//! # Architecture
//!
//! - **Whole-tree persistence**: The tree is one document under the
//!   `citationTree` key; every committed mutation replaces it entirely.
//! - **Dual hierarchy links**: `parent_id` and `children` both store the
//!   relationship; the repair service reconciles them when they drift.
//! - **Origin-tagged writes**: Every tree write carries a typed origin so
//!   listeners can tell user edits from sync/repair/highlight writes and
//!   feedback loops cannot form.
//! - **Last-write-wins sync**: Whole-document timestamp comparison per
//!   signed-in user; no per-field merge.
//!
//! # Modules
//!
//! - [`models`] - Data structures (`Node`, `CitationTree`)
//! - [`storage`] - Local key-value and remote document store seams
//! - [`auth`] - Signed-in-user seam for the sync engine
//! - [`services`] - Tree operations, integrity repair, sync engine

pub mod auth;
pub mod models;
pub mod services;
pub mod storage;

// Re-export commonly used types
pub use models::*;
pub use services::*;
