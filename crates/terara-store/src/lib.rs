//! Document storage for terara.
//!
//! This crate layers documents over an ordered key-value engine. Documents
//! are encoded with the `terara-types` codec and stored under keys derived
//! from their `"id"` field.
//!
//! # Key Types
//!
//! - [`Document`] -- mutable field map with dirty and static flags
//! - [`LockRegistry`] -- advisory, non-blocking key claims
//! - [`KeyStrategy`] -- maps a document id to its storage key
//! - [`Collection`] / [`Catalog`] -- named document groups and their registry
//! - [`Database`] / [`Transaction`] -- engine lifecycle and buffered writes
//!
//! # Engines
//!
//! All engines implement the [`KvEngine`] trait:
//!
//! - [`InMemoryEngine`] -- `BTreeMap`-based engine for tests and embedding
//! - [`LogEngine`] -- append-only, CRC-framed batch log replayed on open
//!
//! # Design Rules
//!
//! 1. The codec is the only persisted representation of a document.
//! 2. A static document never changes after it is loaded.
//! 3. Locks are advisory: claiming never blocks and never fails.
//! 4. A transaction's writes reach the engine as one batch or not at all.

pub mod catalog;
pub mod collection;
pub mod config;
pub mod database;
pub mod document;
pub mod error;
pub mod key;
pub mod lock;
pub mod log;
pub mod memory;
pub mod names;
pub mod traits;
pub mod transaction;

// Re-export primary types at crate root for ergonomic imports.
pub use catalog::{Catalog, CATALOG_PREFIX};
pub use collection::Collection;
pub use config::{DatabaseConfig, EngineKind, SyncMode};
pub use database::Database;
pub use document::Document;
pub use error::{StoreError, StoreResult};
pub use key::{
    collection_prefix, CollectionScopedKey, EncodedIdKey, HashedIdKey, KeyStrategy,
    KeyStrategyKind,
};
pub use lock::{Claim, LockRegistry};
pub use log::LogEngine;
pub use memory::InMemoryEngine;
pub use names::validate_collection_name;
pub use traits::{KvEngine, WriteOp};
pub use transaction::Transaction;
