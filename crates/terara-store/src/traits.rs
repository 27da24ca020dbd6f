use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

/// A single mutation inside a write batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteOp {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

impl WriteOp {
    pub fn key(&self) -> &[u8] {
        match self {
            WriteOp::Put { key, .. } | WriteOp::Delete { key } => key,
        }
    }
}

/// Ordered byte-keyed storage underneath the document layer.
///
/// All implementations must satisfy these invariants:
/// - A batch passed to [`apply`](KvEngine::apply) is applied completely or
///   not at all; readers never observe half a batch.
/// - Keys are compared bytewise; [`scan_prefix`](KvEngine::scan_prefix)
///   returns entries in ascending key order.
/// - The engine never interprets values.
/// - All I/O errors are propagated, never silently ignored.
pub trait KvEngine: Send + Sync + fmt::Debug {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Apply a batch of writes atomically. Later operations on the same key
    /// win over earlier ones.
    fn apply(&self, batch: &[WriteOp]) -> StoreResult<()>;

    /// Every entry whose key starts with `prefix`, in key order.
    fn scan_prefix(&self, prefix: &[u8]) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Number of live keys.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Push buffered writes to durable storage. A no-op for volatile engines.
    fn flush(&self) -> StoreResult<()> {
        Ok(())
    }
}
