//! Buffered transactions over a [`KvEngine`].
//!
//! A [`Transaction`] collects writes in memory and hands them to the engine
//! as one batch on [`commit`](Transaction::commit). Reads see the
//! transaction's own pending writes layered over the engine state. Dropping
//! a transaction without committing discards its writes.
//!
//! There is no conflict detection: two writable transactions that touch the
//! same key both commit, and the later commit wins.

use std::collections::BTreeMap;
use std::ops::Bound;

use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{KvEngine, WriteOp};

pub struct Transaction<'db> {
    engine: &'db dyn KvEngine,
    writable: bool,
    /// `None` marks a pending delete.
    pending: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'db> Transaction<'db> {
    pub(crate) fn new(engine: &'db dyn KvEngine, writable: bool) -> Self {
        Self {
            engine,
            writable,
            pending: BTreeMap::new(),
        }
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Number of buffered writes.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        match self.pending.get(key) {
            Some(buffered) => Ok(buffered.clone()),
            None => self.engine.get(key),
        }
    }

    pub fn set(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> StoreResult<()> {
        self.check_writable()?;
        self.pending.insert(key.into(), Some(value.into()));
        Ok(())
    }

    pub fn delete(&mut self, key: impl Into<Vec<u8>>) -> StoreResult<()> {
        self.check_writable()?;
        self.pending.insert(key.into(), None);
        Ok(())
    }

    /// Every visible entry under `prefix`, in key order.
    pub fn scan_prefix(&self, prefix: &[u8]) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.engine.scan_prefix(prefix)?.into_iter().collect();
        let buffered = self
            .pending
            .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix));
        for (key, value) in buffered {
            match value {
                Some(v) => {
                    merged.insert(key.clone(), v.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }

    /// Apply every buffered write as a single atomic batch.
    ///
    /// Returns the number of writes applied.
    pub fn commit(self) -> StoreResult<usize> {
        if self.pending.is_empty() {
            return Ok(0);
        }
        let batch: Vec<WriteOp> = self
            .pending
            .into_iter()
            .map(|(key, value)| match value {
                Some(value) => WriteOp::Put { key, value },
                None => WriteOp::Delete { key },
            })
            .collect();
        self.engine.apply(&batch)?;
        debug!(ops = batch.len(), "transaction committed");
        Ok(batch.len())
    }

    /// Drop every buffered write.
    pub fn discard(self) {
        if !self.pending.is_empty() {
            debug!(ops = self.pending.len(), "transaction discarded");
        }
    }

    fn check_writable(&self) -> StoreResult<()> {
        if !self.writable {
            return Err(StoreError::ReadOnlyTransaction);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("writable", &self.writable)
            .field("pending", &self.pending.len())
            .finish()
    }
}
