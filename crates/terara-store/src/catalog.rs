//! Registry of the collections in a database.
//!
//! Collection metadata is persisted under the reserved `__catalog/` prefix,
//! one codec document per collection. [`Catalog::init`] rebuilds the
//! in-memory view from those documents.
//!
//! Create and drop write through the transaction they are given, but update
//! the in-memory view immediately. If that transaction is discarded, call
//! [`Catalog::init`] again to resynchronize.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::collection::Collection;
use crate::error::{StoreError, StoreResult};
use crate::key::KeyStrategyKind;
use crate::lock::LockRegistry;
use crate::names::validate_collection_name;
use crate::transaction::Transaction;

/// Key prefix of catalog metadata documents.
pub const CATALOG_PREFIX: &str = "__catalog/";

fn catalog_key(name: &str) -> String {
    format!("{CATALOG_PREFIX}{name}")
}

#[derive(Debug)]
pub struct Catalog {
    collections: BTreeMap<String, Collection>,
    locks: Arc<LockRegistry>,
    key_strategy: KeyStrategyKind,
}

impl Catalog {
    /// An empty catalog. Call [`init`](Self::init) to load persisted
    /// collections.
    pub fn new(locks: Arc<LockRegistry>, key_strategy: KeyStrategyKind) -> Self {
        Self {
            collections: BTreeMap::new(),
            locks,
            key_strategy,
        }
    }

    /// Replace the in-memory view with the persisted metadata.
    ///
    /// Returns the number of collections loaded.
    pub fn init(&mut self, txn: &Transaction<'_>) -> StoreResult<usize> {
        let mut loaded = BTreeMap::new();
        for (_, bytes) in txn.scan_prefix(CATALOG_PREFIX.as_bytes())? {
            let collection = Collection::decode(&bytes, self.key_strategy)?;
            loaded.insert(collection.name().to_string(), collection);
        }
        self.collections = loaded;
        debug!(collections = self.collections.len(), "catalog loaded");
        Ok(self.collections.len())
    }

    pub fn create_collection(
        &mut self,
        txn: &mut Transaction<'_>,
        name: &str,
    ) -> StoreResult<&Collection> {
        self.create(txn, name, false)
    }

    /// Create a secondary (index) collection.
    pub fn create_secondary(
        &mut self,
        txn: &mut Transaction<'_>,
        name: &str,
    ) -> StoreResult<&Collection> {
        self.create(txn, name, true)
    }

    fn create(
        &mut self,
        txn: &mut Transaction<'_>,
        name: &str,
        secondary: bool,
    ) -> StoreResult<&Collection> {
        validate_collection_name(name)?;
        let key = catalog_key(name);
        let locks = Arc::clone(&self.locks);
        let _claim = locks.claim(&key);

        if self.collections.contains_key(name) {
            return Err(StoreError::CollectionExists(name.to_string()));
        }
        let collection = if secondary {
            Collection::new_secondary(name, self.key_strategy)?
        } else {
            Collection::new(name, self.key_strategy)?
        };
        txn.set(key, collection.encode()?)?;

        info!(collection = name, secondary, "collection created");
        Ok(self
            .collections
            .entry(name.to_string())
            .or_insert(collection))
    }

    /// Remove a collection and every document in it.
    ///
    /// Returns the number of documents deleted.
    pub fn drop_collection(&mut self, txn: &mut Transaction<'_>, name: &str) -> StoreResult<usize> {
        let key = catalog_key(name);
        let locks = Arc::clone(&self.locks);
        let _claim = locks.claim(&key);

        let collection = self
            .collections
            .get(name)
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))?;
        let doc_keys = collection.keys(txn)?;
        let removed = doc_keys.len();
        for doc_key in doc_keys {
            txn.delete(doc_key)?;
        }
        txn.delete(key)?;
        self.collections.remove(name);

        info!(collection = name, removed, "collection dropped");
        Ok(removed)
    }

    pub fn collection(&self, name: &str) -> StoreResult<&Collection> {
        self.collections
            .get(name)
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))
    }

    /// Sorted names of every registered collection.
    pub fn names(&self) -> Vec<String> {
        self.collections.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// The lock registry shared with this catalog.
    pub fn locks(&self) -> &Arc<LockRegistry> {
        &self.locks
    }
}
