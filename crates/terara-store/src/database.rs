use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::catalog::Catalog;
use crate::config::{DatabaseConfig, EngineKind};
use crate::error::{StoreError, StoreResult};
use crate::lock::LockRegistry;
use crate::log::LogEngine;
use crate::memory::InMemoryEngine;
use crate::traits::KvEngine;
use crate::transaction::Transaction;

/// A named database over one [`KvEngine`].
///
/// Closing is final: a closed database refuses new transactions and cannot
/// be reopened; open a new one from the same configuration instead.
/// Transactions borrow the database, so none can outlive [`close`](Self::close).
#[derive(Debug)]
pub struct Database {
    config: DatabaseConfig,
    engine: Option<Box<dyn KvEngine>>,
}

impl Database {
    /// Open the database described by `config`, creating it if needed.
    pub fn open(config: DatabaseConfig) -> StoreResult<Self> {
        let engine: Box<dyn KvEngine> = match config.engine {
            EngineKind::Memory => Box::new(InMemoryEngine::new()),
            EngineKind::Log => Box::new(LogEngine::open(&config.data_dir(), config.sync_mode)?),
        };
        info!(
            name = %config.name,
            engine = ?config.engine,
            keys = engine.len(),
            "database opened"
        );
        Ok(Self {
            config,
            engine: Some(engine),
        })
    }

    /// Flush and release the engine. Closing twice is a no-op.
    pub fn close(&mut self) -> StoreResult<()> {
        if let Some(engine) = self.engine.take() {
            engine.flush()?;
            info!(name = %self.config.name, "database closed");
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.engine.is_none()
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Root directory from the configuration.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Start a transaction. Fails with `Closed` once the database is closed.
    pub fn begin(&self, writable: bool) -> StoreResult<Transaction<'_>> {
        let engine = self
            .engine
            .as_deref()
            .ok_or_else(|| StoreError::Closed(self.config.name.clone()))?;
        Ok(Transaction::new(engine, writable))
    }

    /// Run `f` in a writable transaction and commit if it succeeds.
    pub fn update<T>(
        &self,
        f: impl FnOnce(&mut Transaction<'_>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut txn = self.begin(true)?;
        let out = f(&mut txn)?;
        txn.commit()?;
        Ok(out)
    }

    /// Run `f` in a read-only transaction.
    pub fn view<T>(&self, f: impl FnOnce(&Transaction<'_>) -> StoreResult<T>) -> StoreResult<T> {
        let txn = self.begin(false)?;
        f(&txn)
    }

    /// Load the catalog, sharing `locks` with it.
    pub fn catalog(&self, locks: Arc<LockRegistry>) -> StoreResult<Catalog> {
        let mut catalog = Catalog::new(locks, self.config.key_strategy);
        self.view(|txn| catalog.init(txn))?;
        Ok(catalog)
    }

    /// Number of live keys in the engine.
    pub fn key_count(&self) -> StoreResult<usize> {
        self.engine
            .as_deref()
            .map(|engine| engine.len())
            .ok_or_else(|| StoreError::Closed(self.config.name.clone()))
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(
                name = %self.config.name,
                error = %e,
                "failed to close database on drop"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use terara_types::Value;

    fn log_config(dir: &Path) -> DatabaseConfig {
        DatabaseConfig {
            name: "test".into(),
            path: dir.to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn close_is_idempotent_and_final() {
        let mut db = Database::open(DatabaseConfig::in_memory("scratch")).unwrap();
        assert!(!db.is_closed());
        assert_eq!(db.name(), "scratch");

        db.close().unwrap();
        db.close().unwrap();
        assert!(db.is_closed());
        assert!(matches!(db.begin(false), Err(StoreError::Closed(_))));
        assert!(matches!(db.key_count(), Err(StoreError::Closed(_))));
    }

    #[test]
    fn update_commits_and_view_reads() {
        let db = Database::open(DatabaseConfig::in_memory("scratch")).unwrap();
        db.update(|txn| txn.set(b"k".to_vec(), b"v".to_vec())).unwrap();
        let value = db.view(|txn| txn.get(b"k")).unwrap();
        assert_eq!(value, Some(b"v".to_vec()));
    }

    #[test]
    fn failed_update_applies_nothing() {
        let db = Database::open(DatabaseConfig::in_memory("scratch")).unwrap();
        let result: StoreResult<()> = db.update(|txn| {
            txn.set(b"k".to_vec(), b"v".to_vec())?;
            Err(StoreError::CollectionNotFound("missing".into()))
        });
        assert!(result.is_err());
        assert_eq!(db.key_count().unwrap(), 0);
    }

    #[test]
    fn log_database_persists_collections() {
        let dir = tempfile::tempdir().unwrap();
        let locks = Arc::new(LockRegistry::new());
        {
            let mut db = Database::open(log_config(dir.path())).unwrap();
            assert_eq!(db.path(), dir.path());
            let mut catalog = db.catalog(Arc::clone(&locks)).unwrap();
            db.update(|txn| {
                let users = catalog.create_collection(txn, "users")?;
                let mut doc = Document::new();
                doc.set("id", Value::Int64(1))?;
                doc.set("name", Value::from("alice"))?;
                users.insert(txn, &mut doc)?;
                Ok(())
            })
            .unwrap();
            db.close().unwrap();
        }
        assert!(dir.path().join("test").join(crate::log::FILE_NAME).exists());

        let db = Database::open(log_config(dir.path())).unwrap();
        let catalog = db.catalog(locks).unwrap();
        assert_eq!(catalog.names(), vec!["users"]);
        let doc = db
            .view(|txn| catalog.collection("users")?.get(txn, &Value::Int64(1)))
            .unwrap()
            .unwrap();
        assert_eq!(doc.get("name"), Some(&Value::from("alice")));
        assert!(doc.is_static());
    }
}
