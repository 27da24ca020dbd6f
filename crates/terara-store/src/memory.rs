use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::RwLock;

use crate::error::StoreResult;
use crate::traits::{KvEngine, WriteOp};

/// In-memory, `BTreeMap`-based engine.
///
/// Intended for tests and embedding. Nothing survives the process. The map
/// sits behind a `RwLock`, so a batch is applied under a single write guard.
pub struct InMemoryEngine {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl InMemoryEngine {
    /// Create a new empty engine.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for InMemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl KvEngine for InMemoryEngine {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    fn apply(&self, batch: &[WriteOp]) -> StoreResult<()> {
        let mut map = self.entries.write().expect("lock poisoned");
        for op in batch {
            match op {
                WriteOp::Put { key, value } => {
                    map.insert(key.clone(), value.clone());
                }
                WriteOp::Delete { key } => {
                    map.remove(key);
                }
            }
        }
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let map = self.entries.read().expect("lock poisoned");
        Ok(map
            .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }
}

impl std::fmt::Debug for InMemoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryEngine")
            .field("key_count", &count)
            .finish()
    }
}
