//! Advisory lock registry.
//!
//! [`LockRegistry`] records which keys are currently marked "in use". It is a
//! marker, not a mutex:
//!
//! - `lock` never blocks and never fails, even if the key is already claimed
//! - there is no owner, so a caller cannot tell its own claim from another's
//! - `unlock` of an unclaimed key is a no-op
//!
//! Only access to the claimed set itself is serialized. Callers that need
//! exclusive access to a document must coordinate some other way.
//!
//! The registry is shared explicitly (usually as `Arc<LockRegistry>`) by the
//! components that consult it; there is no global instance.

use std::collections::HashSet;
use std::sync::Mutex;

/// Process-wide set of claimed keys.
#[derive(Debug, Default)]
pub struct LockRegistry {
    claimed: Mutex<HashSet<String>>,
}

impl LockRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` as claimed. Claiming an already claimed key succeeds.
    pub fn lock(&self, key: &str) {
        self.claimed
            .lock()
            .expect("lock registry poisoned")
            .insert(key.to_string());
    }

    /// Remove the claim on `key`, if any.
    pub fn unlock(&self, key: &str) {
        self.claimed
            .lock()
            .expect("lock registry poisoned")
            .remove(key);
    }

    pub fn is_locked(&self, key: &str) -> bool {
        self.claimed
            .lock()
            .expect("lock registry poisoned")
            .contains(key)
    }

    /// Claim `key` until the returned guard is dropped.
    ///
    /// Dropping the guard unlocks the key even if someone else claimed it in
    /// the meantime; claims are not counted.
    pub fn claim(&self, key: &str) -> Claim<'_> {
        self.lock(key);
        Claim {
            registry: self,
            key: key.to_string(),
        }
    }

    /// Sorted snapshot of the claimed keys.
    pub fn claimed(&self) -> Vec<String> {
        let set = self.claimed.lock().expect("lock registry poisoned");
        let mut keys: Vec<String> = set.iter().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.claimed.lock().expect("lock registry poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Guard returned by [`LockRegistry::claim`].
#[derive(Debug)]
pub struct Claim<'a> {
    registry: &'a LockRegistry,
    key: String,
}

impl Claim<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.registry.unlock(&self.key);
    }
}
