//! Storage key derivation.
//!
//! A document does not know where it lives; a [`KeyStrategy`] maps its `"id"`
//! value to the key used in the key-value engine. Strategies are injected
//! into documents and collections so the derivation policy can change
//! without touching the codec or the wrapper.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use terara_types::{codec, Value};

use crate::error::StoreResult;
use crate::names::KEY_SEPARATOR;

/// Maps a document id to its storage key.
pub trait KeyStrategy: Send + Sync + fmt::Debug {
    fn derive(&self, id: &Value) -> StoreResult<Vec<u8>>;
}

/// Key is the codec encoding of the id itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct EncodedIdKey;

impl KeyStrategy for EncodedIdKey {
    fn derive(&self, id: &Value) -> StoreResult<Vec<u8>> {
        Ok(codec::encode(id)?)
    }
}

/// `<collection>/` followed by the encoded id.
///
/// Keys sort by collection, then by encoded id, which keeps a collection's
/// documents contiguous for prefix scans.
#[derive(Clone, Debug)]
pub struct CollectionScopedKey {
    prefix: Vec<u8>,
}

impl CollectionScopedKey {
    pub fn new(collection: &str) -> Self {
        Self {
            prefix: collection_prefix(collection),
        }
    }

    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }
}

impl KeyStrategy for CollectionScopedKey {
    fn derive(&self, id: &Value) -> StoreResult<Vec<u8>> {
        let mut key = self.prefix.clone();
        codec::encode_into(id, &mut key)?;
        Ok(key)
    }
}

/// `<collection>/` followed by the BLAKE3 hash of the encoded id.
///
/// Fixed-width keys regardless of id size; ordering within a collection is
/// arbitrary.
#[derive(Clone, Debug)]
pub struct HashedIdKey {
    prefix: Vec<u8>,
}

impl HashedIdKey {
    pub fn new(collection: &str) -> Self {
        Self {
            prefix: collection_prefix(collection),
        }
    }
}

impl KeyStrategy for HashedIdKey {
    fn derive(&self, id: &Value) -> StoreResult<Vec<u8>> {
        let encoded = codec::encode(id)?;
        let mut key = Vec::with_capacity(self.prefix.len() + blake3::OUT_LEN);
        key.extend_from_slice(&self.prefix);
        key.extend_from_slice(blake3::hash(&encoded).as_bytes());
        Ok(key)
    }
}

/// Which collection-scoped strategy to use, as named in configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStrategyKind {
    #[default]
    Scoped,
    Hashed,
}

impl KeyStrategyKind {
    /// Build the strategy for a given collection.
    pub fn build(self, collection: &str) -> Arc<dyn KeyStrategy> {
        match self {
            KeyStrategyKind::Scoped => Arc::new(CollectionScopedKey::new(collection)),
            KeyStrategyKind::Hashed => Arc::new(HashedIdKey::new(collection)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KeyStrategyKind::Scoped => "scoped",
            KeyStrategyKind::Hashed => "hashed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scoped" => Some(KeyStrategyKind::Scoped),
            "hashed" => Some(KeyStrategyKind::Hashed),
            _ => None,
        }
    }
}

/// Key prefix shared by every document of `collection`.
pub fn collection_prefix(collection: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(collection.len() + 1);
    prefix.extend_from_slice(collection.as_bytes());
    prefix.push(KEY_SEPARATOR);
    prefix
}
