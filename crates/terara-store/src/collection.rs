//! Named groups of documents sharing a key prefix.

use std::sync::Arc;

use terara_types::{codec, Fields, Value, ID_FIELD};

use crate::document::Document;
use crate::error::{StoreError, StoreResult};
use crate::key::{collection_prefix, KeyStrategy, KeyStrategyKind};
use crate::names::validate_collection_name;
use crate::transaction::Transaction;

/// Field of the catalog metadata document marking a secondary collection.
const SECONDARY_FIELD: &str = "secondary";

/// A collection of documents.
///
/// A collection holds no data itself; every operation goes through the
/// [`Transaction`] it is handed. Documents live under the collection's key
/// prefix, keyed by the configured [`KeyStrategy`].
#[derive(Clone, Debug)]
pub struct Collection {
    name: String,
    secondary: bool,
    strategy_kind: KeyStrategyKind,
    key_strategy: Arc<dyn KeyStrategy>,
}

impl Collection {
    /// A primary collection. Fails if `name` is not a valid collection name.
    pub fn new(name: &str, strategy_kind: KeyStrategyKind) -> StoreResult<Self> {
        Self::build(name, false, strategy_kind)
    }

    /// A secondary (index) collection.
    pub fn new_secondary(name: &str, strategy_kind: KeyStrategyKind) -> StoreResult<Self> {
        Self::build(name, true, strategy_kind)
    }

    fn build(name: &str, secondary: bool, strategy_kind: KeyStrategyKind) -> StoreResult<Self> {
        validate_collection_name(name)?;
        Ok(Self {
            name: name.to_string(),
            secondary,
            strategy_kind,
            key_strategy: strategy_kind.build(name),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_secondary(&self) -> bool {
        self.secondary
    }

    pub fn key_strategy_kind(&self) -> KeyStrategyKind {
        self.strategy_kind
    }

    /// Storage key of the document whose id is `id`.
    pub fn key_for(&self, id: &Value) -> StoreResult<Vec<u8>> {
        self.key_strategy.derive(id)
    }

    /// An empty document keyed the way this collection keys its documents.
    pub fn new_document(&self) -> Document {
        Document::with_key_strategy(Arc::clone(&self.key_strategy))
    }

    /// Load the document whose id is `id`.
    ///
    /// Documents read through a read-only transaction come back static.
    pub fn get(&self, txn: &Transaction<'_>, id: &Value) -> StoreResult<Option<Document>> {
        let key = self.key_for(id)?;
        let Some(bytes) = txn.get(&key)? else {
            return Ok(None);
        };
        self.load(txn, &bytes).map(Some)
    }

    /// Store `doc` under the key derived from `id`, replacing any previous
    /// document there.
    ///
    /// `doc` must carry an `"id"` of its own; it need not equal `id`.
    pub fn set(&self, txn: &mut Transaction<'_>, id: &Value, doc: &Document) -> StoreResult<()> {
        let key = self.key_for(id)?;
        let bytes = doc.serialize()?;
        txn.set(key, bytes)
    }

    /// Store `doc` under the key derived from its own `"id"` and mark it
    /// clean. Returns the storage key.
    pub fn insert(&self, txn: &mut Transaction<'_>, doc: &mut Document) -> StoreResult<Vec<u8>> {
        let id = doc.id().ok_or_else(|| {
            StoreError::Codec(terara_types::CodecError::InvalidDocument(format!(
                "cannot insert into {} without \"{ID_FIELD}\"",
                self.name
            )))
        })?;
        let key = self.key_for(id)?;
        txn.set(key.clone(), doc.serialize()?)?;
        doc.mark_clean();
        Ok(key)
    }

    /// Delete the document whose id is `id`. Deleting an absent document is
    /// not an error.
    pub fn del(&self, txn: &mut Transaction<'_>, id: &Value) -> StoreResult<()> {
        let key = self.key_for(id)?;
        txn.delete(key)
    }

    /// Every document in the collection, in storage-key order.
    pub fn scan(&self, txn: &Transaction<'_>) -> StoreResult<Vec<Document>> {
        txn.scan_prefix(&collection_prefix(&self.name))?
            .into_iter()
            .map(|(_, bytes)| self.load(txn, &bytes))
            .collect()
    }

    /// Storage keys of every document in the collection.
    pub(crate) fn keys(&self, txn: &Transaction<'_>) -> StoreResult<Vec<Vec<u8>>> {
        Ok(txn
            .scan_prefix(&collection_prefix(&self.name))?
            .into_iter()
            .map(|(key, _)| key)
            .collect())
    }

    fn load(&self, txn: &Transaction<'_>, bytes: &[u8]) -> StoreResult<Document> {
        let mut doc = self.new_document();
        doc.deserialize(bytes)?;
        Ok(if txn.is_writable() {
            doc
        } else {
            doc.into_static()
        })
    }

    /// Catalog metadata: `{id: <name>, secondary: <bool>}`.
    pub fn encode(&self) -> StoreResult<Vec<u8>> {
        let mut fields = Fields::new();
        fields.insert(ID_FIELD.to_string(), Value::String(self.name.clone()));
        fields.insert(SECONDARY_FIELD.to_string(), Value::Bool(self.secondary));
        Ok(codec::encode(&Value::Document(fields))?)
    }

    /// Rebuild a collection from its catalog metadata.
    pub fn decode(bytes: &[u8], strategy_kind: KeyStrategyKind) -> StoreResult<Self> {
        let (fields, _) = terara_types::decode_document(bytes)?;
        let name = fields
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                StoreError::Codec(terara_types::CodecError::InvalidDocument(
                    "collection metadata id is not a string".into(),
                ))
            })?;
        let secondary = fields
            .get(SECONDARY_FIELD)
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Self::build(name, secondary, strategy_kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryEngine;

    fn users() -> Collection {
        Collection::new("users", KeyStrategyKind::Scoped).unwrap()
    }

    fn person(id: i64, name: &str) -> Document {
        let mut doc = Document::new();
        doc.set("id", Value::Int64(id)).unwrap();
        doc.set("name", Value::from(name)).unwrap();
        doc
    }

    #[test]
    fn invalid_name_is_rejected() {
        assert!(matches!(
            Collection::new("a/b", KeyStrategyKind::Scoped),
            Err(StoreError::InvalidCollectionName { .. })
        ));
    }

    #[test]
    fn insert_then_get() {
        let engine = InMemoryEngine::new();
        let coll = users();

        let mut txn = Transaction::new(&engine, true);
        let mut doc = person(1, "alice");
        let key = coll.insert(&mut txn, &mut doc).unwrap();
        assert!(!doc.is_modified());
        assert!(key.starts_with(b"users/"));
        txn.commit().unwrap();

        let txn = Transaction::new(&engine, false);
        let found = coll.get(&txn, &Value::Int64(1)).unwrap().unwrap();
        assert_eq!(found, person(1, "alice"));
        assert!(found.is_static());
        assert!(coll.get(&txn, &Value::Int64(2)).unwrap().is_none());
    }

    #[test]
    fn writable_reads_are_mutable() {
        let engine = InMemoryEngine::new();
        let coll = users();
        let mut txn = Transaction::new(&engine, true);
        coll.set(&mut txn, &Value::Int64(1), &person(1, "alice")).unwrap();

        let mut doc = coll.get(&txn, &Value::Int64(1)).unwrap().unwrap();
        doc.set("name", Value::from("alicia")).unwrap();
        coll.insert(&mut txn, &mut doc).unwrap();
        assert_eq!(
            coll.get(&txn, &Value::Int64(1)).unwrap().unwrap().get("name"),
            Some(&Value::from("alicia"))
        );
    }

    #[test]
    fn insert_without_id_fails() {
        let engine = InMemoryEngine::new();
        let mut txn = Transaction::new(&engine, true);
        let mut doc = Document::new();
        doc.set("name", Value::from("anon")).unwrap();
        assert!(users().insert(&mut txn, &mut doc).unwrap_err().is_invalid_document());
        assert_eq!(txn.pending_len(), 0);
    }

    #[test]
    fn too_deep_document_is_never_stored() {
        let engine = InMemoryEngine::new();
        let coll = users();
        let mut txn = Transaction::new(&engine, true);
        coll.insert(&mut txn, &mut person(1, "alice")).unwrap();

        let deep = (0..70).fold(Value::Null, |inner, _| Value::Array(vec![inner]));
        let mut doc = person(2, "bob");
        doc.set("deep", deep).unwrap();
        assert!(coll.insert(&mut txn, &mut doc).unwrap_err().is_invalid_document());
        assert!(doc.is_modified());
        txn.commit().unwrap();

        let txn = Transaction::new(&engine, false);
        assert!(coll.get(&txn, &Value::Int64(2)).unwrap().is_none());
        assert_eq!(coll.scan(&txn).unwrap().len(), 1);
    }

    #[test]
    fn del_and_scan() {
        let engine = InMemoryEngine::new();
        let coll = users();
        let other = Collection::new("orders", KeyStrategyKind::Scoped).unwrap();
        let mut txn = Transaction::new(&engine, true);
        for (id, name) in [(1, "a"), (2, "b"), (3, "c")] {
            coll.insert(&mut txn, &mut person(id, name)).unwrap();
        }
        other.insert(&mut txn, &mut person(9, "x")).unwrap();
        coll.del(&mut txn, &Value::Int64(2)).unwrap();
        coll.del(&mut txn, &Value::Int64(42)).unwrap();

        let names: Vec<Value> = coll
            .scan(&txn)
            .unwrap()
            .into_iter()
            .filter_map(|d| d.get("name").cloned())
            .collect();
        assert_eq!(names, vec![Value::from("a"), Value::from("c")]);
        assert_eq!(other.scan(&txn).unwrap().len(), 1);
    }

    #[test]
    fn hashed_collection_roundtrips() {
        let engine = InMemoryEngine::new();
        let coll = Collection::new("users", KeyStrategyKind::Hashed).unwrap();
        let mut txn = Transaction::new(&engine, true);
        let key = coll.insert(&mut txn, &mut person(7, "h")).unwrap();
        assert_eq!(key.len(), "users/".len() + 32);
        assert!(coll.get(&txn, &Value::Int64(7)).unwrap().is_some());
        assert_eq!(coll.scan(&txn).unwrap().len(), 1);
    }

    #[test]
    fn metadata_roundtrip() {
        let coll = Collection::new_secondary("by_email", KeyStrategyKind::Scoped).unwrap();
        let bytes = coll.encode().unwrap();
        let back = Collection::decode(&bytes, KeyStrategyKind::Scoped).unwrap();
        assert_eq!(back.name(), "by_email");
        assert!(back.is_secondary());
    }

    #[test]
    fn metadata_with_non_string_id_is_rejected() {
        let mut fields = Fields::new();
        fields.insert("id".into(), Value::Int64(1));
        let bytes = codec::encode(&Value::Document(fields)).unwrap();
        assert!(Collection::decode(&bytes, KeyStrategyKind::Scoped)
            .unwrap_err()
            .is_invalid_document());
    }
}
