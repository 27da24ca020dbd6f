//! Mutable document wrapper.
//!
//! A [`Document`] owns a field map and tracks whether it has been changed
//! since it was created or last loaded. A document constructed with
//! [`Document::new_static`] rejects every mutation for its whole lifetime;
//! such documents are used for read-only rows that must not be written back.
//!
//! The wrapper holds no lock. Sharing one across threads for mutation needs
//! external synchronization.
//!
//! Nothing here touches storage: [`Document::serialize`] produces the bytes,
//! and persisting them is up to the caller (see
//! [`Collection`](crate::collection::Collection)).

use std::sync::Arc;

use terara_types::{composite, Fields, Value, ID_FIELD};

use crate::error::{StoreError, StoreResult};
use crate::key::{EncodedIdKey, KeyStrategy};

#[derive(Clone, Debug)]
pub struct Document {
    fields: Fields,
    modified: bool,
    read_only: bool,
    key: Option<Vec<u8>>,
    key_strategy: Arc<dyn KeyStrategy>,
}

impl Document {
    /// An empty, writable document keyed by its encoded id.
    pub fn new() -> Self {
        Self::with_key_strategy(Arc::new(EncodedIdKey))
    }

    /// An empty, read-only document. It can still be populated with
    /// [`deserialize`](Self::deserialize) or [`project`](Self::project).
    pub fn new_static() -> Self {
        Self {
            read_only: true,
            ..Self::new()
        }
    }

    /// An empty, writable document whose storage key comes from `strategy`.
    pub fn with_key_strategy(strategy: Arc<dyn KeyStrategy>) -> Self {
        Self {
            fields: Fields::new(),
            modified: false,
            read_only: false,
            key: None,
            key_strategy: strategy,
        }
    }

    /// A writable document holding `fields`, marked as modified.
    pub fn from_fields(fields: Fields) -> Self {
        Self {
            fields,
            modified: true,
            ..Self::new()
        }
    }

    pub(crate) fn into_static(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// The value bound to `"id"`, if any.
    pub fn id(&self) -> Option<&Value> {
        self.fields.get(ID_FIELD)
    }

    /// The value bound to `key`, if any. Never fails.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Bind `key` to `value`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> StoreResult<()> {
        self.check_writable()?;
        let key = key.into();
        if key == ID_FIELD {
            self.key = None;
        }
        self.fields.insert(key, value);
        self.modified = true;
        Ok(())
    }

    /// Remove `key`. Removing an unbound key is not an error.
    pub fn del(&mut self, key: &str) -> StoreResult<()> {
        self.check_writable()?;
        if key == ID_FIELD {
            self.key = None;
        }
        self.fields.remove(key);
        self.modified = true;
        Ok(())
    }

    /// Snapshot of the bound field names.
    pub fn keys(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    /// Encode the document. Fails with `InvalidDocument` if `"id"` is unbound.
    pub fn serialize(&self) -> StoreResult<Vec<u8>> {
        let mut out = Vec::new();
        composite::encode_document(&self.fields, &mut out)?;
        Ok(out)
    }

    /// Replace the field map with the document decoded from `buf`.
    ///
    /// On failure the document is unchanged. On success the modified flag is
    /// cleared. Returns the number of bytes consumed.
    pub fn deserialize(&mut self, buf: &[u8]) -> StoreResult<usize> {
        let (fields, consumed) = composite::decode_document(buf)?;
        self.load(fields);
        Ok(consumed)
    }

    /// Replace the field map with only the fields named in `keys`.
    ///
    /// An empty `keys` is a no-op that leaves the document untouched and
    /// returns zero. Otherwise the whole document in `buf` is traversed and
    /// its full length returned.
    pub fn project<K: AsRef<str>>(&mut self, buf: &[u8], keys: &[K]) -> StoreResult<usize> {
        if keys.is_empty() {
            return Ok(0);
        }
        let (fields, consumed) = composite::project_document(buf, keys)?;
        self.load(fields);
        Ok(consumed)
    }

    fn load(&mut self, fields: Fields) {
        self.fields = fields;
        self.modified = false;
        self.key = None;
    }

    /// Key under which this document is stored, derived from `"id"` on first
    /// use and cached until `"id"` changes.
    pub fn storage_key(&mut self) -> StoreResult<&[u8]> {
        if self.key.is_none() {
            let id = self.id().ok_or_else(|| {
                StoreError::Codec(terara_types::CodecError::InvalidDocument(format!(
                    "no \"{ID_FIELD}\" to derive a storage key from"
                )))
            })?;
            self.key = Some(self.key_strategy.derive(id)?);
        }
        Ok(self.key.as_deref().unwrap_or_default())
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Clear the modified flag, typically after the caller persisted it.
    pub fn mark_clean(&mut self) {
        self.modified = false;
    }

    pub fn is_static(&self) -> bool {
        self.read_only
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn into_fields(self) -> Fields {
        self.fields
    }

    /// The document as a nested [`Value::Document`].
    pub fn into_value(self) -> Value {
        Value::Document(self.fields)
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.read_only {
            return Err(StoreError::StaticDocument);
        }
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Document {
    /// Documents are equal when their field maps are.
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}
