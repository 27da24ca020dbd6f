use terara_types::CodecError;

/// Errors from document, engine, and catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A mutation was attempted on a read-only document.
    #[error("static document: mutation rejected")]
    StaticDocument,

    /// Encoding or decoding a stored value failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A log record could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The database has been closed and accepts no new transactions.
    #[error("database is closed: {0}")]
    Closed(String),

    /// An earlier append could not be rolled back; the log accepts no more writes.
    #[error("log is unusable: {0}")]
    LogFailed(String),

    /// A write was attempted through a read-only transaction.
    #[error("transaction is read-only")]
    ReadOnlyTransaction,

    /// The collection name is not usable as a key prefix.
    #[error("invalid collection name {name:?}: {reason}")]
    InvalidCollectionName { name: String, reason: String },

    /// No collection with this name is registered.
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// A collection with this name is already registered.
    #[error("collection already exists: {0}")]
    CollectionExists(String),

    /// The configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Returns `true` if the underlying codec rejected the document structure.
    pub fn is_invalid_document(&self) -> bool {
        matches!(self, StoreError::Codec(e) if e.is_invalid_document())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
