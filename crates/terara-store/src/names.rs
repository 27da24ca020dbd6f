//! Collection name validation.
//!
//! Collection names become key prefixes (`<name>/...`), so valid names:
//! - Must be non-empty and at most [`MAX_NAME_LEN`] bytes
//! - Must not contain `/` or a NUL byte
//! - Must not start with `__` (reserved for system keys such as the catalog)

use crate::error::{StoreError, StoreResult};

pub const MAX_NAME_LEN: usize = 255;

/// Separator between a collection name and the document part of a key.
pub const KEY_SEPARATOR: u8 = b'/';

/// Prefix reserved for system keys.
pub const RESERVED_PREFIX: &str = "__";

fn invalid(name: &str, reason: impl Into<String>) -> StoreError {
    StoreError::InvalidCollectionName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate a collection name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use terara_store::names::validate_collection_name;
///
/// assert!(validate_collection_name("transfers").is_ok());
/// assert!(validate_collection_name("").is_err());
/// assert!(validate_collection_name("a/b").is_err());
/// ```
pub fn validate_collection_name(name: &str) -> StoreResult<()> {
    if name.is_empty() {
        return Err(invalid(name, "collection name must not be empty"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(invalid(
            name,
            format!("longer than {MAX_NAME_LEN} bytes"),
        ));
    }
    if name.bytes().any(|b| b == KEY_SEPARATOR) {
        return Err(invalid(name, "must not contain '/'"));
    }
    if name.bytes().any(|b| b == 0) {
        return Err(invalid(name, "must not contain a NUL byte"));
    }
    if name.starts_with(RESERVED_PREFIX) {
        return Err(invalid(name, "names starting with '__' are reserved"));
    }
    Ok(())
}
