use thiserror::Error;

use crate::tag::Tag;

/// Errors produced while encoding or decoding values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The buffer ends before the value it describes, or a variable-length
    /// field has no terminator.
    #[error("invalid length: need {needed} bytes, have {available}")]
    InvalidLength { needed: usize, available: usize },

    /// The leading tag byte does not match the expected type, or names a
    /// type without a codec.
    #[error("invalid type: expected {expected}, found tag {found:#04x}")]
    InvalidType { expected: Expected, found: u8 },

    /// The stream is structurally invalid as a document or array.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// A string or field name contains a `0x00` byte, which would be read
    /// back as its terminator.
    #[error("embedded NUL byte at offset {offset} in {what}")]
    EmbeddedNul { what: &'static str, offset: usize },

    /// String or field name content is not valid UTF-8.
    #[error("invalid UTF-8 in {what}")]
    InvalidUtf8 { what: &'static str },
}

/// What a decoder was looking for when it hit an unexpected tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    /// A specific tag.
    Tag(Tag),
    /// Any tag with a registered codec.
    AnyValue,
}

impl std::fmt::Display for Expected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expected::Tag(tag) => write!(f, "{tag}"),
            Expected::AnyValue => f.write_str("any value"),
        }
    }
}

impl CodecError {
    pub(crate) fn short(needed: usize, available: usize) -> Self {
        Self::InvalidLength { needed, available }
    }

    pub(crate) fn wrong_tag(expected: Tag, found: u8) -> Self {
        Self::InvalidType {
            expected: Expected::Tag(expected),
            found,
        }
    }

    /// Returns `true` for [`CodecError::InvalidLength`].
    pub fn is_invalid_length(&self) -> bool {
        matches!(self, Self::InvalidLength { .. })
    }

    /// Returns `true` for [`CodecError::InvalidType`].
    pub fn is_invalid_type(&self) -> bool {
        matches!(self, Self::InvalidType { .. })
    }

    /// Returns `true` for [`CodecError::InvalidDocument`].
    pub fn is_invalid_document(&self) -> bool {
        matches!(self, Self::InvalidDocument(_))
    }
}

/// Convenience alias used throughout the types crate.
pub type Result<T> = std::result::Result<T, CodecError>;
