//! Value model and binary codec for terara.
//!
//! This crate defines the only persisted representation of data in terara:
//! a self-describing, tag-prefixed encoding that needs no external length
//! table. Every other terara crate depends on `terara-types`.
//!
//! # Key Types
//!
//! - [`Tag`] -- the closed set of one-byte type tags
//! - [`Value`] -- tagged union of scalars, arrays and documents
//! - [`Fields`] -- the field map of a document
//! - [`CodecError`] -- why an encode or decode failed
//!
//! # Codec
//!
//! - [`encode`] / [`decode`] dispatch on the value's tag
//! - [`scalar`] holds the fixed-layout codecs and the framing markers
//! - [`composite`] holds arrays, documents and [`project_document`]
//!
//! Decoding never reads past the value it is decoding and always reports
//! how many bytes that value occupied. Encoding and decoding both cap
//! array/document nesting at [`MAX_DEPTH`], so anything that encodes also
//! decodes.
//!
//! # Compatibility
//!
//! String and field-name payloads must be valid UTF-8. Records written by
//! encoders that stored arbitrary bytes in a string fail to decode here with
//! [`CodecError::InvalidUtf8`], so such data is not readable across versions.

pub mod codec;
pub mod composite;
pub mod error;
pub mod scalar;
pub mod tag;
pub mod value;

pub use codec::{decode, encode, encode_into, MAX_DEPTH};
pub use composite::{decode_array, decode_document, encode_array, encode_document, project_document};
pub use error::{CodecError, Expected, Result};
pub use tag::Tag;
pub use value::{Fields, Value, ID_FIELD};
