//! Array and document codecs.
//!
//! Composite values carry no length prefix. An array is its tag, each
//! element's encoding in order, then an end-of-stream marker. A document is
//! its tag, a sequence of (field-name marker, value) pairs, then an
//! end-of-stream marker:
//!
//! ```text
//! [Document] [FieldName "id"\0] [Int64 ...] [FieldName "name"\0] [String ...] [EndOfStream]
//! ```
//!
//! Because there is no offset table, skipping a field means decoding it.

use crate::codec::{self, MAX_DEPTH};
use crate::error::{CodecError, Result};
use crate::scalar;
use crate::tag::Tag;
use crate::value::{Fields, Value, ID_FIELD};

const END: u8 = Tag::EndOfStream.as_byte();

/// Byte at `pos`, or `InvalidLength` if the stream ended before its marker.
fn peek(buf: &[u8], pos: usize) -> Result<u8> {
    buf.get(pos)
        .copied()
        .ok_or_else(|| CodecError::short(pos + 1, buf.len()))
}

fn missing_id() -> CodecError {
    CodecError::InvalidDocument(format!("missing \"{ID_FIELD}\" field"))
}

fn enter(depth: usize) -> Result<()> {
    if depth >= MAX_DEPTH {
        return Err(CodecError::InvalidDocument(format!(
            "nesting deeper than {MAX_DEPTH} levels"
        )));
    }
    Ok(())
}

/// Reject framing markers where a value must start.
fn reject_marker(byte: u8, position: impl FnOnce() -> String) -> Result<()> {
    match Tag::from_byte(byte) {
        Some(tag) if tag.is_internal() => Err(CodecError::InvalidDocument(format!(
            "{tag} marker as {}",
            position()
        ))),
        _ => Ok(()),
    }
}

pub fn encode_array(items: &[Value], out: &mut Vec<u8>) -> Result<()> {
    array_into(items, out, 0)
}

pub(crate) fn array_into(items: &[Value], out: &mut Vec<u8>, depth: usize) -> Result<()> {
    enter(depth)?;
    out.push(Tag::Array.as_byte());
    for item in items {
        codec::write_value(item, out, depth + 1)?;
    }
    scalar::encode_end_of_stream(out);
    Ok(())
}

/// Decode an array. The consumed count includes the end-of-stream marker.
pub fn decode_array(buf: &[u8]) -> Result<(Vec<Value>, usize)> {
    array_at(buf, 0)
}

pub(crate) fn array_at(buf: &[u8], depth: usize) -> Result<(Vec<Value>, usize)> {
    scalar::expect(buf, Tag::Array, 1)?;
    enter(depth)?;
    let mut items = Vec::new();
    let mut pos = 1;
    loop {
        let next = peek(buf, pos)?;
        if next == END {
            return Ok((items, pos + 1));
        }
        reject_marker(next, || format!("array element {}", items.len()))?;
        let (item, n) = codec::decode_value(&buf[pos..], depth + 1)?;
        items.push(item);
        pos += n;
    }
}

/// Encode a document. Fails with `InvalidDocument` when `"id"` is unbound.
pub fn encode_document(fields: &Fields, out: &mut Vec<u8>) -> Result<()> {
    document_into(fields, out, 0)
}

pub(crate) fn document_into(fields: &Fields, out: &mut Vec<u8>, depth: usize) -> Result<()> {
    if !fields.contains_key(ID_FIELD) {
        return Err(missing_id());
    }
    enter(depth)?;
    out.push(Tag::Document.as_byte());
    for (name, value) in fields {
        scalar::encode_field_name(name, out)?;
        codec::write_value(value, out, depth + 1)?;
    }
    scalar::encode_end_of_stream(out);
    Ok(())
}

/// Decode a full document.
///
/// Duplicate keys are accepted; the last occurrence wins. The decoded
/// document must bind `"id"`.
pub fn decode_document(buf: &[u8]) -> Result<(Fields, usize)> {
    document_at(buf, 0)
}

pub(crate) fn document_at(buf: &[u8], depth: usize) -> Result<(Fields, usize)> {
    let (fields, consumed) = walk_document(buf, depth, |_| true)?;
    if !fields.contains_key(ID_FIELD) {
        return Err(missing_id());
    }
    Ok((fields, consumed))
}

/// Decode only the fields named in `keys`.
///
/// Every field is still decoded to find where the next one starts, so the
/// consumed count is always the full encoded length of the document. An
/// empty `keys` is a no-op that reads nothing and reports zero bytes.
/// Unlike [`decode_document`], the result is not required to contain
/// `"id"`.
pub fn project_document<K: AsRef<str>>(buf: &[u8], keys: &[K]) -> Result<(Fields, usize)> {
    if keys.is_empty() {
        return Ok((Fields::new(), 0));
    }
    walk_document(buf, 0, |name| keys.iter().any(|k| k.as_ref() == name))
}

fn walk_document(
    buf: &[u8],
    depth: usize,
    mut keep: impl FnMut(&str) -> bool,
) -> Result<(Fields, usize)> {
    scalar::expect(buf, Tag::Document, 1)?;
    enter(depth)?;
    let mut fields = Fields::new();
    let mut pos = 1;
    loop {
        if peek(buf, pos)? == END {
            return Ok((fields, pos + 1));
        }
        let (name, n) = scalar::decode_field_name(&buf[pos..])?;
        pos += n;

        reject_marker(peek(buf, pos)?, || format!("value of field {name:?}"))?;
        let (value, n) = codec::decode_value(&buf[pos..], depth + 1)?;
        pos += n;

        if keep(&name) {
            fields.insert(name, value);
        }
    }
}
