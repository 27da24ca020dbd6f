//! Tag-dispatched entry points over the scalar and composite codecs.

use crate::composite;
use crate::error::{CodecError, Expected, Result};
use crate::scalar;
use crate::tag::Tag;
use crate::value::Value;

/// Deepest array/document nesting accepted by the encoder and decoder.
pub const MAX_DEPTH: usize = 64;

/// Encode any value into a fresh buffer.
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_value(value, &mut out, 0)?;
    Ok(out)
}

/// Append the encoding of `value` to `out`.
///
/// On error `out` is left exactly as it was.
pub fn encode_into(value: &Value, out: &mut Vec<u8>) -> Result<()> {
    let start = out.len();
    write_value(value, out, 0).inspect_err(|_| out.truncate(start))
}

pub(crate) fn write_value(value: &Value, out: &mut Vec<u8>, depth: usize) -> Result<()> {
    match value {
        Value::Null => scalar::encode_null(out),
        Value::Bool(b) => scalar::encode_bool(*b, out),
        Value::Char(c) => scalar::encode_char(*c, out),
        Value::Int32(i) => scalar::encode_int32(*i, out),
        Value::Int64(i) => scalar::encode_int64(*i, out),
        Value::Float(x) => scalar::encode_float(*x, out),
        Value::String(s) => scalar::encode_string(s, out)?,
        Value::Array(items) => composite::array_into(items, out, depth)?,
        Value::Document(fields) => composite::document_into(fields, out, depth)?,
    }
    Ok(())
}

/// Decode the value at the start of `buf`.
///
/// Returns the value and the number of bytes it occupied; bytes past that
/// point are left untouched. Framing markers are not values and fail with
/// `InvalidDocument`; reserved or unknown tags fail with `InvalidType`.
pub fn decode(buf: &[u8]) -> Result<(Value, usize)> {
    decode_value(buf, 0)
}

pub(crate) fn decode_value(buf: &[u8], depth: usize) -> Result<(Value, usize)> {
    let Some(&first) = buf.first() else {
        return Err(CodecError::InvalidLength {
            needed: 1,
            available: 0,
        });
    };
    let tag = Tag::from_byte(first).ok_or(CodecError::InvalidType {
        expected: Expected::AnyValue,
        found: first,
    })?;
    match tag {
        Tag::Null => scalar::decode_null(buf).map(|n| (Value::Null, n)),
        Tag::Bool => scalar::decode_bool(buf).map(|(b, n)| (Value::Bool(b), n)),
        Tag::Char => scalar::decode_char(buf).map(|(c, n)| (Value::Char(c), n)),
        Tag::Int32 => scalar::decode_int32(buf).map(|(i, n)| (Value::Int32(i), n)),
        Tag::Int64 => scalar::decode_int64(buf).map(|(i, n)| (Value::Int64(i), n)),
        Tag::Float => scalar::decode_float(buf).map(|(x, n)| (Value::Float(x), n)),
        Tag::String => scalar::decode_string(buf).map(|(s, n)| (Value::String(s), n)),
        Tag::Array => composite::array_at(buf, depth).map(|(a, n)| (Value::Array(a), n)),
        Tag::Document => composite::document_at(buf, depth).map(|(d, n)| (Value::Document(d), n)),
        Tag::EndOfStream | Tag::FieldName | Tag::Last => Err(CodecError::InvalidDocument(
            format!("{tag} marker in value position"),
        )),
        Tag::BigInt
        | Tag::BigFloat
        | Tag::Collection
        | Tag::Date
        | Tag::TimeStamp
        | Tag::Email
        | Tag::Phone
        | Tag::Money
        | Tag::Uuid
        | Tag::Binary
        | Tag::Blob
        | Tag::Longitude
        | Tag::Latitude
        | Tag::CurrencyCode
        | Tag::CountryCode => Err(CodecError::InvalidType {
            expected: Expected::AnyValue,
            found: first,
        }),
    }
}
