//! Fixed-layout codecs for scalar values and framing markers.
//!
//! Every encoding starts with its tag byte. Fixed-width integers and floats
//! are big-endian; strings and field names are NUL-terminated.
//!
//! ```text
//! Null        [tag]                       1 byte
//! Bool        [tag][0x01 | 0x00]          2 bytes
//! Char        [tag][byte]                 2 bytes
//! Int32       [tag][4 bytes BE]           5 bytes
//! Int64       [tag][8 bytes BE]           9 bytes
//! Float       [tag][8 bytes BE IEEE-754]  9 bytes
//! String      [tag][utf-8 ...][0x00]      variable
//! FieldName   [tag][utf-8 ...][0x00]      variable
//! EndOfStream [tag]                       1 byte
//! ```
//!
//! Decoders return the decoded payload together with the number of bytes
//! consumed, so callers can walk a concatenated stream.

use crate::error::{CodecError, Result};
use crate::tag::Tag;

/// Terminator of strings and field names.
pub const NUL: u8 = 0x00;

/// Check that `buf` holds at least `len` bytes and starts with `tag`.
pub(crate) fn expect(buf: &[u8], tag: Tag, len: usize) -> Result<()> {
    if buf.len() < len {
        return Err(CodecError::short(len, buf.len()));
    }
    if buf[0] != tag.as_byte() {
        return Err(CodecError::wrong_tag(tag, buf[0]));
    }
    Ok(())
}

fn fixed<const N: usize>(buf: &[u8]) -> [u8; N] {
    let mut arr = [0u8; N];
    arr.copy_from_slice(&buf[1..=N]);
    arr
}

pub fn encode_null(out: &mut Vec<u8>) {
    out.push(Tag::Null.as_byte());
}

pub fn decode_null(buf: &[u8]) -> Result<usize> {
    expect(buf, Tag::Null, 1)?;
    Ok(1)
}

pub fn encode_bool(value: bool, out: &mut Vec<u8>) {
    out.push(Tag::Bool.as_byte());
    out.push(u8::from(value));
}

/// Only `0x01` decodes as `true`; every other payload byte is `false`.
pub fn decode_bool(buf: &[u8]) -> Result<(bool, usize)> {
    expect(buf, Tag::Bool, 2)?;
    Ok((buf[1] == 1, 2))
}

pub fn encode_char(value: u8, out: &mut Vec<u8>) {
    out.push(Tag::Char.as_byte());
    out.push(value);
}

pub fn decode_char(buf: &[u8]) -> Result<(u8, usize)> {
    expect(buf, Tag::Char, 2)?;
    Ok((buf[1], 2))
}

pub fn encode_int32(value: i32, out: &mut Vec<u8>) {
    out.push(Tag::Int32.as_byte());
    out.extend_from_slice(&value.to_be_bytes());
}

pub fn decode_int32(buf: &[u8]) -> Result<(i32, usize)> {
    expect(buf, Tag::Int32, 5)?;
    Ok((i32::from_be_bytes(fixed::<4>(buf)), 5))
}

pub fn encode_int64(value: i64, out: &mut Vec<u8>) {
    out.push(Tag::Int64.as_byte());
    out.extend_from_slice(&value.to_be_bytes());
}

pub fn decode_int64(buf: &[u8]) -> Result<(i64, usize)> {
    expect(buf, Tag::Int64, 9)?;
    Ok((i64::from_be_bytes(fixed::<8>(buf)), 9))
}

pub fn encode_float(value: f64, out: &mut Vec<u8>) {
    out.push(Tag::Float.as_byte());
    out.extend_from_slice(&value.to_bits().to_be_bytes());
}

pub fn decode_float(buf: &[u8]) -> Result<(f64, usize)> {
    expect(buf, Tag::Float, 9)?;
    Ok((f64::from_bits(u64::from_be_bytes(fixed::<8>(buf))), 9))
}

fn encode_terminated(tag: Tag, what: &'static str, text: &str, out: &mut Vec<u8>) -> Result<()> {
    if let Some(offset) = text.bytes().position(|b| b == NUL) {
        return Err(CodecError::EmbeddedNul { what, offset });
    }
    out.reserve(text.len() + 2);
    out.push(tag.as_byte());
    out.extend_from_slice(text.as_bytes());
    out.push(NUL);
    Ok(())
}

fn decode_terminated(tag: Tag, what: &'static str, buf: &[u8]) -> Result<(String, usize)> {
    expect(buf, tag, 2)?;
    let end = buf[1..]
        .iter()
        .position(|&b| b == NUL)
        .map(|i| i + 1)
        .ok_or_else(|| CodecError::short(buf.len() + 1, buf.len()))?;
    let text = std::str::from_utf8(&buf[1..end]).map_err(|_| CodecError::InvalidUtf8 { what })?;
    Ok((text.to_owned(), end + 1))
}

/// Encode a string value. Fails if `value` contains a NUL byte.
pub fn encode_string(value: &str, out: &mut Vec<u8>) -> Result<()> {
    encode_terminated(Tag::String, "string", value, out)
}

pub fn decode_string(buf: &[u8]) -> Result<(String, usize)> {
    decode_terminated(Tag::String, "string", buf)
}

/// Encode a document key marker. Same layout as a string, distinct tag.
pub fn encode_field_name(name: &str, out: &mut Vec<u8>) -> Result<()> {
    encode_terminated(Tag::FieldName, "field name", name, out)
}

pub fn decode_field_name(buf: &[u8]) -> Result<(String, usize)> {
    decode_terminated(Tag::FieldName, "field name", buf)
}

pub fn encode_end_of_stream(out: &mut Vec<u8>) {
    out.push(Tag::EndOfStream.as_byte());
}

pub fn decode_end_of_stream(buf: &[u8]) -> Result<usize> {
    expect(buf, Tag::EndOfStream, 1)?;
    Ok(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enc(f: impl FnOnce(&mut Vec<u8>)) -> Vec<u8> {
        let mut out = Vec::new();
        f(&mut out);
        out
    }

    #[test]
    fn int64_layout() {
        let bytes = enc(|o| encode_int64(42, o));
        assert_eq!(bytes, vec![Tag::Int64.as_byte(), 0, 0, 0, 0, 0, 0, 0, 42]);
        assert_eq!(decode_int64(&bytes).unwrap(), (42, 9));
    }

    #[test]
    fn negative_integers_are_twos_complement() {
        let bytes = enc(|o| encode_int32(-1, o));
        assert_eq!(bytes, vec![Tag::Int32.as_byte(), 0xff, 0xff, 0xff, 0xff]);
        assert_eq!(decode_int32(&bytes).unwrap(), (-1, 5));
    }

    #[test]
    fn float_layout_is_ieee_big_endian() {
        let bytes = enc(|o| encode_float(1.0, o));
        assert_eq!(bytes, vec![Tag::Float.as_byte(), 0x3f, 0xf0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(decode_float(&bytes).unwrap(), (1.0, 9));
    }

    #[test]
    fn bool_layout() {
        assert_eq!(enc(|o| encode_bool(true, o)), vec![Tag::Bool.as_byte(), 1]);
        assert_eq!(enc(|o| encode_bool(false, o)), vec![Tag::Bool.as_byte(), 0]);
        assert_eq!(decode_bool(&[Tag::Bool.as_byte(), 7]).unwrap(), (false, 2));
    }

    #[test]
    fn bool_needs_payload_byte() {
        let err = decode_bool(&[Tag::Bool.as_byte()]).unwrap_err();
        assert!(err.is_invalid_length());
    }

    #[test]
    fn char_and_null() {
        assert_eq!(decode_char(&[Tag::Char.as_byte(), b'z']).unwrap(), (b'z', 2));
        assert_eq!(decode_null(&[Tag::Null.as_byte(), 0xaa]).unwrap(), 1);
    }

    #[test]
    fn string_is_nul_terminated() {
        let bytes = enc(|o| encode_string("alice", o).unwrap());
        assert_eq!(bytes, b"\x05alice\x00".to_vec());
        assert_eq!(decode_string(&bytes).unwrap(), ("alice".to_string(), 7));
    }

    #[test]
    fn empty_string_roundtrip() {
        let bytes = enc(|o| encode_string("", o).unwrap());
        assert_eq!(bytes.len(), 2);
        assert_eq!(decode_string(&bytes).unwrap(), (String::new(), 2));
    }

    #[test]
    fn string_decode_stops_at_first_terminator() {
        let buf = b"\x05ab\x00cd\x00";
        assert_eq!(decode_string(buf).unwrap(), ("ab".to_string(), 4));
    }

    #[test]
    fn unterminated_string_is_invalid_length() {
        let err = decode_string(b"\x05abc").unwrap_err();
        assert!(err.is_invalid_length());
    }

    #[test]
    fn embedded_nul_is_rejected_on_encode() {
        let mut out = Vec::new();
        let err = encode_string("a\0b", &mut out).unwrap_err();
        assert_eq!(err, CodecError::EmbeddedNul { what: "string", offset: 1 });
        assert!(out.is_empty());
    }

    #[test]
    fn invalid_utf8_is_rejected_on_decode() {
        let err = decode_string(&[Tag::String.as_byte(), 0xff, 0xfe, 0]).unwrap_err();
        assert_eq!(err, CodecError::InvalidUtf8 { what: "string" });
    }

    #[test]
    fn field_name_uses_its_own_tag() {
        let bytes = enc(|o| encode_field_name("id", o).unwrap());
        assert_eq!(bytes[0], Tag::FieldName.as_byte());
        assert!(decode_string(&bytes).unwrap_err().is_invalid_type());
        assert_eq!(decode_field_name(&bytes).unwrap(), ("id".to_string(), 4));
    }

    #[test]
    fn wrong_tag_is_invalid_type() {
        let bytes = enc(|o| encode_int32(5, o));
        let err = decode_int64(&[bytes.clone(), vec![0; 4]].concat()).unwrap_err();
        assert_eq!(
            err,
            CodecError::InvalidType {
                expected: crate::error::Expected::Tag(Tag::Int64),
                found: Tag::Int32.as_byte(),
            }
        );
    }

    #[test]
    fn short_buffers_are_invalid_length() {
        assert!(decode_int64(&[Tag::Int64.as_byte(), 0, 0]).unwrap_err().is_invalid_length());
        assert!(decode_int32(&[]).unwrap_err().is_invalid_length());
        assert!(decode_float(&[Tag::Float.as_byte()]).unwrap_err().is_invalid_length());
        assert!(decode_end_of_stream(&[]).unwrap_err().is_invalid_length());
    }
}
