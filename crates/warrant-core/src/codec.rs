//! Canonical CBOR encoding for deterministic serialization.
//!
//! Implements RFC 8949 Core Deterministic Encoding over arbitrary serde
//! values:
//! - Map keys sorted by encoded byte comparison
//! - Integers use the smallest valid encoding
//! - Definite lengths only
//! - Tags preserved (links are tag 42)
//! - No floats
//!
//! The canonical encoding is load-bearing: signatures cover canonical bytes
//! and content identifiers hash them, so the same logical value must produce
//! identical bytes on every platform and on every re-encoding.

use ciborium::value::Value;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecError;

/// Serialize `value` into a CBOR value tree.
///
/// Struct field order and integer widths are normalized away in
/// [`encode_value`]; this is the intermediate form canonicalization works on.
pub fn to_value<T: Serialize>(value: &T) -> Result<Value, CodecError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| CodecError::Encode(e.to_string()))?;
    ciborium::from_reader(buf.as_slice()).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Encode `value` to canonical CBOR bytes.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    encode_value(&to_value(value)?)
}

/// Encode a CBOR value tree to canonical bytes.
pub fn encode_value(value: &Value) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    write_value(&mut buf, value)?;
    Ok(buf)
}

/// Decode a value from CBOR bytes.
///
/// Decoding is tolerant of non-canonical input; re-encoding normalizes.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    ciborium::from_reader(bytes).map_err(|e| CodecError::Decode(e.to_string()))
}

/// Decode CBOR bytes into a value tree.
pub fn decode_value(bytes: &[u8]) -> Result<Value, CodecError> {
    ciborium::from_reader(bytes).map_err(|e| CodecError::Decode(e.to_string()))
}

/// Recursively encode a CBOR value.
fn write_value(buf: &mut Vec<u8>, value: &Value) -> Result<(), CodecError> {
    match value {
        Value::Integer(i) => write_integer(buf, i128::from(*i)),
        Value::Bytes(b) => {
            write_head(buf, 2, b.len() as u64);
            buf.extend_from_slice(b);
            Ok(())
        }
        Value::Text(s) => {
            write_head(buf, 3, s.len() as u64);
            buf.extend_from_slice(s.as_bytes());
            Ok(())
        }
        Value::Array(items) => {
            write_head(buf, 4, items.len() as u64);
            for item in items {
                write_value(buf, item)?;
            }
            Ok(())
        }
        Value::Map(entries) => write_map(buf, entries),
        Value::Tag(tag, inner) => {
            write_head(buf, 6, *tag);
            write_value(buf, inner)
        }
        Value::Bool(b) => {
            buf.push(if *b { 0xf5 } else { 0xf4 });
            Ok(())
        }
        Value::Null => {
            buf.push(0xf6);
            Ok(())
        }
        Value::Float(_) => Err(CodecError::Float),
        _ => Err(CodecError::Unsupported),
    }
}

/// Encode a CBOR integer (major types 0 and 1).
fn write_integer(buf: &mut Vec<u8>, n: i128) -> Result<(), CodecError> {
    if n >= 0 {
        if n > u64::MAX as i128 {
            return Err(CodecError::Unsupported);
        }
        write_head(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        let abs = -1 - n;
        if abs > u64::MAX as i128 {
            return Err(CodecError::Unsupported);
        }
        write_head(buf, 1, abs as u64);
    }
    Ok(())
}

/// Encode a major-type head with the smallest argument width.
fn write_head(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a map canonically: keys sorted by their encoded bytes.
fn write_map(buf: &mut Vec<u8>, entries: &[(Value, Value)]) -> Result<(), CodecError> {
    let mut encoded: Vec<(Vec<u8>, &Value)> = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let mut key_buf = Vec::new();
        write_value(&mut key_buf, key)?;
        encoded.push((key_buf, value));
    }
    encoded.sort_by(|a, b| a.0.cmp(&b.0));

    write_head(buf, 5, encoded.len() as u64);
    for (key_bytes, value) in encoded {
        buf.extend_from_slice(&key_bytes);
        write_value(buf, value)?;
    }
    Ok(())
}

/// Write an unsigned LEB128 varint.
pub fn write_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

/// Read an unsigned LEB128 varint, returning the value and bytes consumed.
pub fn read_varint(bytes: &[u8]) -> Result<(u64, usize), CodecError> {
    let mut value: u64 = 0;
    let mut shift: u32 = 0;
    for (i, &byte) in bytes.iter().enumerate() {
        let chunk = u64::from(byte & 0x7f);
        if shift >= 64 || (shift == 63 && chunk > 1) {
            return Err(CodecError::Varint);
        }
        value |= chunk << shift;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
        shift += 7;
    }
    Err(CodecError::Varint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        name: String,
        count: u64,
        tags: Vec<String>,
    }

    #[test]
    fn test_encode_deterministic() {
        let record = Record {
            name: "alpha".into(),
            count: 42,
            tags: vec!["x".into(), "y".into()],
        };
        let a = encode(&record).unwrap();
        let b = encode(&record).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_roundtrip() {
        let record = Record {
            name: "beta".into(),
            count: 1 << 40,
            tags: vec![],
        };
        let bytes = encode(&record).unwrap();
        let recovered: Record = decode(&bytes).unwrap();
        assert_eq!(record, recovered);
    }

    #[test]
    fn test_integer_widths() {
        let mut buf = Vec::new();

        // 0-23: single byte
        write_head(&mut buf, 0, 0);
        assert_eq!(buf, vec![0x00]);

        buf.clear();
        write_head(&mut buf, 0, 23);
        assert_eq!(buf, vec![0x17]);

        // 24-255: two bytes
        buf.clear();
        write_head(&mut buf, 0, 24);
        assert_eq!(buf, vec![0x18, 24]);

        buf.clear();
        write_head(&mut buf, 0, 255);
        assert_eq!(buf, vec![0x18, 255]);

        // 256-65535: three bytes
        buf.clear();
        write_head(&mut buf, 0, 256);
        assert_eq!(buf, vec![0x19, 0x01, 0x00]);

        buf.clear();
        write_head(&mut buf, 0, 65535);
        assert_eq!(buf, vec![0x19, 0xff, 0xff]);
    }

    #[test]
    fn test_negative_integers() {
        let bytes = encode(&-1i64).unwrap();
        assert_eq!(bytes, vec![0x20]);

        let bytes = encode(&-25i64).unwrap();
        assert_eq!(bytes, vec![0x38, 24]);
    }

    #[test]
    fn test_map_key_ordering() {
        // Struct field order must not leak into the encoding.
        let entries = vec![
            (Value::Text("zz".into()), Value::Integer(1.into())),
            (Value::Text("a".into()), Value::Integer(2.into())),
            (Value::Text("mm".into()), Value::Integer(3.into())),
        ];
        let bytes = encode_value(&Value::Map(entries)).unwrap();

        // Map header (3 entries), then keys sorted by encoded bytes:
        // "a" (0x61 61) < "mm" (0x62 6d 6d) < "zz" (0x62 7a 7a).
        assert_eq!(bytes[0], 0xa3);
        assert_eq!(&bytes[1..3], &[0x61, b'a']);
        assert_eq!(bytes[3], 0x02);
        assert_eq!(&bytes[4..7], &[0x62, b'm', b'm']);
        assert_eq!(bytes[7], 0x03);
        assert_eq!(&bytes[8..11], &[0x62, b'z', b'z']);
        assert_eq!(bytes[11], 0x01);
    }

    #[test]
    fn test_tag_passthrough() {
        let value = Value::Tag(42, Box::new(Value::Bytes(vec![1, 2, 3])));
        let bytes = encode_value(&value).unwrap();
        // 0xd8 0x2a = tag(42), 0x43 = bytes(3)
        assert_eq!(&bytes[..3], &[0xd8, 0x2a, 0x43]);

        let recovered = decode_value(&bytes).unwrap();
        assert_eq!(recovered, value);
    }

    #[test]
    fn test_float_rejected() {
        let result = encode(&1.5f64);
        assert!(matches!(result, Err(CodecError::Float)));
    }

    #[test]
    fn test_btreemap_roundtrip() {
        let mut map = BTreeMap::new();
        map.insert("hello".to_string(), "message".to_string());
        let bytes = encode(&map).unwrap();
        let recovered: BTreeMap<String, String> = decode(&bytes).unwrap();
        assert_eq!(map, recovered);
    }

    #[test]
    fn test_varint_known_values() {
        let mut buf = Vec::new();
        write_varint(&mut buf, 0);
        assert_eq!(buf, vec![0x00]);

        buf.clear();
        write_varint(&mut buf, 127);
        assert_eq!(buf, vec![0x7f]);

        buf.clear();
        write_varint(&mut buf, 128);
        assert_eq!(buf, vec![0x80, 0x01]);

        buf.clear();
        write_varint(&mut buf, 300);
        assert_eq!(buf, vec![0xac, 0x02]);
    }

    #[test]
    fn test_varint_truncated() {
        assert!(read_varint(&[0x80]).is_err());
        assert!(read_varint(&[]).is_err());
    }

    proptest! {
        #[test]
        fn prop_varint_roundtrip(value: u64) {
            let mut buf = Vec::new();
            write_varint(&mut buf, value);
            let (recovered, consumed) = read_varint(&buf).unwrap();
            prop_assert_eq!(recovered, value);
            prop_assert_eq!(consumed, buf.len());
        }

        #[test]
        fn prop_canonical_map_is_order_independent(
            keys in proptest::collection::btree_set("[a-z]{1,8}", 1..8),
        ) {
            let entries: Vec<(Value, Value)> = keys
                .iter()
                .enumerate()
                .map(|(i, k)| (Value::Text(k.clone()), Value::Integer((i as u64).into())))
                .collect();
            let mut reversed = entries.clone();
            reversed.reverse();

            let a = encode_value(&Value::Map(entries)).unwrap();
            let b = encode_value(&Value::Map(reversed)).unwrap();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_encode_decode_identity(n: i64, s in "[ -~]{0,32}") {
            let record = (n, s);
            let bytes = encode(&record).unwrap();
            let recovered: (i64, String) = decode(&bytes).unwrap();
            prop_assert_eq!(record, recovered);
        }
    }
}
