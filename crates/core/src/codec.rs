//! Field codec
//!
//! Fixed, deterministic binary encodings for every [`FieldType`].
//!
//! ## Ordering
//!
//! Encodings of one type compare as raw byte sequences in the same order
//! as the decoded values, so storage engines can range-scan encoded keys
//! without decoding them:
//!
//! - **int64**: big-endian with the sign bit flipped
//! - **float64**: IEEE bits big-endian; negatives have every bit inverted,
//!   non-negatives have the sign bit set
//! - **bool**: `0x00` / `0x01`
//! - **string** / **bytes**: the raw bytes (lexicographic)
//! - **null**: empty
//!
//! All functions are pure.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};
use crate::types::FieldType;
use crate::value::Value;

const SIGN_BIT: u64 = 1 << 63;

/// Encode an int64
pub fn encode_int64(v: i64) -> [u8; 8] {
    let mut buf = [0u8; 8];
    BigEndian::write_u64(&mut buf, (v as u64) ^ SIGN_BIT);
    buf
}

/// Decode an int64
pub fn decode_int64(data: &[u8]) -> Result<i64> {
    let raw = exact(FieldType::Int64, data)?;
    Ok((BigEndian::read_u64(raw) ^ SIGN_BIT) as i64)
}

/// Encode a float64
pub fn encode_float64(v: f64) -> [u8; 8] {
    let bits = v.to_bits();
    let ordered = if bits & SIGN_BIT != 0 {
        !bits
    } else {
        bits | SIGN_BIT
    };
    let mut buf = [0u8; 8];
    BigEndian::write_u64(&mut buf, ordered);
    buf
}

/// Decode a float64
pub fn decode_float64(data: &[u8]) -> Result<f64> {
    let raw = exact(FieldType::Float64, data)?;
    let ordered = BigEndian::read_u64(raw);
    let bits = if ordered & SIGN_BIT != 0 {
        ordered & !SIGN_BIT
    } else {
        !ordered
    };
    Ok(f64::from_bits(bits))
}

/// Encode a bool
pub fn encode_bool(v: bool) -> [u8; 1] {
    [v as u8]
}

/// Decode a bool
pub fn decode_bool(data: &[u8]) -> Result<bool> {
    match exact(FieldType::Bool, data)?[0] {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(Error::InvalidEncoding(format!(
            "bool byte must be 0 or 1, got {}",
            other
        ))),
    }
}

/// Decode a string
pub fn decode_string(data: &[u8]) -> Result<String> {
    std::str::from_utf8(data)
        .map(str::to_owned)
        .map_err(|e| Error::InvalidEncoding(format!("string is not valid UTF-8: {}", e)))
}

/// Decode bytes (identity copy)
pub fn decode_bytes(data: &[u8]) -> Result<Vec<u8>> {
    Ok(data.to_vec())
}

/// Decode null (requires empty data)
pub fn decode_null(data: &[u8]) -> Result<()> {
    exact(FieldType::Null, data).map(|_| ())
}

/// Encode any value
pub fn encode(value: &Value) -> Vec<u8> {
    match value {
        Value::Null => Vec::new(),
        Value::Bool(b) => encode_bool(*b).to_vec(),
        Value::Int64(i) => encode_int64(*i).to_vec(),
        Value::Float64(f) => encode_float64(*f).to_vec(),
        Value::String(s) => s.as_bytes().to_vec(),
        Value::Bytes(b) => b.clone(),
    }
}

/// Decode data stored with the given type
pub fn decode(field_type: FieldType, data: &[u8]) -> Result<Value> {
    Ok(match field_type {
        FieldType::Null => {
            decode_null(data)?;
            Value::Null
        }
        FieldType::Bool => Value::Bool(decode_bool(data)?),
        FieldType::Int64 => Value::Int64(decode_int64(data)?),
        FieldType::Float64 => Value::Float64(decode_float64(data)?),
        FieldType::String => Value::String(decode_string(data)?),
        FieldType::Bytes => Value::Bytes(decode_bytes(data)?),
    })
}

/// Check a fixed-width type's length
fn exact(field_type: FieldType, data: &[u8]) -> Result<&[u8]> {
    let size = field_type.fixed_size().unwrap_or(data.len());
    if data.len() < size {
        return Err(Error::Truncated {
            field_type,
            expected: size,
            actual: data.len(),
        });
    }
    if data.len() > size {
        return Err(Error::InvalidEncoding(format!(
            "{} takes {} bytes, got {}",
            field_type,
            size,
            data.len()
        )));
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_int64_known_values() {
        assert_eq!(encode_int64(0), [0x80, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(encode_int64(-1), [0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(decode_int64(&encode_int64(i64::MIN)).unwrap(), i64::MIN);
        assert_eq!(decode_int64(&encode_int64(i64::MAX)).unwrap(), i64::MAX);
    }

    #[test]
    fn test_int64_truncated() {
        let err = decode_int64(&[0x80, 0]).unwrap_err();
        assert!(matches!(
            err,
            Error::Truncated {
                field_type: FieldType::Int64,
                expected: 8,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_int64_surplus_bytes() {
        let err = decode_int64(&[0u8; 9]).unwrap_err();
        assert!(matches!(err, Error::InvalidEncoding(_)));
    }

    #[test]
    fn test_float64_special_values() {
        for v in [f64::INFINITY, f64::NEG_INFINITY, f64::MIN_POSITIVE, -0.0, 0.0] {
            let decoded = decode_float64(&encode_float64(v)).unwrap();
            assert_eq!(decoded.to_bits(), v.to_bits());
        }
        assert!(decode_float64(&encode_float64(f64::NAN)).unwrap().is_nan());
    }

    #[test]
    fn test_float64_negative_sorts_first() {
        assert!(encode_float64(-1.5) < encode_float64(-0.5));
        assert!(encode_float64(-0.5) < encode_float64(0.0));
        assert!(encode_float64(f64::NEG_INFINITY) < encode_float64(f64::MIN));
        assert!(encode_float64(f64::MAX) < encode_float64(f64::INFINITY));
    }

    #[test]
    fn test_bool() {
        assert!(!decode_bool(&encode_bool(false)).unwrap());
        assert!(decode_bool(&encode_bool(true)).unwrap());
        assert!(matches!(decode_bool(&[2]), Err(Error::InvalidEncoding(_))));
        assert!(matches!(decode_bool(&[]), Err(Error::Truncated { .. })));
    }

    #[test]
    fn test_string_invalid_utf8() {
        assert!(matches!(
            decode_string(&[0xC3, 0x28]),
            Err(Error::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_null_requires_empty() {
        assert!(decode_null(&[]).is_ok());
        assert!(decode_null(&[0]).is_err());
    }

    #[test]
    fn test_decode_dispatch() {
        let v = Value::String("john".into());
        assert_eq!(decode(FieldType::String, &encode(&v)).unwrap(), v);
        assert_eq!(decode(FieldType::Null, &[]).unwrap(), Value::Null);
    }

    proptest! {
        #[test]
        fn prop_int64_roundtrip(v in any::<i64>()) {
            prop_assert_eq!(decode_int64(&encode_int64(v)).unwrap(), v);
        }

        #[test]
        fn prop_int64_order(a in any::<i64>(), b in any::<i64>()) {
            prop_assert_eq!(a.cmp(&b), encode_int64(a).cmp(&encode_int64(b)));
        }

        #[test]
        fn prop_float64_roundtrip(v in any::<f64>().prop_filter("not NaN", |f| !f.is_nan())) {
            prop_assert_eq!(decode_float64(&encode_float64(v)).unwrap().to_bits(), v.to_bits());
        }

        #[test]
        fn prop_float64_order(
            a in any::<f64>().prop_filter("not NaN", |f| !f.is_nan()),
            b in any::<f64>().prop_filter("not NaN", |f| !f.is_nan()),
        ) {
            if a < b {
                prop_assert!(encode_float64(a) < encode_float64(b));
            } else if a > b {
                prop_assert!(encode_float64(a) > encode_float64(b));
            }
        }

        #[test]
        fn prop_string_roundtrip_and_order(a in ".*", b in ".*") {
            let (ea, eb) = (encode(&Value::from(a.as_str())), encode(&Value::from(b.as_str())));
            prop_assert_eq!(decode_string(&ea).unwrap(), a.clone());
            prop_assert_eq!(a.cmp(&b), ea.cmp(&eb));
        }

        #[test]
        fn prop_bytes_roundtrip(v in proptest::collection::vec(any::<u8>(), 0..64)) {
            prop_assert_eq!(decode_bytes(&encode(&Value::Bytes(v.clone()))).unwrap(), v);
        }
    }
}
