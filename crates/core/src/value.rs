//! Value types for Tessera
//!
//! `Value` is the decoded form of a field's data.
//!
//! ### Type Rules
//!
//! - Different types are NEVER equal: `Int64(1) != Float64(1.0)`
//! - `Bytes` are not `String`
//! - Float equality is IEEE-754: `NaN != NaN`, `-0.0 == 0.0`
//!
//! [`Value::canonical`] and [`Value::canonical_cmp`] give a total order and an
//! equivalence where every NaN is one value and `-0.0` equals `0.0`. Grouping
//! uses that equivalence.

use std::cmp::Ordering;
use std::fmt;

use crate::types::FieldType;

/// Decoded field value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int64(i64),
    /// 64-bit floating point (IEEE-754)
    Float64(f64),
    /// UTF-8 string
    String(String),
    /// Raw bytes
    Bytes(Vec<u8>),
}

impl Value {
    /// Type of this value
    pub fn field_type(&self) -> FieldType {
        match self {
            Value::Null => FieldType::Null,
            Value::Bool(_) => FieldType::Bool,
            Value::Int64(_) => FieldType::Int64,
            Value::Float64(_) => FieldType::Float64,
            Value::String(_) => FieldType::String,
            Value::Bytes(_) => FieldType::Bytes,
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as bool if this is a Bool value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an Int64 value
    pub fn as_int64(&self) -> Option<i64> {
        match self {
            Value::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if this is a Float64 value
    pub fn as_float64(&self) -> Option<f64> {
        match self {
            Value::Float64(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as &str if this is a String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as &[u8] if this is a Bytes value
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Canonical representative of this value
    ///
    /// Folds `-0.0` into `0.0` and every NaN payload into `f64::NAN`.
    /// Other values are returned unchanged.
    pub fn canonical(self) -> Value {
        match self {
            Value::Float64(f) if f.is_nan() => Value::Float64(f64::NAN),
            Value::Float64(f) if f == 0.0 => Value::Float64(0.0),
            other => other,
        }
    }

    /// Total order over all values
    ///
    /// Values of different types order by their type tag. Within a type the
    /// natural order applies; floats use the canonical form, NaN last.
    pub fn canonical_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
            (Value::Float64(a), Value::Float64(b)) => canonical_float(*a).total_cmp(&canonical_float(*b)),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
            _ => self.field_type().cmp(&other.field_type()),
        }
    }
}

fn canonical_float(f: f64) -> f64 {
    if f.is_nan() {
        // positive quiet NaN sorts after +inf under total_cmp
        f64::NAN.copysign(1.0)
    } else if f == 0.0 {
        0.0
    } else {
        f
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int64(i) => write!(f, "{}", i),
            Value::Float64(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Bytes(b) => {
                write!(f, "0x")?;
                for byte in b {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// From implementations for ergonomic API usage
// ============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int64(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float64(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_different_types_never_equal() {
        assert_ne!(Value::Int64(1), Value::Float64(1.0));
        assert_ne!(Value::String("a".into()), Value::Bytes(b"a".to_vec()));
    }

    #[test]
    fn test_ieee_float_equality() {
        assert_ne!(Value::Float64(f64::NAN), Value::Float64(f64::NAN));
        assert_eq!(Value::Float64(-0.0), Value::Float64(0.0));
    }

    #[test]
    fn test_canonical_folds_zero_and_nan() {
        let neg_zero = Value::Float64(-0.0).canonical();
        assert_eq!(neg_zero.as_float64().unwrap().to_bits(), 0.0f64.to_bits());

        let odd_nan = f64::from_bits(0x7ff8_0000_0000_0001);
        let nan = Value::Float64(odd_nan).canonical();
        assert_eq!(nan.as_float64().unwrap().to_bits(), f64::NAN.to_bits());
    }

    #[test]
    fn test_canonical_cmp_within_type() {
        assert_eq!(Value::Int64(1).canonical_cmp(&Value::Int64(2)), Ordering::Less);
        assert_eq!(
            Value::Float64(-0.0).canonical_cmp(&Value::Float64(0.0)),
            Ordering::Equal
        );
        assert_eq!(
            Value::Float64(f64::NAN).canonical_cmp(&Value::Float64(f64::INFINITY)),
            Ordering::Greater
        );
        assert_eq!(
            Value::String("a".into()).canonical_cmp(&Value::String("b".into())),
            Ordering::Less
        );
    }

    #[test]
    fn test_canonical_cmp_across_types() {
        assert_eq!(Value::Null.canonical_cmp(&Value::Int64(0)), Ordering::Less);
        assert_eq!(
            Value::Bytes(vec![]).canonical_cmp(&Value::Bool(true)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Int64(42).to_string(), "42");
        assert_eq!(Value::String("x".into()).to_string(), "\"x\"");
        assert_eq!(Value::Bytes(vec![0xab, 0x01]).to_string(), "0xab01");
        assert_eq!(Value::Null.to_string(), "NULL");
    }

    #[test]
    fn test_field_type() {
        assert_eq!(Value::from(1i64).field_type(), FieldType::Int64);
        assert_eq!(Value::from("s").field_type(), FieldType::String);
    }
}
