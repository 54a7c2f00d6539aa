//! Named, typed field
//!
//! A field's `data` only has meaning together with its `field_type`;
//! the typed accessors check the type before decoding.

use crate::codec;
use crate::error::{Error, Result};
use crate::types::FieldType;
use crate::value::Value;

/// A `(name, type, data)` triple
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    /// Field name, unique within a record
    pub name: String,
    /// Type the data was encoded with
    pub field_type: FieldType,
    /// Encoded data (see [`codec`])
    pub data: Vec<u8>,
}

impl Field {
    /// Create a field from already-encoded data
    pub fn new(name: impl Into<String>, field_type: FieldType, data: impl Into<Vec<u8>>) -> Self {
        Field {
            name: name.into(),
            field_type,
            data: data.into(),
        }
    }

    /// Create a field by encoding a value
    pub fn from_value(name: impl Into<String>, value: &Value) -> Self {
        Field::new(name, value.field_type(), codec::encode(value))
    }

    /// Int64 field
    pub fn int64(name: impl Into<String>, v: i64) -> Self {
        Field::new(name, FieldType::Int64, codec::encode_int64(v).to_vec())
    }

    /// Float64 field
    pub fn float64(name: impl Into<String>, v: f64) -> Self {
        Field::new(name, FieldType::Float64, codec::encode_float64(v).to_vec())
    }

    /// String field
    pub fn string(name: impl Into<String>, v: impl Into<String>) -> Self {
        Field::new(name, FieldType::String, v.into().into_bytes())
    }

    /// Bool field
    pub fn bool(name: impl Into<String>, v: bool) -> Self {
        Field::new(name, FieldType::Bool, codec::encode_bool(v).to_vec())
    }

    /// Bytes field
    pub fn bytes(name: impl Into<String>, v: impl Into<Vec<u8>>) -> Self {
        Field::new(name, FieldType::Bytes, v)
    }

    /// Null field
    pub fn null(name: impl Into<String>) -> Self {
        Field::new(name, FieldType::Null, Vec::new())
    }

    /// Decode the data with the field's own type
    pub fn value(&self) -> Result<Value> {
        codec::decode(self.field_type, &self.data)
    }

    /// Decode as int64
    pub fn as_int64(&self) -> Result<i64> {
        self.expect(FieldType::Int64)?;
        codec::decode_int64(&self.data)
    }

    /// Decode as float64
    pub fn as_float64(&self) -> Result<f64> {
        self.expect(FieldType::Float64)?;
        codec::decode_float64(&self.data)
    }

    /// Decode as bool
    pub fn as_bool(&self) -> Result<bool> {
        self.expect(FieldType::Bool)?;
        codec::decode_bool(&self.data)
    }

    /// Decode as string
    pub fn as_string(&self) -> Result<String> {
        self.expect(FieldType::String)?;
        codec::decode_string(&self.data)
    }

    /// Decode as bytes
    pub fn as_bytes(&self) -> Result<&[u8]> {
        self.expect(FieldType::Bytes)?;
        Ok(&self.data)
    }

    fn expect(&self, expected: FieldType) -> Result<()> {
        if self.field_type != expected {
            return Err(Error::TypeMismatch {
                expected,
                actual: self.field_type,
            });
        }
        Ok(())
    }
}
