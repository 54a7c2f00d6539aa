//! Field type tags

use std::fmt;

/// Type of a field's data
///
/// The discriminant is the one-byte tag written into encoded records;
/// it must never change for an existing variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum FieldType {
    /// No data
    Null = 1,
    /// One byte, 0 or 1
    Bool = 2,
    /// 64-bit signed integer
    Int64 = 3,
    /// 64-bit IEEE-754 float
    Float64 = 4,
    /// UTF-8 string
    String = 5,
    /// Raw bytes
    Bytes = 6,
}

impl FieldType {
    /// Tag byte for this type
    pub fn as_tag(self) -> u8 {
        self as u8
    }

    /// Parse a tag byte
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(FieldType::Null),
            2 => Some(FieldType::Bool),
            3 => Some(FieldType::Int64),
            4 => Some(FieldType::Float64),
            5 => Some(FieldType::String),
            6 => Some(FieldType::Bytes),
            _ => None,
        }
    }

    /// Exact encoded size for fixed-width types
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            FieldType::Null => Some(0),
            FieldType::Bool => Some(1),
            FieldType::Int64 | FieldType::Float64 => Some(8),
            FieldType::String | FieldType::Bytes => None,
        }
    }

    /// Lowercase type name
    pub fn name(self) -> &'static str {
        match self {
            FieldType::Null => "null",
            FieldType::Bool => "bool",
            FieldType::Int64 => "int64",
            FieldType::Float64 => "float64",
            FieldType::String => "string",
            FieldType::Bytes => "bytes",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
