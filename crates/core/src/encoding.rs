//! Record encoding
//!
//! ## Layout
//!
//! ```text
//! [count: u32]
//! count × [name_len: u16][name: utf8][type: u8][data_len: u32][data]
//! ```
//!
//! All integers are big-endian. [`EncodedRecord`] reads fields straight out
//! of this layout; nothing is decoded until a field is requested, so a
//! corrupt record only fails when it is actually used.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};
use crate::field::Field;
use crate::record::{FieldBuffer, Record};
use crate::types::FieldType;

const COUNT_LEN: usize = 4;
const NAME_LEN: usize = 2;
const DATA_LEN: usize = 4;

/// Encode any record
pub fn encode_record(record: &dyn Record) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; COUNT_LEN];
    let mut count: u32 = 0;
    record.iterate(&mut |f| {
        let name_len = u16::try_from(f.name.len()).map_err(|_| {
            Error::InvalidEncoding(format!("field name too long: {} bytes", f.name.len()))
        })?;
        let data_len = u32::try_from(f.data.len()).map_err(|_| {
            Error::InvalidEncoding(format!("field {} data too long", f.name))
        })?;

        let mut header = [0u8; NAME_LEN];
        BigEndian::write_u16(&mut header, name_len);
        buf.extend_from_slice(&header);
        buf.extend_from_slice(f.name.as_bytes());
        buf.push(f.field_type.as_tag());
        let mut len = [0u8; DATA_LEN];
        BigEndian::write_u32(&mut len, data_len);
        buf.extend_from_slice(&len);
        buf.extend_from_slice(&f.data);

        count += 1;
        Ok(())
    })?;
    BigEndian::write_u32(&mut buf[..COUNT_LEN], count);
    Ok(buf)
}

/// Decode a record into an owned buffer
pub fn decode_record(data: &[u8]) -> Result<FieldBuffer> {
    FieldBuffer::from_record(&EncodedRecord::new(data))
}

/// Record view over encoded bytes
#[derive(Debug, Clone, Copy)]
pub struct EncodedRecord<'a> {
    data: &'a [u8],
}

impl<'a> EncodedRecord<'a> {
    /// Wrap encoded bytes without validating them
    pub fn new(data: &'a [u8]) -> Self {
        EncodedRecord { data }
    }

    /// The underlying bytes
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    fn raw_fields(&self) -> Result<RawFields<'a>> {
        let count = read_slice(self.data, 0, COUNT_LEN)?;
        Ok(RawFields {
            data: self.data,
            offset: COUNT_LEN,
            remaining: BigEndian::read_u32(count),
        })
    }
}

impl Record for EncodedRecord<'_> {
    fn field(&self, name: &str) -> Result<Field> {
        for raw in self.raw_fields()? {
            let raw = raw?;
            if raw.name == name {
                return Ok(raw.to_field());
            }
        }
        Err(Error::FieldNotFound(name.to_string()))
    }

    fn iterate(&self, visit: &mut dyn FnMut(&Field) -> Result<()>) -> Result<()> {
        for raw in self.raw_fields()? {
            visit(&raw?.to_field())?;
        }
        Ok(())
    }
}

struct RawField<'a> {
    name: &'a str,
    field_type: FieldType,
    data: &'a [u8],
}

impl RawField<'_> {
    fn to_field(&self) -> Field {
        Field::new(self.name, self.field_type, self.data)
    }
}

struct RawFields<'a> {
    data: &'a [u8],
    offset: usize,
    remaining: u32,
}

impl<'a> RawFields<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let slice = read_slice(self.data, self.offset, len)?;
        self.offset += len;
        Ok(slice)
    }

    fn next_field(&mut self) -> Result<RawField<'a>> {
        let name_len = BigEndian::read_u16(self.take(NAME_LEN)?) as usize;
        let name = std::str::from_utf8(self.take(name_len)?)
            .map_err(|e| Error::InvalidEncoding(format!("field name is not UTF-8: {}", e)))?;
        let tag = self.take(1)?[0];
        let field_type = FieldType::from_tag(tag)
            .ok_or_else(|| Error::InvalidEncoding(format!("unknown field type tag {}", tag)))?;
        let data_len = BigEndian::read_u32(self.take(DATA_LEN)?) as usize;
        let data = self.take(data_len)?;
        Ok(RawField {
            name,
            field_type,
            data,
        })
    }
}

impl<'a> Iterator for RawFields<'a> {
    type Item = Result<RawField<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let item = self.next_field();
        if item.is_err() {
            self.remaining = 0;
        }
        Some(item)
    }
}

fn read_slice(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    let available = data.len().saturating_sub(offset);
    if available < len {
        return Err(Error::InvalidEncoding(format!(
            "record truncated at offset {}: need {} bytes, have {}",
            offset, len, available
        )));
    }
    Ok(&data[offset..offset + len])
}
