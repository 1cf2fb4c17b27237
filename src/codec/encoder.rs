//! Binary encoder (FC_BUFFER compatible)

use super::schema::{FieldWriter, PackStruct};
use super::{CodecError, CodecResult, Pack};

/// Append-only output buffer
#[derive(Debug, Default, Clone)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Pack any value
    pub fn encode<T: Pack + ?Sized>(&mut self, value: &T) -> CodecResult<()> {
        value.pack(self)
    }

    /// Pack a struct field by field according to its schema
    pub fn write_struct<T: PackStruct>(&mut self, value: &T) -> CodecResult<()> {
        let mut fields = FieldWriter::new(self, T::SCHEMA);
        value.pack_fields(&mut fields)?;
        fields.finish()
    }

    /// Write bytes without a length prefix
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write_u8(v as u8);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.write_raw(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write_raw(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write_raw(&v.to_le_bytes());
    }

    pub fn write_u128(&mut self, v: u128) {
        // Lo word first, then hi word - both little-endian
        self.write_raw(&v.to_le_bytes());
    }

    pub fn write_i64(&mut self, v: i64) {
        self.write_raw(&v.to_le_bytes());
    }

    /// Unsigned LEB128: 7 bits per byte, high bit set on continuation
    pub fn write_uvarint(&mut self, mut v: u64) {
        loop {
            let byte = (v & 0x7f) as u8;
            v >>= 7;
            if v == 0 {
                self.write_u8(byte);
                return;
            }
            self.write_u8(byte | 0x80);
        }
    }

    /// Signed varint (zig-zag, then LEB128)
    pub fn write_varint32(&mut self, v: i32) {
        let zigzag = ((v << 1) ^ (v >> 31)) as u32;
        self.write_uvarint(zigzag as u64);
    }

    /// Write a varint length prefix followed by the bytes
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_uvarint(bytes.len() as u64);
        self.write_raw(bytes);
    }

    pub fn write_string(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    /// Write a fixed-width field, zero-padding shorter values
    pub fn write_fixed(&mut self, bytes: &[u8], width: usize) -> CodecResult<()> {
        if bytes.len() > width {
            return Err(CodecError::ChecksumTooLong {
                width,
                len: bytes.len(),
            });
        }
        self.write_raw(bytes);
        self.buf.resize(self.buf.len() + (width - bytes.len()), 0);
        Ok(())
    }
}
