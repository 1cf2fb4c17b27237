//! Binary decoder (FC_BUFFER compatible)

use super::schema::{FieldReader, PackStruct};
use super::{CodecError, CodecResult, Unpack};

/// Cursor over a packed buffer
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes consumed so far
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Unpack any value
    pub fn decode<T: Unpack>(&mut self) -> CodecResult<T> {
        T::unpack(self)
    }

    /// Unpack a struct field by field according to its schema
    pub fn read_struct<T: PackStruct>(&mut self) -> CodecResult<T> {
        let mut fields = FieldReader::new(self, T::SCHEMA);
        let value = T::unpack_fields(&mut fields)?;
        fields.finish()?;
        Ok(value)
    }

    /// Read exactly `n` bytes
    pub fn read_raw(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        if n > self.remaining() {
            return Err(CodecError::NotEnoughData {
                required: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_raw(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> CodecResult<u8> {
        Ok(self.read_raw(1)?[0])
    }

    pub fn read_bool(&mut self) -> CodecResult<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidBool(other)),
        }
    }

    pub fn read_u16(&mut self) -> CodecResult<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> CodecResult<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> CodecResult<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_u128(&mut self) -> CodecResult<u128> {
        Ok(u128::from_le_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> CodecResult<i64> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    /// Unsigned LEB128, at most 64 bits
    pub fn read_uvarint(&mut self) -> CodecResult<u64> {
        let mut value: u64 = 0;
        let mut shift = 0u32;
        loop {
            let byte = self.read_u8()?;
            if shift == 63 && byte > 1 {
                return Err(CodecError::VarintOverflow { bits: 64 });
            }
            value |= ((byte & 0x7f) as u64) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if shift > 63 {
                return Err(CodecError::VarintOverflow { bits: 64 });
            }
        }
    }

    pub fn read_uvarint32(&mut self) -> CodecResult<u32> {
        let value = self.read_uvarint()?;
        u32::try_from(value).map_err(|_| CodecError::VarintOverflow { bits: 32 })
    }

    /// Signed varint (LEB128, then zig-zag)
    pub fn read_varint32(&mut self) -> CodecResult<i32> {
        let zigzag = self.read_uvarint32()?;
        Ok(((zigzag >> 1) as i32) ^ -((zigzag & 1) as i32))
    }

    /// Read a `varuint32` length or element count
    pub fn read_len(&mut self) -> CodecResult<usize> {
        Ok(self.read_uvarint32()? as usize)
    }

    /// Read a varint length prefix followed by that many bytes
    pub fn read_bytes(&mut self) -> CodecResult<Vec<u8>> {
        let len = self.read_len()?;
        Ok(self.read_raw(len)?.to_vec())
    }

    pub fn read_string(&mut self) -> CodecResult<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes).map_err(|e| CodecError::InvalidUtf8(e.to_string()))
    }
}
