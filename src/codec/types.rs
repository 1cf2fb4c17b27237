//! VM scalar types: varints, checksums, raw bytes and time points

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{CodecError, CodecResult, Decoder, Encoder, Pack, Unpack};

/// `varuint32`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Varuint32(pub u32);

impl Pack for Varuint32 {
    fn pack(&self, enc: &mut Encoder) -> CodecResult<()> {
        enc.write_uvarint(self.0 as u64);
        Ok(())
    }
}

impl Unpack for Varuint32 {
    fn unpack(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        Ok(Varuint32(dec.read_uvarint32()?))
    }
}

/// `varint32` (zig-zag)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Varint32(pub i32);

impl Pack for Varint32 {
    fn pack(&self, enc: &mut Encoder) -> CodecResult<()> {
        enc.write_varint32(self.0);
        Ok(())
    }
}

impl Unpack for Varint32 {
    fn unpack(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        Ok(Varint32(dec.read_varint32()?))
    }
}

/// Fixed-width checksum of `N` bytes
///
/// Packs without a length prefix. Short values are zero-padded to `N` bytes
/// when built, so the value in memory is the value on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Checksum<const N: usize>([u8; N]);

pub type Checksum160 = Checksum<20>;
pub type Checksum256 = Checksum<32>;
pub type Checksum512 = Checksum<64>;

impl<const N: usize> Checksum<N> {
    pub const WIDTH: usize = N;

    pub fn new(bytes: impl AsRef<[u8]>) -> CodecResult<Self> {
        let bytes = bytes.as_ref();
        if bytes.len() > N {
            return Err(CodecError::ChecksumTooLong {
                width: N,
                len: bytes.len(),
            });
        }
        let mut out = [0u8; N];
        out[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(out))
    }

    pub fn zero() -> Self {
        Self([0u8; N])
    }

    pub fn from_hex(s: &str) -> CodecResult<Self> {
        let bytes = hex::decode(s).map_err(|e| CodecError::Unsupported(format!("checksum hex: {}", e)))?;
        Self::new(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; N] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl<const N: usize> Default for Checksum<N> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<const N: usize> fmt::Display for Checksum<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl<const N: usize> Pack for Checksum<N> {
    fn pack(&self, enc: &mut Encoder) -> CodecResult<()> {
        enc.write_raw(&self.0);
        Ok(())
    }
}

impl<const N: usize> Unpack for Checksum<N> {
    fn unpack(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        Self::new(dec.read_raw(N)?)
    }
}

impl<const N: usize> Serialize for Checksum<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de, const N: usize> Deserialize<'de> for Checksum<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Length-prefixed bytes, hex in JSON
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HexBytes(pub Vec<u8>);

impl HexBytes {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for HexBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for HexBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl Pack for HexBytes {
    fn pack(&self, enc: &mut Encoder) -> CodecResult<()> {
        enc.write_bytes(&self.0);
        Ok(())
    }
}

impl Unpack for HexBytes {
    fn unpack(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        Ok(Self(dec.read_bytes()?))
    }
}

impl Serialize for HexBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for HexBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map(HexBytes).map_err(serde::de::Error::custom)
    }
}

/// Seconds since the Unix epoch, packed as `u32`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimePointSec(pub u32);

impl TimePointSec {
    pub fn from_unix(secs: i64) -> CodecResult<Self> {
        u32::try_from(secs)
            .map(TimePointSec)
            .map_err(|_| CodecError::Unsupported(format!("time point {} out of u32 range", secs)))
    }

    pub fn as_secs(&self) -> u32 {
        self.0
    }

    pub fn checked_add_secs(&self, secs: u32) -> Option<Self> {
        self.0.checked_add(secs).map(TimePointSec)
    }
}

impl fmt::Display for TimePointSec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match DateTime::<Utc>::from_timestamp(self.0 as i64, 0) {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            None => write!(f, "{}", self.0),
        }
    }
}

impl Pack for TimePointSec {
    fn pack(&self, enc: &mut Encoder) -> CodecResult<()> {
        enc.write_u32(self.0);
        Ok(())
    }
}

impl Unpack for TimePointSec {
    fn unpack(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        Ok(TimePointSec(dec.read_u32()?))
    }
}

impl Serialize for TimePointSec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TimePointSec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let naive = NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S").map_err(serde::de::Error::custom)?;
        TimePointSec::from_unix(naive.and_utc().timestamp()).map_err(serde::de::Error::custom)
    }
}
