//! EOSIO Binary Codec
//!
//! Byte-exact packing of transaction data in the layout the EOSIO virtual
//! machine expects:
//! - LEB128 varints for lengths, counts and `varuint32`
//! - Little-endian fixed-width integers (16/32/64/128-bit)
//! - Length-prefixed byte arrays and strings
//! - Zero-padded fixed-size checksums
//! - Curve-tagged public keys and signatures
//! - Fixed-point assets (`i64` amount, precision byte, 7-byte symbol code)
//! - Key-sorted maps, so packing is deterministic
//!
//! Structs pack through an explicit `StructSchema` whose per-field
//! `FieldMode` (required / optional / binary extension / skip) is checked
//! when the schema is built.

mod decoder;
mod encoder;
mod impls;
mod schema;
pub mod asset;
pub mod keys;
pub mod name;
pub mod types;


pub use asset::{Asset, Symbol};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use keys::{Curve, PublicKey, Signature};
pub use name::{AccountName, ActionName, Name, PermissionName};
pub use schema::{FieldMode, FieldReader, FieldSpec, FieldWriter, PackStruct, StructSchema};
pub use types::{Checksum, Checksum160, Checksum256, Checksum512, HexBytes, TimePointSec, Varint32, Varuint32};

/// Errors raised while packing or unpacking
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("not enough data: required {required} bytes, remaining {remaining}")]
    NotEnoughData { required: usize, remaining: usize },

    #[error("varint overflows {bits} bits")]
    VarintOverflow { bits: u32 },

    #[error("binary extension field `{field}` of `{schema}` is followed by a non-extension field")]
    MisplacedBinaryExtension {
        schema: &'static str,
        field: &'static str,
    },

    #[error("schema mismatch in `{schema}`: {reason}")]
    SchemaMismatch { schema: &'static str, reason: String },

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("invalid asset: {0}")]
    InvalidAsset(String),

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("unsupported curve tag {0}")]
    UnsupportedCurve(u8),

    #[error("value of {len} bytes does not fit a {width}-byte checksum")]
    ChecksumTooLong { width: usize, len: usize },

    #[error("invalid bool byte {0:#04x}")]
    InvalidBool(u8),

    #[error("invalid utf-8 string: {0}")]
    InvalidUtf8(String),

    #[error("unsupported value: {0}")]
    Unsupported(String),

    #[error("{0} trailing bytes after decode")]
    TrailingBytes(usize),
}

pub type CodecResult<T> = Result<T, CodecError>;

/// A value with a VM-defined binary packing
pub trait Pack {
    fn pack(&self, enc: &mut Encoder) -> CodecResult<()>;
}

/// A value that can be read back from its binary packing
pub trait Unpack: Sized {
    fn unpack(dec: &mut Decoder<'_>) -> CodecResult<Self>;
}

/// Pack a value into a fresh buffer
pub fn to_bytes<T: Pack + ?Sized>(value: &T) -> CodecResult<Vec<u8>> {
    let mut enc = Encoder::new();
    value.pack(&mut enc)?;
    Ok(enc.into_bytes())
}

/// Unpack a value that must span the whole buffer
pub fn from_bytes<T: Unpack>(data: &[u8]) -> CodecResult<T> {
    let mut dec = Decoder::new(data);
    let value = T::unpack(&mut dec)?;
    if !dec.is_exhausted() {
        return Err(CodecError::TrailingBytes(dec.remaining()));
    }
    Ok(value)
}
