//! Curve-tagged key material
//!
//! Public keys and signatures pack as one curve byte followed by a
//! curve-specific fixed-size payload. Text forms:
//! - `EOS<base58(key ‖ ripemd160(key)[..4])>` (legacy K1 public key)
//! - `PUB_K1_<base58(key ‖ ripemd160(key ‖ "K1")[..4])>`
//! - `SIG_K1_<base58(sig ‖ ripemd160(sig ‖ "K1")[..4])>`

use std::fmt;
use std::str::FromStr;

use ripemd::{Digest, Ripemd160};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{CodecError, CodecResult, Decoder, Encoder, Pack, Unpack};

pub const PUBLIC_KEY_LEGACY_PREFIX: &str = "EOS";
const CHECKSUM_LEN: usize = 4;

/// Signature curve tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Curve {
    /// secp256k1
    #[default]
    K1 = 0,
    /// secp256r1 (P-256)
    R1 = 1,
    /// WebAuthn
    WA = 2,
}

impl Curve {
    pub fn from_tag(tag: u8) -> CodecResult<Self> {
        match tag {
            0 => Ok(Curve::K1),
            1 => Ok(Curve::R1),
            2 => Ok(Curve::WA),
            other => Err(CodecError::UnsupportedCurve(other)),
        }
    }

    pub fn tag(&self) -> u8 {
        *self as u8
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            Curve::K1 => "K1",
            Curve::R1 => "R1",
            Curve::WA => "WA",
        }
    }

    /// Compressed point size; WebAuthn keys are variable-length and unsupported
    pub fn public_key_len(&self) -> CodecResult<usize> {
        match self {
            Curve::K1 | Curve::R1 => Ok(33),
            Curve::WA => Err(CodecError::UnsupportedCurve(self.tag())),
        }
    }

    /// Recoverable signature size (recovery byte first)
    pub fn signature_len(&self) -> CodecResult<usize> {
        match self {
            Curve::K1 | Curve::R1 => Ok(65),
            Curve::WA => Err(CodecError::UnsupportedCurve(self.tag())),
        }
    }

    fn from_suffix(suffix: &str) -> CodecResult<Self> {
        match suffix {
            "K1" => Ok(Curve::K1),
            "R1" => Ok(Curve::R1),
            "WA" => Ok(Curve::WA),
            other => Err(CodecError::InvalidKey(format!("unknown curve suffix '{}'", other))),
        }
    }
}

fn ripemd_checksum(data: &[u8], suffix: &str) -> [u8; CHECKSUM_LEN] {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.update(suffix.as_bytes());
    let hash = hasher.finalize();
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&hash[..CHECKSUM_LEN]);
    out
}

fn encode_with_checksum(data: &[u8], suffix: &str) -> String {
    let mut buf = data.to_vec();
    buf.extend_from_slice(&ripemd_checksum(data, suffix));
    bs58::encode(buf).into_string()
}

fn decode_with_checksum(encoded: &str, suffix: &str, expected_len: usize) -> CodecResult<Vec<u8>> {
    let decoded = bs58::decode(encoded)
        .into_vec()
        .map_err(|e| CodecError::InvalidKey(format!("invalid base58: {}", e)))?;
    if decoded.len() != expected_len + CHECKSUM_LEN {
        return Err(CodecError::InvalidKey(format!(
            "invalid length {}, expected {}",
            decoded.len(),
            expected_len + CHECKSUM_LEN
        )));
    }
    let (payload, checksum) = decoded.split_at(expected_len);
    if checksum != ripemd_checksum(payload, suffix) {
        return Err(CodecError::InvalidKey("invalid checksum".to_string()));
    }
    Ok(payload.to_vec())
}

/// Curve-tagged public key
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PublicKey {
    pub curve: Curve,
    pub content: Vec<u8>,
}

impl PublicKey {
    pub fn new(curve: Curve, content: Vec<u8>) -> CodecResult<Self> {
        let key = Self { curve, content };
        key.validate()?;
        Ok(key)
    }

    pub fn validate(&self) -> CodecResult<()> {
        let expected = self.curve.public_key_len()?;
        if self.content.len() != expected {
            return Err(CodecError::InvalidKey(format!(
                "{} public key must be {} bytes, got {}",
                self.curve.suffix(),
                expected,
                self.content.len()
            )));
        }
        Ok(())
    }

    /// Legacy `EOS...` form (K1 only)
    pub fn to_legacy_string(&self) -> CodecResult<String> {
        if self.curve != Curve::K1 {
            return Err(CodecError::InvalidKey("legacy format is K1 only".to_string()));
        }
        Ok(format!("{}{}", PUBLIC_KEY_LEGACY_PREFIX, encode_with_checksum(&self.content, "")))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = self.curve.suffix();
        write!(f, "PUB_{}_{}", suffix, encode_with_checksum(&self.content, suffix))
    }
}

impl FromStr for PublicKey {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix("PUB_") {
            let (suffix, encoded) = rest
                .split_once('_')
                .ok_or_else(|| CodecError::InvalidKey(format!("malformed public key '{}'", s)))?;
            let curve = Curve::from_suffix(suffix)?;
            let content = decode_with_checksum(encoded, suffix, curve.public_key_len()?)?;
            return PublicKey::new(curve, content);
        }
        if let Some(encoded) = s.strip_prefix(PUBLIC_KEY_LEGACY_PREFIX) {
            let content = decode_with_checksum(encoded, "", Curve::K1.public_key_len()?)?;
            return PublicKey::new(Curve::K1, content);
        }
        Err(CodecError::InvalidKey(format!("unrecognized public key prefix in '{}'", s)))
    }
}

impl Pack for PublicKey {
    fn pack(&self, enc: &mut Encoder) -> CodecResult<()> {
        self.validate()?;
        enc.write_u8(self.curve.tag());
        enc.write_raw(&self.content);
        Ok(())
    }
}

impl Unpack for PublicKey {
    fn unpack(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        let curve = Curve::from_tag(dec.read_u8()?)?;
        let content = dec.read_raw(curve.public_key_len()?)?.to_vec();
        Ok(PublicKey { curve, content })
    }
}

/// Curve-tagged signature (recovery byte first)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Signature {
    pub curve: Curve,
    pub content: Vec<u8>,
}

impl Signature {
    pub fn new(curve: Curve, content: Vec<u8>) -> CodecResult<Self> {
        let sig = Self { curve, content };
        sig.validate()?;
        Ok(sig)
    }

    /// Parse `curve tag ‖ payload`
    pub fn from_tagged(data: &[u8]) -> CodecResult<Self> {
        let (&tag, content) = data
            .split_first()
            .ok_or_else(|| CodecError::InvalidKey("empty signature".to_string()))?;
        Signature::new(Curve::from_tag(tag)?, content.to_vec())
    }

    pub fn validate(&self) -> CodecResult<()> {
        let expected = self.curve.signature_len()?;
        if self.content.len() != expected {
            return Err(CodecError::InvalidKey(format!(
                "{} signature must be {} bytes, got {}",
                self.curve.suffix(),
                expected,
                self.content.len()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = self.curve.suffix();
        write!(f, "SIG_{}_{}", suffix, encode_with_checksum(&self.content, suffix))
    }
}

impl FromStr for Signature {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("SIG_")
            .ok_or_else(|| CodecError::InvalidKey(format!("signature '{}' must start with SIG_", s)))?;
        let (suffix, encoded) = rest
            .split_once('_')
            .ok_or_else(|| CodecError::InvalidKey(format!("malformed signature '{}'", s)))?;
        let curve = Curve::from_suffix(suffix)?;
        let content = decode_with_checksum(encoded, suffix, curve.signature_len()?)?;
        Signature::new(curve, content)
    }
}

impl Pack for Signature {
    fn pack(&self, enc: &mut Encoder) -> CodecResult<()> {
        self.validate()?;
        enc.write_u8(self.curve.tag());
        enc.write_raw(&self.content);
        Ok(())
    }
}

impl Unpack for Signature {
    fn unpack(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        let curve = Curve::from_tag(dec.read_u8()?)?;
        let content = dec.read_raw(curve.signature_len()?)?.to_vec();
        Ok(Signature { curve, content })
    }
}

macro_rules! impl_string_serde {
    ($($ty:ty),*) => {
        $(
            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.serialize_str(&self.to_string())
                }
            }

            impl<'de> Deserialize<'de> for $ty {
                fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                    let s = String::deserialize(deserializer)?;
                    s.parse().map_err(serde::de::Error::custom)
                }
            }
        )*
    };
}

impl_string_serde!(PublicKey, Signature);
