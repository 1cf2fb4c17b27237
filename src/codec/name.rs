//! EOSIO `name`
//!
//! Up to 13 characters from `.12345abcdefghijklmnopqrstuvwxyz`, packed 5 bits
//! per character (4 bits for the 13th) into a `u64`, most significant first.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{CodecError, CodecResult, Decoder, Encoder, Pack, Unpack};

const CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

/// Account, permission and action identifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(pub u64);

pub type AccountName = Name;
pub type PermissionName = Name;
pub type ActionName = Name;

impl Name {
    pub fn new(s: &str) -> CodecResult<Self> {
        s.parse()
    }

    /// Encode a name literal in const context, panicking on invalid input
    pub const fn constant(s: &str) -> Self {
        let bytes = s.as_bytes();
        if bytes.len() > 13 {
            panic!("name literal longer than 13 characters");
        }
        let mut value: u64 = 0;
        let mut i = 0;
        while i < bytes.len() {
            let symbol = match bytes[i] {
                c @ b'a'..=b'z' => (c - b'a') as u64 + 6,
                c @ b'1'..=b'5' => (c - b'1') as u64 + 1,
                b'.' => 0,
                _ => panic!("invalid character in name literal"),
            };
            if i < 12 {
                value |= (symbol & 0x1f) << (64 - 5 * (i + 1));
            } else {
                if symbol > 0x0f {
                    panic!("13th character of a name literal must be in '.1-5a-j'");
                }
                value |= symbol;
            }
            i += 1;
        }
        Name(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

fn char_to_symbol(c: u8) -> Option<u64> {
    match c {
        b'a'..=b'z' => Some((c - b'a') as u64 + 6),
        b'1'..=b'5' => Some((c - b'1') as u64 + 1),
        b'.' => Some(0),
        _ => None,
    }
}

impl FromStr for Name {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() > 13 {
            return Err(CodecError::InvalidName(format!("'{}' is longer than 13 characters", s)));
        }

        let mut value: u64 = 0;
        for (i, &c) in bytes.iter().enumerate() {
            let symbol = char_to_symbol(c)
                .ok_or_else(|| CodecError::InvalidName(format!("'{}' contains invalid character '{}'", s, c as char)))?;
            if i < 12 {
                value |= (symbol & 0x1f) << (64 - 5 * (i + 1));
            } else {
                if symbol > 0x0f {
                    return Err(CodecError::InvalidName(format!(
                        "'{}' has a 13th character outside '.1-5a-j'",
                        s
                    )));
                }
                value |= symbol;
            }
        }
        Ok(Name(value))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chars = [b'.'; 13];
        let mut tmp = self.0;
        for i in 0..13 {
            let (mask, shift) = if i == 0 { (0x0f, 4) } else { (0x1f, 5) };
            chars[12 - i] = CHARMAP[(tmp & mask) as usize];
            tmp >>= shift;
        }

        let end = chars.iter().rposition(|&c| c != b'.').map(|p| p + 1).unwrap_or(0);
        // CHARMAP is ASCII
        f.write_str(std::str::from_utf8(&chars[..end]).map_err(|_| fmt::Error)?)
    }
}

impl Pack for Name {
    fn pack(&self, enc: &mut Encoder) -> CodecResult<()> {
        enc.write_u64(self.0);
        Ok(())
    }
}

impl Unpack for Name {
    fn unpack(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        Ok(Name(dec.read_u64()?))
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Check the stricter rules for account names used as addresses
pub fn validate_account_name(name: &str) -> CodecResult<()> {
    if name.is_empty() || name.len() > 12 {
        return Err(CodecError::InvalidName(format!(
            "account '{}' must be between 1 and 12 characters",
            name
        )));
    }

    let bytes = name.as_bytes();
    if matches!(bytes[0], b'1'..=b'5' | b'.') {
        return Err(CodecError::InvalidName(format!(
            "account '{}' cannot start with a number or period",
            name
        )));
    }
    if bytes[bytes.len() - 1] == b'.' {
        return Err(CodecError::InvalidName(format!("account '{}' cannot end with a period", name)));
    }
    if !bytes.iter().all(|&c| matches!(c, b'a'..=b'z' | b'1'..=b'5' | b'.')) {
        return Err(CodecError::InvalidName(format!(
            "account '{}' may only contain a-z, 1-5 and '.'",
            name
        )));
    }
    Ok(())
}
