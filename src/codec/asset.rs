//! Fixed-point assets
//!
//! Wire layout: `i64` amount, one precision byte, 7-byte null-padded symbol code.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{CodecError, CodecResult, Decoder, Encoder, Pack, Unpack};

const SYMBOL_CODE_LEN: usize = 7;
const MAX_PRECISION: u8 = 18;

/// Token symbol, e.g. `4,EOS`
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    pub precision: u8,
    pub code: String,
}

impl Symbol {
    pub fn new(precision: u8, code: &str) -> CodecResult<Self> {
        let symbol = Self {
            precision,
            code: code.to_string(),
        };
        symbol.validate()?;
        Ok(symbol)
    }
}

fn validate_code(code: &str) -> CodecResult<()> {
    if code.is_empty() || code.len() > SYMBOL_CODE_LEN {
        return Err(CodecError::InvalidSymbol(format!(
            "code '{}' must be 1-{} characters",
            code, SYMBOL_CODE_LEN
        )));
    }
    if !code.bytes().all(|c| c.is_ascii_uppercase()) {
        return Err(CodecError::InvalidSymbol(format!("code '{}' must be uppercase A-Z", code)));
    }
    Ok(())
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision, self.code)
    }
}

impl Symbol {
    pub fn validate(&self) -> CodecResult<()> {
        if self.precision > MAX_PRECISION {
            return Err(CodecError::InvalidSymbol(format!(
                "precision {} exceeds {}",
                self.precision, MAX_PRECISION
            )));
        }
        validate_code(&self.code)
    }
}

impl Pack for Symbol {
    fn pack(&self, enc: &mut Encoder) -> CodecResult<()> {
        // Reject anything unpack would refuse
        self.validate()?;
        enc.write_u8(self.precision);
        enc.write_fixed(self.code.as_bytes(), SYMBOL_CODE_LEN)
    }
}

impl Unpack for Symbol {
    fn unpack(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        let precision = dec.read_u8()?;
        let raw = dec.read_raw(SYMBOL_CODE_LEN)?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(SYMBOL_CODE_LEN);
        let code = std::str::from_utf8(&raw[..end]).map_err(|e| CodecError::InvalidSymbol(e.to_string()))?;
        Symbol::new(precision, code)
    }
}

/// Amount in the smallest unit plus its symbol, e.g. `1.0000 EOS`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Asset {
    pub amount: i64,
    pub symbol: Symbol,
}

impl Asset {
    pub fn new(amount: i64, symbol: Symbol) -> Self {
        Self { amount, symbol }
    }

    /// Build from an unsigned blockchain amount, rejecting values above `i64::MAX`
    pub fn from_units(units: u64, precision: u8, code: &str) -> CodecResult<Self> {
        let amount = i64::try_from(units)
            .map_err(|_| CodecError::InvalidAsset(format!("amount {} exceeds i64 range", units)))?;
        Ok(Self::new(amount, Symbol::new(precision, code)?))
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();
        let precision = self.symbol.precision as u32;
        if precision == 0 {
            return write!(f, "{}{} {}", sign, abs, self.symbol.code);
        }
        let scale = 10u64.pow(precision);
        write!(
            f,
            "{}{}.{:0width$} {}",
            sign,
            abs / scale,
            abs % scale,
            self.symbol.code,
            width = precision as usize
        )
    }
}

impl FromStr for Asset {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let (number, code) = match (parts.next(), parts.next(), parts.next()) {
            (Some(number), Some(code), None) => (number, code),
            _ => return Err(CodecError::InvalidAsset(format!("expected '<amount> <SYMBOL>', got '{}'", s))),
        };

        let (negative, digits) = match number.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, number),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        if int_part.is_empty() || !int_part.bytes().chain(frac_part.bytes()).all(|c| c.is_ascii_digit()) {
            return Err(CodecError::InvalidAsset(format!("invalid amount '{}'", number)));
        }

        let precision = u8::try_from(frac_part.len())
            .map_err(|_| CodecError::InvalidAsset(format!("too many decimals in '{}'", number)))?;
        let units: i64 = format!("{}{}", int_part, frac_part)
            .parse()
            .map_err(|_| CodecError::InvalidAsset(format!("amount '{}' out of range", number)))?;

        let amount = if negative { -units } else { units };
        Ok(Asset::new(amount, Symbol::new(precision, code)?))
    }
}

impl Pack for Asset {
    fn pack(&self, enc: &mut Encoder) -> CodecResult<()> {
        enc.write_i64(self.amount);
        self.symbol.pack(enc)
    }
}

impl Unpack for Asset {
    fn unpack(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        let amount = dec.read_i64()?;
        let symbol = Symbol::unpack(dec)?;
        Ok(Asset { amount, symbol })
    }
}

impl Serialize for Asset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Asset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
