//! Chain state needed to build a transaction

use serde::{Deserialize, Serialize};

use crate::codec::{HexBytes, TimePointSec, Varuint32};
use crate::error::{TxKitError, TxKitResult};
use crate::utils::config::{ChainSettings, EXPIRATION_GRACE_SECS};

use super::transaction::TransactionHeader;

/// Input fetched from the chain before building a transaction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxInput {
    /// Unix seconds the input was fetched at
    pub timestamp: i64,
    pub chain_id: HexBytes,
    pub head_block_id: HexBytes,

    /// Account that owns the sending address
    pub from_account: String,
    /// Account sponsoring CPU/NET (and RAM top-ups) when a fee payer is used
    pub fee_payer_account: String,

    /// Symbol resolved for the asset contract, if any
    pub symbol: String,

    pub available_ram: i64,
    /// Microseconds
    pub available_cpu: i64,
    /// Bytes
    pub available_net: i64,
    /// RAM balance to float the sending account at
    pub target_ram: i64,
    /// Native token balance in the smallest unit
    pub native_balance: u64,
}

impl TxInput {
    pub fn new(timestamp: i64, head_block_id: Vec<u8>, from_account: &str) -> Self {
        Self {
            timestamp,
            head_block_id: HexBytes(head_block_id),
            from_account: from_account.to_string(),
            ..Default::default()
        }
    }

    fn head_block_bytes(&self) -> TxKitResult<&[u8]> {
        let id = self.head_block_id.as_bytes();
        if id.len() < 12 {
            return Err(TxKitError::assembly(format!(
                "head block id must be at least 12 bytes, got {}",
                id.len()
            )));
        }
        Ok(id)
    }

    /// Low 16 bits of the block number stored big-endian in the id prefix
    pub fn ref_block_num(&self) -> TxKitResult<u16> {
        let id = self.head_block_bytes()?;
        let num = u32::from_be_bytes([id[0], id[1], id[2], id[3]]);
        Ok(num as u16)
    }

    pub fn ref_block_prefix(&self) -> TxKitResult<u32> {
        let id = self.head_block_bytes()?;
        Ok(u32::from_le_bytes([id[8], id[9], id[10], id[11]]))
    }

    pub fn expiration(&self, expiration_secs: u32) -> TxKitResult<TimePointSec> {
        let secs = self
            .timestamp
            .checked_add(expiration_secs as i64)
            .ok_or_else(|| TxKitError::assembly("expiration overflows"))?;
        TimePointSec::from_unix(secs).map_err(|e| TxKitError::assembly(e.to_string()))
    }

    /// Header of a fresh transaction referencing the head block
    pub fn header(&self, chain: &ChainSettings) -> TxKitResult<TransactionHeader> {
        Ok(TransactionHeader {
            expiration: self.expiration(chain.expiration_secs)?,
            ref_block_num: self.ref_block_num()?,
            ref_block_prefix: self.ref_block_prefix()?,
            max_net_usage_words: Varuint32(0),
            max_cpu_usage_ms: chain.max_cpu_usage_ms,
            delay_sec: Varuint32(0),
        })
    }

    /// EOS has no nonces, so every transaction is independent
    pub fn independent_of(&self, _other: &TxInput) -> bool {
        true
    }

    /// A resend is safe once the previous attempt has surely expired and the
    /// chain has moved to a different head block.
    pub fn safe_from_double_send(&self, old: Option<&TxInput>, chain: &ChainSettings) -> bool {
        let Some(old) = old else {
            return false;
        };
        let window = chain.expiration_secs as i64 + EXPIRATION_GRACE_SECS as i64;
        let elapsed = self.timestamp.saturating_sub(old.timestamp);
        elapsed >= window && self.head_block_id != old.head_block_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head_block() -> Vec<u8> {
        let mut id = vec![0u8; 32];
        // block 0x0102_abcd
        id[..4].copy_from_slice(&[0x01, 0x02, 0xab, 0xcd]);
        id[8..12].copy_from_slice(&[0x78, 0x56, 0x34, 0x12]);
        id
    }

    #[test]
    fn test_reference_block_fields() {
        let input = TxInput::new(0, head_block(), "alice");
        assert_eq!(input.ref_block_num().unwrap(), 0xabcd);
        assert_eq!(input.ref_block_prefix().unwrap(), 0x1234_5678);
    }

    #[test]
    fn test_short_head_block_id_rejected() {
        let input = TxInput::new(0, vec![0u8; 11], "alice");
        let err = input.ref_block_num().unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::Assembly);
    }

    #[test]
    fn test_header_uses_settings() {
        let input = TxInput::new(1_000, head_block(), "alice");
        let header = input.header(&ChainSettings::default()).unwrap();
        assert_eq!(header.expiration, TimePointSec(1_300));
        assert_eq!(header.max_cpu_usage_ms, 25);
        assert_eq!(header.delay_sec, Varuint32(0));
    }

    #[test]
    fn test_double_send_safety() {
        let chain = ChainSettings::default();
        let now = 1_700_000_000;

        let fresh = TxInput::default();
        assert!(!fresh.safe_from_double_send(None, &chain));
        assert!(!fresh.safe_from_double_send(Some(&TxInput::default()), &chain));
        assert!(fresh.independent_of(&TxInput::default()));

        let old = TxInput {
            timestamp: now,
            head_block_id: HexBytes(vec![1]),
            ..Default::default()
        };

        // Same time, different block
        let same_time = TxInput {
            timestamp: now,
            head_block_id: HexBytes(vec![2]),
            ..Default::default()
        };
        assert!(!same_time.safe_from_double_send(Some(&old), &chain));

        // Only the expiration has passed, grace period has not
        let expired = TxInput {
            timestamp: now + 300,
            head_block_id: HexBytes(vec![2]),
            ..Default::default()
        };
        assert!(!expired.safe_from_double_send(Some(&old), &chain));

        let after_grace = TxInput {
            timestamp: now + 300 + 90,
            head_block_id: HexBytes(vec![2]),
            ..Default::default()
        };
        assert!(after_grace.safe_from_double_send(Some(&old), &chain));

        // Same head block is never safe
        let stuck = TxInput {
            timestamp: now + 10_000,
            head_block_id: HexBytes(vec![1]),
            ..Default::default()
        };
        assert!(!stuck.safe_from_double_send(Some(&old), &chain));
    }

    #[test]
    fn test_input_json_roundtrip() {
        let mut input = TxInput::new(42, head_block(), "aaaaaaaaaaa1");
        input.target_ram = 2000;
        let json = serde_json::to_string(&input).unwrap();
        assert!(json.contains("\"from_account\":\"aaaaaaaaaaa1\""));
        let back: TxInput = serde_json::from_str(&json).unwrap();
        assert_eq!(back, input);
    }
}
