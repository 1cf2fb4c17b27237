//! Signature Canonicalizer
//!
//! EOS only accepts "canonical" secp256k1 signatures: neither the `r` nor
//! the `s` half may have its top bit set, and neither may start with a zero
//! byte unless the next byte has its top bit set. Signers return
//! `r ‖ s ‖ recid`; on chain the recovery byte comes first, offset by 27.

use crate::codec::{Curve, Signature};
use crate::error::{TxKitError, TxKitResult};

pub const RAW_SIGNATURE_LEN: usize = 65;
pub const RECOVERY_MAGIC: u8 = 27;

/// A K1 signature that passed the canonical-form test
///
/// Only `SignatureCanonicalizer::canonicalize` can build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalSignature(Signature);

impl CanonicalSignature {
    pub fn signature(&self) -> &Signature {
        &self.0
    }

    /// Recovery byte first, then `r ‖ s`
    pub fn as_bytes(&self) -> &[u8] {
        &self.0.content
    }

    pub fn into_signature(self) -> Signature {
        self.0
    }
}

/// Recovery-byte relocation and the canonical-form predicate
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureCanonicalizer;

impl SignatureCanonicalizer {
    /// Move the trailing recovery byte to the front, adding 27 to raw ids 0 and 1
    pub fn relocate_recovery_byte(raw: &[u8]) -> TxKitResult<[u8; RAW_SIGNATURE_LEN]> {
        if raw.len() != RAW_SIGNATURE_LEN {
            return Err(TxKitError::invalid_signature(format!(
                "expected {} signature bytes, got {}",
                RAW_SIGNATURE_LEN,
                raw.len()
            )));
        }

        let recovery = raw[64];
        let mut out = [0u8; RAW_SIGNATURE_LEN];
        out[0] = if recovery <= 1 { recovery + RECOVERY_MAGIC } else { recovery };
        out[1..].copy_from_slice(&raw[..64]);
        Ok(out)
    }

    /// Canonical-form test on a recovery-byte-first signature
    pub fn is_canonical(sig: &[u8; RAW_SIGNATURE_LEN]) -> bool {
        sig[1] & 0x80 == 0
            && !(sig[1] == 0 && sig[2] & 0x80 == 0)
            && sig[33] & 0x80 == 0
            && !(sig[33] == 0 && sig[34] & 0x80 == 0)
    }

    /// Tag a relocated signature with the K1 curve if it is canonical
    pub fn canonicalize(sig: &[u8; RAW_SIGNATURE_LEN]) -> Option<CanonicalSignature> {
        if !Self::is_canonical(sig) {
            return None;
        }
        Some(CanonicalSignature(Signature {
            curve: Curve::K1,
            content: sig.to_vec(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical_fixture() -> [u8; RAW_SIGNATURE_LEN] {
        let mut sig = [0x11u8; RAW_SIGNATURE_LEN];
        sig[0] = 31;
        sig
    }

    #[test]
    fn test_relocation_offsets_low_recovery_ids() {
        let mut raw = [0xabu8; RAW_SIGNATURE_LEN];
        raw[0] = 0x01;
        raw[63] = 0x02;

        raw[64] = 0;
        let out = SignatureCanonicalizer::relocate_recovery_byte(&raw).unwrap();
        assert_eq!(out[0], 27);
        assert_eq!(out[1], 0x01);
        assert_eq!(out[64], 0x02);

        raw[64] = 1;
        assert_eq!(SignatureCanonicalizer::relocate_recovery_byte(&raw).unwrap()[0], 28);

        // Already offset ids pass through unchanged
        raw[64] = 31;
        assert_eq!(SignatureCanonicalizer::relocate_recovery_byte(&raw).unwrap()[0], 31);
        raw[64] = 2;
        assert_eq!(SignatureCanonicalizer::relocate_recovery_byte(&raw).unwrap()[0], 2);
    }

    #[test]
    fn test_relocation_rejects_wrong_length() {
        let err = SignatureCanonicalizer::relocate_recovery_byte(&[0u8; 64]).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidSignature);
    }

    #[test]
    fn test_high_bit_on_r() {
        let mut sig = canonical_fixture();
        assert!(SignatureCanonicalizer::is_canonical(&sig));

        sig[1] = 0x80;
        assert!(!SignatureCanonicalizer::is_canonical(&sig));

        sig[1] = 0x00;
        sig[2] = 0x80;
        assert!(SignatureCanonicalizer::is_canonical(&sig));
    }

    #[test]
    fn test_leading_zero_needs_high_bit_after_it() {
        let mut sig = canonical_fixture();
        sig[1] = 0x00;
        sig[2] = 0x7f;
        assert!(!SignatureCanonicalizer::is_canonical(&sig));

        let mut sig = canonical_fixture();
        sig[33] = 0x00;
        sig[34] = 0x01;
        assert!(!SignatureCanonicalizer::is_canonical(&sig));

        sig[34] = 0x81;
        assert!(SignatureCanonicalizer::is_canonical(&sig));
    }

    #[test]
    fn test_high_bit_on_s() {
        let mut sig = canonical_fixture();
        sig[33] = 0xff;
        assert!(!SignatureCanonicalizer::is_canonical(&sig));
    }

    #[test]
    fn test_canonicalize_tags_k1() {
        let sig = canonical_fixture();
        let canonical = SignatureCanonicalizer::canonicalize(&sig).unwrap();
        assert_eq!(canonical.signature().curve, Curve::K1);
        assert_eq!(canonical.as_bytes(), &sig[..]);
        assert!(canonical.into_signature().to_string().starts_with("SIG_K1_"));

        let mut bad = sig;
        bad[1] = 0x90;
        assert!(SignatureCanonicalizer::canonicalize(&bad).is_none());
    }
}
