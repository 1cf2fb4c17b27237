//! Signing digest
//!
//! `SHA-256(chain_id ‖ packed_trx ‖ cfd_hash)`, where an empty chain id is
//! replaced by 32 zero bytes and `cfd_hash` is `SHA-256(context_free_data)`,
//! or 32 zero bytes when there is no context-free data.

use sha2::{Digest, Sha256};

pub const DIGEST_LEN: usize = 32;

/// Compute the digest every signer of a transaction signs
pub fn signing_digest(chain_id: &[u8], packed_trx: &[u8], context_free_data: &[u8]) -> [u8; DIGEST_LEN] {
    let mut hasher = Sha256::new();

    if chain_id.is_empty() {
        hasher.update([0u8; DIGEST_LEN]);
    } else {
        hasher.update(chain_id);
    }

    hasher.update(packed_trx);

    if context_free_data.is_empty() {
        hasher.update([0u8; DIGEST_LEN]);
    } else {
        hasher.update(Sha256::digest(context_free_data));
    }

    hasher.finalize().into()
}
