//! Transaction Signing
//!
//! Searches for canonical EOS signatures:
//! 1. Compute the signing digest of the current transaction body
//! 2. Ask every required signer for a raw signature over it
//! 3. Relocate the recovery byte and test each signature for canonical form
//! 4. If any signer's signature is not canonical, perturb the expiration and
//!    start over; otherwise serialize the signed envelope
//!
//! Signers are injected through the `Signer` trait, so keys can live in
//! process (`LocalKeySigner`), on a hardware device or behind a remote
//! service.

pub mod canonical;
pub mod digest;
pub mod round;
pub mod session;
pub mod signer;

#[cfg(test)]
mod tests;

pub use canonical::{CanonicalSignature, SignatureCanonicalizer, RAW_SIGNATURE_LEN, RECOVERY_MAGIC};
pub use digest::{signing_digest, DIGEST_LEN};
pub use round::{sign_transaction, SigningRound};
pub use session::{MultiSignerCoordinator, SignatureRecord, SigningSession, SigningState};
pub use signer::{recover_public_key, LocalKeySigner, SignatureRequest, SignatureResponse, Signer, SignerId};
