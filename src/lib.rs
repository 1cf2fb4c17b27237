//! EOS Transaction Kit
//!
//! Builds, signs and serializes EOS/Antelope transactions without a node.
//!
//! # Architecture
//!
//! This crate provides:
//! - **codec**: Byte-exact EOSIO binary packing (varints, names, assets, keys)
//! - **tx**: Transaction assembly from transfer and staking intents, including
//!   RAM balancing and fee-payer co-signing
//! - **signing**: The canonical-signature search across one or more signers
//! - **utils**: Structured logging and configuration
//!
//! # Security
//!
//! Private keys never enter a `SigningSession`; signing goes through the
//! `Signer` trait. `LocalKeySigner` clears its keys when dropped.
//!
//! # Example
//!
//! ```rust,ignore
//! use eos_txkit::{LocalKeySigner, TransactionAssembler, TransferIntent, TxInput, TxKitConfig};
//!
//! let assembler = TransactionAssembler::new(TxKitConfig::from_json(&config_json)?)?;
//! let input: TxInput = serde_json::from_str(&fetched_input)?;
//! let built = assembler.transfer(&intent, &input)?;
//! let signer = LocalKeySigner::new().with_key_hex("addr1", &key_hex)?;
//! let packed = assembler.sign(built, &signer)?;
//! println!("{}", packed.to_json()?);
//! ```

pub mod codec;
pub mod error;
pub mod signing;
pub mod tx;
pub mod utils;

// Re-export key types for convenience
pub use codec::{Asset, Name, PublicKey, Signature};
pub use error::{ErrorCode, TxKitError, TxKitResult};
pub use signing::{
    sign_transaction, LocalKeySigner, SignatureRequest, SignatureResponse, Signer, SignerId, SigningRound,
    SigningSession, SigningState,
};
pub use tx::{
    BuiltTransaction, FeePayer, PackedTransaction, StakeIntent, Transaction, TransactionAssembler, TransferIntent,
    TxInput, WithdrawIntent,
};
pub use utils::config::{SigningSettings, TxKitConfig};
