//! Transaction Module
//!
//! Builds unsigned EOS transactions from transfer and staking intents:
//! - `TxInput` carries the chain state (head block, chain id, resources)
//! - `TransactionAssembler` turns intents into actions, balancing RAM on the way
//! - `validate_address` accepts account names and public keys
//! - `Transaction` and `PackedTransaction` are the wire-level body and envelope

pub mod actions;
mod address;
mod builder;
mod contract;
mod input;
mod transaction;


pub use actions::ActionPayload;
pub use address::{classify_address, validate_address, AddressKind};
pub use builder::*;
pub use contract::{default_contract_id, parse_contract_id};
pub use input::TxInput;
pub use transaction::*;
