//! Unified error types for the transaction kit
//!
//! Every fallible operation surfaces a `TxKitError` tagged with an
//! `ErrorCode`, so callers can tell a codec failure from a broken signer
//! or an exhausted canonical-signature search at a glance.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::codec::CodecError;

/// Main error type for all transaction-kit operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxKitError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl TxKitError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn codec(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Codec, msg)
    }

    pub fn signer(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Signer, msg)
    }

    pub fn canonical_search_exhausted(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::CanonicalSearchExhausted, msg)
    }

    pub fn assembly(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Assembly, msg)
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }

    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidAddress, msg)
    }

    pub fn invalid_signature(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidSignature, msg)
    }

    pub fn crypto_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::CryptoError, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }
}

impl fmt::Display for TxKitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for TxKitError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Wire format
    Codec,

    // Signing protocol
    Signer,
    CanonicalSearchExhausted,
    InvalidSignature,

    // Transaction assembly
    Assembly,
    InvalidInput,
    InvalidAddress,

    // Crypto / parsing
    CryptoError,
    HexError,
    JsonError,

    // Internal
    Internal,
}

/// Result type alias for transaction-kit operations
pub type TxKitResult<T> = Result<T, TxKitError>;

// Conversions from common error types

impl From<CodecError> for TxKitError {
    fn from(e: CodecError) -> Self {
        TxKitError::new(ErrorCode::Codec, e.to_string())
    }
}

impl From<serde_json::Error> for TxKitError {
    fn from(e: serde_json::Error) -> Self {
        TxKitError::new(ErrorCode::JsonError, e.to_string())
    }
}

impl From<hex::FromHexError> for TxKitError {
    fn from(e: hex::FromHexError) -> Self {
        TxKitError::new(ErrorCode::HexError, e.to_string())
    }
}

impl From<secp256k1::Error> for TxKitError {
    fn from(e: secp256k1::Error) -> Self {
        TxKitError::new(ErrorCode::CryptoError, format!("Secp256k1 error: {}", e))
    }
}
