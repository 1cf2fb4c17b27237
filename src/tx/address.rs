//! Address validation
//!
//! An EOS address is either an account name or a public key in legacy
//! (`EOS...`) or prefixed (`PUB_K1_...`) form. Key checksums are verified.

use serde::{Deserialize, Serialize};

use crate::codec::keys::PUBLIC_KEY_LEGACY_PREFIX;
use crate::codec::name::validate_account_name;
use crate::codec::PublicKey;
use crate::error::{TxKitError, TxKitResult};

/// Address type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressKind {
    Account,
    LegacyPublicKey,
    PublicKey,
}

/// Classify an address, rejecting anything malformed
pub fn classify_address(address: &str) -> TxKitResult<AddressKind> {
    let address = address.trim();
    if address.starts_with("PUB_") || address.starts_with(PUBLIC_KEY_LEGACY_PREFIX) {
        address
            .parse::<PublicKey>()
            .map_err(|e| TxKitError::invalid_address(format!("invalid public key '{}': {}", address, e)))?;
        return Ok(if address.starts_with("PUB_") {
            AddressKind::PublicKey
        } else {
            AddressKind::LegacyPublicKey
        });
    }

    validate_account_name(address).map_err(|e| TxKitError::invalid_address(e.to_string()))?;
    Ok(AddressKind::Account)
}

pub fn validate_address(address: &str) -> TxKitResult<()> {
    classify_address(address).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    const LEGACY_KEY: &str = "EOS6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5GDW5CV";

    #[test]
    fn test_accounts() {
        assert_eq!(classify_address("eosio.token").unwrap(), AddressKind::Account);
        assert_eq!(classify_address("aaaaaaaaaaa1").unwrap(), AddressKind::Account);
        assert!(validate_address("1abc").is_err());
        assert!(validate_address("abc.").is_err());
        assert!(validate_address("toolongaccount").is_err());
        assert!(validate_address("").is_err());
    }

    #[test]
    fn test_public_keys() {
        assert_eq!(classify_address(LEGACY_KEY).unwrap(), AddressKind::LegacyPublicKey);

        let key: PublicKey = LEGACY_KEY.parse().unwrap();
        let prefixed = key.to_string();
        assert!(prefixed.starts_with("PUB_K1_"));
        assert_eq!(classify_address(&prefixed).unwrap(), AddressKind::PublicKey);
    }

    #[test]
    fn test_bad_checksum() {
        let mut corrupted = LEGACY_KEY.to_string();
        corrupted.pop();
        corrupted.push('X');
        let err = classify_address(&corrupted).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAddress);
    }
}
