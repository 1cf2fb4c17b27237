//! Token contract identifiers
//!
//! A token on EOS needs two identifiers: the account hosting the contract
//! (e.g. `eosio.token`) and the symbol (e.g. `EOS`). They are written as
//! `<contract>/<symbol>` or `<contract>-<symbol>`; a bare contract resolves
//! its symbol from the transaction input, then from the native asset aliases.

use crate::error::{TxKitError, TxKitResult};
use crate::utils::config::ChainSettings;

use super::input::TxInput;

/// Split on the first separator kind that occurs in the id
fn split_contract_id(id: &str) -> Option<(&str, &str)> {
    ['/', '-'].iter().find_map(|&sep| id.split_once(sep))
}

/// Resolve a contract id into `(contract account, symbol)`
pub fn parse_contract_id(
    chain: &ChainSettings,
    contract_id: &str,
    input: Option<&TxInput>,
) -> TxKitResult<(String, String)> {
    if let Some((contract, symbol)) = split_contract_id(contract_id) {
        return Ok((contract.to_string(), symbol.to_string()));
    }

    if let Some(input) = input {
        if !input.symbol.is_empty() {
            return Ok((contract_id.to_string(), input.symbol.clone()));
        }
    }

    if let Some(native) = chain.native_asset(contract_id) {
        if let Some((contract, symbol)) = split_contract_id(&native.contract_id) {
            return Ok((contract.to_string(), symbol.to_string()));
        }
    }

    Err(TxKitError::assembly(format!(
        "unable to resolve symbol from contract, expected `<contract>/<symbol>` (got '{}')",
        contract_id
    )))
}

/// Contract id used when a transfer names none
pub fn default_contract_id(chain: &ChainSettings) -> &str {
    &chain.default_contract
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::config::NativeAsset;

    #[test]
    fn test_explicit_symbol() {
        let chain = ChainSettings::default();
        assert_eq!(
            parse_contract_id(&chain, "core.vaulta/A", None).unwrap(),
            ("core.vaulta".to_string(), "A".to_string())
        );
        assert_eq!(
            parse_contract_id(&chain, "token.pcash-USDCASH", None).unwrap(),
            ("token.pcash".to_string(), "USDCASH".to_string())
        );
    }

    #[test]
    fn test_symbol_from_input() {
        let chain = ChainSettings::default();
        let input = TxInput {
            symbol: "USDT".to_string(),
            ..Default::default()
        };
        assert_eq!(
            parse_contract_id(&chain, "tethertether", Some(&input)).unwrap(),
            ("tethertether".to_string(), "USDT".to_string())
        );
    }

    #[test]
    fn test_symbol_from_native_alias() {
        let mut chain = ChainSettings::default();
        chain.native_assets.push(NativeAsset {
            alias: "A".to_string(),
            contract_id: "core.vaulta/A".to_string(),
        });
        assert_eq!(
            parse_contract_id(&chain, "A", None).unwrap(),
            ("core.vaulta".to_string(), "A".to_string())
        );
        assert_eq!(
            parse_contract_id(&chain, "EOS", Some(&TxInput::default())).unwrap(),
            ("eosio.token".to_string(), "EOS".to_string())
        );
    }

    #[test]
    fn test_unresolvable_contract() {
        let chain = ChainSettings::default();
        let err = parse_contract_id(&chain, "unknown.tkn", None).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::Assembly);
        assert!(err.message.contains("unknown.tkn"));
    }

    #[test]
    fn test_default_contract() {
        assert_eq!(default_contract_id(&ChainSettings::default()), "eosio.token/EOS");
    }
}
