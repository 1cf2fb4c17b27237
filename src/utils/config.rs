//! Configuration
//!
//! Chain, resource, signing and logging settings with:
//! - Defaults matching EOS mainnet conventions
//! - JSON loading
//! - Validation of every tunable before use

use crate::error::{TxKitError, TxKitResult};
use crate::utils::logging;
use serde::{Deserialize, Serialize};

/// Default transaction lifetime
pub const DEFAULT_EXPIRATION_SECS: u32 = 5 * 60;
/// Grace period on top of the expiration before a resend is safe
pub const EXPIRATION_GRACE_SECS: u32 = 90;
/// Hard ceiling on canonical-signature retries
pub const DEFAULT_MAX_SIGNING_ATTEMPTS: u32 = 255;
/// Upper bound accepted for `max_attempts`
pub const MAX_SIGNING_ATTEMPTS_LIMIT: u32 = 1000;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxKitConfig {
    pub chain: ChainSettings,
    pub resources: ResourceSettings,
    pub signing: SigningSettings,
    pub logging: LoggingSettings,
}

impl TxKitConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json(json: &str) -> TxKitResult<Self> {
        let config: TxKitConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> TxKitResult<()> {
        self.chain.validate()?;
        self.resources.validate()?;
        self.signing.validate()
    }
}

/// A native asset alias, e.g. `"EOS" -> "eosio.token/EOS"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeAsset {
    pub alias: String,
    pub contract_id: String,
}

/// Chain-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainSettings {
    /// Contract id used when a transfer names no contract (`<contract>/<symbol>`)
    pub default_contract: String,
    /// Decimals used when a transfer names none
    pub default_decimals: u8,
    /// Symbol of the core token used for staking
    pub native_symbol: String,
    /// Account hosting the system contract
    pub system_contract: String,
    /// Known asset aliases
    pub native_assets: Vec<NativeAsset>,
    /// Seconds between the input timestamp and the transaction expiration
    pub expiration_secs: u32,
    /// Header `max_cpu_usage_ms` for freshly built transactions
    pub max_cpu_usage_ms: u8,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            default_contract: "eosio.token/EOS".to_string(),
            default_decimals: 4,
            native_symbol: "EOS".to_string(),
            system_contract: "eosio".to_string(),
            native_assets: vec![NativeAsset {
                alias: "EOS".to_string(),
                contract_id: "eosio.token/EOS".to_string(),
            }],
            expiration_secs: DEFAULT_EXPIRATION_SECS,
            max_cpu_usage_ms: 25,
        }
    }
}

impl ChainSettings {
    pub fn validate(&self) -> TxKitResult<()> {
        if self.default_contract.is_empty() {
            return Err(TxKitError::invalid_input("default_contract must not be empty"));
        }
        if self.default_decimals > 18 {
            return Err(TxKitError::invalid_input(format!(
                "default_decimals must be at most 18, got {}",
                self.default_decimals
            )));
        }
        if self.native_symbol.is_empty() || self.native_symbol.len() > 7 {
            return Err(TxKitError::invalid_input(format!(
                "native_symbol must be 1-7 characters, got '{}'",
                self.native_symbol
            )));
        }
        if self.system_contract.is_empty() {
            return Err(TxKitError::invalid_input("system_contract must not be empty"));
        }
        if self.expiration_secs == 0 {
            return Err(TxKitError::invalid_input("expiration_secs must be positive"));
        }
        Ok(())
    }

    /// Look up the contract id registered for an alias
    pub fn native_asset(&self, alias: &str) -> Option<&NativeAsset> {
        self.native_assets
            .iter()
            .find(|na| na.alias.eq_ignore_ascii_case(alias) || na.contract_id == alias)
    }
}

/// RAM top-up/sell tolerance band
///
/// The assembler only inserts a `buyrambytes` action when the projected
/// shortfall exceeds `ram_buy_tolerance`, and only inserts `sellram` when the
/// surplus exceeds `ram_sell_tolerance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceSettings {
    pub ram_buy_tolerance: i64,
    pub ram_sell_tolerance: i64,
}

impl Default for ResourceSettings {
    fn default() -> Self {
        Self {
            ram_buy_tolerance: 250,
            ram_sell_tolerance: 500,
        }
    }
}

impl ResourceSettings {
    pub fn validate(&self) -> TxKitResult<()> {
        if self.ram_buy_tolerance < 0 || self.ram_sell_tolerance < 0 {
            return Err(TxKitError::invalid_input("RAM tolerances must not be negative"));
        }
        Ok(())
    }
}

/// Log output settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Emit per-attempt and per-transaction debug lines
    pub debug: bool,
}

impl LoggingSettings {
    /// Turn on process-wide debug output; `debug: false` leaves the flag alone
    pub fn apply(&self) {
        if self.debug {
            logging::enable_debug();
        }
    }
}

/// Canonical-signature search settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningSettings {
    /// Retries allowed before the search is declared exhausted
    pub max_attempts: u32,
}

impl Default for SigningSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_SIGNING_ATTEMPTS,
        }
    }
}

impl SigningSettings {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn validate(&self) -> TxKitResult<()> {
        if self.max_attempts == 0 || self.max_attempts > MAX_SIGNING_ATTEMPTS_LIMIT {
            return Err(TxKitError::invalid_input(format!(
                "max_attempts must be between 1 and {}, got {}",
                MAX_SIGNING_ATTEMPTS_LIMIT, self.max_attempts
            )));
        }
        Ok(())
    }
}
