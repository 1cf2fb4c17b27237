//! Transaction Assembler
//!
//! Turns transfer and staking intents into an unsigned `Transaction` plus
//! the list of signers it needs. Every intent may be preceded by a RAM
//! `buyrambytes` or `sellram` action that keeps the sending account near its
//! target RAM balance.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::codec::{Asset, HexBytes, Name};
use crate::error::{TxKitError, TxKitResult};
use crate::signing::{sign_transaction, Signer, SignerId};
use crate::utils::config::TxKitConfig;
use crate::{log_debug, log_info};

use super::actions;
use super::contract::{default_contract_id, parse_contract_id};
use super::input::TxInput;
use super::transaction::{Action, PackedTransaction, PermissionLevel, Transaction};

/// A secondary account that sponsors CPU/NET for the transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeePayer {
    /// Signer identity of the fee payer
    pub address: String,
    /// Account name; falls back to `TxInput::fee_payer_account`
    pub account: Option<String>,
}

/// Move tokens between accounts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferIntent {
    /// Signer identity of the sender
    pub from: String,
    /// Sender account; falls back to `TxInput::from_account`
    pub from_account: Option<String>,
    /// Recipient account
    pub to: String,
    /// Amount in the smallest unit
    pub amount: u64,
    pub decimals: Option<u8>,
    /// `<contract>/<symbol>`; the chain default when absent
    pub contract: Option<String>,
    pub memo: String,
    pub fee_payer: Option<FeePayer>,
}

/// Stake or unstake native tokens for CPU or NET
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeIntent {
    pub from: String,
    /// Staking account; falls back to `TxInput::from_account`
    pub account: Option<String>,
    pub amount: u64,
    /// `cpu` or `net`
    pub validator: String,
}

/// Claim tokens whose unstaking delay has elapsed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawIntent {
    pub from: String,
    pub account: Option<String>,
}

/// The resource a stake is delegated to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StakeResource {
    Cpu,
    Net,
}

impl FromStr for StakeResource {
    type Err = TxKitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cpu" => Ok(StakeResource::Cpu),
            "net" => Ok(StakeResource::Net),
            _ => Err(TxKitError::assembly(format!(
                "invalid validator '{}', expected 'cpu' or 'net'",
                s
            ))),
        }
    }
}

/// An assembled transaction waiting for signatures
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltTransaction {
    pub transaction: Transaction,
    /// Primary signer first, then the fee payer if any
    pub signers: Vec<SignerId>,
    pub chain_id: HexBytes,
    pub context_free_data: Vec<u8>,
}

/// Builds transactions from intents
#[derive(Debug, Clone, Default)]
pub struct TransactionAssembler {
    config: TxKitConfig,
}

fn parse_account(account: &str, role: &str) -> TxKitResult<Name> {
    if account.is_empty() {
        return Err(TxKitError::assembly(format!("{} account is required", role)));
    }
    account
        .parse()
        .map_err(|e| TxKitError::assembly(format!("invalid {} account '{}': {}", role, account, e)))
}

impl TransactionAssembler {
    pub fn new(config: TxKitConfig) -> TxKitResult<Self> {
        config.validate()?;
        config.logging.apply();
        Ok(Self { config })
    }

    pub fn config(&self) -> &TxKitConfig {
        &self.config
    }

    fn system_contract(&self) -> TxKitResult<Name> {
        parse_account(&self.config.chain.system_contract, "system contract")
    }

    fn native_asset(&self, amount: u64) -> TxKitResult<Asset> {
        let chain = &self.config.chain;
        Asset::from_units(amount, chain.default_decimals, &chain.native_symbol)
            .map_err(|e| TxKitError::assembly(e.to_string()))
    }

    fn new_transaction(&self, input: &TxInput) -> TxKitResult<Transaction> {
        Ok(Transaction::new(input.header(&self.config.chain)?))
    }

    /// Append a RAM purchase or sale that moves `ram_account` toward
    /// `input.target_ram`, leaving balances inside the tolerance band alone.
    pub fn balance_ram(
        &self,
        actions: &mut Vec<Action>,
        ram_account: Name,
        sponsor: Name,
        input: &TxInput,
    ) -> TxKitResult<()> {
        let resources = &self.config.resources;
        let system = self.system_contract()?;
        let diff = input.target_ram.saturating_sub(input.available_ram);

        if diff > resources.ram_buy_tolerance {
            let bytes = u32::try_from(diff)
                .map_err(|_| TxKitError::assembly(format!("RAM shortfall {} does not fit u32", diff)))?;
            log_info!(
                "tx::builder",
                "Buying RAM",
                payer = sponsor,
                receiver = ram_account,
                bytes = bytes
            );
            actions.push(actions::buy_ram_bytes(system, sponsor, ram_account, bytes));
        } else if diff < -resources.ram_sell_tolerance {
            let bytes = diff.saturating_neg();
            log_info!("tx::builder", "Selling RAM", account = ram_account, bytes = bytes);
            let mut sell = actions::sell_ram(system, ram_account, bytes);
            if ram_account != sponsor {
                // Sponsor co-signs so its CPU/NET covers the sale
                sell.authorization.insert(0, PermissionLevel::active(sponsor));
            }
            actions.push(sell);
        } else {
            log_debug!(
                "tx::builder",
                "RAM within tolerance",
                account = ram_account,
                available = input.available_ram,
                target = input.target_ram
            );
        }
        Ok(())
    }

    fn finish(&self, transaction: Transaction, signers: Vec<SignerId>, input: &TxInput) -> BuiltTransaction {
        BuiltTransaction {
            transaction,
            signers,
            chain_id: input.chain_id.clone(),
            context_free_data: Vec::new(),
        }
    }

    pub fn transfer(&self, intent: &TransferIntent, input: &TxInput) -> TxKitResult<BuiltTransaction> {
        let chain = &self.config.chain;
        let from = parse_account(intent.from_account.as_deref().unwrap_or(input.from_account.as_str()), "sender")?;
        let to = parse_account(&intent.to, "recipient")?;

        // The sponsor pays CPU/NET and any RAM top-up
        let sponsor = match &intent.fee_payer {
            Some(fee_payer) => {
                let account = fee_payer.account.as_deref().unwrap_or(input.fee_payer_account.as_str());
                if account.is_empty() {
                    return Err(TxKitError::assembly(format!(
                        "fee payer '{}' has no account identity",
                        fee_payer.address
                    )));
                }
                parse_account(account, "fee payer")?
            }
            None => from,
        };

        let decimals = intent.decimals.unwrap_or(chain.default_decimals);
        let contract_id = intent.contract.as_deref().unwrap_or_else(|| default_contract_id(chain));
        let (contract, symbol) = parse_contract_id(chain, contract_id, Some(input))?;
        let contract = parse_account(&contract, "token contract")?;
        let quantity =
            Asset::from_units(intent.amount, decimals, &symbol).map_err(|e| TxKitError::assembly(e.to_string()))?;

        let mut tx = self.new_transaction(input)?;
        self.balance_ram(&mut tx.actions, from, sponsor, input)?;

        let shown_quantity = quantity.to_string();
        let mut transfer = actions::transfer(contract, from, to, quantity, &intent.memo);
        if sponsor != from {
            // Co-signer authorization must come first
            transfer.authorization.insert(0, PermissionLevel::active(sponsor));
        }
        tx.actions.push(transfer);

        let mut signers = vec![SignerId::new(&intent.from)];
        if let Some(fee_payer) = &intent.fee_payer {
            signers.push(SignerId::new(&fee_payer.address));
        }

        log_debug!(
            "tx::builder",
            "Assembled transfer",
            from = from,
            to = to,
            quantity = shown_quantity,
            actions = tx.actions.len()
        );
        Ok(self.finish(tx, signers, input))
    }

    fn staking_account(&self, account: Option<&str>, input: &TxInput) -> TxKitResult<Name> {
        parse_account(account.unwrap_or(input.from_account.as_str()), "staking")
    }

    pub fn stake(&self, intent: &StakeIntent, input: &TxInput) -> TxKitResult<BuiltTransaction> {
        let resource: StakeResource = intent.validator.parse()?;
        let account = self.staking_account(intent.account.as_deref(), input)?;
        let amount = self.native_asset(intent.amount)?;
        let zero = self.native_asset(0)?;

        let (net, cpu) = match resource {
            StakeResource::Cpu => (zero, amount),
            StakeResource::Net => (amount, zero),
        };

        let mut tx = self.new_transaction(input)?;
        self.balance_ram(&mut tx.actions, account, account, input)?;
        tx.actions
            .push(actions::delegate_bw(self.system_contract()?, account, account, net, cpu));

        log_debug!("tx::builder", "Assembled stake", account = account, validator = intent.validator);
        Ok(self.finish(tx, vec![SignerId::new(&intent.from)], input))
    }

    pub fn unstake(&self, intent: &StakeIntent, input: &TxInput) -> TxKitResult<BuiltTransaction> {
        let resource: StakeResource = intent.validator.parse()?;
        let account = self.staking_account(intent.account.as_deref(), input)?;
        let amount = self.native_asset(intent.amount)?;
        let zero = self.native_asset(0)?;

        let (net, cpu) = match resource {
            StakeResource::Cpu => (zero, amount),
            StakeResource::Net => (amount, zero),
        };

        let mut tx = self.new_transaction(input)?;
        self.balance_ram(&mut tx.actions, account, account, input)?;
        tx.actions
            .push(actions::undelegate_bw(self.system_contract()?, account, account, net, cpu));

        log_debug!("tx::builder", "Assembled unstake", account = account, validator = intent.validator);
        Ok(self.finish(tx, vec![SignerId::new(&intent.from)], input))
    }

    /// Run the canonical-signature search with the configured attempt cap
    pub fn sign<S: Signer + ?Sized>(&self, built: BuiltTransaction, signer: &S) -> TxKitResult<PackedTransaction> {
        sign_transaction(built, signer, &self.config.signing)
    }

    pub fn withdraw(&self, intent: &WithdrawIntent, input: &TxInput) -> TxKitResult<BuiltTransaction> {
        let account = self.staking_account(intent.account.as_deref(), input)?;

        let mut tx = self.new_transaction(input)?;
        tx.actions.push(actions::refund(self.system_contract()?, account));

        log_debug!("tx::builder", "Assembled refund", account = account);
        Ok(self.finish(tx, vec![SignerId::new(&intent.from)], input))
    }
}
