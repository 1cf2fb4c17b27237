//! Canonical signature search
//!
//! A `SigningSession` owns one transaction while its signers search for a
//! set of canonical signatures:
//!
//! ```text
//! Unsigned -> AwaitingSignatures -> Testing -> AllCanonical
//!                  ^                   |
//!                  +------ Retry <-----+-----> Failed
//! ```
//!
//! Each retry bumps the expiration by the attempt number, which changes the
//! digest without changing what the transaction does. The transaction is
//! complete only when every signer's latest signature is canonical and was
//! made during the current attempt.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::codec::{Signature, TimePointSec};
use crate::error::{TxKitError, TxKitResult};
use crate::tx::{BuiltTransaction, PackedTransaction, Transaction};
use crate::utils::config::SigningSettings;
use crate::{log_debug, log_error};

use super::canonical::{CanonicalSignature, SignatureCanonicalizer, RAW_SIGNATURE_LEN};
use super::digest::signing_digest;
use super::signer::{SignatureRequest, SignatureResponse, SignerId};

/// Where a session is in the search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningState {
    Unsigned,
    AwaitingSignatures,
    Testing,
    Retry,
    AllCanonical,
    Failed,
}

impl SigningState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SigningState::AllCanonical | SigningState::Failed)
    }
}

/// One signature as received, recovery byte already moved to the front
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRecord {
    pub attempt: u32,
    pub signature: [u8; RAW_SIGNATURE_LEN],
}

impl SignatureRecord {
    pub fn is_canonical(&self) -> bool {
        SignatureCanonicalizer::is_canonical(&self.signature)
    }
}

/// Tracks every required signer's signature history
///
/// Histories are append-only; only the latest entry of each signer counts.
#[derive(Debug, Clone)]
pub struct MultiSignerCoordinator {
    signers: Vec<SignerId>,
    history: HashMap<SignerId, Vec<SignatureRecord>>,
}

impl MultiSignerCoordinator {
    pub fn new(signers: Vec<SignerId>) -> TxKitResult<Self> {
        if signers.is_empty() {
            return Err(TxKitError::assembly("a transaction needs at least one signer"));
        }
        let mut history = HashMap::with_capacity(signers.len());
        for signer in &signers {
            if history.insert(signer.clone(), Vec::new()).is_some() {
                return Err(TxKitError::assembly(format!("signer '{}' is listed twice", signer)));
            }
        }
        Ok(Self { signers, history })
    }

    pub fn signers(&self) -> &[SignerId] {
        &self.signers
    }

    pub fn record(&mut self, signer: &SignerId, record: SignatureRecord) -> TxKitResult<()> {
        let history = self
            .history
            .get_mut(signer)
            .ok_or_else(|| TxKitError::signer(format!("unexpected signature from '{}'", signer)))?;
        history.push(record);
        Ok(())
    }

    pub fn history(&self, signer: &SignerId) -> &[SignatureRecord] {
        self.history.get(signer).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn latest(&self, signer: &SignerId) -> Option<&SignatureRecord> {
        self.history(signer).last()
    }

    /// Signers without a signature for `attempt`
    pub fn missing(&self, attempt: u32) -> Vec<SignerId> {
        self.signers
            .iter()
            .filter(|signer| self.latest(signer).map_or(true, |r| r.attempt != attempt))
            .cloned()
            .collect()
    }

    /// Every signer's latest signature is from `attempt` and canonical
    pub fn all_canonical(&self, attempt: u32) -> bool {
        self.signers.iter().all(|signer| {
            self.latest(signer)
                .map_or(false, |r| r.attempt == attempt && r.is_canonical())
        })
    }

    /// Canonical signatures for `attempt`, in signer order
    pub fn canonical_signatures(&self, attempt: u32) -> Option<Vec<CanonicalSignature>> {
        self.signers
            .iter()
            .map(|signer| {
                self.latest(signer)
                    .filter(|r| r.attempt == attempt)
                    .and_then(|r| SignatureCanonicalizer::canonicalize(&r.signature))
            })
            .collect()
    }
}

/// Per-transaction signing state
#[derive(Debug, Clone)]
pub struct SigningSession {
    transaction: Transaction,
    base_expiration: TimePointSec,
    chain_id: Vec<u8>,
    context_free_data: Vec<u8>,
    coordinator: MultiSignerCoordinator,
    state: SigningState,
    attempt: u32,
    max_attempts: u32,
}

impl SigningSession {
    pub fn new(built: BuiltTransaction, settings: &SigningSettings) -> TxKitResult<Self> {
        settings.validate()?;
        let coordinator = MultiSignerCoordinator::new(built.signers)?;
        Ok(Self {
            base_expiration: built.transaction.expiration(),
            transaction: built.transaction,
            chain_id: built.chain_id.0,
            context_free_data: built.context_free_data,
            coordinator,
            state: SigningState::Unsigned,
            attempt: 0,
            max_attempts: settings.max_attempts,
        })
    }

    pub fn state(&self) -> SigningState {
        self.state
    }

    /// Zero-based attempt counter
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn coordinator(&self) -> &MultiSignerCoordinator {
        &self.coordinator
    }

    /// Digest of the transaction body as it currently stands
    pub fn digest(&self) -> TxKitResult<[u8; 32]> {
        let packed = self.transaction.pack()?;
        Ok(signing_digest(&self.chain_id, &packed, &self.context_free_data))
    }

    /// Requests still outstanding for the current attempt
    ///
    /// Moves `Unsigned`/`Retry` to `AwaitingSignatures`. Asking again while
    /// awaiting returns the same requests; nothing is mutated.
    pub fn signature_requests(&mut self) -> TxKitResult<Vec<SignatureRequest>> {
        match self.state {
            SigningState::AllCanonical => return Ok(Vec::new()),
            SigningState::Failed => return Err(self.exhausted_error()),
            SigningState::Testing => {
                return Err(TxKitError::internal("signature requests asked for while testing"));
            }
            SigningState::Unsigned | SigningState::Retry => {
                self.state = SigningState::AwaitingSignatures;
            }
            SigningState::AwaitingSignatures => {}
        }

        let digest = self.digest()?;
        let requests: Vec<SignatureRequest> = self
            .coordinator
            .missing(self.attempt)
            .into_iter()
            .map(|signer| SignatureRequest {
                digest,
                signer,
                attempt: self.attempt,
            })
            .collect();

        log_debug!(
            "signing::session",
            "Requesting signatures",
            attempt = self.attempt,
            requests = requests.len(),
            digest = hex::encode(digest)
        );
        Ok(requests)
    }

    /// Record signer responses for the current attempt and test them once
    /// every signer has answered.
    pub fn add_signatures(&mut self, responses: Vec<SignatureResponse>) -> TxKitResult<SigningState> {
        if self.state != SigningState::AwaitingSignatures {
            return Err(TxKitError::signer(format!(
                "signatures supplied in state {:?}",
                self.state
            )));
        }

        for response in responses {
            let signature = SignatureCanonicalizer::relocate_recovery_byte(&response.signature)?;
            self.coordinator.record(
                &response.signer,
                SignatureRecord {
                    attempt: self.attempt,
                    signature,
                },
            )?;
        }

        if !self.coordinator.missing(self.attempt).is_empty() {
            return Ok(self.state);
        }

        self.state = SigningState::Testing;
        self.test_signatures()
    }

    fn test_signatures(&mut self) -> TxKitResult<SigningState> {
        if self.coordinator.all_canonical(self.attempt) {
            self.state = SigningState::AllCanonical;
            log_debug!(
                "signing::session",
                "Found canonical signatures",
                attempts = self.attempt + 1,
                signers = self.coordinator.signers().len()
            );
            return Ok(self.state);
        }

        if self.attempt + 1 >= self.max_attempts {
            self.state = SigningState::Failed;
            log_error!(
                "signing::session",
                "Canonical signature search exhausted",
                attempts = self.attempt + 1
            );
            return Err(self.exhausted_error());
        }

        self.attempt += 1;
        let expiration = self
            .base_expiration
            .checked_add_secs(self.attempt)
            .ok_or_else(|| TxKitError::internal("expiration overflow while retrying"))?;
        self.transaction.set_expiration(expiration);
        self.state = SigningState::Retry;

        log_debug!(
            "signing::session",
            "Signature not canonical, retrying",
            attempt = self.attempt,
            expiration = expiration
        );
        Ok(self.state)
    }

    fn exhausted_error(&self) -> TxKitError {
        TxKitError::canonical_search_exhausted("could not find canonical EOS signature")
            .with_details(format!("attempts: {}", self.attempt + 1))
    }

    /// True once every signer holds a canonical signature for this body
    pub fn is_complete(&self) -> bool {
        self.state == SigningState::AllCanonical
    }

    /// Serialize the signed envelope, ending the session
    pub fn finalize(self) -> TxKitResult<PackedTransaction> {
        if !self.is_complete() {
            return Err(TxKitError::signer(format!(
                "transaction is not fully signed (state {:?})",
                self.state
            )));
        }
        let signatures: Vec<Signature> = self
            .coordinator
            .canonical_signatures(self.attempt)
            .ok_or_else(|| TxKitError::internal("canonical signatures missing after completion"))?
            .into_iter()
            .map(CanonicalSignature::into_signature)
            .collect();
        PackedTransaction::new(&self.transaction, signatures, &self.context_free_data)
    }
}
