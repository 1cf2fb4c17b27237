//! Signing rounds
//!
//! Drives a `SigningSession` against a `Signer`: one round asks every
//! outstanding signer for a signature and hands the results back to the
//! session. `sign_transaction` repeats rounds until the session settles.

use crate::error::{TxKitError, TxKitResult};
use crate::tx::{BuiltTransaction, PackedTransaction};
use crate::utils::config::SigningSettings;
use crate::log_warn;

use super::session::{SigningSession, SigningState};
use super::signer::{SignatureResponse, Signer};

/// One attempt of the canonical search
pub struct SigningRound<'a, S: Signer + ?Sized> {
    signer: &'a S,
}

impl<'a, S: Signer + ?Sized> SigningRound<'a, S> {
    pub fn new(signer: &'a S) -> Self {
        Self { signer }
    }

    /// Collect signatures for the session's current attempt
    ///
    /// Signer errors abort the round unchanged; the session stays in
    /// `AwaitingSignatures` and can be resumed or dropped.
    pub fn run(&self, session: &mut SigningSession) -> TxKitResult<SigningState> {
        let requests = session.signature_requests()?;
        if requests.is_empty() {
            return Ok(session.state());
        }

        let mut responses = Vec::with_capacity(requests.len());
        for request in &requests {
            let signature = self.signer.sign(&request.digest, &request.signer).map_err(|e| {
                log_warn!(
                    "signing::round",
                    "Signer failed",
                    signer = request.signer,
                    attempt = request.attempt,
                    error = e
                );
                e
            })?;
            responses.push(SignatureResponse::new(request.signer.clone(), signature));
        }

        session.add_signatures(responses)
    }
}

/// Sign `built` until every signature is canonical
pub fn sign_transaction<S: Signer + ?Sized>(
    built: BuiltTransaction,
    signer: &S,
    settings: &SigningSettings,
) -> TxKitResult<PackedTransaction> {
    let mut session = SigningSession::new(built, settings)?;
    let round = SigningRound::new(signer);

    loop {
        match round.run(&mut session)? {
            SigningState::AllCanonical => break,
            SigningState::Retry => continue,
            state => {
                return Err(TxKitError::internal(format!("signing round ended in state {:?}", state)));
            }
        }
    }

    session.finalize()
}
