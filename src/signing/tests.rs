//! Session and round tests for the signing module

#[cfg(test)]
mod session_tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use crate::codec::TimePointSec;
    use crate::error::{ErrorCode, TxKitError, TxKitResult};
    use crate::signing::*;
    use crate::tx::{BuiltTransaction, FeePayer, TransactionAssembler, TransferIntent, TxInput};
    use crate::utils::config::{SigningSettings, TxKitConfig};

    const CHAIN_ID: [u8; 7] = [1, 2, 3, 4, 6, 7, 8];
    const KEY_A: &str = "0101010101010101010101010101010101010101010101010101010101010101";
    const KEY_B: &str = "0202020202020202020202020202020202020202020202020202020202020202";

    fn canonical_raw() -> Vec<u8> {
        let mut raw = vec![0x11u8; 65];
        raw[64] = 0;
        raw
    }

    fn non_canonical_raw() -> Vec<u8> {
        let mut raw = vec![0x11u8; 65];
        raw[0] = 0x80;
        raw[64] = 1;
        raw
    }

    /// Returns non-canonical signatures for each signer's first `bad` calls
    struct ScriptedSigner {
        bad: HashMap<SignerId, u32>,
        calls: RefCell<HashMap<SignerId, u32>>,
        digests: RefCell<Vec<[u8; 32]>>,
    }

    impl ScriptedSigner {
        fn new(bad: &[(&str, u32)]) -> Self {
            Self {
                bad: bad.iter().map(|(id, n)| (SignerId::new(*id), *n)).collect(),
                calls: RefCell::new(HashMap::new()),
                digests: RefCell::new(Vec::new()),
            }
        }

        fn calls(&self, id: &str) -> u32 {
            self.calls.borrow().get(&SignerId::new(id)).copied().unwrap_or(0)
        }
    }

    impl Signer for ScriptedSigner {
        fn sign(&self, digest: &[u8; 32], signer: &SignerId) -> TxKitResult<Vec<u8>> {
            self.digests.borrow_mut().push(*digest);
            let mut calls = self.calls.borrow_mut();
            let count = calls.entry(signer.clone()).or_insert(0);
            *count += 1;
            let bad = self.bad.get(signer).copied().unwrap_or(0);
            if *count <= bad {
                Ok(non_canonical_raw())
            } else {
                Ok(canonical_raw())
            }
        }
    }

    fn input() -> TxInput {
        let mut input = TxInput::new(1_700_000_000, vec![0u8; 32], "aaaaaaaaaaa1");
        input.chain_id = CHAIN_ID.to_vec().into();
        input.available_ram = 2000;
        input.target_ram = 2000;
        input
    }

    fn built(fee_payer: bool) -> BuiltTransaction {
        let mut input = input();
        input.fee_payer_account = "aaaaaaaaaaa3".to_string();
        let intent = TransferIntent {
            from: "addr1".to_string(),
            to: "aaaaaaaaaaa2".to_string(),
            amount: 10_000,
            fee_payer: fee_payer.then(|| FeePayer {
                address: "addr3".to_string(),
                account: None,
            }),
            ..Default::default()
        };
        TransactionAssembler::default().transfer(&intent, &input).unwrap()
    }

    fn settings(max_attempts: u32) -> SigningSettings {
        SigningSettings::default().with_max_attempts(max_attempts)
    }

    #[test]
    fn test_canonical_on_first_attempt() {
        let built = built(false);
        let base = built.transaction.expiration();
        let signer = ScriptedSigner::new(&[]);

        let mut session = SigningSession::new(built, &settings(10)).unwrap();
        assert_eq!(session.state(), SigningState::Unsigned);

        let state = SigningRound::new(&signer).run(&mut session).unwrap();
        assert_eq!(state, SigningState::AllCanonical);
        assert!(session.is_complete());
        assert_eq!(session.attempt(), 0);
        assert_eq!(session.transaction().expiration(), base);

        let packed = session.finalize().unwrap();
        assert_eq!(packed.signatures.len(), 1);
        assert_eq!(packed.signatures[0].content[0], 27);
    }

    #[test]
    fn test_retry_bumps_expiration_and_digest() {
        let built = built(false);
        let base = built.transaction.expiration();
        let signer = ScriptedSigner::new(&[("addr1", 3)]);

        let mut session = SigningSession::new(built, &settings(10)).unwrap();
        let round = SigningRound::new(&signer);

        assert_eq!(round.run(&mut session).unwrap(), SigningState::Retry);
        assert_eq!(session.attempt(), 1);
        assert_eq!(session.transaction().expiration(), TimePointSec(base.0 + 1));

        assert_eq!(round.run(&mut session).unwrap(), SigningState::Retry);
        assert_eq!(session.transaction().expiration(), TimePointSec(base.0 + 2));

        assert_eq!(round.run(&mut session).unwrap(), SigningState::Retry);
        assert_eq!(session.transaction().expiration(), TimePointSec(base.0 + 3));

        assert_eq!(round.run(&mut session).unwrap(), SigningState::AllCanonical);
        assert_eq!(session.attempt(), 3);

        let digests = signer.digests.borrow();
        assert_eq!(digests.len(), 4);
        for pair in digests.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn test_base_expiration_offset_by_attempt() {
        let built = built(false);
        let base = built.transaction.expiration();
        let signer = ScriptedSigner::new(&[("addr1", 4)]);

        let packed = sign_transaction(built, &signer, &settings(10)).unwrap();
        let body = packed.transaction().unwrap();
        // Offsets are taken from the original expiration, not accumulated
        assert_eq!(body.expiration(), base.checked_add_secs(4).unwrap());
    }

    #[test]
    fn test_fee_payer_resigns_after_primary_retry() {
        let built = built(true);
        assert_eq!(built.signers.len(), 2);
        let signer = ScriptedSigner::new(&[("addr1", 1)]);

        let packed = sign_transaction(built, &signer, &settings(10)).unwrap();
        assert_eq!(packed.signatures.len(), 2);
        // Both signers sign every attempt
        assert_eq!(signer.calls("addr1"), 2);
        assert_eq!(signer.calls("addr3"), 2);
    }

    #[test]
    fn test_stale_canonical_signature_does_not_count() {
        let mut session = SigningSession::new(built(true), &settings(10)).unwrap();
        let requests = session.signature_requests().unwrap();
        assert_eq!(requests.len(), 2);

        let state = session
            .add_signatures(vec![
                SignatureResponse::new(SignerId::new("addr1"), non_canonical_raw()),
                SignatureResponse::new(SignerId::new("addr3"), canonical_raw()),
            ])
            .unwrap();
        assert_eq!(state, SigningState::Retry);

        // addr3 is still canonical from attempt 0 but the body has changed
        assert!(!session.coordinator().all_canonical(session.attempt()));
        let requests = session.signature_requests().unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.attempt == 1));

        session
            .add_signatures(vec![SignatureResponse::new(SignerId::new("addr1"), canonical_raw())])
            .unwrap();
        assert!(!session.is_complete());
        assert_eq!(session.state(), SigningState::AwaitingSignatures);

        let state = session
            .add_signatures(vec![SignatureResponse::new(SignerId::new("addr3"), canonical_raw())])
            .unwrap();
        assert_eq!(state, SigningState::AllCanonical);
        assert_eq!(session.coordinator().history(&SignerId::new("addr3")).len(), 2);
    }

    #[test]
    fn test_partial_responses_keep_outstanding_requests() {
        let mut session = SigningSession::new(built(true), &settings(10)).unwrap();
        let first = session.signature_requests().unwrap();

        session
            .add_signatures(vec![SignatureResponse::new(SignerId::new("addr3"), canonical_raw())])
            .unwrap();

        let outstanding = session.signature_requests().unwrap();
        assert_eq!(outstanding.len(), 1);
        assert_eq!(outstanding[0].signer, SignerId::new("addr1"));
        assert_eq!(outstanding[0].digest, first[0].digest);
    }

    #[test]
    fn test_queries_do_not_mutate() {
        let mut session = SigningSession::new(built(false), &settings(10)).unwrap();
        let a = session.signature_requests().unwrap();
        let b = session.signature_requests().unwrap();
        assert_eq!(a, b);

        let before = session.transaction().clone();
        for _ in 0..3 {
            assert!(!session.is_complete());
        }
        assert_eq!(session.transaction(), &before);
        assert_eq!(session.digest().unwrap(), a[0].digest);
    }

    #[test]
    fn test_body_frozen_after_completion() {
        let signer = ScriptedSigner::new(&[("addr1", 2)]);
        let mut session = SigningSession::new(built(false), &settings(10)).unwrap();
        let round = SigningRound::new(&signer);
        while round.run(&mut session).unwrap() != SigningState::AllCanonical {}

        let body = session.transaction().clone();
        let digest = session.digest().unwrap();
        assert!(session.is_complete());
        assert!(session.signature_requests().unwrap().is_empty());
        assert_eq!(round.run(&mut session).unwrap(), SigningState::AllCanonical);
        assert_eq!(session.transaction(), &body);
        assert_eq!(session.digest().unwrap(), digest);
    }

    #[test]
    fn test_search_exhausted() {
        let signer = ScriptedSigner::new(&[("addr1", u32::MAX)]);
        let mut session = SigningSession::new(built(false), &settings(3)).unwrap();
        let round = SigningRound::new(&signer);

        assert_eq!(round.run(&mut session).unwrap(), SigningState::Retry);
        assert_eq!(round.run(&mut session).unwrap(), SigningState::Retry);
        let err = round.run(&mut session).unwrap_err();
        assert_eq!(err.code, ErrorCode::CanonicalSearchExhausted);
        assert_eq!(session.state(), SigningState::Failed);
        assert_eq!(signer.calls("addr1"), 3);

        let err = session.signature_requests().unwrap_err();
        assert_eq!(err.code, ErrorCode::CanonicalSearchExhausted);
        assert!(session.finalize().is_err());
    }

    #[test]
    fn test_signer_error_propagates() {
        let failing = |_: &[u8; 32], _: &SignerId| -> TxKitResult<Vec<u8>> {
            Err(TxKitError::signer("device disconnected"))
        };
        let err = sign_transaction(built(false), &failing, &settings(10)).unwrap_err();
        assert_eq!(err.code, ErrorCode::Signer);
        assert_eq!(err.message, "device disconnected");
    }

    #[test]
    fn test_rejects_bad_responses() {
        let mut session = SigningSession::new(built(false), &settings(10)).unwrap();

        // Nothing has been requested yet
        let err = session
            .add_signatures(vec![SignatureResponse::new(SignerId::new("addr1"), canonical_raw())])
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Signer);

        session.signature_requests().unwrap();
        let err = session
            .add_signatures(vec![SignatureResponse::new(SignerId::new("mallory"), canonical_raw())])
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Signer);

        let err = session
            .add_signatures(vec![SignatureResponse::new(SignerId::new("addr1"), vec![0u8; 64])])
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidSignature);
        assert_eq!(session.state(), SigningState::AwaitingSignatures);
    }

    #[test]
    fn test_finalize_requires_completion() {
        let session = SigningSession::new(built(false), &settings(10)).unwrap();
        let err = session.finalize().unwrap_err();
        assert_eq!(err.code, ErrorCode::Signer);
    }

    #[test]
    fn test_signer_list_validation() {
        let mut dup = built(false);
        dup.signers.push(SignerId::new("addr1"));
        let err = SigningSession::new(dup, &settings(10)).unwrap_err();
        assert_eq!(err.code, ErrorCode::Assembly);

        let mut none = built(false);
        none.signers.clear();
        assert!(SigningSession::new(none, &settings(10)).is_err());

        assert!(SigningSession::new(built(false), &settings(0)).is_err());
    }

    #[test]
    fn test_local_keys_end_to_end() {
        let signer = LocalKeySigner::new()
            .with_key_hex("addr1", KEY_A)
            .unwrap()
            .with_key_hex("addr3", KEY_B)
            .unwrap();

        let packed = sign_transaction(built(true), &signer, &SigningSettings::default()).unwrap();
        assert_eq!(packed.signatures.len(), 2);

        let digest = signing_digest(&CHAIN_ID, packed.packed_trx.as_bytes(), &[]);
        let expected = [SignerId::new("addr1"), SignerId::new("addr3")];
        for (signature, id) in packed.signatures.iter().zip(expected.iter()) {
            let bytes: [u8; RAW_SIGNATURE_LEN] = signature.content.as_slice().try_into().unwrap();
            assert!(SignatureCanonicalizer::is_canonical(&bytes));
            let recovered = recover_public_key(signature, &digest).unwrap();
            assert_eq!(Some(recovered), signer.public_key(id));
        }

        let json = packed.to_json().unwrap();
        assert!(json.contains("SIG_K1_"));
    }

    #[test]
    fn test_assembler_signs_with_configured_cap() {
        let mut config = TxKitConfig::default();
        config.signing.max_attempts = 4;
        let assembler = TransactionAssembler::new(config).unwrap();
        let built = assembler.transfer(&TransferIntent {
            from: "addr1".to_string(),
            to: "aaaaaaaaaaa2".to_string(),
            amount: 1,
            ..Default::default()
        }, &input()).unwrap();

        let signer = ScriptedSigner::new(&[("addr1", u32::MAX)]);
        let err = assembler.sign(built.clone(), &signer).unwrap_err();
        assert_eq!(err.code, ErrorCode::CanonicalSearchExhausted);
        assert_eq!(signer.calls("addr1"), 4);

        let packed = assembler.sign(built, &ScriptedSigner::new(&[("addr1", 3)])).unwrap();
        assert_eq!(packed.signatures.len(), 1);
    }
}
