use std::cell::RefCell;

use eos_txkit::signing::{SignatureCanonicalizer, SigningRound, SigningSession, SigningState, RAW_SIGNATURE_LEN};
use eos_txkit::{
    sign_transaction, ErrorCode, FeePayer, LocalKeySigner, SignerId, SigningSettings, TransactionAssembler,
    TransferIntent, TxInput, TxKitResult,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn input() -> TxInput {
    let mut input = TxInput::new(1_700_000_000, vec![0u8; 32], "aaaaaaaaaaa1");
    input.chain_id = vec![1, 2, 3, 4, 6, 7, 8].into();
    input.fee_payer_account = "aaaaaaaaaaa3".to_string();
    input.available_ram = 2000;
    input.target_ram = 2000;
    input
}

fn fee_payer_transfer(amount: u64) -> TransferIntent {
    TransferIntent {
        from: "addr1".to_string(),
        to: "aaaaaaaaaaa2".to_string(),
        amount,
        fee_payer: Some(FeePayer {
            address: "addr3".to_string(),
            account: None,
        }),
        ..Default::default()
    }
}

#[test]
fn two_signer_sessions_reach_canonical_form() {
    let assembler = TransactionAssembler::default();
    let settings = SigningSettings::default().with_max_attempts(250);
    let rng = RefCell::new(StdRng::seed_from_u64(0x5eed));
    let random_signer = |_: &[u8; 32], _: &SignerId| -> TxKitResult<Vec<u8>> {
        let mut raw = vec![0u8; RAW_SIGNATURE_LEN];
        let mut rng = rng.borrow_mut();
        rng.fill(&mut raw[..64]);
        raw[64] = rng.gen_range(0..=1);
        Ok(raw)
    };

    let sessions = 10_000;
    let mut completed = 0;
    let mut attempts: Vec<u32> = Vec::with_capacity(sessions as usize);
    for i in 0..sessions {
        let built = assembler.transfer(&fee_payer_transfer(i + 1), &input()).unwrap();
        let mut session = SigningSession::new(built, &settings).unwrap();
        let round = SigningRound::new(&random_signer);

        let finished = loop {
            match round.run(&mut session) {
                Ok(SigningState::AllCanonical) => break true,
                Ok(SigningState::Retry) => continue,
                Ok(other) => panic!("unexpected state {:?}", other),
                Err(err) => {
                    assert_eq!(err.code, ErrorCode::CanonicalSearchExhausted);
                    break false;
                }
            }
        };
        if !finished {
            continue;
        }
        completed += 1;
        attempts.push(session.attempt() + 1);

        let body = session.transaction().clone();
        assert!(session.is_complete());
        assert!(session.signature_requests().unwrap().is_empty());
        assert_eq!(session.transaction(), &body);

        let packed = session.finalize().unwrap();
        assert_eq!(packed.signatures.len(), 2);
        for signature in &packed.signatures {
            let bytes: [u8; RAW_SIGNATURE_LEN] = signature.content.as_slice().try_into().unwrap();
            assert!(SignatureCanonicalizer::is_canonical(&bytes));
        }
        assert_eq!(packed.transaction().unwrap(), body);
    }

    assert!(completed >= 9_990, "only {} of {} sessions completed", completed, sessions);

    // About 1 in 16 rounds is canonical for both signers
    let mean = attempts.iter().map(|&a| a as f64).sum::<f64>() / attempts.len() as f64;
    let max = attempts.iter().copied().max().unwrap_or(0);
    assert!(mean < 25.0, "mean attempts {:.1} is too high", mean);
    assert!(max < 225, "slowest session took {} attempts", max);
}

#[test]
fn local_keys_sign_fee_payer_transfer() {
    let signer = LocalKeySigner::new()
        .with_key_hex("addr1", &"11".repeat(32))
        .unwrap()
        .with_key_hex("addr3", &"33".repeat(32))
        .unwrap();
    let built = TransactionAssembler::default()
        .transfer(&fee_payer_transfer(10_000), &input())
        .unwrap();

    let packed = sign_transaction(built, &signer, &SigningSettings::default()).unwrap();
    let json = packed.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let signatures = value["signatures"].as_array().unwrap();
    assert_eq!(signatures.len(), 2);
    assert!(signatures.iter().all(|s| s.as_str().unwrap().starts_with("SIG_K1_")));
    assert_eq!(value["compression"], "none");
}
