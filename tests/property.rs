use std::collections::{BTreeMap, HashMap};

use eos_txkit::codec::{self, Asset, Name, Varuint32};
use eos_txkit::signing::{SignatureCanonicalizer, RAW_SIGNATURE_LEN};
use proptest::prelude::*;

fn any_asset() -> impl Strategy<Value = Asset> {
    (any::<i64>(), 0u8..=18, "[A-Z]{1,7}").prop_map(|(amount, precision, code)| {
        let mut asset = Asset::from_units(0, precision, &code).expect("valid symbol");
        asset.amount = amount;
        asset
    })
}

proptest! {
    #[test]
    fn varuint32_roundtrips(value in any::<u32>()) {
        let bytes = codec::to_bytes(&Varuint32(value)).unwrap();
        prop_assert!(bytes.len() <= 5);
        // Only the last byte lacks the continuation bit
        prop_assert!(bytes[..bytes.len() - 1].iter().all(|b| b & 0x80 != 0));
        prop_assert_eq!(bytes[bytes.len() - 1] & 0x80, 0);

        let back: Varuint32 = codec::from_bytes(&bytes).unwrap();
        prop_assert_eq!(back.0, value);
    }

    #[test]
    fn names_roundtrip_through_text_and_wire(text in "[a-z1-5]{1,12}") {
        let name: Name = text.parse().unwrap();
        prop_assert_eq!(name.to_string(), text);

        let bytes = codec::to_bytes(&name).unwrap();
        prop_assert_eq!(bytes.len(), 8);
        let back: Name = codec::from_bytes(&bytes).unwrap();
        prop_assert_eq!(back, name);
    }

    #[test]
    fn assets_pack_to_sixteen_bytes(asset in any_asset()) {
        let bytes = codec::to_bytes(&asset).unwrap();
        prop_assert_eq!(bytes.len(), 16);
        prop_assert_eq!(&bytes[..8], &asset.amount.to_le_bytes()[..]);
        prop_assert_eq!(bytes[8], asset.symbol.precision);

        let back: Asset = codec::from_bytes(&bytes).unwrap();
        prop_assert_eq!(back, asset);
    }

    #[test]
    fn map_packing_is_order_independent(entries in prop::collection::vec(("[a-z]{0,6}", any::<u32>()), 0..24)) {
        let hashed: HashMap<String, u32> = entries.iter().cloned().collect();
        let sorted: BTreeMap<String, u32> = hashed.iter().map(|(k, v)| (k.clone(), *v)).collect();

        let first = codec::to_bytes(&hashed).unwrap();
        prop_assert_eq!(&first, &codec::to_bytes(&sorted).unwrap());
        prop_assert_eq!(first, codec::to_bytes(&hashed).unwrap());
    }

    #[test]
    fn relocation_keeps_r_and_s(raw in prop::collection::vec(any::<u8>(), RAW_SIGNATURE_LEN)) {
        let relocated = SignatureCanonicalizer::relocate_recovery_byte(&raw).unwrap();
        prop_assert_eq!(&relocated[1..], &raw[..64]);
        if raw[64] <= 1 {
            prop_assert_eq!(relocated[0], raw[64] + 27);
        } else {
            prop_assert_eq!(relocated[0], raw[64]);
        }
    }

    #[test]
    fn canonical_forms_have_clear_high_bits(raw in prop::collection::vec(any::<u8>(), RAW_SIGNATURE_LEN)) {
        let relocated = SignatureCanonicalizer::relocate_recovery_byte(&raw).unwrap();
        if let Some(canonical) = SignatureCanonicalizer::canonicalize(&relocated) {
            let bytes = canonical.as_bytes();
            prop_assert_eq!(bytes[1] & 0x80, 0);
            prop_assert_eq!(bytes[33] & 0x80, 0);
            prop_assert!(bytes[1] != 0 || bytes[2] & 0x80 != 0);
            prop_assert!(bytes[33] != 0 || bytes[34] & 0x80 != 0);
        }
    }
}
