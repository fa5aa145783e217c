//! Property test for the `derive` → `payloads` → `combine` → `parse`
//! round trip, randomizing the spend amount, replay block, and signing
//! key rather than the whole operation shape.

use proptest::prelude::*;

use rosetta_zen_chain::model::{
    AccountIdentifier, CoinAction, CoinChange, CoinIdentifier, Operation, OperationMetadata, OperationStatus, OperationType,
};
use rosetta_zen_chain::{Amount, Hash, Network};
use rosetta_zen_rpc::types::ScriptPubKey;

use crate::combine::{combine, InputSignature};
use crate::derive::derive_address;
use crate::metadata::ConstructionMetadata;
use crate::parse::{parse_signed, parse_unsigned};
use crate::payloads::build_payloads;
use crate::replay::base_lock_script;

fn secret_key_strategy() -> impl Strategy<Value = [u8; 32]> {
    any::<[u8; 32]>().prop_filter("must be a valid secp256k1 scalar", |bytes| secp256k1::SecretKey::from_slice(bytes).is_ok())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn derive_payloads_combine_parse_round_trips(
        source_key in secret_key_strategy(),
        dest_key in secret_key_strategy(),
        spend_amount in 10_000i64..1_000_000_000,
        fee in 0i64..10_000,
        replay_height in 0i64..2_000_000,
        replay_hash_bytes in any::<[u8; 32]>(),
        txid_bytes in any::<[u8; 32]>(),
        vout in 0u32..8,
    ) {
        let secp = secp256k1::Secp256k1::new();
        let source_sk = secp256k1::SecretKey::from_slice(&source_key).unwrap();
        let source_pk = secp256k1::PublicKey::from_secret_key(&secp, &source_sk);
        let dest_sk = secp256k1::SecretKey::from_slice(&dest_key).unwrap();
        let dest_pk = secp256k1::PublicKey::from_secret_key(&secp, &dest_sk);

        let network = Network::Testnet;
        let source_address = derive_address(network, &source_pk.serialize()).unwrap();
        let dest_address = derive_address(network, &dest_pk.serialize()).unwrap();

        let txid = Hash::from_bytes(txid_bytes);
        let replay_hash = Hash::from_bytes(replay_hash_bytes);

        let input_op = Operation {
            operation_index: 0,
            network_index: Some(0),
            operation_type: OperationType::Input,
            status: OperationStatus::Success,
            account: Some(AccountIdentifier::new(source_address.to_string())),
            amount: Some(Amount(-spend_amount)),
            coin_change: Some(CoinChange { action: CoinAction::Spent, coin_identifier: CoinIdentifier::new(txid, vout) }),
            metadata: OperationMetadata::default(),
        };
        let output_op = Operation {
            operation_index: 1,
            network_index: Some(0),
            operation_type: OperationType::Output,
            status: OperationStatus::Success,
            account: Some(AccountIdentifier::new(dest_address.to_string())),
            amount: Some(Amount(spend_amount - fee)),
            coin_change: None,
            metadata: OperationMetadata::default(),
        };

        let source_lock_script = base_lock_script(&source_address);
        let script_pub_key = ScriptPubKey {
            asm: String::new(),
            hex: hex::encode(&source_lock_script.0),
            req_sigs: Some(1),
            kind: "pubkeyhash".to_string(),
            addresses: vec![source_address.to_string()],
        };
        let metadata = ConstructionMetadata {
            script_pub_keys: vec![script_pub_key],
            replay_block_height: replay_height,
            replay_block_hash: replay_hash.to_string(),
        };

        let (unsigned, payloads) = build_payloads(network, &[input_op.clone(), output_op.clone()], &metadata).unwrap();
        prop_assert_eq!(payloads.len(), 1);

        let message = secp256k1::Message::from_slice(&payloads[0].bytes).unwrap();
        let signature = secp.sign(&message, &source_sk).serialize_compact();
        let public_key = source_pk.serialize();
        let signatures = vec![InputSignature { signature: &signature, public_key: &public_key }];
        let signed = combine(&unsigned, &signatures).unwrap();

        let from_unsigned = parse_unsigned(network, &unsigned).unwrap();
        let from_signed = parse_signed(network, &signed).unwrap();

        prop_assert_eq!(from_unsigned.operations.len(), 2);
        prop_assert_eq!(from_signed.operations.len(), 2);
        prop_assert_eq!(from_signed.signer_addresses, vec![source_address.to_string()]);

        let recovered_output_amount = from_signed.operations[1].amount.unwrap().0;
        prop_assert_eq!(recovered_output_amount, spend_amount - fee);
        let recovered_input_amount: i64 = unsigned.input_amounts[0].parse().unwrap();
        prop_assert_eq!(recovered_input_amount, -spend_amount);
    }
}
