//! Covers spec scenario 5 (construction round-trip): derive an address,
//! preprocess/fetch metadata for a real indexed coin, build payloads, sign
//! and combine, then confirm `Parse` recovers the same operations from
//! both the unsigned and signed forms and `Hash`/`Submit` agree on the
//! resulting transaction identifier.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use tokio_util::sync::CancellationToken;

use rosetta_zen_chain::model::{AccountIdentifier, CoinAction, CoinChange, Operation, OperationStatus, OperationType};
use rosetta_zen_chain::transparent::Address;
use rosetta_zen_chain::{Amount, Hash, Height, Network};
use rosetta_zen_construction::{build_payloads, combine, derive_address, fetch_metadata, preprocess, transaction_hash, FeeConfig, InputSignature};
use rosetta_zen_indexer::Orchestrator;
use rosetta_zen_indexer::SyncConfig;
use rosetta_zen_rpc::types::{BlockchainInfo, PeerInfo, RawBlock, RawTransaction, RawVin, RawVout, ScriptPubKey};
use rosetta_zen_rpc::{NodeClient, RpcError};
use rosetta_zen_state::{Config, State};

fn hash_at(tag: &str, height: i64) -> Hash {
    let mut bytes = [0u8; 32];
    let digest = format!("{tag}{height}");
    for (i, b) in digest.bytes().enumerate().take(32) {
        bytes[i] = b;
    }
    Hash::from_bytes(bytes)
}

struct FakeClient {
    chain: Mutex<HashMap<i64, RawBlock>>,
    submitted: Mutex<Vec<String>>,
}

#[async_trait]
impl NodeClient for FakeClient {
    async fn get_best_block(&self) -> Result<Height, RpcError> {
        Ok(Height(0))
    }

    async fn get_hash_from_index(&self, height: Height) -> Result<Hash, RpcError> {
        self.chain
            .lock()
            .unwrap()
            .get(&height.value())
            .map(|b| b.hash.parse().unwrap())
            .ok_or(RpcError::BlockNotFound)
    }

    async fn get_block(&self, hash: Hash) -> Result<RawBlock, RpcError> {
        self.chain
            .lock()
            .unwrap()
            .values()
            .find(|b| b.hash == hash.to_string())
            .cloned()
            .ok_or(RpcError::BlockNotFound)
    }

    async fn get_blockchain_info(&self) -> Result<BlockchainInfo, RpcError> {
        unimplemented!("not exercised by this test")
    }

    async fn get_peers(&self) -> Result<Vec<PeerInfo>, RpcError> {
        unimplemented!("not exercised by this test")
    }

    async fn get_raw_mempool(&self) -> Result<Vec<Hash>, RpcError> {
        unimplemented!("not exercised by this test")
    }

    async fn suggested_fee_rate(&self, _conf_target: u32) -> Result<f64, RpcError> {
        Ok(2.0)
    }

    async fn send_raw_transaction(&self, hex: &str) -> Result<Hash, RpcError> {
        let tx = rosetta_zen_chain::transparent::Transaction::from_hex(hex).map_err(|_| RpcError::BlockNotFound)?;
        self.submitted.lock().unwrap().push(hex.to_string());
        Ok(tx.hash())
    }
}

fn input_op(index: u64, address: &str, amount: i64, coin_id: &str) -> Operation {
    Operation {
        operation_index: index,
        network_index: Some(0),
        operation_type: OperationType::Input,
        status: OperationStatus::Success,
        account: Some(AccountIdentifier::new(address)),
        amount: Some(Amount(amount)),
        coin_change: Some(CoinChange {
            action: CoinAction::Spent,
            coin_identifier: coin_id.parse().unwrap(),
        }),
        metadata: Default::default(),
    }
}

fn output_op(index: u64, address: &str, amount: i64) -> Operation {
    Operation {
        operation_index: index,
        network_index: Some(0),
        operation_type: OperationType::Output,
        status: OperationStatus::Success,
        account: Some(AccountIdentifier::new(address)),
        amount: Some(Amount(amount)),
        coin_change: None,
        metadata: Default::default(),
    }
}

#[tokio::test]
async fn derive_to_submit_round_trips_through_the_same_operations() {
    let secp = Secp256k1::new();
    let source_sk = SecretKey::from_slice(&[0x11; 32]).unwrap();
    let source_pk = PublicKey::from_secret_key(&secp, &source_sk);
    let source_address = derive_address(Network::Testnet, &source_pk.serialize()).unwrap();

    let dest_sk = SecretKey::from_slice(&[0x22; 32]).unwrap();
    let dest_pk = PublicKey::from_secret_key(&secp, &dest_sk);
    let dest_address = Address::from_public_key(Network::Testnet, &dest_pk);

    let source_lock_script = rosetta_zen_construction::replay::base_lock_script(&source_address);
    let genesis_hash = hash_at("genesis", 0);
    let funding_txid = hash_at("fund", 0);

    let block0 = RawBlock {
        hash: genesis_hash.to_string(),
        confirmations: 1,
        size: 100,
        height: 0,
        version: 4,
        merkleroot: funding_txid.to_string(),
        tx: vec![RawTransaction {
            txid: funding_txid.to_string(),
            hex: String::new(),
            version: 1,
            size: 100,
            vsize: None,
            locktime: 0,
            vin: vec![RawVin { coinbase: Some("00".to_string()), txid: None, vout: None, sequence: 0 }],
            vout: vec![RawVout {
                value: Decimal::new(1_000_000_000, 8),
                n: 0,
                script_pub_key: ScriptPubKey {
                    asm: String::new(),
                    hex: hex::encode(&source_lock_script.0),
                    req_sigs: Some(1),
                    kind: "pubkeyhash".to_string(),
                    addresses: vec![source_address.to_string()],
                },
                backward_transfer: false,
            }],
        }],
        cert: vec![],
        time: 1_700_000_000,
        nonce: "0".to_string(),
        bits: "1d00ffff".to_string(),
        difficulty: 1.0,
        previousblockhash: None,
        nextblockhash: None,
    };

    let mut chain = HashMap::new();
    chain.insert(0, block0);
    let client = std::sync::Arc::new(FakeClient { chain: Mutex::new(chain), submitted: Mutex::new(Vec::new()) });

    let dir = tempdir::TempDir::new("rosetta-zen-construction-test").unwrap();
    let config = Config::new(dir.path().to_path_buf());
    let state = State::new(&config, Network::Testnet).unwrap();

    let orchestrator = std::sync::Arc::new(Orchestrator::new(
        client.clone(),
        state.clone(),
        SyncConfig { window: 4, idle_timeout: Duration::from_millis(200), reorg_search_depth: 100 },
    ));
    let cancel = CancellationToken::new();
    let handle = tokio::spawn({
        let orchestrator = orchestrator.clone();
        let cancel = cancel.clone();
        async move { orchestrator.run(cancel).await }
    });

    for _ in 0..200 {
        if state.tip().unwrap().is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(state.tip().unwrap().is_some(), "indexer never reached height 0");

    let coin_id = format!("{}:0", funding_txid);
    let spend_amount = 1_000_000_000i64;
    let send_amount = 999_000_000i64;

    let ops = vec![
        input_op(0, &source_address.to_string(), -spend_amount, &coin_id),
        output_op(1, &dest_address.to_string(), send_amount),
    ];

    let options = preprocess(&ops, Some(1.0)).unwrap();
    assert_eq!(options.coins.len(), 1);

    let fees = FeeConfig { confirmation_target: 6, min_fee_rate: 1.0, replay_protection_depth: 0 };
    let (metadata, suggested_rate, _replay_height) = fetch_metadata(client.as_ref(), &state, &options, fees).await.unwrap();
    assert_eq!(metadata.replay_block_hash, genesis_hash.to_string());
    assert_eq!(suggested_rate, 2.0);

    let (unsigned, payloads) = build_payloads(Network::Testnet, &ops, &metadata).unwrap();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].address, source_address.to_string());

    let message = Message::from_slice(&payloads[0].bytes).unwrap();
    let signature = secp.sign(&message, &source_sk);
    let signature_bytes = signature.serialize_compact();
    let public_key_bytes = source_pk.serialize();

    let signed = combine(
        &unsigned,
        &[InputSignature { signature: &signature_bytes, public_key: &public_key_bytes }],
    )
    .unwrap();

    let parsed_unsigned = rosetta_zen_construction::parse_unsigned(Network::Testnet, &unsigned).unwrap();
    assert_eq!(parsed_unsigned.operations.len(), 2);
    assert_eq!(parsed_unsigned.operations[0].account.as_ref().unwrap().address, source_address.to_string());
    assert_eq!(parsed_unsigned.operations[0].amount, Some(Amount(-spend_amount)));
    assert_eq!(parsed_unsigned.operations[1].account.as_ref().unwrap().address, dest_address.to_string());
    assert_eq!(parsed_unsigned.operations[1].amount, Some(Amount(send_amount)));

    let parsed_signed = rosetta_zen_construction::parse_signed(Network::Testnet, &signed).unwrap();
    assert_eq!(parsed_signed.signer_addresses, vec![source_address.to_string()]);
    assert_eq!(parsed_signed.operations[0].amount, Some(Amount(-spend_amount)));
    assert_eq!(parsed_signed.operations[1].amount, Some(Amount(send_amount)));

    let hash = transaction_hash(&signed).unwrap();
    let submitted_hash = rosetta_zen_construction::submit(client.as_ref(), &signed).await.unwrap();
    assert_eq!(hash, submitted_hash);

    cancel.cancel();
    let _ = handle.await;
}
