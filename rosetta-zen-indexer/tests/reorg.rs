//! Covers spec scenario 2 (reorg of depth 2): sync a short chain A, have
//! the node switch to a competing chain B from height 1 on, and confirm
//! the orchestrator rolls back and resyncs without disturbing the
//! balance at the unaffected height.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

use rosetta_zen_chain::{Hash, Height, Network};
use rosetta_zen_indexer::{Orchestrator, SyncConfig};
use rosetta_zen_rpc::types::{RawBlock, RawTransaction, RawVin, RawVout, ScriptPubKey};
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

fn raw_block(tag: &str, height: i64, parent: Option<Hash>, address: &str, amount: &str) -> RawBlock {
    let parent = parent.map(|h| h.to_string());
    RawBlock {
        hash: hash_at(tag, height).to_string(),
        confirmations: 1,
        size: 100,
        height,
        version: 4,
        merkleroot: hash_at(tag, height).to_string(),
        tx: vec![RawTransaction {
            txid: hash_at(tag, height).to_string(),
            hex: String::new(),
            version: 1,
            size: 100,
            vsize: None,
            locktime: 0,
            vin: vec![RawVin {
                coinbase: Some("00".to_string()),
                txid: None,
                vout: None,
                sequence: 0,
            }],
            vout: vec![RawVout {
                value: amount.parse::<Decimal>().unwrap(),
                n: 0,
                script_pub_key: ScriptPubKey {
                    asm: String::new(),
                    hex: "76a914deadbeef88ac".to_string(),
                    req_sigs: Some(1),
                    kind: "pubkeyhash".to_string(),
                    addresses: vec![address.to_string()],
                },
                backward_transfer: false,
            }],
        }],
        cert: vec![],
        time: 1_600_000_000 + height,
        nonce: "0".to_string(),
        bits: "1d00ffff".to_string(),
        difficulty: 1.0,
        previousblockhash: parent,
        nextblockhash: None,
    }
}

struct FakeClient {
    chain: Mutex<HashMap<i64, RawBlock>>,
}

impl FakeClient {
    fn new(blocks: Vec<RawBlock>) -> FakeClient {
        let chain = blocks.into_iter().map(|b| (b.height, b)).collect();
        FakeClient { chain: Mutex::new(chain) }
    }

    fn set_chain(&self, blocks: Vec<RawBlock>) {
        let mut chain = self.chain.lock().unwrap();
        *chain = blocks.into_iter().map(|b| (b.height, b)).collect();
    }
}

#[async_trait]
impl NodeClient for FakeClient {
    async fn get_best_block(&self) -> Result<Height, RpcError> {
        unimplemented!("not exercised by the sync loop")
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

    async fn get_blockchain_info(&self) -> Result<rosetta_zen_rpc::types::BlockchainInfo, RpcError> {
        unimplemented!("not exercised by the sync loop")
    }

    async fn get_peers(&self) -> Result<Vec<rosetta_zen_rpc::types::PeerInfo>, RpcError> {
        unimplemented!("not exercised by the sync loop")
    }

    async fn get_raw_mempool(&self) -> Result<Vec<Hash>, RpcError> {
        unimplemented!("not exercised by the sync loop")
    }

    async fn suggested_fee_rate(&self, _conf_target: u32) -> Result<f64, RpcError> {
        unimplemented!("not exercised by the sync loop")
    }

    async fn send_raw_transaction(&self, _hex: &str) -> Result<Hash, RpcError> {
        unimplemented!("not exercised by the sync loop")
    }
}

#[tokio::test]
async fn reorg_of_depth_2_rolls_back_and_resyncs() {
    let dir = tempdir::TempDir::new("rosetta-zen-indexer-test").unwrap();
    let config = Config::new(dir.path().to_path_buf());
    let state = State::new(&config, Network::Regtest).unwrap();

    // amounts are expressed in whole coin, scaled ×1e8 to zatoshi by
    // `Amount::from_coin_decimal`; these fractions land on exact small
    // zatoshi counts so the balance assertions below read naturally.
    let chain_a = vec![
        raw_block("a", 0, None, "addr-a", "0.00000010"),
        raw_block("a", 1, Some(hash_at("a", 0)), "addr-a", "0.00000001"),
        raw_block("a", 2, Some(hash_at("a", 1)), "addr-a", "0.00000001"),
    ];
    let client = std::sync::Arc::new(FakeClient::new(chain_a));
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

    wait_for_tip(&state, 2).await;
    assert_eq!(state.balance_at("addr-a", Height(0)).unwrap(), 10);

    let chain_b = vec![
        raw_block("a", 0, None, "addr-a", "0.00000010"),
        raw_block("b", 1, Some(hash_at("a", 0)), "addr-a", "0.00000002"),
        raw_block("b", 2, Some(hash_at("b", 1)), "addr-a", "0.00000003"),
    ];
    client.set_chain(chain_b);

    wait_for_hash(&state, 2, hash_at("b", 2)).await;

    assert_eq!(state.balance_at("addr-a", Height(0)).unwrap(), 10);
    assert_eq!(state.balance_at("addr-a", Height(1)).unwrap(), 12);
    assert_eq!(state.balance_at("addr-a", Height(2)).unwrap(), 15);

    cancel.cancel();
    let _ = handle.await;
}

async fn wait_for_tip(state: &State, height: i64) {
    for _ in 0..200 {
        if let Some(tip) = state.tip().unwrap() {
            if tip.index.value() >= height {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("timed out waiting for tip to reach height {height}");
}

async fn wait_for_hash(state: &State, height: i64, expected: Hash) {
    for _ in 0..400 {
        if let Some(block) = state.get_by_index(Height(height)).unwrap() {
            if block.block_identifier.hash == expected {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("timed out waiting for height {height} to settle on the expected hash");
}
