use rosetta_zen_chain::model::{
    AccountIdentifier, Block, BlockIdentifier, BlockMetadata, CoinAction, CoinChange,
    CoinIdentifier, Operation, OperationMetadata, OperationStatus, OperationType, Transaction,
    TransactionMetadata,
};
use rosetta_zen_chain::{Amount, Hash, Height};
use rosetta_zen_state::{Config, State};

struct Op {
    address: &'static str,
    amount: i64,
    coin_change: Option<(CoinAction, String)>,
}

fn op(address: &'static str, amount: i64, coin_change: Option<(CoinAction, String)>) -> Op {
    Op { address, amount, coin_change }
}

fn block(height: i64, parent: Hash, hash: Hash, ops: Vec<Op>) -> Block {
    let operations = ops
        .into_iter()
        .enumerate()
        .map(|(i, op)| Operation {
            operation_index: i as u64,
            network_index: Some(i as u64),
            operation_type: if op.amount >= 0 { OperationType::Output } else { OperationType::Input },
            status: OperationStatus::Success,
            account: Some(AccountIdentifier::new(op.address)),
            amount: Some(Amount::zatoshi(op.amount)),
            coin_change: op.coin_change.map(|(action, coin_id)| CoinChange {
                action,
                coin_identifier: coin_id.parse::<CoinIdentifier>().unwrap(),
            }),
            metadata: OperationMetadata {
                script_pub_key_hex: Some("76a914deadbeef88ac".to_string()),
            },
        })
        .collect();

    Block {
        block_identifier: BlockIdentifier { hash, index: Height(height) },
        parent_block_identifier: BlockIdentifier { hash: parent, index: Height(height - 1) },
        timestamp_ms: 0,
        metadata: BlockMetadata {
            size: 0,
            version: 4,
            merkle_root: Hash::zero(),
            nonce: "0".into(),
            bits: "1d00ffff".into(),
            difficulty: 1.0,
        },
        transactions: vec![Transaction {
            transaction_identifier: hash,
            operations,
            metadata: TransactionMetadata { size: 0, version: 1, vsize: None, locktime: 0 },
        }],
    }
}

fn hash_at(n: u8) -> Hash {
    let mut bytes = [0u8; 32];
    bytes[0] = n;
    Hash::from_bytes(bytes)
}

fn coin_id_at(n: u8) -> String {
    format!("{}:0", hash_at(n))
}

fn state() -> (tempdir::TempDir, State) {
    let dir = tempdir::TempDir::new("rosetta-zen-state-test").unwrap();
    let config = Config::new(dir.path().to_path_buf());
    let state = State::new(&config, rosetta_zen_chain::Network::Regtest).unwrap();
    (dir, state)
}

#[tokio::test]
async fn historical_balance_reflects_point_in_time() {
    let (_dir, state) = state();

    let b0 = block(
        0,
        Hash::zero(),
        hash_at(1),
        vec![op("addr-a", 10, Some((CoinAction::Created, coin_id_at(1))))],
    );
    state.commit_finalized(b0).await.unwrap();

    for height in 1..100i64 {
        let ops = if height == 20 {
            vec![op("addr-a", -3, Some((CoinAction::Spent, coin_id_at(1))))]
        } else if height == 77 {
            vec![op("addr-a", 1, Some((CoinAction::Created, coin_id_at(height as u8))))]
        } else {
            vec![]
        };
        let b = block(height, hash_at(height as u8), hash_at((height + 1) as u8), ops);
        state.commit_finalized(b).await.unwrap();
    }

    assert_eq!(state.balance_at("addr-a", Height(50)).unwrap(), 7);
    assert_eq!(state.balance_at("addr-a", Height(19)).unwrap(), 10);
    assert_eq!(state.balance_at("addr-a", Height(99)).unwrap(), 8);
}

#[tokio::test]
async fn non_contiguous_commit_is_rejected() {
    let (_dir, state) = state();
    let b0 = block(0, Hash::zero(), hash_at(1), vec![]);
    state.commit_finalized(b0).await.unwrap();

    let skip = block(2, hash_at(1), hash_at(2), vec![]);
    let err = state.commit_finalized(skip).await.unwrap_err();
    assert!(matches!(err, rosetta_zen_state::StateError::NonContiguous { .. }));
}

#[tokio::test]
async fn rollback_restores_spent_coin_and_balance() {
    let (_dir, state) = state();

    let b0 = block(
        0,
        Hash::zero(),
        hash_at(1),
        vec![op("addr-a", 10, Some((CoinAction::Created, coin_id_at(1))))],
    );
    state.commit_finalized(b0).await.unwrap();

    let b1 = block(
        1,
        hash_at(1),
        hash_at(2),
        vec![op("addr-a", -10, Some((CoinAction::Spent, coin_id_at(1))))],
    );
    state.commit_finalized(b1).await.unwrap();
    assert_eq!(state.balance_at("addr-a", Height(1)).unwrap(), 0);
    assert!(state.coins_of("addr-a").unwrap().is_empty());

    state.rollback_tip().await.unwrap();

    assert_eq!(state.balance_at("addr-a", Height(0)).unwrap(), 10);
    assert_eq!(state.coins_of("addr-a").unwrap().len(), 1);
    assert_eq!(state.tip().unwrap().unwrap().index, Height(0));
}
