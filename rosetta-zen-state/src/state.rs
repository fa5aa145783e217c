use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use rosetta_zen_chain::model::{Block, BlockIdentifier, CoinIdentifier};
use rosetta_zen_chain::{Hash, Height, Network};

use crate::coin::Coin;
use crate::config::Config;
use crate::error::{Result, StateError};
use crate::keys;
use crate::sled_format::SledTreeExt;

/// The gateway's persistent state: coin store (§4.C), block store (§4.D),
/// and balance store (§4.E), as one embedded `sled` database.
///
/// Cheap to clone: every field is either a `sled::Tree` (itself an `Arc`
/// handle) or wrapped in one. All mutating operations serialize behind
/// `commit_lock`, which realizes the "single commit lock held by the
/// indexer" requirement (§4.C) directly in the store rather than trusting
/// callers to hold an external lock.
#[derive(Clone)]
pub struct State {
    pub(crate) block_by_height: sled::Tree,
    pub(crate) hash_to_height: sled::Tree,
    pub(crate) coin_by_id: sled::Tree,
    pub(crate) coin_by_address: sled::Tree,
    pub(crate) balance_points: sled::Tree,
    pub(crate) address_balance: sled::Tree,
    pub(crate) meta: sled::Tree,
    pub(crate) commit_lock: Arc<Mutex<()>>,
    pub(crate) tip_tx: Arc<watch::Sender<Option<BlockIdentifier>>>,
}

const TIP_KEY: &[u8] = b"tip";

impl State {
    pub fn new(config: &Config, network: Network) -> Result<State> {
        let db = config.sled_config(network).open()?;
        let meta = db.open_tree(b"meta")?;

        let tip = meta
            .zs_get::<_, BlockIdentifier>("meta", TIP_KEY)?;
        let (tip_tx, _) = watch::channel(tip);

        Ok(State {
            block_by_height: db.open_tree(b"b/block_by_height")?,
            hash_to_height: db.open_tree(b"h/hash_to_height")?,
            coin_by_id: db.open_tree(b"c/coin_by_id")?,
            coin_by_address: db.open_tree(b"c/coin_by_address")?,
            balance_points: db.open_tree(b"k/balance_points")?,
            address_balance: db.open_tree(b"k/address_balance")?,
            meta,
            commit_lock: Arc::new(Mutex::new(())),
            tip_tx: Arc::new(tip_tx),
        })
    }

    pub fn tip(&self) -> Result<Option<BlockIdentifier>> {
        self.meta.zs_get("meta", TIP_KEY)
    }

    /// Subscribes to tip advancement, for `GetBlockLazy`-style waiters.
    pub fn subscribe_tip(&self) -> watch::Receiver<Option<BlockIdentifier>> {
        self.tip_tx.subscribe()
    }

    pub fn get_by_hash(&self, hash: Hash) -> Result<Option<Arc<Block>>> {
        match self.hash_to_height.zs_get::<_, Height>("h/hash_to_height", hash.0.to_vec())? {
            Some(height) => self.get_by_index(height),
            None => Ok(None),
        }
    }

    pub fn get_by_index(&self, height: Height) -> Result<Option<Arc<Block>>> {
        let block: Option<Block> = self
            .block_by_height
            .zs_get("b/block_by_height", keys::height_key(height).to_vec())?;
        Ok(block.map(Arc::new))
    }

    /// `CoinsOf` (§4.C): every unspent coin currently indexed for `address`.
    pub fn coins_of(&self, address: &str) -> Result<Vec<Coin>> {
        let mut coins = Vec::new();
        for entry in self.coin_by_address.scan_prefix(keys::address_prefix(address)) {
            let (_, coin_id_bytes) = entry?;
            let coin_id: CoinIdentifier = std::str::from_utf8(&coin_id_bytes)
                .expect("coin ids are ascii")
                .parse()
                .expect("coin ids stored by this crate always parse");
            if let Some(record) = self.coin_record(&coin_id)? {
                if !record.is_spent() {
                    coins.push(Coin {
                        coin_identifier: coin_id,
                        amount: record.amount,
                        script_pub_key_hex: record.script_pub_key_hex,
                    });
                }
            }
        }
        Ok(coins)
    }

    /// `ScriptPubKeysOf` (§4.C): the script record stored when each coin
    /// was created. Fails with `CoinNotFound` if any is missing — spent
    /// coins remain findable because spending only tombstones them.
    pub fn script_pub_keys_of(&self, coin_ids: &[CoinIdentifier]) -> Result<Vec<String>> {
        coin_ids
            .iter()
            .map(|id| {
                self.coin_record(id)?
                    .map(|record| record.script_pub_key_hex)
                    .ok_or_else(|| StateError::CoinNotFound(id.clone()))
            })
            .collect()
    }

    pub(crate) fn coin_record(&self, coin_id: &CoinIdentifier) -> Result<Option<crate::coin::CoinRecord>> {
        self.coin_by_id.zs_get("c/coin_by_id", keys::coin_id_key(coin_id))
    }

    /// The `(address, amount)` behind a coin, spent or not. Used by the
    /// indexer to resolve inputs that reference an output created in an
    /// already-committed block, outside the normalizer's in-block map.
    pub fn coin_fact(&self, coin_id: &CoinIdentifier) -> Result<Option<(String, i64)>> {
        Ok(self
            .coin_record(coin_id)?
            .map(|record| (record.address, record.amount)))
    }

    /// `BalanceAt` (§4.E): the most recent balance point with
    /// `point.height <= height`.
    pub fn balance_at(&self, address: &str, height: Height) -> Result<i64> {
        let upper = keys::balance_point_key(address, height);
        let prefix = keys::address_prefix(address);
        let found = self
            .balance_points
            .range(prefix..=upper)
            .next_back()
            .transpose()?;
        match found {
            Some((_, value)) => {
                let balance: i64 = bincode::deserialize(&value).map_err(|source| {
                    StateError::Encoding { tree: "k/balance_points", source }
                })?;
                Ok(balance)
            }
            None => Ok(0),
        }
    }
}
