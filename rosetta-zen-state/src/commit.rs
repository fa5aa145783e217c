use std::collections::HashMap;

use sled::transaction::{TransactionError, Transactional};

use rosetta_zen_chain::model::{Block, BlockIdentifier, CoinAction, CoinIdentifier};
use rosetta_zen_chain::Height;

use crate::coin::CoinRecord;
use crate::error::{Result, StateError};
use crate::keys;
use crate::sled_format::SledTreeExt;
use crate::state::State;

/// Everything the commit (or its inverse, rollback) needs to know about
/// one block's effect on the coin and balance stores, computed up front
/// so the sled transaction itself is a pure set of inserts/removes.
struct BlockEffects {
    coin_creations: Vec<(CoinIdentifier, CoinRecord)>,
    coin_spends: Vec<CoinIdentifier>,
    balance_deltas: HashMap<String, i64>,
}

fn effects_of(block: &Block) -> BlockEffects {
    let mut coin_creations = Vec::new();
    let mut coin_spends = Vec::new();
    let mut balance_deltas: HashMap<String, i64> = HashMap::new();

    for tx in &block.transactions {
        for op in &tx.operations {
            let (Some(account), Some(amount)) = (&op.account, &op.amount) else {
                continue;
            };
            *balance_deltas.entry(account.address.clone()).or_insert(0) += amount.0;

            if let Some(coin_change) = &op.coin_change {
                match coin_change.action {
                    CoinAction::Created => coin_creations.push((
                        coin_change.coin_identifier.clone(),
                        CoinRecord {
                            address: account.address.clone(),
                            amount: amount.0,
                            script_pub_key_hex: op
                                .metadata
                                .script_pub_key_hex
                                .clone()
                                .unwrap_or_default(),
                            spent_at: None,
                        },
                    )),
                    CoinAction::Spent => coin_spends.push(coin_change.coin_identifier.clone()),
                }
            }
        }
    }

    BlockEffects {
        coin_creations,
        coin_spends,
        balance_deltas,
    }
}

impl State {
    pub(crate) fn current_balance(&self, address: &str) -> Result<i64> {
        Ok(self
            .address_balance
            .zs_get("k/address_balance", address.as_bytes())?
            .unwrap_or(0))
    }

    /// Commits a block under the single commit lock (§4.C, §4.F "Commit"):
    /// persists the block, applies coin removals/additions, recomputes
    /// per-address balances, and advances the tip, all in one sled
    /// transaction. Validates I1 (spent coins must exist and be unspent)
    /// and I3 (strictly contiguous heights) before touching the database.
    pub async fn commit_finalized(&self, block: Block) -> Result<BlockIdentifier> {
        let _guard = self.commit_lock.lock().await;

        let current_tip = self.tip()?;
        let expected_height = current_tip.map(|t| t.index.next()).unwrap_or(Height(0));
        if block.block_identifier.index != expected_height {
            return Err(StateError::NonContiguous {
                tip: current_tip.map(|t| t.index.value()),
                attempted: block.block_identifier.index.value(),
            });
        }

        let effects = effects_of(&block);

        for coin_id in &effects.coin_spends {
            let record = self
                .coin_record(coin_id)?
                .ok_or_else(|| StateError::SpentCoinMissing(coin_id.clone()))?;
            if record.is_spent() {
                return Err(StateError::SpentCoinMissing(coin_id.clone()));
            }
        }
        for (coin_id, _) in &effects.coin_creations {
            if self.coin_record(coin_id)?.is_some() {
                return Err(StateError::CoinAlreadyExists(coin_id.clone()));
            }
        }

        let mut new_balances = HashMap::new();
        for (address, delta) in &effects.balance_deltas {
            new_balances.insert(address.clone(), self.current_balance(address)? + delta);
        }

        let block_identifier = block.block_identifier;
        let height_bytes = keys::height_key(block_identifier.index);
        let hash_bytes = block_identifier.hash.0;
        let block_value = bincode::serialize(&block)
            .map_err(|source| StateError::Encoding { tree: "b/block_by_height", source })?;
        let height_value = bincode::serialize(&block_identifier.index)
            .map_err(|source| StateError::Encoding { tree: "h/hash_to_height", source })?;
        let tip_value = bincode::serialize(&block_identifier)
            .map_err(|source| StateError::Encoding { tree: "meta", source })?;

        let trees = (
            &self.block_by_height,
            &self.hash_to_height,
            &self.coin_by_id,
            &self.coin_by_address,
            &self.balance_points,
            &self.address_balance,
            &self.meta,
        );

        trees
            .transaction(|(blocks, hash_idx, coin_by_id, coin_by_addr, balance_points, address_balance, meta)| {
                blocks.insert(height_bytes.as_ref(), block_value.clone())?;
                hash_idx.insert(hash_bytes.as_ref(), height_value.clone())?;

                for coin_id in &effects.coin_spends {
                    let key = keys::coin_id_key(coin_id);
                    if let Some(existing) = coin_by_id.get(key.as_slice())? {
                        if let Ok(mut record) = bincode::deserialize::<CoinRecord>(&existing) {
                            record.spent_at = Some(block_identifier.index.value());
                            if let Ok(bytes) = bincode::serialize(&record) {
                                coin_by_id.insert(key.as_slice(), bytes)?;
                            }
                        }
                    }
                }
                for (coin_id, record) in &effects.coin_creations {
                    let key = keys::coin_id_key(coin_id);
                    let bytes = bincode::serialize(record).expect("record encodes");
                    coin_by_id.insert(key.as_slice(), bytes)?;
                    let index_key = keys::coin_by_address_key(&record.address, coin_id);
                    coin_by_addr.insert(index_key, keys::coin_id_key(coin_id))?;
                }

                for (address, balance) in &new_balances {
                    let point_key = keys::balance_point_key(address, block_identifier.index);
                    let bytes = bincode::serialize(balance).expect("i64 always encodes");
                    balance_points.insert(point_key, bytes.clone())?;
                    address_balance.insert(address.as_bytes(), bytes)?;
                }

                meta.insert(b"tip".as_ref(), tip_value.clone())?;

                Ok(())
            })
            .map_err(|err: TransactionError<()>| match err {
                TransactionError::Abort(()) => StateError::Encoding {
                    tree: "c/coin_by_id",
                    source: bincode::Error::from(bincode::ErrorKind::Custom(
                        "corrupt coin record during commit".into(),
                    )),
                },
                TransactionError::Storage(e) => StateError::Io(e),
            })?;

        let _ = self.tip_tx.send(Some(block_identifier));
        metrics::counter!("state.committed.block.count", 1);
        metrics::gauge!("state.committed.block.height", block_identifier.index.value() as f64);
        tracing::debug!(height = block_identifier.index.value(), "committed block");

        Ok(block_identifier)
    }

    /// Rolls back the current tip (§4.F reorg protocol step 2): removes
    /// the block record, un-tombstones the coins it spent, deletes the
    /// coins it created, and restores the previous balance points — all
    /// in one transaction so a crash mid-rollback leaves the store in
    /// either the pre- or post-rollback state for this height.
    pub async fn rollback_tip(&self) -> Result<Block> {
        let _guard = self.commit_lock.lock().await;

        let tip = self.tip()?.ok_or(StateError::NoTipToDelete)?;
        let block = self
            .get_by_index(tip.index)?
            .ok_or(StateError::NoTipToDelete)?;
        let effects = effects_of(&block);

        let mut restored_balances = HashMap::new();
        let mut addresses: Vec<&String> = effects.balance_deltas.keys().collect();
        addresses.sort();
        addresses.dedup();
        for address in addresses {
            let previous_height = tip.index.previous();
            let balance = match previous_height {
                Some(h) => self.balance_at(address, h)?,
                None => 0,
            };
            restored_balances.insert(address.clone(), balance);
        }

        let new_tip = tip.index.previous().and_then(|h| {
            self.get_by_index(h)
                .ok()
                .flatten()
                .map(|b| b.block_identifier)
        });
        let height_bytes = keys::height_key(tip.index);
        let hash_bytes = tip.hash.0;
        let new_tip_value = new_tip
            .map(|id| bincode::serialize(&id))
            .transpose()
            .map_err(|source| StateError::Encoding { tree: "meta", source })?;

        let trees = (
            &self.block_by_height,
            &self.hash_to_height,
            &self.coin_by_id,
            &self.coin_by_address,
            &self.balance_points,
            &self.address_balance,
            &self.meta,
        );

        trees
            .transaction(|(blocks, hash_idx, coin_by_id, _coin_by_addr, balance_points, address_balance, meta)| {
                blocks.remove(height_bytes.as_ref())?;
                hash_idx.remove(hash_bytes.as_ref())?;

                for (coin_id, _) in &effects.coin_creations {
                    coin_by_id.remove(keys::coin_id_key(coin_id).as_slice())?;
                    // the address index entry is left in place and filtered by
                    // `coins_of` on lookup, which tolerates a dangling coin id.
                }
                for coin_id in &effects.coin_spends {
                    let key = keys::coin_id_key(coin_id);
                    if let Some(existing) = coin_by_id.get(key.as_slice())? {
                        if let Ok(mut record) = bincode::deserialize::<CoinRecord>(&existing) {
                            record.spent_at = None;
                            if let Ok(bytes) = bincode::serialize(&record) {
                                coin_by_id.insert(key.as_slice(), bytes)?;
                            }
                        }
                    }
                }

                for (address, balance) in &restored_balances {
                    let point_key = keys::balance_point_key(address, tip.index);
                    balance_points.remove(point_key)?;
                    let bytes = bincode::serialize(balance).expect("i64 always encodes");
                    address_balance.insert(address.as_bytes(), bytes)?;
                }

                match &new_tip_value {
                    Some(bytes) => meta.insert(b"tip".as_ref(), bytes.clone())?,
                    None => meta.remove(b"tip".as_ref())?,
                };

                Ok(())
            })
            .map_err(|err: TransactionError<()>| match err {
                TransactionError::Abort(()) => StateError::NoTipToDelete,
                TransactionError::Storage(e) => StateError::Io(e),
            })?;

        let _ = self.tip_tx.send(new_tip);
        tracing::warn!(height = tip.index.value(), "rolled back block");

        Ok((*block).clone())
    }
}
