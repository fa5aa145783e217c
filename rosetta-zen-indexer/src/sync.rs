//! Sync orchestrator (§4.F): a bounded window of concurrent prefetch
//! fetches feeds a single committer, with a reorg protocol triggered
//! whenever a fetched block's parent no longer matches the committed tip.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use tokio_util::sync::CancellationToken;

use rosetta_zen_chain::model::{Block, CoinAction, CoinIdentifier};
use rosetta_zen_chain::{Hash, Height};
use rosetta_zen_rpc::types::RawBlock;
use rosetta_zen_rpc::{NodeClient, RpcError};
use rosetta_zen_state::State;

use crate::error::IndexerError;
use crate::normalize::{normalize_block, referenced_inputs};

/// Tunables named in §6's config surface: `sync-window`, the liveness
/// watchdog's `T_idle`, and how far back a reorg search is allowed to walk
/// before giving up (a node that reports a fork deeper than this has a
/// problem beyond what an automatic rollback should attempt to fix).
#[derive(Clone, Copy, Debug)]
pub struct SyncConfig {
    pub window: usize,
    pub idle_timeout: Duration,
    pub reorg_search_depth: i64,
}

impl Default for SyncConfig {
    fn default() -> SyncConfig {
        SyncConfig {
            window: 8,
            idle_timeout: Duration::from_secs(30),
            reorg_search_depth: 2_000,
        }
    }
}

/// Owns the tip: the single caller driving `run` is the only writer the
/// store ever sees, satisfying the "single commit lock held by the
/// indexer" contract (§4.C) — `State` itself also serializes commits, so
/// this isn't relied on for correctness, only for avoiding wasted fetches
/// from two orchestrators racing the same node.
pub struct Orchestrator<C: NodeClient> {
    client: Arc<C>,
    state: State,
    config: SyncConfig,
}

impl<C: NodeClient + 'static> Orchestrator<C> {
    pub fn new(client: Arc<C>, state: State, config: SyncConfig) -> Orchestrator<C> {
        Orchestrator { client, state, config }
    }

    /// Runs until `cancel` fires. Per §5 "Cancellation": a fetch in
    /// flight is abandoned, but a commit already under way always
    /// finishes before the loop exits.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), IndexerError> {
        let mut last_commit = Instant::now();

        loop {
            if cancel.is_cancelled() {
                return Err(IndexerError::Cancelled);
            }

            let tip = self.state.tip()?;
            let next_height = tip.map(|t| t.index.next()).unwrap_or(Height(0));

            let raws = tokio::select! {
                _ = cancel.cancelled() => return Err(IndexerError::Cancelled),
                result = self.fetch_window(next_height) => result?,
            };

            if raws.is_empty() {
                // caught up to the node's tip; idle until either a new
                // block appears or the watchdog forces a reorg check.
                tokio::select! {
                    _ = cancel.cancelled() => return Err(IndexerError::Cancelled),
                    _ = tokio::time::sleep(self.config.idle_timeout) => {}
                }
                if last_commit.elapsed() >= self.config.idle_timeout {
                    self.check_for_reorg().await?;
                }
                continue;
            }

            let normalized = self.normalize_window(raws)?;

            let mut committed_any = false;
            for block in normalized {
                if !self.parent_matches_tip(&block)? {
                    self.resolve_reorg().await?;
                    break;
                }
                self.state.commit_finalized(block).await?;
                last_commit = Instant::now();
                committed_any = true;
            }

            if !committed_any && last_commit.elapsed() >= self.config.idle_timeout {
                self.check_for_reorg().await?;
            }
        }
    }

    fn parent_matches_tip(&self, block: &Block) -> Result<bool, IndexerError> {
        match self.state.tip()? {
            Some(tip) => Ok(block.parent_block_identifier.hash == tip.hash),
            None => Ok(block.is_genesis()),
        }
    }

    /// Fetches up to `window` blocks starting at `start`, tolerating the
    /// node's tip falling short of the full window (§4.A `BlockNotFound`/
    /// `OutOfRange` just mean we've caught up).
    async fn fetch_window(&self, start: Height) -> Result<Vec<RawBlock>, IndexerError> {
        let mut futures = FuturesUnordered::new();
        for offset in 0..self.config.window as i64 {
            let client = Arc::clone(&self.client);
            let height = Height(start.value() + offset);
            futures.push(async move {
                let hash = client.get_hash_from_index(height).await?;
                client.get_block(hash).await
            });
        }

        let mut raws = Vec::new();
        while let Some(result) = futures.next().await {
            match result {
                Ok(raw) => raws.push(raw),
                Err(RpcError::BlockNotFound) | Err(RpcError::OutOfRange) => {}
                Err(err) => return Err(IndexerError::Rpc(err)),
            }
        }
        raws.sort_by_key(|raw| raw.height);
        Ok(raws)
    }

    /// Normalizes a fetched window in height order, threading a
    /// window-local coin map forward so a block can spend outputs
    /// created earlier in the same window without a round-trip to the
    /// committed store (§4.F "prefetch coin cache").
    fn normalize_window(&self, raws: Vec<RawBlock>) -> Result<Vec<Block>, IndexerError> {
        let mut window_coins: HashMap<CoinIdentifier, (String, i64)> = HashMap::new();
        let mut blocks = Vec::with_capacity(raws.len());

        for raw in raws {
            let mut lookup = window_coins.clone();
            for coin_id in referenced_inputs(&raw)? {
                if !lookup.contains_key(&coin_id) {
                    if let Some(fact) = self.state.coin_fact(&coin_id)? {
                        lookup.insert(coin_id, fact);
                    }
                }
            }

            let (block, _externally_referenced) = normalize_block(&raw, &lookup)?;

            for tx in &block.transactions {
                for op in &tx.operations {
                    if let (Some(account), Some(amount), Some(coin_change)) =
                        (&op.account, &op.amount, &op.coin_change)
                    {
                        if coin_change.action == CoinAction::Created {
                            window_coins.insert(
                                coin_change.coin_identifier.clone(),
                                (account.address.clone(), amount.0),
                            );
                        }
                    }
                }
            }

            blocks.push(block);
        }

        Ok(blocks)
    }

    /// Compares our tip's hash against what the node currently reports at
    /// that height; a mismatch without a new block in hand still means a
    /// reorg happened under us (§4.F "OR when the node reports a tip
    /// whose hash at our tip height no longer matches ours").
    async fn check_for_reorg(&self) -> Result<(), IndexerError> {
        let Some(tip) = self.state.tip()? else {
            return Ok(());
        };
        let node_hash = self.client.get_hash_from_index(tip.index).await?;
        if node_hash != tip.hash {
            self.resolve_reorg().await?;
        }
        Ok(())
    }

    /// §4.F reorg protocol: walk back to the fork point, then roll the
    /// store back to it one height at a time. Forward sync resumes
    /// automatically on the caller's next loop iteration, since the tip
    /// is now the fork point.
    async fn resolve_reorg(&self) -> Result<(), IndexerError> {
        let original_tip = self.state.tip()?.ok_or(IndexerError::ForkPointNotFound)?;
        let mut probe = original_tip;

        let fork_height = loop {
            let node_hash = self.probe_node_hash(probe.index).await?;
            if node_hash == probe.hash {
                break probe.index;
            }
            if original_tip.index.value() - probe.index.value() >= self.config.reorg_search_depth {
                return Err(IndexerError::ForkPointNotFound);
            }
            probe = match probe.index.previous() {
                Some(h) => self
                    .state
                    .get_by_index(h)?
                    .map(|b| b.block_identifier)
                    .ok_or(IndexerError::ForkPointNotFound)?,
                None => return Err(IndexerError::ForkPointNotFound),
            };
        };

        let mut rolled_back = 0u32;
        while self
            .state
            .tip()?
            .map(|t| t.index.value() > fork_height.value())
            .unwrap_or(false)
        {
            self.state.rollback_tip().await?;
            rolled_back += 1;
        }

        tracing::warn!(
            fork_height = fork_height.value(),
            rolled_back,
            "resolved reorg"
        );
        Ok(())
    }

    async fn probe_node_hash(&self, height: Height) -> Result<Hash, IndexerError> {
        Ok(self.client.get_hash_from_index(height).await?)
    }
}
