//! `GetBlockLazy` (§4.F): returns the current tip without blocking sync,
//! or waits for a specific block to arrive, bounded by a timeout.

use std::sync::Arc;
use std::time::Duration;

use rosetta_zen_chain::model::{Block, BlockIdentifier};
use rosetta_zen_state::State;

use crate::error::IndexerError;

pub async fn get_block_lazy(
    state: &State,
    id: Option<BlockIdentifier>,
    timeout: Duration,
) -> Result<Option<Arc<Block>>, IndexerError> {
    match id {
        None => match state.tip()? {
            Some(tip) => Ok(state.get_by_index(tip.index)?),
            None => Ok(None),
        },
        Some(id) => {
            if let Some(found) = state.get_by_hash(id.hash)? {
                return Ok(Some(found));
            }

            let mut tip_rx = state.subscribe_tip();
            let deadline = tokio::time::Instant::now() + timeout;
            loop {
                let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
                if remaining.is_zero() {
                    return Ok(None);
                }
                match tokio::time::timeout(remaining, tip_rx.changed()).await {
                    Ok(Ok(())) => {
                        if let Some(found) = state.get_by_hash(id.hash)? {
                            return Ok(Some(found));
                        }
                    }
                    // sender dropped, or timed out waiting for the next change.
                    Ok(Err(_)) | Err(_) => return Ok(None),
                }
            }
        }
    }
}
