//! `Metadata` (§4.G): resolve the fee, the replay block, and the spent
//! coins' locking scripts needed to sign them.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use rosetta_zen_chain::model::CoinIdentifier;
use rosetta_zen_chain::{Hash, Height};
use rosetta_zen_rpc::types::ScriptPubKey;
use rosetta_zen_rpc::NodeClient;
use rosetta_zen_state::State;

use crate::error::ConstructionError;
use crate::preprocess::PreprocessOptions;

#[derive(Clone, Copy, Debug)]
pub struct FeeConfig {
    pub confirmation_target: u32,
    pub min_fee_rate: f64,
    pub replay_protection_depth: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConstructionMetadata {
    #[serde(rename = "scriptPubKeys")]
    pub script_pub_keys: Vec<ScriptPubKey>,
    pub replay_block_height: i64,
    pub replay_block_hash: String,
}

/// Reconstructs a `ScriptPubKey` record for a coin this service already
/// knows how to spend: a single pay-to-pubkey-hash output, the only kind
/// construction ever builds (§4.G scope).
fn script_pub_key_for(hex: String, address: String) -> ScriptPubKey {
    ScriptPubKey {
        asm: format!(
            "OP_DUP OP_HASH160 {} OP_EQUALVERIFY OP_CHECKSIG",
            &hex[6..hex.len().saturating_sub(4)]
        ),
        hex,
        req_sigs: Some(1),
        kind: "pubkeyhash".to_string(),
        addresses: vec![address],
    }
}

pub async fn fetch_metadata<C: NodeClient + ?Sized>(
    client: &C,
    state: &State,
    options: &PreprocessOptions,
    fees: FeeConfig,
) -> Result<(ConstructionMetadata, f64, i64), ConstructionError> {
    let coin_ids = options
        .coins
        .iter()
        .map(|c| c.coin_identifier.parse::<CoinIdentifier>())
        .collect::<Result<Vec<_>, _>>()?;

    let mut script_pub_keys = Vec::with_capacity(coin_ids.len());
    for coin_id in &coin_ids {
        let (address, _amount) = state
            .coin_fact(coin_id)?
            .ok_or_else(|| ConstructionError::MalformedOperations("spent coin not found in the store"))?;
        let hex = state.script_pub_keys_of(std::slice::from_ref(coin_id))?.remove(0);
        script_pub_keys.push(script_pub_key_for(hex, address));
    }

    let best = client.get_best_block().await?;
    let replay_height = (best.value() - fees.replay_protection_depth).max(0);
    let replay_hash = client.get_hash_from_index(Height(replay_height)).await?;
    let suggested_rate = client.suggested_fee_rate(fees.confirmation_target).await?;

    let metadata = ConstructionMetadata {
        script_pub_keys,
        replay_block_height: replay_height,
        replay_block_hash: replay_hash.to_string(),
    };

    Ok((metadata, suggested_rate, replay_height))
}

/// `fee = max(estimated_size × rate × multiplier, estimated_size × minFeeRate)`,
/// rounded half-up at each term (§4.G "Numeric semantics").
pub fn compute_fee(estimated_size: u64, suggested_rate: f64, multiplier: f64, fees: FeeConfig) -> i64 {
    let size = Decimal::from(estimated_size);
    let primary = (size * Decimal::try_from(suggested_rate).unwrap_or_default() * Decimal::try_from(multiplier).unwrap_or_default())
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let floor = (size * Decimal::try_from(fees.min_fee_rate).unwrap_or_default())
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    primary.max(floor).to_i64().unwrap_or(i64::MAX)
}

/// The replay hash at genesis, useful for re-deriving `replay_hash` when
/// parsing a transaction back (§4.G `Parse`).
pub fn parse_replay_hash(hex: &str) -> Result<Hash, ConstructionError> {
    hex.parse().map_err(|e: rosetta_zen_chain::serialization::SerializationError| {
        ConstructionError::Chain(e.into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_floors_at_the_minimum_rate() {
        let fees = FeeConfig { confirmation_target: 6, min_fee_rate: 1.0, replay_protection_depth: 2000 };
        assert_eq!(compute_fee(114, 1.0, 0.75, fees), 114);
    }

    #[test]
    fn fee_uses_the_suggested_rate_when_it_dominates() {
        let fees = FeeConfig { confirmation_target: 6, min_fee_rate: 1.0, replay_protection_depth: 2000 };
        assert_eq!(compute_fee(114, 10.0, 0.75, fees), 855);
    }
}
