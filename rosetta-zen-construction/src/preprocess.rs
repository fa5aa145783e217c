//! `Preprocess` (§4.G): extract the spent coin references and an
//! estimated byte size from a proposed set of operations.

use serde::{Deserialize, Serialize};

use rosetta_zen_chain::model::{CoinAction, Operation, OperationType};

use crate::error::ConstructionError;
use crate::replay::ESTIMATED_REPLAY_OUTPUT_LEN;

/// Fixed transaction overhead independent of input/output count: 4-byte
/// version, 4-byte locktime, and the two single-byte input/output
/// CompactInt counts this service never needs more than a byte for.
const FIXED_OVERHEAD: u64 = 10;

/// Per-input estimate: 36-byte outpoint, 4-byte sequence, 1-byte
/// scriptSig-length placeholder. The real scriptSig is filled in only at
/// `Combine` time, after a signature exists to measure.
const ESTIMATED_INPUT_LEN: u64 = 41;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SpentCoin {
    pub coin_identifier: String,
    /// Signed, matching the operation's amount (always negative).
    pub amount: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PreprocessOptions {
    pub coins: Vec<SpentCoin>,
    pub estimated_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_multiplier: Option<f64>,
}

pub fn preprocess(operations: &[Operation], fee_multiplier: Option<f64>) -> Result<PreprocessOptions, ConstructionError> {
    let mut coins = Vec::new();
    let mut output_count: u64 = 0;

    for op in operations {
        match op.operation_type {
            OperationType::Input => {
                let coin_change = op
                    .coin_change
                    .as_ref()
                    .ok_or(ConstructionError::MalformedOperations("input operation missing coin_change"))?;
                if coin_change.action != CoinAction::Spent {
                    return Err(ConstructionError::MalformedOperations("input operation's coin_change must be Spent"));
                }
                let amount = op
                    .amount
                    .ok_or(ConstructionError::MalformedOperations("input operation missing amount"))?;
                coins.push(SpentCoin {
                    coin_identifier: coin_change.coin_identifier.to_string(),
                    amount: amount.0,
                });
            }
            OperationType::Output => output_count += 1,
            OperationType::Coinbase => {
                return Err(ConstructionError::MalformedOperations("construction never spends a coinbase-only transaction"))
            }
        }
    }

    let estimated_size = FIXED_OVERHEAD
        + coins.len() as u64 * ESTIMATED_INPUT_LEN
        + output_count * ESTIMATED_REPLAY_OUTPUT_LEN;

    Ok(PreprocessOptions { coins, estimated_size, fee_multiplier })
}
