//! The normalized operation ledger (spec §3): the typed shape a raw node
//! block is reduced to by `rosetta-zen-indexer`'s normalizer, and the shape
//! every store and query path downstream of it works with.

use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::hash::Hash;
use crate::height::Height;

/// Identifies a single block: its hash and height. Equivalent to Rosetta's
/// `BlockIdentifier`/`PartialBlockIdentifier`; used for both roles here
/// since a parent reference is always fully specified once normalized.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct BlockIdentifier {
    pub hash: Hash,
    pub index: Height,
}

/// Per-output coin reference, `"<txhash>:<vout>"`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct CoinIdentifier {
    pub tx_hash: Hash,
    pub vout: u32,
}

impl CoinIdentifier {
    pub fn new(tx_hash: Hash, vout: u32) -> CoinIdentifier {
        CoinIdentifier { tx_hash, vout }
    }
}

impl std::fmt::Display for CoinIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}", self.tx_hash, self.vout)
    }
}

impl std::str::FromStr for CoinIdentifier {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hash, vout) = s
            .rsplit_once(':')
            .ok_or(crate::error::Error::MalformedCoinIdentifier)?;
        let tx_hash: Hash = hash
            .parse()
            .map_err(|_| crate::error::Error::MalformedCoinIdentifier)?;
        let vout: u32 = vout
            .parse()
            .map_err(|_| crate::error::Error::MalformedCoinIdentifier)?;
        Ok(CoinIdentifier { tx_hash, vout })
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum CoinAction {
    Created,
    Spent,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CoinChange {
    pub action: CoinAction,
    pub coin_identifier: CoinIdentifier,
}

/// The sub-account tag used to mark immature funds: coinbase outputs and
/// certificate backward-transfer outputs.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum SubAccount {
    Coinbase,
}

/// An address the operation credits or debits.
///
/// Kept as the raw node-reported string rather than the typed
/// [`crate::transparent::Address`]: multisig and other non-standard
/// scripts carry addresses that don't decode to a single transparent
/// address, and the normalizer must preserve them verbatim (§4.B).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AccountIdentifier {
    pub address: String,
    pub sub_account: Option<SubAccount>,
}

impl AccountIdentifier {
    pub fn new(address: impl Into<String>) -> AccountIdentifier {
        AccountIdentifier {
            address: address.into(),
            sub_account: None,
        }
    }

    pub fn coinbase(address: impl Into<String>) -> AccountIdentifier {
        AccountIdentifier {
            address: address.into(),
            sub_account: Some(SubAccount::Coinbase),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum OperationType {
    Coinbase,
    Input,
    Output,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum OperationStatus {
    Success,
}

/// Extra per-operation detail that doesn't fit the core Rosetta fields.
///
/// `script_pub_key_hex` is populated for every OUTPUT operation: it is
/// the record the coin store needs to satisfy `ScriptPubKeysOf` for spent
/// coins (§4.C), and it doubles as the only way to surface a `nulldata`
/// (OP_RETURN) output's contents, since those carry no address and no
/// coin-change (§4.B edge case).
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct OperationMetadata {
    pub script_pub_key_hex: Option<String>,
}

/// One entry in a transaction's operation ledger.
///
/// `operation_index` is 0-based and strictly increasing across the whole
/// transaction (coinbase/inputs then outputs); `network_index` restarts at
/// 0 separately for inputs and for outputs (P3).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub operation_index: u64,
    pub network_index: Option<u64>,
    pub operation_type: OperationType,
    pub status: OperationStatus,
    pub account: Option<AccountIdentifier>,
    pub amount: Option<Amount>,
    pub coin_change: Option<CoinChange>,
    pub metadata: OperationMetadata,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransactionMetadata {
    pub size: u64,
    pub version: i32,
    pub vsize: Option<u64>,
    pub locktime: u32,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_identifier: Hash,
    pub operations: Vec<Operation>,
    pub metadata: TransactionMetadata,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BlockMetadata {
    pub size: u64,
    pub version: i32,
    pub merkle_root: Hash,
    pub nonce: String,
    pub bits: String,
    pub difficulty: f64,
}

/// A fully normalized block, as stored by `rosetta-zen-state`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub block_identifier: BlockIdentifier,
    pub parent_block_identifier: BlockIdentifier,
    pub timestamp_ms: i64,
    pub metadata: BlockMetadata,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn is_genesis(&self) -> bool {
        self.block_identifier.index.value() == 0
    }
}
