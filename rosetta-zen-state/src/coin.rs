use serde::{Deserialize, Serialize};

use rosetta_zen_chain::model::CoinIdentifier;

/// The `(address, coin-id, amount, script-pub-key)` record named in §3,
/// stored under the `c/` tree.
///
/// `spent_at` tombstones rather than deletes a coin once it is spent: a
/// reorg rollback only needs to clear the flag to resurrect the coin with
/// its original `script_pub_key_hex` intact, rather than reconstructing a
/// record the normalized operation ledger doesn't carry enough detail to
/// rebuild (the INPUT operation that spent it records only the address
/// and amount, not the script). Truly removing a record is reserved for
/// coins *created* by the block being rolled back, which never existed
/// before it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoinRecord {
    pub address: String,
    pub amount: i64,
    pub script_pub_key_hex: String,
    pub spent_at: Option<i64>,
}

impl CoinRecord {
    pub fn is_spent(&self) -> bool {
        self.spent_at.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct Coin {
    pub coin_identifier: CoinIdentifier,
    pub amount: i64,
    pub script_pub_key_hex: String,
}
