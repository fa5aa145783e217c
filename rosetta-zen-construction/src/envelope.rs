//! The JSON intermediate formats construction hands back and forth
//! between `Payloads`/`Combine`/`Parse` (§6 "Transaction wire format").
//! Field names and casing match the envelope `rosetta-zen-gatewayd`
//! already speaks to existing wallets integrated against this service.

use serde::{Deserialize, Serialize};

use rosetta_zen_rpc::types::ScriptPubKey;

/// `Payloads`' output and `Parse`'s unsigned input: the raw unsigned
/// transaction hex plus everything `Combine`/`Parse` need without a
/// round-trip to the node or the store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    pub transaction: String,
    #[serde(rename = "scriptPubKeys")]
    pub script_pub_keys: Vec<ScriptPubKey>,
    pub input_amounts: Vec<String>,
    pub input_addresses: Vec<String>,
}

/// `Combine`'s output and `Parse`'s signed input. Carries only what a
/// signed transaction's own bytes can't already express: the spent
/// amounts (needed to emit the negative INPUT operation amounts).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub transaction: String,
    pub input_amounts: Vec<String>,
}
