//! Strict typed decoders for the node's JSON-RPC responses (§4.A, §9
//! "never pass loose maps through the normalizer"). Field names mirror
//! the node's wire JSON exactly; shape is grounded on
//! `examples/original_source/zen/client_test.go`'s fixtures (the
//! already-decoded Go `Block`/`Transaction`/`Certificate` types), adapted
//! back to the raw snake_case RPC field names those fixtures were parsed
//! from.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize)]
pub struct BlockchainInfo {
    pub chain: String,
    pub blocks: i64,
    pub headers: i64,
    pub bestblockhash: String,
    #[serde(default)]
    pub verificationprogress: f64,
}

/// Also re-emitted verbatim in `rosetta-zen-construction`'s metadata and
/// unsigned-transaction envelopes, hence `Serialize` alongside `Deserialize`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScriptPubKey {
    pub asm: String,
    pub hex: String,
    #[serde(rename = "reqSigs", default)]
    pub req_sigs: Option<u32>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub addresses: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawVout {
    pub value: Decimal,
    pub n: u32,
    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: ScriptPubKey,
    /// Set on sidechain certificate outputs that behave like coinbase
    /// outputs for maturity purposes (§4.B step 4, GLOSSARY "Certificate").
    #[serde(rename = "backwardTransfer", default)]
    pub backward_transfer: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawVin {
    #[serde(default)]
    pub coinbase: Option<String>,
    pub txid: Option<String>,
    pub vout: Option<u32>,
    pub sequence: u32,
}

impl RawVin {
    pub fn is_coinbase(&self) -> bool {
        self.coinbase.is_some()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawTransaction {
    pub txid: String,
    pub hex: String,
    pub version: i32,
    pub size: u64,
    #[serde(default)]
    pub vsize: Option<u64>,
    pub locktime: u32,
    pub vin: Vec<RawVin>,
    pub vout: Vec<RawVout>,
}

/// A sidechain certificate (§4.B step 4, GLOSSARY "Certificate"):
/// structurally a transaction-like record with an extra `cert` payload
/// the normalizer ignores beyond distinguishing backward-transfer outputs.
#[derive(Clone, Debug, Deserialize)]
pub struct RawCertificate {
    #[serde(rename = "cert")]
    pub cert_id: String,
    pub version: i32,
    pub size: u64,
    #[serde(default)]
    pub vin: Vec<RawVin>,
    pub vout: Vec<RawVout>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawBlock {
    pub hash: String,
    pub confirmations: i64,
    pub size: u64,
    pub height: i64,
    pub version: i32,
    pub merkleroot: String,
    pub tx: Vec<RawTransaction>,
    #[serde(default)]
    pub cert: Vec<RawCertificate>,
    pub time: i64,
    pub nonce: String,
    pub bits: String,
    pub difficulty: f64,
    pub previousblockhash: Option<String>,
    pub nextblockhash: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PeerInfo {
    pub addr: String,
    pub subver: String,
    pub version: i64,
}
