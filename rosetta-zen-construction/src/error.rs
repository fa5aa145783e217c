use thiserror::Error;

/// Construction-pipeline errors (§7 "Construction errors"): always
/// returned to the API caller with a stable code, never fatal to any
/// other component.
#[derive(Error, Debug)]
pub enum ConstructionError {
    #[error("signature must be exactly 64 bytes (compact r||s), got {0}")]
    BadSignatureLength(usize),

    #[error("malformed DER signature or public key: {0}")]
    InvalidSignature(#[from] secp256k1::Error),

    #[error("unknown script type {0:?}, expected pay-to-pubkey-hash")]
    UnknownScriptType(String),

    #[error("spend amount {spend} exceeds available coin value {available}")]
    InsufficientFunds { spend: i64, available: i64 },

    #[error("operations did not describe a valid spend: {0}")]
    MalformedOperations(&'static str),

    #[error(transparent)]
    Chain(#[from] rosetta_zen_chain::Error),

    #[error("malformed transaction envelope: {0}")]
    Envelope(#[from] serde_json::Error),

    #[error(transparent)]
    Rpc(#[from] rosetta_zen_rpc::RpcError),

    #[error(transparent)]
    State(#[from] rosetta_zen_state::StateError),
}

impl ConstructionError {
    /// Stable numeric code surfaced to Rosetta callers (§7 "a stable
    /// numeric code, a short message, a retriable flag").
    pub fn code(&self) -> i64 {
        match self {
            ConstructionError::BadSignatureLength(_) => 1,
            ConstructionError::InvalidSignature(_) => 2,
            ConstructionError::UnknownScriptType(_) => 3,
            ConstructionError::InsufficientFunds { .. } => 4,
            ConstructionError::MalformedOperations(_) => 5,
            ConstructionError::Chain(_) => 6,
            ConstructionError::Envelope(_) => 7,
            ConstructionError::Rpc(_) => 8,
            ConstructionError::State(_) => 9,
        }
    }

    pub fn retriable(&self) -> bool {
        matches!(self, ConstructionError::Rpc(e) if e.is_retryable())
    }
}
