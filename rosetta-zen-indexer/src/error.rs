use rosetta_zen_chain::model::CoinIdentifier;
use thiserror::Error;

/// §4.B's single failure mode, plus the errors the sync loop propagates
/// from its collaborators (§7).
#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("missing previous output for input {0}")]
    MissingPreviousOutput(CoinIdentifier),

    #[error("malformed node response: {0}")]
    Malformed(&'static str),

    #[error(transparent)]
    Chain(#[from] rosetta_zen_chain::Error),
}

/// Errors that abort the sync loop's committer (§7 "Invariant violation"
/// disposition) versus ones a caller can recover from.
#[derive(Error, Debug)]
pub enum IndexerError {
    #[error(transparent)]
    Rpc(#[from] rosetta_zen_rpc::RpcError),

    #[error(transparent)]
    State(#[from] rosetta_zen_state::StateError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("sync loop cancelled")]
    Cancelled,

    #[error("reorg fork point not found within the configured search depth")]
    ForkPointNotFound,
}
