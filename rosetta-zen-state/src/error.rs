use rosetta_zen_chain::model::CoinIdentifier;
use thiserror::Error;

/// Errors surfaced at the state crate's public boundary (§7: "Domain" and
/// "Invariant violation" dispositions). Invariant violations are fatal to
/// the committer: the caller is expected to abort the sync loop and leave
/// readers on the last-good tip.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("coin {0} not found")]
    CoinNotFound(CoinIdentifier),

    #[error("block height {attempted} is not contiguous with tip {tip:?}")]
    NonContiguous {
        tip: Option<i64>,
        attempted: i64,
    },

    #[error("invariant violation: coin {0} already exists in the coin store")]
    CoinAlreadyExists(CoinIdentifier),

    #[error("invariant violation: spent coin {0} is missing from the coin store")]
    SpentCoinMissing(CoinIdentifier),

    #[error("block store is empty, there is no tip to delete")]
    NoTipToDelete,

    #[error(transparent)]
    Io(#[from] sled::Error),

    #[error("corrupt record in {tree}: {source}")]
    Encoding {
        tree: &'static str,
        #[source]
        source: bincode::Error,
    },
}

pub type Result<T> = std::result::Result<T, StateError>;
