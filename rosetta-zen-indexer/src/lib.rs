//! Reorg-safe chain synchronizer (§4.B, §4.F): the pure block normalizer,
//! the prefetch/commit/reorg sync loop, and the `GetBlockLazy` waiter
//! built on top of `rosetta-zen-state`'s tip-advancement channel.

pub mod error;
pub mod lazy;
pub mod normalize;
pub mod sync;

pub use error::{IndexerError, NormalizeError};
pub use lazy::get_block_lazy;
pub use normalize::normalize_block;
pub use sync::{Orchestrator, SyncConfig};
