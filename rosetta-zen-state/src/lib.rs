//! Persistent state for the gateway: coin store, block store, and balance
//! store (spec §4.C/§4.D/§4.E), backed by one embedded `sled` database.
//!
//! [`State`] owns every tree and the single commit lock guarding them;
//! `commit_finalized`/`rollback_tip` (in [`commit`]) are the only
//! mutating operations, matching §4.C's "writers serialize behind a
//! single commit lock held by the indexer" — here, held inside the store
//! itself rather than trusted to the caller.

pub mod coin;
mod commit;
pub mod config;
pub mod error;
mod keys;
mod sled_format;
mod state;

pub use coin::Coin;
pub use config::Config;
pub use error::{Result, StateError};
pub use state::State;
