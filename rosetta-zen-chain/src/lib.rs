//! Core data model shared by every crate in the gateway: block/transaction
//! identifiers, the normalized operation ledger (spec §3), transparent
//! addresses and scripts, and the wire serialization primitives
//! `rosetta-zen-construction` uses to build and sign spends.

pub mod amount;
pub mod compactint;
pub mod error;
pub mod hash;
pub mod height;
pub mod model;
pub mod network;
pub mod serialization;
pub mod transparent;

pub use amount::Amount;
pub use error::Error;
pub use hash::Hash;
pub use height::Height;
pub use network::Network;
pub use serialization::{BitcoinDeserialize, BitcoinSerialize, SerializationError};
