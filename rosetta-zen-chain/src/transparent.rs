//! Transparent (Bitcoin-inherited) addresses, scripts, and the raw
//! transaction wire format used by construction.

mod address;
mod script;
mod tx;

pub use address::Address;
pub use script::Script;
pub use tx::{Input, OutPoint, Output, Transaction};
