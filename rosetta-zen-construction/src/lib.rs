//! Transaction construction pipeline (§4.G): derive, preprocess,
//! metadata, payloads, combine, parse, hash, submit. Builds and signs a
//! single pay-to-pubkey-hash spend with a replay-protection suffix on
//! every output; never constructs coinbase or certificate transactions.

pub mod combine;
pub mod derive;
pub mod envelope;
pub mod error;
pub mod hash;
pub mod metadata;
pub mod parse;
pub mod payloads;
pub mod preprocess;
pub mod replay;
pub mod submit;

#[cfg(test)]
mod prop;

pub use combine::{combine, InputSignature};
pub use derive::derive_address;
pub use envelope::{SignedTransaction, UnsignedTransaction};
pub use error::ConstructionError;
pub use hash::transaction_hash;
pub use metadata::{fetch_metadata, ConstructionMetadata, FeeConfig};
pub use parse::{parse_signed, parse_unsigned, ParsedTransaction};
pub use payloads::{build_payloads, SigningPayload};
pub use preprocess::{preprocess, PreprocessOptions, SpentCoin};
pub use submit::submit;
