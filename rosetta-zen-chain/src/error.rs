use thiserror::Error;

/// Errors shared by every crate that builds on the core data model.
#[derive(Error, Debug)]
pub enum Error {
    #[error("malformed coin identifier, expected \"<txhash>:<vout>\"")]
    MalformedCoinIdentifier,
    #[error(transparent)]
    Serialization(#[from] crate::serialization::SerializationError),
    #[error(transparent)]
    Amount(#[from] crate::amount::AmountError),
}
