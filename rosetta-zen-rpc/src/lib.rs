//! Node JSON-RPC adapter (§4.A): typed requests and strict response
//! decoding, capped-exponential-backoff retry with jitter, and the §6
//! node-error-code → typed-error mapping table.

pub mod client;
pub mod error;
pub mod retry;
pub mod types;

pub use client::{HttpNodeClient, NodeClient};
pub use error::RpcError;
pub use retry::RetryPolicy;
