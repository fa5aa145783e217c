use thiserror::Error;

/// The error taxonomy named in §4.A/§6: transport failures and node
/// warm-up are retryable, domain errors (including the `BlockNotFound`
/// sentinel) are not, and malformed JSON is always fatal to the call.
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("node rpc transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("node is still warming up")]
    NotReady,

    #[error("block not found")]
    BlockNotFound,

    #[error("requested height is out of range")]
    OutOfRange,

    #[error("node rpc error {code}: {message}")]
    Domain { code: i64, message: String },

    #[error("malformed node rpc response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error("retry budget exhausted after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<RpcError>,
    },
}

impl RpcError {
    /// §7: transport failures and node warm-up are retried with backoff;
    /// everything else is propagated immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RpcError::Transport(_) | RpcError::NotReady)
    }

    /// Maps a node JSON-RPC error object to a typed error per the §6 table.
    pub fn from_node_error(code: i64, message: String) -> RpcError {
        match code {
            -28 => RpcError::NotReady,
            -5 => RpcError::BlockNotFound,
            -8 => RpcError::OutOfRange,
            _ => RpcError::Domain { code, message },
        }
    }
}
