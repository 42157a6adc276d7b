//! Error types for the RPC SDK

/// Result type alias
pub type Result<T> = std::result::Result<T, RpcError>;

/// Transport-level failures; per-request JSON-RPC errors travel inside responses
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("RPC endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Decode error: {0}")]
    Decode(String),
}

impl RpcError {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Status { status, .. } => *status >= 500,
            Self::Decode(_) => false,
        }
    }
}
