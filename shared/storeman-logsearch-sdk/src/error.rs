//! Error types for the log search SDK

/// Result type alias
pub type Result<T> = std::result::Result<T, LogSearchError>;

/// Log search client errors
#[derive(Debug, thiserror::Error)]
pub enum LogSearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unauthorized: check log search credentials")]
    Unauthorized,

    #[error("Search failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Decode error: {0}")]
    Decode(String),
}
