//! Error types for the storeman tooling

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoremanError>;

#[derive(Error, Debug)]
pub enum StoremanError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Log search error: {0}")]
    LogSearch(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Timestamp resolution failed: {0}")]
    Resolution(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoremanError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::LogSearch(_) => "LOG_SEARCH_ERROR",
            Self::Rpc(_) => "RPC_ERROR",
            Self::Resolution(_) => "RESOLUTION_ERROR",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Io(_) => "IO_ERROR",
        }
    }

    /// Process exit code for a command that failed with this error.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

impl From<serde_json::Error> for StoremanError {
    fn from(err: serde_json::Error) -> Self {
        StoremanError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for StoremanError {
    fn from(err: serde_yaml::Error) -> Self {
        StoremanError::Config(err.to_string())
    }
}
