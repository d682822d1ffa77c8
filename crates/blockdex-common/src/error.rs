//! Error types for Blockdex

use thiserror::Error;

/// Result type alias for Blockdex operations
pub type Result<T> = std::result::Result<T, BlockdexError>;

/// Main error type for Blockdex
#[derive(Error, Debug)]
pub enum BlockdexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unsupported indexing type: {0}")]
    UnsupportedJobType(String),

    #[error("Invalid job status: {0}")]
    InvalidJobStatus(String),

    #[error("Invalid webhook event status: {0}")]
    InvalidEventStatus(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
