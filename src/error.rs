use thiserror::Error;

use crate::catalog::LoadError;
use crate::embedding::EmbeddingError;

/// Main error type for the dealdex crate
#[derive(Error, Debug)]
pub enum DealdexError {
    /// Snapshot loading errors (malformed input, missing required fields)
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Embedding backend errors (model init or generation failure)
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type for dealdex operations
pub type Result<T> = std::result::Result<T, DealdexError>;
