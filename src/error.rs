//! Error types for the cache client
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache client and its backends.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache (only raised by `get_or_fail`)
    #[error("Cache not found for key '{0}'")]
    NotFound(String),

    /// Backend could not be selected or constructed from the configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Value does not fit the encoder of the declared object type
    #[error("Encode error: {0}")]
    Encode(String),

    /// Payload cannot be parsed as the declared object type
    #[error("Decode error: {0}")]
    Decode(String),

    /// Payload or value does not satisfy the record schema
    #[error("Validation error: {0}")]
    Validation(String),

    /// Object type descriptor matches none of the codecs
    #[error("Unsupported object type: {0}")]
    UnsupportedType(String),

    /// Binary object serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error reported by a backend driver, passed through as-is
    #[error("{backend} backend error: {message}")]
    Backend {
        backend: &'static str,
        message: String,
    },

    /// Local filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CacheError {
    /// Wraps a driver error for the named backend.
    pub fn backend(backend: &'static str, err: impl std::fmt::Display) -> Self {
        CacheError::Backend {
            backend,
            message: err.to_string(),
        }
    }
}

impl From<bincode::Error> for CacheError {
    fn from(err: bincode::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache client.
pub type Result<T> = std::result::Result<T, CacheError>;
