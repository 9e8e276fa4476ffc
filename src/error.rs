//! Error types for the caching engine

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the caching engine
///
/// Infrastructure failures (persistence I/O, preload loaders) are handled at
/// their boundaries and never surface through `get`/`set`; only malformed
/// input and corrupt payloads reach callers.
#[derive(Error, Debug)]
pub enum Error {
    /// Value serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Compression failed
    #[error("Compression with {algorithm} failed: {reason}")]
    CompressionFailed { algorithm: String, reason: String },

    /// Decompression failed
    #[error("Decompression with {algorithm} failed: {reason}")]
    DecompressionFailed { algorithm: String, reason: String },

    /// Invalid key pattern
    #[error("Invalid key pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Persistence backend error
    #[error("Persistence backend error: {0}")]
    Persistence(String),

    /// Preload rule error
    #[error("Preload rule '{rule_id}' failed: {reason}")]
    PreloadRule { rule_id: String, reason: String },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
