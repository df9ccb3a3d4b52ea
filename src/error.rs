//! Error types for a3s-veil

use thiserror::Error;

/// Errors that can occur while protecting or revealing private data
#[derive(Debug, Error)]
pub enum VeilError {
    /// Malformed tier, attribute, record or frame input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Cipher operation failure while sealing
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Tag verification failed on open
    ///
    /// Always an integrity failure: tampering, wrong key or wrong cipher.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Serialization/deserialization failure of a private payload or envelope
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Key provider could not supply key material
    #[error("Key provider error: {0}")]
    KeyProvider(String),

    /// Metadata fetch failure
    #[error("Failed to fetch metadata '{reference}': {reason}")]
    Fetch {
        reference: String,
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for veil operations
pub type Result<T> = std::result::Result<T, VeilError>;
