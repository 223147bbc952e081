//! Error types for secret protection.

use thiserror::Error;

/// Result type for protection operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur while protecting or unprotecting secrets.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Decryption failed (wrong key, wrong user, or tampered data).
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Invalid key length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// The protection key file could not be created or read.
    #[error("key file error: {0}")]
    KeyFile(String),

    /// The platform protection API reported a failure.
    #[error("platform protection failed: {0}")]
    Platform(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
