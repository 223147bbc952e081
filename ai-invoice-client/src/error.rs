//! Client error types.
//!
//! License rejections ([`LicenseFailure`]) are kept structurally apart from
//! every other failure so callers can decide whether to ask for a new
//! credential without string matching.

use std::fmt;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type for license store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Why a request was finally rejected on license grounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseFailureReason {
    /// The final attempt was answered with 401.
    Unauthorized,
    /// The final attempt was answered with 403.
    Forbidden,
    /// The first attempt was rejected and no new license could be obtained.
    RefreshFailed,
}

impl LicenseFailureReason {
    /// Maps a final 401/403 status to its reason.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            401 => Some(Self::Unauthorized),
            403 => Some(Self::Forbidden),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::RefreshFailed => "refresh_failed",
        }
    }
}

impl fmt::Display for LicenseFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request the server rejected because of the license.
#[derive(Debug, Clone, Error)]
#[error("{operation} was rejected by the license check ({reason}, HTTP {status})")]
pub struct LicenseFailure {
    /// Name of the logical operation that failed.
    pub operation: String,
    /// Status code of the last response.
    pub status: u16,
    pub reason: LicenseFailureReason,
    /// Raw body of the last response, empty if it could not be read.
    pub body: String,
}

/// Errors from the license store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protection error: {0}")]
    Protection(#[from] ai_invoice_crypto::CryptoError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("protection task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Errors that can occur in client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Rejected on license grounds after at most one refresh.
    #[error(transparent)]
    License(#[from] LicenseFailure),

    /// The server answered with a non-license error status.
    #[error("{operation} failed with HTTP {status}")]
    Status {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A successful response carried a body that could not be decoded.
    #[error("{operation} returned an unreadable response: {message}")]
    Decode { operation: String, message: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("license store error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid license artifact: {0}")]
    InvalidArtifact(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Returns the license failure, if this is one.
    pub fn license_failure(&self) -> Option<&LicenseFailure> {
        match self {
            ClientError::License(failure) => Some(failure),
            _ => None,
        }
    }

    /// Returns true if the caller should prompt for a new license.
    pub fn is_license_failure(&self) -> bool {
        matches!(self, ClientError::License(_))
    }
}
