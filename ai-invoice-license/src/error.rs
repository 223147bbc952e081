//! Error types for license issuing and verification.

use thiserror::Error;

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;

/// Which authorization status class a verification failure belongs to.
///
/// Clients refresh their token differently depending on the class, so the
/// split is part of the wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenialClass {
    /// The token could not be authenticated (401).
    Unauthorized,
    /// The token is authentic but does not grant access (403).
    Forbidden,
    /// The caller asked for something unusable, such as a blank feature (400).
    InvalidInput,
    /// Verification could not be performed at all (503).
    Unavailable,
}

/// Licensing errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// No token was presented.
    #[error("license token is required")]
    MissingToken,

    /// Token could not be decoded into a well-formed artifact.
    #[error("malformed license token: {0}")]
    Malformed(String),

    /// The token names a key id with no configured public key.
    #[error("license is signed with unknown key id '{0}'")]
    UnknownKey(String),

    /// Ed25519 signature verification failed.
    #[error("license token signature invalid")]
    InvalidSignature,

    /// License has expired.
    #[error("license expired on {0}")]
    Expired(String),

    /// The token id or its subject is on a revocation list.
    #[error("license has been revoked ({0})")]
    Revoked(String),

    /// The license does not grant the required feature flag.
    #[error("license does not permit '{0}' operations")]
    FeatureNotLicensed(String),

    /// Public key material could not be loaded.
    #[error("license verification unavailable: {0}")]
    KeyUnavailable(String),

    /// A blank or otherwise unusable feature flag was requested.
    #[error("invalid feature flag: {0:?}")]
    InvalidFeature(String),

    /// An issue request was rejected before signing.
    #[error("invalid license request: {0}")]
    InvalidRequest(String),

    /// The private signing key could not be parsed.
    #[error("invalid signing key: {0}")]
    SigningKey(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LicenseError {
    /// Returns the status class of a verification failure.
    ///
    /// Caller errors are `InvalidInput`. Errors that never come out of
    /// verification (issuer errors) are reported as `Unavailable`.
    #[must_use]
    pub fn class(&self) -> DenialClass {
        match self {
            Self::MissingToken
            | Self::Malformed(_)
            | Self::UnknownKey(_)
            | Self::InvalidSignature
            | Self::Expired(_) => DenialClass::Unauthorized,
            Self::Revoked(_) | Self::FeatureNotLicensed(_) => DenialClass::Forbidden,
            Self::InvalidFeature(_) | Self::InvalidRequest(_) => DenialClass::InvalidInput,
            Self::KeyUnavailable(_)
            | Self::SigningKey(_)
            | Self::Serialization(_) => DenialClass::Unavailable,
        }
    }

    /// Stable machine-readable reason code.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingToken => "missing_token",
            Self::Malformed(_) => "malformed",
            Self::UnknownKey(_) => "unknown_key",
            Self::InvalidSignature => "invalid_signature",
            Self::Expired(_) => "expired",
            Self::Revoked(_) => "revoked",
            Self::FeatureNotLicensed(_) => "feature_not_licensed",
            Self::KeyUnavailable(_) => "key_unavailable",
            Self::InvalidFeature(_) => "invalid_feature",
            Self::InvalidRequest(_) => "invalid_request",
            Self::SigningKey(_) => "invalid_signing_key",
            Self::Serialization(_) => "serialization",
        }
    }
}
