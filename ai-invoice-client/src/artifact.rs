//! The client's view of a license: an opaque token and an expiry hint.

use crate::error::{ClientError, ClientResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// An issued license as held by the client.
///
/// The token is never parsed here; only the server's verifier interprets
/// it. `expires_at` is a staleness hint and grants nothing on its own.
/// Artifacts are immutable: a new license is a new artifact.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(try_from = "ArtifactRecord")]
pub struct LicenseArtifact {
    token: String,
    #[zeroize(skip)]
    expires_at: Option<DateTime<Utc>>,
}

impl LicenseArtifact {
    /// Creates an artifact, trimming the token. Blank tokens are rejected.
    pub fn new(token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> ClientResult<Self> {
        let mut token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(ClientError::InvalidArtifact("token is blank".to_string()));
        }
        let artifact = Self {
            token: trimmed.to_string(),
            expires_at,
        };
        token.zeroize();
        Ok(artifact)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// True when the hint says the license has lapsed at `now`.
    ///
    /// An artifact without an expiry hint is never stale.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// True when `other` carries the same token text.
    pub fn same_token(&self, other: &LicenseArtifact) -> bool {
        self.token == other.token
    }
}

impl fmt::Debug for LicenseArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LicenseArtifact")
            .field("token", &format_args!("[REDACTED; {} chars]", self.token.len()))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
struct ArtifactRecord {
    token: String,
    #[zeroize(skip)]
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

impl TryFrom<ArtifactRecord> for LicenseArtifact {
    type Error = ClientError;

    fn try_from(mut record: ArtifactRecord) -> ClientResult<Self> {
        let token = std::mem::take(&mut record.token);
        LicenseArtifact::new(token, record.expires_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn token_is_trimmed() {
        let artifact = LicenseArtifact::new("  abc\n", None).unwrap();
        assert_eq!(artifact.token(), "abc");
    }

    #[test]
    fn blank_token_is_rejected() {
        assert!(matches!(
            LicenseArtifact::new(" \t", None),
            Err(ClientError::InvalidArtifact(_))
        ));
    }

    #[test]
    fn staleness_follows_hint() {
        let now = Utc::now();
        let fresh = LicenseArtifact::new("a", Some(now + Duration::hours(1))).unwrap();
        let stale = LicenseArtifact::new("a", Some(now)).unwrap();
        let open = LicenseArtifact::new("a", None).unwrap();
        assert!(!fresh.is_stale(now));
        assert!(stale.is_stale(now));
        assert!(!open.is_stale(now));
    }

    #[test]
    fn debug_hides_token() {
        let artifact = LicenseArtifact::new("super-secret-token", None).unwrap();
        let debug = format!("{artifact:?}");
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn deserializing_blank_token_fails() {
        let result: Result<LicenseArtifact, _> =
            serde_json::from_str(r#"{"token":"  ","expires_at":null}"#);
        assert!(result.is_err());
    }

    #[test]
    fn serde_keeps_expiry() {
        let expires = Utc::now() + Duration::days(3);
        let artifact = LicenseArtifact::new("tok", Some(expires)).unwrap();
        let json = serde_json::to_string(&artifact).unwrap();
        let back: LicenseArtifact = serde_json::from_str(&json).unwrap();
        assert_eq!(back, artifact);
    }
}
