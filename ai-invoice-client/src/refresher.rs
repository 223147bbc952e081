//! Sources of replacement licenses.

use crate::artifact::LicenseArtifact;
use ai_invoice_license::parse_timestamp;
use async_trait::async_trait;
use tracing::{debug, warn};

/// Default variable holding a replacement token.
pub const TOKEN_ENV: &str = "AI_INVOICE_LICENSE_TOKEN";

/// Default variable holding the replacement token's expiry (RFC 3339).
pub const EXPIRES_ENV: &str = "AI_INVOICE_LICENSE_EXPIRES_AT";

/// Why a refresh was requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshContext {
    /// Logical operation whose request was rejected.
    pub operation: String,
    /// Status of the rejected response, if any.
    pub status: Option<u16>,
    /// Body of the rejected response, best effort.
    pub body: String,
}

impl RefreshContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

/// Fetches a replacement license.
///
/// `Ok(None)` means nothing new is available. Errors are logged by the
/// manager and treated the same way as a failed refresh; they never reach
/// the request that triggered the refresh.
#[async_trait]
pub trait LicenseRefresher: Send + Sync {
    async fn refresh(
        &self,
        current: Option<&LicenseArtifact>,
        context: &RefreshContext,
    ) -> anyhow::Result<Option<LicenseArtifact>>;
}

/// Reads a replacement token from the process environment.
#[derive(Debug, Clone)]
pub struct EnvRefresher {
    token_var: String,
    expires_var: String,
}

impl EnvRefresher {
    pub fn new() -> Self {
        Self::with_vars(TOKEN_ENV, EXPIRES_ENV)
    }

    pub fn with_vars(token_var: impl Into<String>, expires_var: impl Into<String>) -> Self {
        Self {
            token_var: token_var.into(),
            expires_var: expires_var.into(),
        }
    }

    pub fn token_var(&self) -> &str {
        &self.token_var
    }

    fn read_expiry(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        let raw = std::env::var(&self.expires_var).ok()?;
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let parsed = parse_timestamp(raw);
        if parsed.is_none() {
            warn!(var = %self.expires_var, "ignoring unparseable license expiry");
        }
        parsed
    }
}

impl Default for EnvRefresher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LicenseRefresher for EnvRefresher {
    async fn refresh(
        &self,
        current: Option<&LicenseArtifact>,
        context: &RefreshContext,
    ) -> anyhow::Result<Option<LicenseArtifact>> {
        let Ok(token) = std::env::var(&self.token_var) else {
            debug!(var = %self.token_var, operation = %context.operation, "no license in environment");
            return Ok(None);
        };
        if token.trim().is_empty() {
            return Ok(None);
        }
        if current.is_some_and(|c| c.token() == token.trim()) {
            debug!(var = %self.token_var, "environment license matches the current one");
            return Ok(None);
        }

        let artifact = LicenseArtifact::new(token, self.read_expiry())?;
        Ok(Some(artifact))
    }
}
