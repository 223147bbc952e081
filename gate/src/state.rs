use ai_invoice_license::LicenseVerifier;
use secrecy::SecretString;
use std::sync::Arc;

/// Shared state for gate handlers and middleware.
#[derive(Clone)]
pub struct GateState {
    pub verifier: Arc<LicenseVerifier>,
    /// Enables the administrative routes when set.
    pub admin_api_key: Option<SecretString>,
}

impl GateState {
    pub fn new(verifier: LicenseVerifier) -> Self {
        Self {
            verifier: Arc::new(verifier),
            admin_api_key: None,
        }
    }

    pub fn with_admin_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.admin_api_key = (!key.trim().is_empty()).then(|| SecretString::new(key.into_boxed_str()));
        self
    }
}

impl std::fmt::Debug for GateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateState")
            .field("cached_key_ids", &self.verifier.cached_key_ids())
            .field("admin_enabled", &self.admin_api_key.is_some())
            .finish()
    }
}
