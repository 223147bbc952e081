//! Client configuration and wiring.

use crate::error::{ClientError, ClientResult};
use crate::manager::LicenseManager;
use crate::refresher::{EnvRefresher, EXPIRES_ENV, TOKEN_ENV};
use crate::store::FileLicenseStore;
use crate::transport::LicensedClient;
use ai_invoice_crypto::platform_protector;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for a [`LicensedClient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the AI Invoice API.
    pub base_url: String,
    /// Where the protected license is kept. Defaults to the local data dir.
    pub store_path: Option<PathBuf>,
    /// Key file for non-Windows protection. Defaults next to the store.
    pub key_path: Option<PathBuf>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Variable the environment refresher reads the token from.
    pub token_env: String,
    /// Variable the environment refresher reads the expiry from.
    pub expires_env: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8088".to_string(),
            store_path: None,
            key_path: None,
            timeout_secs: 30,
            token_env: TOKEN_ENV.to_string(),
            expires_env: EXPIRES_ENV.to_string(),
        }
    }
}

impl ClientConfig {
    /// Resolves `(store path, key path)`, falling back to platform defaults.
    pub fn resolve_paths(&self) -> ClientResult<(PathBuf, PathBuf)> {
        let store_path = match &self.store_path {
            Some(path) => path.clone(),
            None => FileLicenseStore::default_paths()
                .map(|(store, _)| store)
                .ok_or_else(|| ClientError::Config("no local data directory".to_string()))?,
        };
        let key_path = match &self.key_path {
            Some(path) => path.clone(),
            None => store_path.with_extension("key"),
        };
        Ok((store_path, key_path))
    }

    /// Builds a manager backed by the protected file store and the
    /// environment refresher.
    pub fn build_manager(&self) -> ClientResult<Arc<LicenseManager>> {
        let (store_path, key_path) = self.resolve_paths()?;
        let store = FileLicenseStore::new(store_path, platform_protector(key_path));
        let refresher = EnvRefresher::with_vars(&self.token_env, &self.expires_env);
        Ok(Arc::new(LicenseManager::new(
            Arc::new(store),
            Arc::new(refresher),
        )))
    }

    /// Builds a ready-to-use client.
    pub fn build(&self) -> ClientResult<LicensedClient> {
        if self.base_url.trim().is_empty() {
            return Err(ClientError::Config("base_url is empty".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;
        Ok(LicensedClient::new(http, &self.base_url, self.build_manager()?))
    }
}
