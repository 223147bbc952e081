//! Server-side license verification.
//!
//! Verification runs in a fixed order, and the first failing step decides
//! the error:
//!
//! 1. decode the token into an envelope (`Malformed`)
//! 2. resolve the public key by the embedded key id (`UnknownKey`)
//! 3. verify the signature over the canonical payload (`InvalidSignature`)
//! 4. check `expires_at > now` (`Expired`)
//! 5. check the token id, then the subject, against the revocation list (`Revoked`)
//! 6. check the required feature flag (`FeatureNotLicensed`)
//!
//! Parsed public keys are cached by key id. The cache is only cleared by
//! [`LicenseVerifier::reset_key_cache`]; operators call it after swapping
//! key material.

use crate::claims::{normalize_features, LicenseClaims};
use crate::error::{LicenseError, LicenseResult};
use crate::payload::{format_timestamp, LicensePayload};
use crate::revocation::RevocationList;
use crate::token::LicenseEnvelope;
use chrono::{DateTime, Utc};
use ed25519_dalek::pkcs8::spki::DecodePublicKey;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};

/// Key id used for tokens that do not embed one.
pub const DEFAULT_KEY_ID: &str = "default";

/// Where a PEM-encoded Ed25519 public key comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// A PEM file on disk, re-read after each cache reset.
    Path(PathBuf),
    /// An inline PEM string.
    Pem(String),
}

impl KeySource {
    fn load(&self) -> LicenseResult<VerifyingKey> {
        let pem = match self {
            Self::Path(path) => std::fs::read_to_string(path).map_err(|e| {
                LicenseError::KeyUnavailable(format!(
                    "public key file {} could not be read: {e}",
                    path.display()
                ))
            })?,
            Self::Pem(pem) => pem.clone(),
        };

        VerifyingKey::from_public_key_pem(pem.trim()).map_err(|_| {
            LicenseError::KeyUnavailable("public key is not a valid Ed25519 PEM key".to_string())
        })
    }
}

/// Validates license tokens against configured Ed25519 public keys.
#[derive(Debug)]
pub struct LicenseVerifier {
    sources: HashMap<String, KeySource>,
    cache: RwLock<HashMap<String, VerifyingKey>>,
    revocations: RevocationList,
}

impl LicenseVerifier {
    /// Creates a verifier with no keys and an empty revocation list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
            cache: RwLock::new(HashMap::new()),
            revocations: RevocationList::default(),
        }
    }

    /// Creates a verifier whose default key is read from a PEM file.
    ///
    /// # Errors
    ///
    /// Returns `KeyUnavailable` if the file does not exist.
    pub fn from_public_key_path(path: impl Into<PathBuf>) -> LicenseResult<Self> {
        let path = path.into();
        if !path.exists() {
            return Err(LicenseError::KeyUnavailable(format!(
                "public key not found at {}",
                path.display()
            )));
        }
        Ok(Self::new().with_key(DEFAULT_KEY_ID, KeySource::Path(path)))
    }

    /// Creates a verifier whose default key is an inline PEM string.
    ///
    /// # Errors
    ///
    /// Returns `KeyUnavailable` if the string is blank.
    pub fn from_public_key_pem(pem: &str) -> LicenseResult<Self> {
        let pem = pem.trim();
        if pem.is_empty() {
            return Err(LicenseError::KeyUnavailable(
                "public key string must not be empty".to_string(),
            ));
        }
        Ok(Self::new().with_key(DEFAULT_KEY_ID, KeySource::Pem(pem.to_string())))
    }

    /// Registers a key source under a key id, replacing any previous one.
    #[must_use]
    pub fn with_key(mut self, key_id: impl Into<String>, source: KeySource) -> Self {
        self.sources.insert(key_id.into(), source);
        self
    }

    /// Sets the revocation list.
    #[must_use]
    pub fn with_revocations(mut self, revocations: RevocationList) -> Self {
        self.revocations = revocations;
        self
    }

    /// Returns the revocation list consulted on every call.
    #[must_use]
    pub fn revocations(&self) -> &RevocationList {
        &self.revocations
    }

    /// Verifies a token and requires a feature flag.
    pub fn verify(&self, token: &str, required_feature: &str) -> LicenseResult<LicenseClaims> {
        self.verify_at(token, Some(required_feature), Utc::now())
    }

    /// Verifies a token without gating on a feature flag.
    pub fn verify_token(&self, token: &str) -> LicenseResult<LicenseClaims> {
        self.verify_at(token, None, Utc::now())
    }

    /// Verifies a token against an explicit clock.
    pub fn verify_at(
        &self,
        token: &str,
        required_feature: Option<&str>,
        now: DateTime<Utc>,
    ) -> LicenseResult<LicenseClaims> {
        let required_feature = match required_feature.map(str::trim) {
            Some("") => return Err(LicenseError::InvalidFeature(String::new())),
            other => other,
        };

        if token.trim().is_empty() {
            return Err(LicenseError::MissingToken);
        }

        let envelope = LicenseEnvelope::decode(token)?;

        let key_id = envelope.key_id().unwrap_or(DEFAULT_KEY_ID).to_string();
        let verifying_key = self.resolve_key(&key_id)?;

        let signature = Signature::from_slice(&envelope.signature_bytes()?)
            .map_err(|_| LicenseError::InvalidSignature)?;
        verifying_key
            .verify(&envelope.signed_bytes()?, &signature)
            .map_err(|_| LicenseError::InvalidSignature)?;

        let payload: LicensePayload = serde_json::from_value(envelope.payload)
            .map_err(|e| LicenseError::Malformed(format!("license payload is malformed: {e}")))?;

        if payload.is_expired_at(now) {
            return Err(LicenseError::Expired(format_timestamp(&payload.expires_at)));
        }

        if self.revocations.is_token_revoked(&payload.token_id) {
            debug!("Rejected revoked token id {}", payload.token_id);
            return Err(LicenseError::Revoked(format!("token {}", payload.token_id)));
        }
        if self.revocations.is_subject_revoked(&payload.tenant.id) {
            debug!("Rejected token for revoked subject {}", payload.tenant.id);
            return Err(LicenseError::Revoked(format!("subject {}", payload.tenant.id)));
        }

        if let Some(feature) = required_feature {
            let granted = normalize_features(&payload.features);
            if !granted.contains(feature) {
                return Err(LicenseError::FeatureNotLicensed(feature.to_string()));
            }
        }

        Ok(LicenseClaims::from_payload(payload))
    }

    /// Drops every cached public key. The next verification re-reads key sources.
    pub fn reset_key_cache(&self) {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let dropped = cache.len();
        cache.clear();
        info!("License public key cache reset ({} keys dropped)", dropped);
    }

    /// Key ids currently held in the cache.
    #[must_use]
    pub fn cached_key_ids(&self) -> Vec<String> {
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<String> = cache.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn resolve_key(&self, key_id: &str) -> LicenseResult<VerifyingKey> {
        if let Some(key) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key_id)
        {
            return Ok(*key);
        }

        let source = self
            .sources
            .get(key_id)
            .ok_or_else(|| LicenseError::UnknownKey(key_id.to_string()))?;
        let key = source.load()?;

        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key_id.to_string(), key);
        debug!("Cached license public key '{}'", key_id);
        Ok(key)
    }
}

impl Default for LicenseVerifier {
    fn default() -> Self {
        Self::new()
    }
}
