//! Offline license issuing.
//!
//! The issuer holds the private Ed25519 key and never runs inside the
//! serving process. Only its public key is distributed to verifiers.

use crate::error::{LicenseError, LicenseResult};
use crate::payload::{LicensePayload, TenantInfo};
use crate::token::{canonical_json, encode_b64, LicenseEnvelope, ALGORITHM, ENVELOPE_VERSION};
use chrono::{DateTime, Utc};
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::spki::EncodePublicKey;
use ed25519_dalek::pkcs8::DecodePrivateKey;
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Everything needed to issue one license.
#[derive(Debug, Clone, Default)]
pub struct IssueRequest {
    pub tenant_id: String,
    pub tenant_name: Option<String>,
    pub tenant_metadata: Map<String, Value>,
    pub features: Vec<String>,
    /// Defaults to now.
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub devices: Vec<String>,
    pub key_id: Option<String>,
    /// Defaults to a random UUID.
    pub token_id: Option<String>,
    pub certificate: Option<Map<String, Value>>,
}

impl IssueRequest {
    /// Starts a request for a tenant expiring at `expires_at`.
    pub fn new(tenant_id: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            expires_at,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn tenant_name(mut self, name: impl Into<String>) -> Self {
        self.tenant_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn feature(mut self, feature: impl Into<String>) -> Self {
        self.features.push(feature.into());
        self
    }

    #[must_use]
    pub fn features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features.extend(features.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn device(mut self, device: impl Into<String>) -> Self {
        self.devices.push(device.into());
        self
    }

    #[must_use]
    pub fn issued_at(mut self, issued_at: DateTime<Utc>) -> Self {
        self.issued_at = Some(issued_at);
        self
    }

    #[must_use]
    pub fn key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    #[must_use]
    pub fn token_id(mut self, token_id: impl Into<String>) -> Self {
        self.token_id = Some(token_id.into());
        self
    }

    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.tenant_metadata.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn certificate(mut self, certificate: Map<String, Value>) -> Self {
        self.certificate = Some(certificate);
        self
    }
}

/// Output of the issuer: the signed artifact and its transport token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedLicense {
    pub artifact: LicenseEnvelope,
    pub token: String,
}

/// Signs license payloads with a private Ed25519 key.
pub struct Issuer {
    signing_key: SigningKey,
}

impl Issuer {
    /// Wraps an existing signing key.
    #[must_use]
    pub fn new(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }

    /// Parses an unencrypted PKCS#8 PEM private key.
    pub fn from_pkcs8_pem(pem: &str) -> LicenseResult<Self> {
        let signing_key = SigningKey::from_pkcs8_pem(pem.trim())
            .map_err(|e| LicenseError::SigningKey(e.to_string()))?;
        Ok(Self::new(signing_key))
    }

    /// The public half, for distribution to verifiers.
    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// The public key as a SubjectPublicKeyInfo PEM document.
    pub fn public_key_pem(&self) -> LicenseResult<String> {
        self.verifying_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| LicenseError::SigningKey(e.to_string()))
    }

    /// Builds, canonicalizes and signs a payload.
    pub fn issue(&self, request: IssueRequest) -> LicenseResult<IssuedLicense> {
        let tenant_id = request.tenant_id.trim();
        if tenant_id.is_empty() {
            return Err(LicenseError::InvalidRequest(
                "tenant id must not be empty".to_string(),
            ));
        }

        let issued_at = request.issued_at.unwrap_or_else(Utc::now);
        if request.expires_at <= issued_at {
            return Err(LicenseError::InvalidRequest(
                "expiry must be after the issue time".to_string(),
            ));
        }

        let payload = LicensePayload {
            tenant: TenantInfo {
                id: tenant_id.to_string(),
                name: request
                    .tenant_name
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty()),
                metadata: request.tenant_metadata,
            },
            features: clean_features(request.features),
            issued_at,
            expires_at: request.expires_at,
            token_id: non_blank(request.token_id)
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            key_id: non_blank(request.key_id),
            devices: clean_features(request.devices),
            certificate: request.certificate.filter(|c| !c.is_empty()),
        };

        self.sign(&payload)
    }

    /// Signs an already-built payload.
    pub fn sign(&self, payload: &LicensePayload) -> LicenseResult<IssuedLicense> {
        let payload = serde_json::to_value(payload)?;
        let signature = self.signing_key.sign(&canonical_json(&payload)?);

        let artifact = LicenseEnvelope {
            version: ENVELOPE_VERSION,
            algorithm: ALGORITHM.to_string(),
            payload,
            signature: encode_b64(&signature.to_bytes()),
        };
        let token = artifact.encode()?;
        Ok(IssuedLicense { artifact, token })
    }
}

impl std::fmt::Debug for Issuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Issuer")
            .field("signing_key", &"[REDACTED]")
            .finish()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trims, drops blanks and de-duplicates while keeping first-seen order.
fn clean_features(values: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !cleaned.iter().any(|c| c == value) {
            cleaned.push(value.to_string());
        }
    }
    cleaned
}
