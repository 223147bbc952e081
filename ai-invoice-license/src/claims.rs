//! Validated claim set returned by the verifier.

use crate::payload::{LicensePayload, TenantInfo};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Claims of a license that passed verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseClaims {
    tenant: TenantInfo,
    features: BTreeSet<String>,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    token_id: String,
    key_id: Option<String>,
    devices: Vec<String>,
}

impl LicenseClaims {
    pub(crate) fn from_payload(payload: LicensePayload) -> Self {
        Self {
            features: normalize_features(&payload.features),
            tenant: payload.tenant,
            issued_at: payload.issued_at,
            expires_at: payload.expires_at,
            token_id: payload.token_id,
            key_id: payload.key_id,
            devices: payload.devices,
        }
    }

    /// Tenant id (the license subject).
    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.tenant.id
    }

    /// Tenant display name.
    #[must_use]
    pub fn tenant_name(&self) -> Option<&str> {
        self.tenant.name.as_deref()
    }

    /// Full tenant record.
    #[must_use]
    pub fn tenant(&self) -> &TenantInfo {
        &self.tenant
    }

    /// Granted feature flags.
    #[must_use]
    pub fn features(&self) -> &BTreeSet<String> {
        &self.features
    }

    /// Returns true if the feature flag is granted.
    #[must_use]
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.contains(feature.trim())
    }

    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    #[must_use]
    pub fn token_id(&self) -> &str {
        &self.token_id
    }

    #[must_use]
    pub fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    /// Device bindings.
    #[must_use]
    pub fn devices(&self) -> &[String] {
        &self.devices
    }
}

pub(crate) fn normalize_features(features: &[String]) -> BTreeSet<String> {
    features
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}
