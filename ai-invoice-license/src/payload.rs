//! The signed license payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The tenant a license is issued to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TenantInfo {
    /// Tenant identifier. Also the subject used for subject revocation.
    pub id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free-form tenant metadata.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Decoded license payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LicensePayload {
    /// Licensed tenant.
    pub tenant: TenantInfo,
    /// Granted feature flags.
    #[serde(default)]
    pub features: Vec<String>,
    /// When the license was issued.
    #[serde(with = "timestamp")]
    pub issued_at: DateTime<Utc>,
    /// When the license stops being valid.
    #[serde(with = "timestamp")]
    pub expires_at: DateTime<Utc>,
    /// Unique token id, used for targeted revocation.
    pub token_id: String,
    /// Id of the key that signed this payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    /// Device bindings. Also read from a single-string `device` key.
    #[serde(
        default,
        alias = "device",
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub devices: Vec<String>,
    /// Human-readable certificate metadata (contract or business name).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<Map<String, Value>>,
}

impl LicensePayload {
    /// Returns true if the license is expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Formats a timestamp the way it is embedded in payloads: `2026-01-01T00:00:00Z`.
#[must_use]
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Parses an RFC 3339 timestamp, or a naive ISO-8601 one taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn one_or_many<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(device)) => vec![device],
        Some(OneOrMany::Many(devices)) => devices,
        None => Vec::new(),
    })
}

mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}
