//! Arguments and helpers for the offline issuing CLI.

use ai_invoice_license::{parse_timestamp, IssueRequest, IssuedLicense};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Generate signed license artifacts for tenants.
#[derive(Parser, Debug, Clone)]
#[command(name = "ai-invoice-issue")]
#[command(about = "Generate signed AI Invoice license artifacts")]
pub struct IssueArgs {
    /// Path to the PEM-encoded (PKCS#8) Ed25519 private key
    #[arg(long)]
    pub private_key: PathBuf,

    /// Tenant identifier embedded in the license
    #[arg(long)]
    pub tenant_id: String,

    /// Human-friendly tenant label
    #[arg(long)]
    pub tenant_name: Option<String>,

    /// Additional tenant metadata (repeatable)
    #[arg(long = "meta", value_name = "KEY=VALUE")]
    pub meta: Vec<String>,

    /// Feature flag to enable (repeatable)
    #[arg(long = "feature")]
    pub features: Vec<String>,

    /// Expiry as RFC 3339 or YYYY-MM-DD (dates mean end of day UTC)
    #[arg(long)]
    pub expires: String,

    /// Override the issue timestamp (defaults to now)
    #[arg(long)]
    pub issued_at: Option<String>,

    /// Device binding identifier (repeatable)
    #[arg(long = "device")]
    pub devices: Vec<String>,

    /// Identifier of the signing key
    #[arg(long)]
    pub key_id: Option<String>,

    /// Explicit token id (defaults to a random UUID)
    #[arg(long)]
    pub token_id: Option<String>,

    /// Print only the transport token
    #[arg(long)]
    pub token_only: bool,

    /// Also write the artifact JSON to this file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl IssueArgs {
    /// Builds the issue request described by the arguments.
    pub fn to_request(&self) -> Result<IssueRequest> {
        let expires_at = parse_datetime(&self.expires, true).context("--expires")?;
        let mut request = IssueRequest::new(self.tenant_id.clone(), expires_at)
            .features(self.features.iter().cloned());

        if let Some(raw) = &self.issued_at {
            request = request.issued_at(parse_datetime(raw, false).context("--issued-at")?);
        }
        if let Some(name) = self.tenant_name.as_deref().filter(|n| !n.trim().is_empty()) {
            request = request.tenant_name(name.trim());
        }
        for (key, value) in parse_metadata(&self.meta)? {
            request = request.metadata(key, value);
        }
        for device in &self.devices {
            request = request.device(device.clone());
        }
        if let Some(key_id) = self.key_id.as_deref().filter(|k| !k.trim().is_empty()) {
            request = request.key_id(key_id.trim());
        }
        if let Some(token_id) = self.token_id.as_deref().filter(|t| !t.trim().is_empty()) {
            request = request.token_id(token_id.trim());
        }
        Ok(request)
    }

    /// Renders what goes to stdout for an issued license.
    pub fn render(&self, issued: &IssuedLicense) -> Result<String> {
        if self.token_only {
            return Ok(issued.token.clone());
        }
        let text = if self.pretty {
            serde_json::to_string_pretty(issued)?
        } else {
            serde_json::to_string(issued)?
        };
        Ok(text)
    }
}

/// Parses RFC 3339, naive ISO-8601 (as UTC) or a bare date.
///
/// A bare date is midnight, or 23:59:59 when `end_of_day` is set.
pub fn parse_datetime(value: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let time = if end_of_day {
            date.and_hms_opt(23, 59, 59)
        } else {
            date.and_hms_opt(0, 0, 0)
        };
        if let Some(time) = time {
            return Ok(time.and_utc());
        }
    }
    match parse_timestamp(value) {
        Some(parsed) => Ok(parsed),
        None => bail!("'{value}' must be an RFC 3339 timestamp or YYYY-MM-DD"),
    }
}

/// Parses repeated `KEY=VALUE` entries.
pub fn parse_metadata(entries: &[String]) -> Result<Map<String, Value>> {
    let mut metadata = Map::new();
    for entry in entries {
        let Some((key, value)) = entry.split_once('=') else {
            bail!("metadata entries must be KEY=VALUE, got '{entry}'");
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("metadata keys must be non-empty");
        }
        metadata.insert(key.to_string(), Value::String(value.trim().to_string()));
    }
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn args(extra: &[&str]) -> IssueArgs {
        let mut argv = vec![
            "ai-invoice-issue",
            "--private-key",
            "key.pem",
            "--tenant-id",
            "tenant-1",
            "--expires",
            "2027-03-31",
        ];
        argv.extend_from_slice(extra);
        IssueArgs::parse_from(argv)
    }

    #[test]
    fn bare_expiry_date_is_end_of_day() {
        let parsed = parse_datetime("2027-03-31", true).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2027, 3, 31, 23, 59, 59).unwrap());
        let start = parse_datetime("2027-03-31", false).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2027, 3, 31, 0, 0, 0).unwrap());
    }

    #[test]
    fn timestamps_are_accepted() {
        let parsed = parse_datetime("2027-03-31T10:00:00+02:00", true).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2027, 3, 31, 8, 0, 0).unwrap());
        assert!(parse_datetime("soon", true).is_err());
    }

    #[test]
    fn metadata_requires_key_value() {
        let parsed = parse_metadata(&["region = eu".to_string()]).unwrap();
        assert_eq!(parsed["region"], "eu");
        assert!(parse_metadata(&["novalue".to_string()]).is_err());
        assert!(parse_metadata(&["=x".to_string()]).is_err());
    }

    #[test]
    fn request_carries_every_flag() {
        let request = args(&[
            "--tenant-name",
            "Acme",
            "--feature",
            "extract",
            "--feature",
            "predict",
            "--device",
            "laptop",
            "--key-id",
            "2027",
            "--token-id",
            "jti-9",
            "--meta",
            "plan=pro",
            "--issued-at",
            "2027-01-01",
        ])
        .to_request()
        .unwrap();

        assert_eq!(request.tenant_id, "tenant-1");
        assert_eq!(request.tenant_name.as_deref(), Some("Acme"));
        assert_eq!(request.features, vec!["extract", "predict"]);
        assert_eq!(request.devices, vec!["laptop"]);
        assert_eq!(request.key_id.as_deref(), Some("2027"));
        assert_eq!(request.token_id.as_deref(), Some("jti-9"));
        assert_eq!(request.tenant_metadata["plan"], "pro");
        assert_eq!(
            request.issued_at,
            Some(Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap())
        );
    }
}
