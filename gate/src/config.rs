use ai_invoice_license::{
    KeySource, LicenseError, LicenseResult, LicenseVerifier, RevocationList, DEFAULT_KEY_ID,
};
use clap::Parser;
use std::path::PathBuf;

/// Runtime configuration for the gate, from flags or the environment.
#[derive(Parser, Debug, Clone)]
#[command(name = "ai-invoice-gate")]
#[command(about = "License-gated HTTP boundary for AI Invoice")]
pub struct GateConfig {
    /// HTTP port to listen on
    #[arg(short, long, env = "GATE_PORT", default_value = "8088")]
    pub port: u16,

    /// Path to the PEM-encoded license public key
    #[arg(long, env = "LICENSE_PUBLIC_KEY_PATH")]
    pub license_public_key_path: Option<PathBuf>,

    /// Inline PEM-encoded license public key
    #[arg(long, env = "LICENSE_PUBLIC_KEY", hide_env_values = true)]
    pub license_public_key: Option<String>,

    /// Key id the public key is registered under
    #[arg(long, env = "LICENSE_KEY_ID", default_value = DEFAULT_KEY_ID)]
    pub license_key_id: String,

    /// Comma-separated revoked token ids
    #[arg(long, env = "LICENSE_REVOKED_JTIS", default_value = "")]
    pub license_revoked_jtis: String,

    /// Comma-separated revoked subjects (tenant ids)
    #[arg(long, env = "LICENSE_REVOKED_SUBJECTS", default_value = "")]
    pub license_revoked_subjects: String,

    /// Token required by the administrative routes
    #[arg(long, env = "ADMIN_API_KEY", hide_env_values = true)]
    pub admin_api_key: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl GateConfig {
    /// Revocation list built from the two comma-separated settings.
    pub fn revocations(&self) -> RevocationList {
        RevocationList::from_entries(
            parse_list(&self.license_revoked_jtis),
            parse_list(&self.license_revoked_subjects),
        )
    }

    /// Builds the verifier. The key path wins over the inline key.
    ///
    /// The key is registered under `default` and, when different, under the
    /// configured key id, so tokens with and without a key id both resolve.
    pub fn build_verifier(&self) -> LicenseResult<LicenseVerifier> {
        let source = match (&self.license_public_key_path, &self.license_public_key) {
            (Some(path), _) => {
                if !path.exists() {
                    return Err(LicenseError::KeyUnavailable(format!(
                        "public key not found at {}",
                        path.display()
                    )));
                }
                KeySource::Path(path.clone())
            }
            (None, Some(pem)) if !pem.trim().is_empty() => KeySource::Pem(pem.trim().to_string()),
            _ => {
                return Err(LicenseError::KeyUnavailable(
                    "set LICENSE_PUBLIC_KEY_PATH or LICENSE_PUBLIC_KEY".to_string(),
                ));
            }
        };

        let key_id = self.license_key_id.trim();
        let mut verifier = LicenseVerifier::new().with_key(DEFAULT_KEY_ID, source.clone());
        if !key_id.is_empty() && key_id != DEFAULT_KEY_ID {
            verifier = verifier.with_key(key_id, source);
        }
        Ok(verifier.with_revocations(self.revocations()))
    }
}

/// Splits a comma-separated setting, dropping blanks.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_trims_and_drops_blanks() {
        assert_eq!(parse_list(" a, b ,,c "), vec!["a", "b", "c"]);
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn defaults_from_flags() {
        let config = GateConfig::parse_from(["ai-invoice-gate", "--license-public-key", "pem"]);
        assert_eq!(config.port, 8088);
        assert_eq!(config.license_key_id, "default");
        assert!(config.revocations().is_empty());
    }

    #[test]
    fn missing_key_is_reported() {
        let config = GateConfig::parse_from(["ai-invoice-gate"]);
        let err = config.build_verifier().unwrap_err();
        assert_eq!(err.reason(), "key_unavailable");
    }
}
