//! Offline license issuing CLI.
//!
//! Usage:
//!   ai-invoice-issue --private-key license_private.pem --tenant-id acme \
//!       --feature extract --feature predict --expires 2027-12-31
//!
//! Prints `{artifact, token}` JSON (or only the token with `--token-only`).

use ai_invoice_gate::IssueArgs;
use ai_invoice_license::Issuer;
use anyhow::{Context, Result};
use clap::Parser;

fn main() -> Result<()> {
    let args = IssueArgs::parse();

    let pem = std::fs::read_to_string(&args.private_key)
        .with_context(|| format!("Private key not found: {}", args.private_key.display()))?;
    let issuer = Issuer::from_pkcs8_pem(&pem).context("Failed to load private key")?;

    let request = args.to_request()?;
    let issued = issuer.issue(request).context("Failed to issue license")?;

    if let Some(path) = &args.output {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let artifact = if args.pretty {
            serde_json::to_string_pretty(&issued.artifact)?
        } else {
            serde_json::to_string(&issued.artifact)?
        };
        std::fs::write(path, artifact + "\n")
            .with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("Wrote license artifact to {}", path.display());
    }

    println!("{}", args.render(&issued)?);
    Ok(())
}
