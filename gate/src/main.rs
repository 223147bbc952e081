//! AI Invoice license gate
//!
//! Serves the license-gated HTTP boundary: verifies the `X-License` header
//! of incoming requests against the configured Ed25519 public key and
//! revocation lists.
//!
//! Usage:
//!   LICENSE_PUBLIC_KEY_PATH=license_public.pem ai-invoice-gate --port 8088

use ai_invoice_gate::{build_router, GateConfig, GateState};
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let config = GateConfig::parse();
    let log_level = if config.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("AI Invoice license gate starting...");
    let verifier = config
        .build_verifier()
        .context("Failed to configure license verification")?;
    info!(
        revocations = verifier.revocations().len(),
        "License verifier ready"
    );

    let mut state = GateState::new(verifier);
    if let Some(key) = &config.admin_api_key {
        state = state.with_admin_key(key.clone());
    }
    if state.admin_api_key.is_none() {
        info!("Administrative API disabled (ADMIN_API_KEY not set)");
    }

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind HTTP port {}", config.port))?;
    info!("HTTP listening on port {}", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("AI Invoice license gate stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
