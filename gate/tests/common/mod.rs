//! Shared helpers for gate tests.

#![allow(dead_code)]

use ai_invoice_gate::{build_router, GateState};
use ai_invoice_license::{IssueRequest, Issuer, LicenseVerifier};
use chrono::{Duration, Utc};
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::spki::EncodePublicKey;
use ed25519_dalek::SigningKey;

pub const ADMIN_KEY: &str = "admin-secret";

pub fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[3u8; 32])
}

pub fn public_key_pem() -> String {
    signing_key()
        .verifying_key()
        .to_public_key_pem(LineEnding::LF)
        .unwrap()
}

pub fn verifier() -> LicenseVerifier {
    LicenseVerifier::from_public_key_pem(&public_key_pem()).unwrap()
}

pub fn issue(request: IssueRequest) -> String {
    Issuer::new(signing_key()).issue(request).unwrap().token
}

/// A token for `tenant-123` valid for a week.
pub fn token(features: &[&str]) -> String {
    issue(
        IssueRequest::new("tenant-123", Utc::now() + Duration::days(7))
            .tenant_name("Acme Co")
            .features(features.iter().copied()),
    )
}

/// Spin up the HTTP server on an OS-assigned port, returning the base URL.
pub async fn spawn_test_server(state: GateState) -> String {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{}", port)
}

pub async fn spawn_default_server() -> String {
    spawn_test_server(GateState::new(verifier()).with_admin_key(ADMIN_KEY)).await
}
