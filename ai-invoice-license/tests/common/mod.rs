//! Shared test helpers for license tests.

#![allow(dead_code)]

use ai_invoice_license::{IssueRequest, Issuer, LicenseVerifier};
use chrono::{Duration, Utc};
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::spki::EncodePublicKey;
use ed25519_dalek::pkcs8::EncodePrivateKey;
use ed25519_dalek::SigningKey;

/// Returns a deterministic Ed25519 signing key from a fixed seed.
pub fn test_signing_key() -> SigningKey {
    let seed: [u8; 32] = [
        1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24,
        25, 26, 27, 28, 29, 30, 31, 32,
    ];
    SigningKey::from_bytes(&seed)
}

/// A second deterministic key that verifiers are never configured with.
pub fn rogue_signing_key() -> SigningKey {
    SigningKey::from_bytes(&[7u8; 32])
}

pub fn public_key_pem(signing_key: &SigningKey) -> String {
    signing_key
        .verifying_key()
        .to_public_key_pem(LineEnding::LF)
        .unwrap()
}

pub fn private_key_pem(signing_key: &SigningKey) -> String {
    signing_key.to_pkcs8_pem(LineEnding::LF).unwrap().to_string()
}

pub fn test_issuer() -> Issuer {
    Issuer::new(test_signing_key())
}

pub fn test_verifier() -> LicenseVerifier {
    LicenseVerifier::from_public_key_pem(&public_key_pem(&test_signing_key())).unwrap()
}

/// A request for `tenant-123` valid for 7 days with the given features.
pub fn request_with_features(features: &[&str]) -> IssueRequest {
    IssueRequest::new("tenant-123", Utc::now() + Duration::days(7))
        .tenant_name("Acme Co")
        .features(features.iter().copied())
}

/// Issues a token signed by the test key.
pub fn issue_token(features: &[&str]) -> String {
    test_issuer()
        .issue(request_with_features(features))
        .unwrap()
        .token
}
