//! Signed license tokens for AI Invoice.
//!
//! This crate handles:
//! - The license payload and its signed envelope
//! - Canonical JSON and the transport token encoding
//! - Offline issuing with an Ed25519 private key
//! - Server-side verification: signature, expiry, revocation, feature flags
//!
//! # Token Format
//!
//! A transport token is `base64url(canonical_json(envelope))`:
//!
//! ```text
//! { "algorithm": "ed25519", "payload": {...}, "signature": "...", "version": 1 }
//! ```
//!
//! The signature covers the canonical JSON of the payload. The payload
//! contains the tenant, feature flags, issue and expiry timestamps, a token
//! id, an optional key id and optional device bindings.
//!
//! Clients treat the token as an opaque string and send it in the
//! [`LICENSE_HEADER`] request header.

mod claims;
mod error;
mod issuer;
mod payload;
mod revocation;
mod token;
mod verifier;

pub use claims::LicenseClaims;
pub use error::{DenialClass, LicenseError, LicenseResult};
pub use issuer::{IssueRequest, IssuedLicense, Issuer};
pub use payload::{format_timestamp, parse_timestamp, LicensePayload, TenantInfo};
pub use revocation::RevocationList;
pub use token::{canonical_json, LicenseEnvelope, ALGORITHM, ENVELOPE_VERSION};
pub use verifier::{KeySource, LicenseVerifier, DEFAULT_KEY_ID};

/// The one request header that carries the transport token, end to end.
pub const LICENSE_HEADER: &str = "X-License";
