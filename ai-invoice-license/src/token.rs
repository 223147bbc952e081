//! Transport token encoding.
//!
//! A token is `base64url(canonical_json(envelope))` where the envelope is:
//!
//! ```text
//! { "algorithm": "ed25519", "payload": {...}, "signature": "<base64url>", "version": 1 }
//! ```
//!
//! The signature covers `canonical_json(payload)`. Canonical JSON sorts
//! object keys at every level and carries no insignificant whitespace, so the
//! signed bytes can be rebuilt from the decoded payload on any platform.

use crate::error::{LicenseError, LicenseResult};
use base64::{
    alphabet,
    engine::{general_purpose::URL_SAFE, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Envelope format version.
pub const ENVELOPE_VERSION: u64 = 1;

/// The only supported signature algorithm.
pub const ALGORITHM: &str = "ed25519";

/// Accepts padded and unpadded base64url.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A signed license artifact: the payload plus its detached signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseEnvelope {
    /// Envelope format version.
    pub version: u64,
    /// Signature algorithm.
    pub algorithm: String,
    /// The signed payload, kept as raw JSON so the signed bytes can be rebuilt exactly.
    pub payload: Value,
    /// base64url signature over `canonical_json(payload)`.
    pub signature: String,
}

impl LicenseEnvelope {
    /// Encodes the envelope into a transport token.
    pub fn encode(&self) -> LicenseResult<String> {
        let bytes = canonical_json(self)?;
        Ok(URL_SAFE.encode(bytes))
    }

    /// Decodes a transport token into an envelope.
    ///
    /// Only the envelope structure is checked here; the signature and
    /// payload schema are checked by the verifier.
    pub fn decode(token: &str) -> LicenseResult<Self> {
        let bytes = URL_SAFE_LENIENT
            .decode(token.trim())
            .map_err(|_| LicenseError::Malformed("token is not valid base64".to_string()))?;

        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|_| LicenseError::Malformed("token did not decode to JSON".to_string()))?;

        let Value::Object(mut object) = value else {
            return Err(LicenseError::Malformed(
                "token must decode to an object".to_string(),
            ));
        };

        if object.get("algorithm").and_then(Value::as_str) != Some(ALGORITHM) {
            return Err(LicenseError::Malformed(
                "unsupported license algorithm".to_string(),
            ));
        }
        if object.get("version").and_then(Value::as_u64) != Some(ENVELOPE_VERSION) {
            return Err(LicenseError::Malformed(
                "unsupported license version".to_string(),
            ));
        }

        let payload = object.remove("payload").filter(Value::is_object);
        let signature = object
            .remove("signature")
            .and_then(|s| s.as_str().map(str::to_string));

        match (payload, signature) {
            (Some(payload), Some(signature)) => Ok(Self {
                version: ENVELOPE_VERSION,
                algorithm: ALGORITHM.to_string(),
                payload,
                signature,
            }),
            _ => Err(LicenseError::Malformed(
                "malformed license artifact".to_string(),
            )),
        }
    }

    /// Decodes the detached signature bytes.
    pub fn signature_bytes(&self) -> LicenseResult<Vec<u8>> {
        decode_b64(&self.signature)
            .map_err(|_| LicenseError::Malformed("signature is not base64 encoded".to_string()))
    }

    /// Returns the bytes the signature covers.
    pub fn signed_bytes(&self) -> LicenseResult<Vec<u8>> {
        canonical_json(&self.payload)
    }

    /// Returns the `key_id` embedded in the payload, if any.
    #[must_use]
    pub fn key_id(&self) -> Option<&str> {
        self.payload.get("key_id").and_then(Value::as_str)
    }
}

/// Serializes a value to canonical JSON bytes.
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> LicenseResult<Vec<u8>> {
    let value = serde_json::to_value(value)?;
    Ok(serde_json::to_vec(&sorted(value))?)
}

/// base64url-encodes with padding.
pub(crate) fn encode_b64(bytes: &[u8]) -> String {
    URL_SAFE.encode(bytes)
}

pub(crate) fn decode_b64(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_LENIENT.decode(encoded.trim())
}

// Rebuilds every object with keys inserted in sorted order, so the output
// does not depend on whether serde_json keeps insertion order.
fn sorted(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut out = Map::with_capacity(entries.len());
            for (key, value) in entries {
                out.insert(key, sorted(value));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        other => other,
    }
}
