use crate::error::GateError;
use crate::middleware::{gated, license_token};
use crate::state::GateState;
use crate::ADMIN_TOKEN_HEADER;
use ai_invoice_license::LicenseClaims;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Json;
use axum::routing::{get, post};
use axum::{Extension, Router};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FeatureStatus {
    pub feature: String,
    pub licensed: bool,
    pub tenant_id: String,
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn license_info(Extension(claims): Extension<LicenseClaims>) -> Json<LicenseClaims> {
    Json(claims)
}

async fn check_feature(
    State(state): State<GateState>,
    Path(feature): Path<String>,
    headers: HeaderMap,
) -> Result<Json<FeatureStatus>, GateError> {
    let token = license_token(&headers)?;
    let claims = state.verifier.verify(token, &feature)?;
    Ok(Json(FeatureStatus {
        feature: feature.trim().to_string(),
        licensed: true,
        tenant_id: claims.tenant_id().to_string(),
    }))
}

async fn reset_key_cache(
    State(state): State<GateState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, GateError> {
    let expected = state.admin_api_key.as_ref().ok_or(GateError::AdminDisabled)?;
    let supplied = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(GateError::InvalidAdminToken)?;
    if !constant_time_compare(expected.expose_secret(), supplied) {
        return Err(GateError::InvalidAdminToken);
    }

    state.verifier.reset_key_cache();
    info!("license key cache reset by administrator");
    Ok(Json(serde_json::json!({ "status": "reset" })))
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Build the HTTP router with the given gate state.
pub fn build_router(state: GateState) -> Router {
    let licensed = gated(
        Router::new().route("/api/v1/license", get(license_info)),
        state.clone(),
        None,
    );

    Router::new()
        .route("/health", get(health))
        .route("/api/v1/license/features/{feature}", get(check_feature))
        .route("/api/v1/admin/license/reset-key-cache", post(reset_key_cache))
        .merge(licensed)
        .with_state(state)
}
