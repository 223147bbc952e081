//! License enforcement for axum routers.

use crate::error::GateError;
use crate::state::GateState;
use ai_invoice_license::{LicenseError, LICENSE_HEADER};
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use std::sync::Arc;
use tracing::debug;

/// Middleware state: the verifier plus the feature a router requires.
#[derive(Clone)]
pub struct LicenseGate {
    state: GateState,
    feature: Option<Arc<str>>,
}

impl LicenseGate {
    /// `None` only checks that the license is valid.
    pub fn new(state: GateState, feature: Option<&str>) -> Self {
        Self {
            state,
            feature: feature.map(Arc::from),
        }
    }
}

/// Reads the license token from the canonical header.
pub(crate) fn license_token(headers: &HeaderMap) -> Result<&str, LicenseError> {
    let value = headers.get(LICENSE_HEADER).ok_or(LicenseError::MissingToken)?;
    value
        .to_str()
        .map_err(|_| LicenseError::Malformed("license header is not valid text".to_string()))
}

/// Verifies the request's license and stores the claims as an extension.
pub async fn require_license(
    State(gate): State<LicenseGate>,
    mut request: Request,
    next: Next,
) -> Result<Response, GateError> {
    let token = license_token(request.headers())?;
    let claims = match gate.feature.as_deref() {
        Some(feature) => gate.state.verifier.verify(token, feature)?,
        None => gate.state.verifier.verify_token(token)?,
    };

    debug!(
        tenant = claims.tenant_id(),
        token_id = claims.token_id(),
        feature = gate.feature.as_deref(),
        "license accepted"
    );
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Puts every route of `router` behind the license check.
pub fn gated<S>(router: Router<S>, state: GateState, feature: Option<&str>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn_with_state(
        LicenseGate::new(state, feature),
        require_license,
    ))
}
