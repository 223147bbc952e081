use ai_invoice_license::{DenialClass, LicenseError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::warn;

/// Failures surfaced at the HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error(transparent)]
    License(#[from] LicenseError),

    #[error("invalid admin token")]
    InvalidAdminToken,

    #[error("administrative API is not configured")]
    AdminDisabled,
}

impl GateError {
    pub fn status(&self) -> StatusCode {
        match self {
            GateError::License(e) => match e.class() {
                DenialClass::Unauthorized => StatusCode::UNAUTHORIZED,
                DenialClass::Forbidden => StatusCode::FORBIDDEN,
                DenialClass::InvalidInput => StatusCode::BAD_REQUEST,
                DenialClass::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            },
            GateError::InvalidAdminToken => StatusCode::UNAUTHORIZED,
            GateError::AdminDisabled => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            GateError::License(e) => e.reason(),
            GateError::InvalidAdminToken => "invalid_admin_token",
            GateError::AdminDisabled => "admin_disabled",
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(status = status.as_u16(), reason = self.reason(), "request denied: {self}");
        let body = serde_json::json!({
            "detail": self.to_string(),
            "reason": self.reason(),
        });
        (status, Json(body)).into_response()
    }
}
