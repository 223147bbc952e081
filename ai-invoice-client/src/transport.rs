//! HTTP client that carries the license and refreshes it once on rejection.

use crate::error::{ClientError, ClientResult, LicenseFailure, LicenseFailureReason};
use crate::manager::LicenseManager;
use crate::refresher::RefreshContext;
use ai_invoice_license::LICENSE_HEADER;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Per-request refresh state. Never shared between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshState {
    NotAttempted,
    Attempted,
}

/// Sends requests with the current license attached.
///
/// A 401 or 403 triggers at most one refresh and one retry for that request.
pub struct LicensedClient {
    http: Client,
    base_url: String,
    manager: Arc<LicenseManager>,
    header: HeaderName,
}

impl LicensedClient {
    pub fn new(http: Client, base_url: impl Into<String>, manager: Arc<LicenseManager>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            manager,
            header: HeaderName::from_static("x-license"),
        }
    }

    pub fn manager(&self) -> &Arc<LicenseManager> {
        &self.manager
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Joins `path` onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Sends a request built by `build`, returning the successful response.
    ///
    /// `build` runs once per attempt so the retry carries the refreshed token.
    /// Non-2xx statuses other than 401/403 are returned as
    /// [`ClientError::Status`] and are not retried.
    pub async fn send<F>(
        &self,
        operation: &str,
        build: F,
        cancel: &CancellationToken,
    ) -> ClientResult<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut refresh = RefreshState::NotAttempted;

        loop {
            let response = self.attempt(&build, cancel).await?;
            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }
            let body = read_body(response).await;

            if !is_license_status(status) {
                return Err(ClientError::Status {
                    operation: operation.to_string(),
                    status: status.as_u16(),
                    body,
                });
            }

            if refresh == RefreshState::Attempted {
                let reason = LicenseFailureReason::from_status(status.as_u16())
                    .unwrap_or(LicenseFailureReason::Unauthorized);
                warn!(operation, status = status.as_u16(), "request rejected after license refresh");
                return Err(failure(operation, status, reason, body));
            }
            refresh = RefreshState::Attempted;

            debug!(operation, status = status.as_u16(), "request rejected, refreshing license");
            let context = RefreshContext::new(operation)
                .with_status(status.as_u16())
                .with_body(body.clone());
            if self.manager.refresh(&context, cancel).await {
                continue;
            }
            if cancel.is_cancelled() {
                return Err(ClientError::Cancelled);
            }
            warn!(operation, status = status.as_u16(), "request rejected and no new license available");
            return Err(failure(
                operation,
                status,
                LicenseFailureReason::RefreshFailed,
                body,
            ));
        }
    }

    /// GETs `path` and decodes a JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        cancel: &CancellationToken,
    ) -> ClientResult<T> {
        let url = self.url(path);
        let response = self.send(operation, |http| http.get(&url), cancel).await?;
        decode(operation, response).await
    }

    /// POSTs `body` as JSON to `path` and decodes a JSON body.
    pub async fn post_json<B, T>(
        &self,
        operation: &str,
        path: &str,
        body: &B,
        cancel: &CancellationToken,
    ) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let response = self
            .send(operation, |http| http.post(&url).json(body), cancel)
            .await?;
        decode(operation, response).await
    }

    async fn attempt<F>(&self, build: &F, cancel: &CancellationToken) -> ClientResult<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let token = self.manager.get_token(cancel).await?;
        let mut request = build(&self.http).build()?;

        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&token)
                .map_err(|_| ClientError::InvalidArtifact("token is not a valid header value".into()))?;
            value.set_sensitive(true);
            request.headers_mut().insert(self.header.clone(), value);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ClientError::Cancelled),
            response = self.http.execute(request) => Ok(response?),
        }
    }
}

impl std::fmt::Debug for LicensedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicensedClient")
            .field("base_url", &self.base_url)
            .field("header", &LICENSE_HEADER)
            .finish()
    }
}

fn is_license_status(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

/// Reads the body once; read failures become an empty body.
async fn read_body(response: Response) -> String {
    match response.text().await {
        Ok(body) => body,
        Err(e) => {
            debug!("could not read response body: {e}");
            String::new()
        }
    }
}

fn failure(
    operation: &str,
    status: StatusCode,
    reason: LicenseFailureReason,
    body: String,
) -> ClientError {
    ClientError::License(LicenseFailure {
        operation: operation.to_string(),
        status: status.as_u16(),
        reason,
        body,
    })
}

async fn decode<T: DeserializeOwned>(operation: &str, response: Response) -> ClientResult<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode {
        operation: operation.to_string(),
        message: e.to_string(),
    })
}
