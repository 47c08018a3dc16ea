//! HTTP plumbing shared by every endpoint.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use url::Url;

use super::ApiError;
use super::types::ErrorBody;
use crate::config::ApiConfig;
use crate::models::SessionContext;

/// Client for the TyHub REST API.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

/// How a 401 answer should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Auth {
    /// The request carried a bearer token; a 401 means the session is over.
    Bearer,
    /// Credentials are in the body (sign-in); a 401 is an ordinary rejection.
    Credentials,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the underlying HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("tyhub-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// Build the URL for an endpoint from path segments.
    ///
    /// Segments are percent-encoded, so record ids can never escape their
    /// position in the path.
    pub(super) fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidEndpoint(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Start an unauthenticated request.
    pub(super) fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        Ok(self.inner.client.request(method, self.endpoint(segments)?))
    }

    /// Start a request carrying the session's bearer token.
    pub(super) fn authorized(
        &self,
        method: Method,
        segments: &[&str],
        session: &SessionContext,
    ) -> Result<RequestBuilder, ApiError> {
        Ok(self
            .request(method, segments)?
            .bearer_auth(session.access_token().expose_secret()))
    }

    /// Send a request and decode its JSON body.
    pub(super) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        auth: Auth,
    ) -> Result<T, ApiError> {
        let body = self.send(request, auth).await?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse API response"
            );
            ApiError::Parse(e)
        })
    }

    /// Send a request whose body is not needed.
    pub(super) async fn send_unit(&self, request: RequestBuilder, auth: Auth) -> Result<(), ApiError> {
        self.send(request, auth).await.map(drop)
    }

    async fn send(&self, request: RequestBuilder, auth: Auth) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let error = error_for_status(status, &body, auth);
        match &error {
            ApiError::Unauthorized => tracing::info!("API rejected the session token"),
            _ => tracing::warn!(
                status = %status,
                body = %body.chars().take(200).collect::<String>(),
                "API returned non-success status"
            ),
        }
        Err(error)
    }
}

/// Map a non-success response to an [`ApiError`].
fn error_for_status(status: StatusCode, body: &str, auth: Auth) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_default();

    match status {
        StatusCode::UNAUTHORIZED if auth == Auth::Bearer => ApiError::Unauthorized,
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        _ => ApiError::Rejected {
            status: status.as_u16(),
            message,
        },
    }
}
