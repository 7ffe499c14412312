//! Authenticated client for the upstream quotable API.
//!
//! [`UpstreamClient`] attaches the bearer token from [`TokenCache`], issues
//! the GET and classifies the outcome:
//!
//! | Outcome | Error |
//! |---|---|
//! | 2xx with JSON body | none, body returned as-is |
//! | non-2xx | [`QuotegateError::UpstreamStatus`] |
//! | timeout | [`QuotegateError::UpstreamTimeout`] |
//! | connection / body failure | [`QuotegateError::UpstreamUnavailable`] |
//!
//! A 401 additionally invalidates the cached token so the next request logs
//! in again. The failing request itself is not retried.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::warn;

use crate::auth::TokenCache;
use crate::telemetry;
use crate::{QuotegateError, Result};

/// Default base URL for the quotable API
pub const DEFAULT_BASE_URL: &str = "https://quotable.box.podego.com";

/// Client for the upstream API.
#[derive(Clone)]
pub struct UpstreamClient {
    http: Client,
    base_url: String,
    tokens: Arc<TokenCache>,
}

impl UpstreamClient {
    pub fn new(http: Client, tokens: Arc<TokenCache>) -> Self {
        Self::with_base_url(http, tokens, DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(http: Client, tokens: Arc<TokenCache>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `endpoint` with `query`, returning the upstream JSON body.
    ///
    /// # Arguments
    /// * `endpoint` - Path below the base URL (e.g. `metrics/api_requests`)
    /// * `query` - Query parameters, forwarded in order
    /// * `timeout` - Per-request timeout; `None` uses the client default
    pub async fn get(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
        timeout: Option<Duration>,
    ) -> Result<Value> {
        let token = self.tokens.get_token().await?;
        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));

        let mut request = self
            .http
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, token.bearer());
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let start = Instant::now();
        let result = self.send(endpoint, request).await;
        metrics::histogram!(telemetry::UPSTREAM_DURATION_SECONDS, "endpoint" => endpoint.to_string())
            .record(start.elapsed().as_secs_f64());
        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(telemetry::UPSTREAM_REQUESTS_TOTAL,
            "endpoint" => endpoint.to_string(), "status" => status)
        .increment(1);

        if let Err(QuotegateError::UpstreamStatus { status: 401, .. }) = &result {
            self.tokens.invalidate(&token).await;
        }
        result
    }

    async fn send(&self, endpoint: &str, request: reqwest::RequestBuilder) -> Result<Value> {
        let response = request
            .send()
            .await
            .map_err(|e| classify_transport_error(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(endpoint, status, response).await);
        }

        response
            .json()
            .await
            .map_err(|e| classify_transport_error(endpoint, e))
    }
}

/// Build an [`QuotegateError::UpstreamStatus`], keeping the body only if it
/// is valid JSON.
async fn status_error(
    endpoint: &str,
    status: StatusCode,
    response: reqwest::Response,
) -> QuotegateError {
    warn!(endpoint, status = status.as_u16(), "upstream returned error status");
    let body = response
        .bytes()
        .await
        .ok()
        .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).ok());
    QuotegateError::UpstreamStatus {
        status: status.as_u16(),
        body,
    }
}

fn classify_transport_error(endpoint: &str, err: reqwest::Error) -> QuotegateError {
    if err.is_timeout() {
        warn!(endpoint, "upstream request timed out");
        return QuotegateError::UpstreamTimeout;
    }
    let err = err.without_url();
    warn!(endpoint, error = %err, "upstream request failed");
    QuotegateError::UpstreamUnavailable(err.to_string())
}
