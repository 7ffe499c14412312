//! Builder for configuring gateway instances

use std::sync::Arc;
use std::time::Duration;

use super::Gateway;
use crate::auth::{
    Credentials, DEFAULT_LOGIN_TIMEOUT, DEFAULT_TOKEN_TTL, FirebaseIdentityProvider,
    IdentityProvider, TokenCache,
};
use crate::cache::{CacheConfig, ResponseCache};
use crate::upstream::{DEFAULT_BASE_URL, UpstreamClient};
use crate::{QuotegateError, Result};

/// Default upstream request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest accepted cache or token TTL (100 years).
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Builder for [`Gateway`].
///
/// ```rust,no_run
/// # use quotegate::{Credentials, Gateway};
/// let gateway = Gateway::builder()
///     .credentials(Credentials::new("api-key", "ops@example.com", "secret"))
///     .build()?;
/// # Ok::<(), quotegate::QuotegateError>(())
/// ```
pub struct GatewayBuilder {
    credentials: Option<Credentials>,
    identity_provider: Option<Arc<dyn IdentityProvider>>,
    identity_url: Option<String>,
    identity_timeout: Option<Duration>,
    upstream_url: String,
    response_ttl: Duration,
    metrics_ttl: Duration,
    token_ttl: Duration,
    timeout: Option<Duration>,
    metrics_timeout: Option<Duration>,
    http: Option<reqwest::Client>,
}

impl GatewayBuilder {
    pub fn new() -> Self {
        let cache = CacheConfig::default();
        Self {
            credentials: None,
            identity_provider: None,
            identity_url: None,
            identity_timeout: Some(DEFAULT_LOGIN_TIMEOUT),
            upstream_url: DEFAULT_BASE_URL.to_string(),
            response_ttl: cache.ttl,
            metrics_ttl: cache.ttl,
            token_ttl: DEFAULT_TOKEN_TTL,
            timeout: Some(DEFAULT_TIMEOUT),
            metrics_timeout: Some(DEFAULT_TIMEOUT),
            http: None,
        }
    }

    /// Sign in to Firebase with these credentials.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Use a custom identity provider instead of Firebase.
    pub fn identity_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.identity_provider = Some(provider);
        self
    }

    /// Override the Identity Toolkit base URL.
    pub fn identity_url(mut self, url: impl Into<String>) -> Self {
        self.identity_url = Some(url.into());
        self
    }

    /// Timeout for each sign-in request. `None` disables it.
    pub fn identity_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.identity_timeout = timeout;
        self
    }

    /// Override the upstream API base URL.
    pub fn upstream_url(mut self, url: impl Into<String>) -> Self {
        self.upstream_url = url.into();
        self
    }

    /// TTL for `health` and `quotes` responses.
    pub fn response_ttl(mut self, ttl: Duration) -> Self {
        self.response_ttl = ttl;
        self
    }

    /// TTL for metrics responses.
    pub fn metrics_ttl(mut self, ttl: Duration) -> Self {
        self.metrics_ttl = ttl;
        self
    }

    /// TTL for the bearer token.
    pub fn token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Timeout for `health` and `quotes` requests. `None` disables it.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Timeout for metrics requests. `None` disables it.
    pub fn metrics_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.metrics_timeout = timeout;
        self
    }

    /// Share an existing HTTP client.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Build the gateway.
    ///
    /// Fails with [`QuotegateError::Configuration`] when no identity
    /// provider is configured, a credential is empty, or a TTL exceeds
    /// [`MAX_TTL`].
    pub fn build(self) -> Result<Gateway> {
        validate_ttl("response_ttl", self.response_ttl)?;
        validate_ttl("metrics_ttl", self.metrics_ttl)?;
        validate_ttl("token_ttl", self.token_ttl)?;

        let http = match self.http {
            Some(http) => http,
            None => reqwest::Client::builder().build().map_err(|e| {
                QuotegateError::Configuration(format!("failed to build HTTP client: {e}"))
            })?,
        };

        let provider: Arc<dyn IdentityProvider> = match (self.identity_provider, self.credentials) {
            (Some(provider), _) => provider,
            (None, Some(credentials)) => {
                validate_credentials(&credentials)?;
                let firebase = match self.identity_url {
                    Some(url) => {
                        FirebaseIdentityProvider::with_base_url(credentials, http.clone(), url)
                    }
                    None => FirebaseIdentityProvider::new(credentials, http.clone()),
                };
                Arc::new(firebase.with_timeout(self.identity_timeout))
            }
            (None, None) => {
                return Err(QuotegateError::Configuration(
                    "no identity provider credentials configured".to_string(),
                ));
            }
        };

        let tokens = Arc::new(TokenCache::with_ttl(provider, self.token_ttl));
        let upstream = UpstreamClient::with_base_url(http, tokens, self.upstream_url);

        Ok(Gateway {
            upstream,
            main_cache: ResponseCache::new("main", &CacheConfig::new().ttl(self.response_ttl)),
            metrics_cache: ResponseCache::new(
                "metrics",
                &CacheConfig::new().ttl(self.metrics_ttl),
            ),
            timeout: self.timeout,
            metrics_timeout: self.metrics_timeout,
        })
    }
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_credentials(credentials: &Credentials) -> Result<()> {
    for (field, value) in [
        ("api_key", &credentials.api_key),
        ("email", &credentials.email),
        ("password", &credentials.password),
    ] {
        if value.trim().is_empty() {
            return Err(QuotegateError::Configuration(format!(
                "identity provider credential `{field}` is empty"
            )));
        }
    }
    Ok(())
}

fn validate_ttl(field: &str, ttl: Duration) -> Result<()> {
    if ttl > MAX_TTL {
        return Err(QuotegateError::Configuration(format!(
            "`{field}` of {}s exceeds the maximum of {}s",
            ttl.as_secs(),
            MAX_TTL.as_secs()
        )));
    }
    Ok(())
}
