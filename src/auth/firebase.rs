//! Firebase Identity Toolkit password sign-in.
//!
//! See: <https://cloud.google.com/identity-platform/docs/use-rest-api#section-sign-in-email-password>

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::IdentityProvider;
use crate::{QuotegateError, Result};

/// Default base URL for the Identity Toolkit API
const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com";

/// Default bound on a single sign-in request.
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Account credentials used to sign in to the identity provider.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(
        api_key: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("email", &"<redacted>")
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Identity provider backed by Firebase's `accounts:signInWithPassword`.
#[derive(Clone)]
pub struct FirebaseIdentityProvider {
    credentials: Credentials,
    http: Client,
    base_url: String,
    timeout: Option<Duration>,
}

impl FirebaseIdentityProvider {
    /// Create a provider talking to the public Identity Toolkit endpoint.
    pub fn new(credentials: Credentials, http: Client) -> Self {
        Self::with_base_url(credentials, http, DEFAULT_BASE_URL)
    }

    /// Create a provider with a custom base URL (for testing with wiremock).
    pub fn with_base_url(
        credentials: Credentials,
        http: Client,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Some(DEFAULT_LOGIN_TIMEOUT),
        }
    }

    /// Bound each sign-in request. `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentityProvider {
    fn name(&self) -> &str {
        "firebase"
    }

    async fn login(&self) -> Result<String> {
        let url = format!("{}/v1/accounts:signInWithPassword", self.base_url);
        debug!("signing in to identity provider");

        let mut request = self
            .http
            .post(&url)
            .query(&[("key", self.credentials.api_key.as_str())])
            .json(&SignInRequest {
                email: &self.credentials.email,
                password: &self.credentials.password,
                return_secure_token: true,
            });
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            // The request URL carries the API key; strip it before logging.
            .map_err(|e| {
                if e.is_timeout() {
                    warn!("identity provider request timed out");
                    return QuotegateError::Authentication(
                        "identity provider timed out".to_string(),
                    );
                }
                warn!(error = %e.without_url(), "identity provider request failed");
                QuotegateError::Authentication("identity provider unreachable".to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "identity provider rejected sign-in");
            return Err(QuotegateError::Authentication(format!(
                "identity provider returned {}",
                status.as_u16()
            )));
        }

        let body: SignInResponse = response.json().await.map_err(|e| {
            warn!(error = %e.without_url(), "identity provider returned malformed body");
            QuotegateError::Authentication("malformed sign-in response".to_string())
        })?;

        body.id_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| QuotegateError::Authentication("sign-in response missing idToken".into()))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    #[serde(default)]
    id_token: Option<String>,
}
