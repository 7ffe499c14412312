//! Single-token cache with a fixed TTL.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::IdentityProvider;
use crate::telemetry;
use crate::{QuotegateError, Result};

/// Default token lifetime. Shorter than the provider's one-hour ID token
/// lifetime.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3000);

/// A bearer token with its local expiry.
///
/// `expires_at` is derived from the cache TTL at issuance, not from any
/// expiry claim inside the token.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    value: String,
    expires_at: Instant,
}

impl Token {
    pub fn new(value: impl Into<String>, expires_at: Instant) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// Raw token value.
    pub fn secret(&self) -> &str {
        &self.value
    }

    /// `Authorization` header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.value)
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// A token is usable while `now <= expires_at`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Process-wide cache for the upstream bearer token.
///
/// The lock is held across the login call, so at most one login is in
/// flight and concurrent callers wait for (and share) its result. A failed
/// login leaves the cache empty; the next caller tries again.
pub struct TokenCache {
    provider: Arc<dyn IdentityProvider>,
    ttl: Duration,
    current: Mutex<Option<Token>>,
}

impl TokenCache {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self::with_ttl(provider, DEFAULT_TOKEN_TTL)
    }

    pub fn with_ttl(provider: Arc<dyn IdentityProvider>, ttl: Duration) -> Self {
        Self {
            provider,
            ttl,
            current: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached token, logging in first if it is missing or expired.
    pub async fn get_token(&self) -> Result<Token> {
        let mut current = self.current.lock().await;

        if let Some(token) = current.as_ref() {
            if !token.is_expired(Instant::now()) {
                return Ok(token.clone());
            }
            debug!(provider = self.provider.name(), "cached token expired");
        }

        let value = match self.provider.login().await {
            Ok(value) => value,
            Err(err) => {
                metrics::counter!(telemetry::LOGINS_TOTAL, "status" => "error").increment(1);
                warn!(provider = self.provider.name(), reason = err.reason(), "login failed");
                return Err(match err {
                    QuotegateError::Authentication(_) => err,
                    other => QuotegateError::Authentication(other.to_string()),
                });
            }
        };
        metrics::counter!(telemetry::LOGINS_TOTAL, "status" => "ok").increment(1);
        debug!(provider = self.provider.name(), ttl_secs = self.ttl.as_secs(), "login succeeded");

        let expires_at = Instant::now().checked_add(self.ttl).ok_or_else(|| {
            QuotegateError::Configuration(format!(
                "token TTL of {}s is out of range",
                self.ttl.as_secs()
            ))
        })?;
        let token = Token::new(value, expires_at);
        *current = Some(token.clone());
        Ok(token)
    }

    /// Drop `stale` if it is still the cached token.
    ///
    /// A token already replaced by a concurrent refresh is left alone.
    pub async fn invalidate(&self, stale: &Token) {
        let mut current = self.current.lock().await;
        if current.as_ref().is_some_and(|t| t.secret() == stale.secret()) {
            debug!(provider = self.provider.name(), "invalidating rejected token");
            *current = None;
        }
    }
}
