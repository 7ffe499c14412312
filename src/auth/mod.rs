//! Upstream authentication.
//!
//! The upstream API accepts a bearer token issued by an external identity
//! provider. [`IdentityProvider`] is the seam for that login call;
//! [`FirebaseIdentityProvider`] is the production implementation and
//! [`TokenCache`] keeps the resulting token for a fixed TTL.
//!
//! Credential and token material is never logged: both [`Credentials`] and
//! [`Token`] redact their secrets in `Debug` output.

mod firebase;
mod token;

use async_trait::async_trait;

use crate::Result;

pub use firebase::{Credentials, DEFAULT_LOGIN_TIMEOUT, FirebaseIdentityProvider};
pub use token::{DEFAULT_TOKEN_TTL, Token, TokenCache};

/// Provider of bearer tokens for the upstream API.
///
/// Implementations perform one login per call and must report every
/// failure (rejected credentials, transport failure, malformed response)
/// as [`QuotegateError::Authentication`](crate::QuotegateError::Authentication).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    /// Log in and return a fresh bearer token.
    async fn login(&self) -> Result<String>;
}
