//! Quotegate - caching, authenticated gateway for the quotable API
//!
//! This crate forwards requests to a single upstream API, injecting a bearer
//! token obtained from an identity provider and caching responses for a
//! short TTL. Concurrent misses on the same cache key, and concurrent token
//! refreshes, are coalesced into a single upstream call.
//!
//! # Example
//!
//! ```rust,no_run
//! use quotegate::{Credentials, Gateway, MetricKind};
//!
//! #[tokio::main]
//! async fn main() -> quotegate::Result<()> {
//!     let gateway = Gateway::builder()
//!         .credentials(Credentials::new("api-key", "ops@example.com", "secret"))
//!         .build()?;
//!
//!     let quotes = gateway.quotes(5).await?;
//!     let signups = gateway.metric(MetricKind::NewSignups).await?;
//!
//!     println!("{quotes}\n{signups}");
//!     Ok(())
//! }
//! ```
//!
//! The `server` feature (on by default) adds the axum HTTP surface in
//! [`server`] and the `quotegated` daemon.

pub mod auth;
pub mod cache;
pub mod error;
pub mod gateway;
#[cfg(feature = "server")]
pub mod server;
pub mod telemetry;
pub mod types;
pub mod upstream;

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export main types at crate root
pub use auth::{Credentials, IdentityProvider, Token, TokenCache};
pub use cache::{CacheConfig, ResponseCache};
pub use error::{QuotegateError, Result};
pub use gateway::{Gateway, GatewayBuilder};
pub use types::{MetricKind, QuotesQuery};
pub use upstream::UpstreamClient;
