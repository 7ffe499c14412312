//! HTTP surface.
//!
//! This module provides:
//! - The axum [`router`] with CORS and request tracing layers
//! - Request handlers (`handlers`) mapping paths onto [`Gateway`] calls
//! - Error to HTTP response mapping (`error`)
//! - Configuration types (`config`)
//!
//! | Path | Upstream |
//! |---|---|
//! | `/health` | `health` |
//! | `/quotes?n=<n>` | `quotes?n=<n>` |
//! | `/metrics/<slug>` | `metrics/<resource>` (see [`MetricKind`](crate::MetricKind)) |

pub mod config;
mod error;
mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::get;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::types::MetricKind;
use crate::{Gateway, QuotegateError, Result};

pub use error::ErrorBody;

/// Origins allowed by default.
pub const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost", "http://localhost:3000"];

/// Build the gateway router.
///
/// Fails with [`QuotegateError::Configuration`] if an origin is not a valid
/// header value.
pub fn router(gateway: Arc<Gateway>, cors_origins: &[String]) -> Result<Router> {
    let metrics = MetricKind::ALL
        .into_iter()
        .fold(Router::<Arc<Gateway>>::new(), |router, kind| {
            router.route(&format!("/{}", kind.slug()), get(handlers::metric(kind)))
        });

    Ok(Router::new()
        .route("/health", get(handlers::health))
        .route("/quotes", get(handlers::quotes))
        .nest("/metrics", metrics)
        .layer(cors_layer(cors_origins)?)
        .layer(TraceLayer::new_for_http())
        .with_state(gateway))
}

/// CORS policy: listed origins, any method and header, credentials allowed.
///
/// Methods and headers are mirrored from the preflight request since
/// wildcards cannot be combined with credentials.
fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|e| {
                QuotegateError::Configuration(format!("invalid CORS origin {origin:?}: {e}"))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}
