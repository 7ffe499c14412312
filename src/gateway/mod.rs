//! The gateway handle.
//!
//! [`Gateway`] owns the upstream client and one [`ResponseCache`] per
//! upstream family. It is built once at startup (see [`GatewayBuilder`])
//! and shared by reference with every request handler; nothing here is
//! global state.

mod builder;

use std::time::Duration;

use serde_json::Value;

use crate::Result;
use crate::cache::ResponseCache;
use crate::types::MetricKind;
use crate::upstream::UpstreamClient;

pub use builder::GatewayBuilder;

/// Cached, authenticated access to the upstream API.
pub struct Gateway {
    upstream: UpstreamClient,
    main_cache: ResponseCache,
    metrics_cache: ResponseCache,
    timeout: Option<Duration>,
    metrics_timeout: Option<Duration>,
}

impl Gateway {
    /// Create a new builder for configuring the gateway.
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::new()
    }

    /// Upstream `health`.
    pub async fn health(&self) -> Result<Value> {
        self.fetch_main("health", &[]).await
    }

    /// Upstream `quotes?n=<n>`, cached per `n`.
    pub async fn quotes(&self, n: i64) -> Result<Value> {
        self.fetch_main("quotes", &[("n", n.to_string())]).await
    }

    /// Upstream `metrics/<resource>`.
    pub async fn metric(&self, kind: MetricKind) -> Result<Value> {
        let endpoint = kind.endpoint();
        let params: &[(&str, String)] = &[];
        self.metrics_cache
            .get_or_compute(&endpoint, params, || {
                self.upstream.get(&endpoint, params, self.metrics_timeout)
            })
            .await
    }

    /// Drop all cached responses. The token is kept.
    pub fn clear_cache(&self) {
        self.main_cache.clear();
        self.metrics_cache.clear();
    }

    pub fn upstream(&self) -> &UpstreamClient {
        &self.upstream
    }

    async fn fetch_main(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value> {
        self.main_cache
            .get_or_compute(endpoint, params, || {
                self.upstream.get(endpoint, params, self.timeout)
            })
            .await
    }
}
