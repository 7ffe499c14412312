//! TTL response cache for upstream JSON payloads.
//!
//! [`ResponseCache`] sits in [`Gateway`](crate::Gateway) in front of the
//! [`UpstreamClient`](crate::upstream::UpstreamClient). A hit bypasses token
//! lookup and the upstream call entirely. Hit, miss and coalesced-miss
//! metrics are emitted per cache instance.
//!
//! # Expiry
//!
//! Entries live for a fixed TTL from the moment they were computed. There is
//! no capacity bound and no eviction under memory pressure; an expired entry
//! is treated as absent on the next read and replaced as a whole (value and
//! expiry are one moka entry, so readers never see a torn pair).
//!
//! # Single-flight
//!
//! Concurrent misses on the same key are coalesced by moka: exactly one
//! caller runs `compute`, the others await its outcome. A failed
//! computation is never stored; every waiter receives the same error and
//! the next call starts a fresh computation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde_json::Value;
use tracing::debug;

use crate::Result;
use crate::telemetry;

/// Configuration for a response cache.
///
/// ```rust
/// # use quotegate::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new().ttl(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Time-to-live for cached entries. Default: 60 seconds.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
        }
    }
}

impl CacheConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the time-to-live for cached entries.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// In-memory TTL cache keyed on `(endpoint, params)`.
pub struct ResponseCache {
    name: &'static str,
    ttl: Duration,
    cache: Cache<String, Value>,
}

impl ResponseCache {
    /// Create a new response cache. `name` labels its metrics and logs.
    pub fn new(name: &'static str, config: &CacheConfig) -> Self {
        let cache = Cache::builder().time_to_live(config.ttl).build();
        Self {
            name,
            ttl: config.ttl,
            cache,
        }
    }

    /// Cache name used in metric labels.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached value for `(endpoint, params)`, or run `compute`
    /// and cache its result.
    ///
    /// `compute` is only polled when this call wins the race for a missing
    /// key. Its error is returned unchanged and nothing is cached.
    pub async fn get_or_compute<Fut>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        compute: impl FnOnce() -> Fut,
    ) -> Result<Value>
    where
        Fut: Future<Output = Result<Value>>,
    {
        let key = cache_key(endpoint, params);
        if let Some(value) = self.cache.get(&key).await {
            debug!(cache = self.name, endpoint, "response cache hit");
            metrics::counter!(telemetry::CACHE_HITS_TOTAL, "cache" => self.name).increment(1);
            return Ok(value);
        }

        let entry = self
            .cache
            .entry(key)
            .or_try_insert_with(compute())
            .await
            .map_err(Arc::unwrap_or_clone)?;

        if entry.is_fresh() {
            debug!(cache = self.name, endpoint, "response cache miss");
            metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "cache" => self.name).increment(1);
        } else {
            // Another caller filled the entry while this one waited
            debug!(cache = self.name, endpoint, "response cache miss coalesced");
            metrics::counter!(telemetry::CACHE_COALESCED_TOTAL, "cache" => self.name)
                .increment(1);
        }

        Ok(entry.into_value())
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

/// Compute a cache key from an endpoint and its ordered parameters.
///
/// Each component is JSON-quoted, so distinct inputs can never produce the
/// same key (unlike a hash).
fn cache_key(endpoint: &str, params: &[(&str, String)]) -> String {
    let mut key = quote(endpoint);
    for (name, value) in params {
        key.push('&');
        key.push_str(&quote(name));
        key.push('=');
        key.push_str(&quote(value));
    }
    key
}

fn quote(s: &str) -> String {
    Value::String(s.to_owned()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&'static str, &str)]) -> Vec<(&'static str, String)> {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn cache_key_deterministic() {
        let k1 = cache_key("quotes", &params(&[("n", "3")]));
        let k2 = cache_key("quotes", &params(&[("n", "3")]));
        assert_eq!(k1, k2);
    }

    #[test]
    fn cache_key_differs_on_endpoint() {
        let k1 = cache_key("health", &[]);
        let k2 = cache_key("quotes", &[]);
        assert_ne!(k1, k2);
    }

    #[test]
    fn cache_key_differs_on_param_value() {
        let k1 = cache_key("quotes", &params(&[("n", "3")]));
        let k2 = cache_key("quotes", &params(&[("n", "5")]));
        assert_ne!(k1, k2);
    }

    #[test]
    fn cache_key_no_params_differs_from_empty_value() {
        let k1 = cache_key("quotes", &[]);
        let k2 = cache_key("quotes", &params(&[("n", "")]));
        assert_ne!(k1, k2);
    }

    #[test]
    fn cache_key_separators_cannot_be_forged() {
        // An endpoint containing the separator must not alias a real param.
        let k1 = cache_key("quotes\"&\"n\"=\"3", &[]);
        let k2 = cache_key("quotes", &params(&[("n", "3")]));
        assert_ne!(k1, k2);
    }

    #[test]
    fn config_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(60));
    }
}
