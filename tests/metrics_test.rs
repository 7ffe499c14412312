//! Tests for metrics integration.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use quotegate::auth::{IdentityProvider, TokenCache};
use quotegate::cache::{CacheConfig, ResponseCache};
use quotegate::telemetry;
use quotegate::upstream::UpstreamClient;
use quotegate::{QuotegateError, Result};

// ============================================================================
// Mock providers
// ============================================================================

struct MockProvider;

#[async_trait]
impl IdentityProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn login(&self) -> Result<String> {
        Ok("token".to_string())
    }
}

struct FailingProvider;

#[async_trait]
impl IdentityProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn login(&self) -> Result<String> {
        Err(QuotegateError::Authentication("rejected".into()))
    }
}

// ============================================================================
// Snapshot type alias for readability
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

// ============================================================================
// Helpers
// ============================================================================

/// Sum all counter values matching a given metric name.
fn counter_total(snapshot: &SnapshotVec, name: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Sum counter values for a name with a given label value.
fn counter_with_label(snapshot: &SnapshotVec, name: &str, label: &str, value: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| {
            key.kind() == MetricKind::Counter
                && key.key().name() == name
                && key
                    .key()
                    .labels()
                    .any(|l| l.key() == label && l.value() == value)
        })
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Check if any histogram entries exist for a given metric name.
fn has_histogram(snapshot: &SnapshotVec, name: &str) -> bool {
    snapshot
        .iter()
        .any(|(key, _, _, _)| key.kind() == MetricKind::Histogram && key.key().name() == name)
}

// ============================================================================
// Tests
// ============================================================================

/// Runs async code within a local recorder scope on the multi-thread runtime.
///
/// `block_in_place` ensures the sync `with_local_recorder` closure stays
/// on the current thread while `block_on` drives the inner async work.
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn cache_hits_and_misses_recorded() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let cache = ResponseCache::new("main", &CacheConfig::default());
                for _ in 0..3 {
                    cache
                        .get_or_compute("health", &[], || async { Ok(serde_json::json!(1)) })
                        .await
                        .unwrap();
                }
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_MISSES_TOTAL), 1);
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_HITS_TOTAL), 2);
    assert_eq!(
        counter_with_label(&snapshot, telemetry::CACHE_HITS_TOTAL, "cache", "main"),
        2
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn coalesced_misses_recorded_separately() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let cache = ResponseCache::new("metrics", &CacheConfig::default());
                let slow = || async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(serde_json::json!({"n": 1}))
                };
                let (a, b, c, d) = tokio::join!(
                    cache.get_or_compute("metrics/api_requests", &[], slow),
                    cache.get_or_compute("metrics/api_requests", &[], slow),
                    cache.get_or_compute("metrics/api_requests", &[], slow),
                    cache.get_or_compute("metrics/api_requests", &[], slow),
                );
                for result in [a, b, c, d] {
                    assert_eq!(result.unwrap(), serde_json::json!({"n": 1}));
                }
                // Stored entry now serves a plain hit
                cache
                    .get_or_compute("metrics/api_requests", &[], slow)
                    .await
                    .unwrap();
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_MISSES_TOTAL), 1);
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_COALESCED_TOTAL), 3);
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_HITS_TOTAL), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn upstream_request_records_metrics() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&mock_server)
        .await;

    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let tokens = Arc::new(TokenCache::new(Arc::new(MockProvider)));
                let client =
                    UpstreamClient::with_base_url(reqwest::Client::new(), tokens, mock_server.uri());
                client.get("health", &[], None).await
            })
        })
    });
    assert!(result.is_ok());

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter_with_label(&snapshot, telemetry::UPSTREAM_REQUESTS_TOTAL, "status", "ok"),
        1
    );
    assert_eq!(
        counter_with_label(&snapshot, telemetry::LOGINS_TOTAL, "status", "ok"),
        1
    );
    assert!(
        has_histogram(&snapshot, telemetry::UPSTREAM_DURATION_SECONDS),
        "expected a duration histogram entry"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn failed_login_records_error_metric() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let tokens = TokenCache::new(Arc::new(FailingProvider));
                tokens.get_token().await
            })
        })
    });
    assert!(result.is_err());

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter_with_label(&snapshot, telemetry::LOGINS_TOTAL, "status", "error"),
        1
    );
    assert_eq!(counter_total(&snapshot, telemetry::UPSTREAM_REQUESTS_TOTAL), 0);
}

#[tokio::test]
async fn metrics_are_noop_without_recorder() {
    // Verify no panics when no recorder is installed.
    let cache = ResponseCache::new("main", &CacheConfig::default());
    let value = cache
        .get_or_compute("health", &[], || async { Ok(serde_json::json!("ok")) })
        .await
        .unwrap();
    assert_eq!(value, "ok");
}
