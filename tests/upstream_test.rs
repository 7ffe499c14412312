//! Wiremock integration tests for UpstreamClient.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use quotegate::auth::{IdentityProvider, TokenCache};
use quotegate::upstream::UpstreamClient;
use quotegate::{QuotegateError, Result};

// ============================================================================
// Helpers
// ============================================================================

/// Hands out `test-token` and counts logins.
#[derive(Default)]
struct StaticProvider {
    logins: AtomicUsize,
}

#[async_trait]
impl IdentityProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn login(&self) -> Result<String> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        Ok("test-token".to_string())
    }
}

struct RejectingProvider;

#[async_trait]
impl IdentityProvider for RejectingProvider {
    fn name(&self) -> &str {
        "rejecting"
    }

    async fn login(&self) -> Result<String> {
        Err(QuotegateError::Authentication("INVALID_PASSWORD".into()))
    }
}

fn client(base_url: impl Into<String>, provider: Arc<dyn IdentityProvider>) -> UpstreamClient {
    UpstreamClient::with_base_url(
        reqwest::Client::new(),
        Arc::new(TokenCache::new(provider)),
        base_url,
    )
}

fn n(value: &str) -> Vec<(&'static str, String)> {
    vec![("n", value.to_string())]
}

// ============================================================================
// Success
// ============================================================================

/// Test an authenticated GET with query forwarding.
#[tokio::test]
async fn test_get_success_forwards_token_and_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/quotes"))
        .and(query_param("n", "5"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"quote": "a"}, {"quote": "b"}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(mock_server.uri(), Arc::new(StaticProvider::default()));
    let value = client.get("quotes", &n("5"), None).await.unwrap();

    assert_eq!(value.as_array().map(Vec::len), Some(2));
}

/// Test that field order in the upstream payload is preserved.
#[tokio::test]
async fn test_get_preserves_field_order() {
    let mock_server = MockServer::start().await;
    let raw = r#"{"zeta":1,"alpha":{"y":true,"b":null},"mid":[3,2,1]}"#;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(raw, "application/json"))
        .mount(&mock_server)
        .await;

    let client = client(mock_server.uri(), Arc::new(StaticProvider::default()));
    let value = client.get("health", &[], None).await.unwrap();

    assert_eq!(serde_json::to_string(&value).unwrap(), raw);
}

// ============================================================================
// Error classification
// ============================================================================

/// Test a non-2xx status with a JSON body.
#[tokio::test]
async fn test_get_status_error_keeps_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/metrics/daily_active_users"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(serde_json::json!({"detail": "down"})),
        )
        .mount(&mock_server)
        .await;

    let client = client(mock_server.uri(), Arc::new(StaticProvider::default()));
    let err = client
        .get("metrics/daily_active_users", &[], None)
        .await
        .unwrap_err();

    match err {
        QuotegateError::UpstreamStatus { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, Some(serde_json::json!({"detail": "down"})));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

/// Test a non-2xx status with a non-JSON body.
#[tokio::test]
async fn test_get_status_error_drops_text_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Traceback (most recent call)"))
        .mount(&mock_server)
        .await;

    let client = client(mock_server.uri(), Arc::new(StaticProvider::default()));
    let err = client.get("health", &[], None).await.unwrap_err();

    assert!(matches!(
        err,
        QuotegateError::UpstreamStatus {
            status: 500,
            body: None
        }
    ));
}

/// Test timeout classification.
#[tokio::test]
async fn test_get_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/metrics/response_times"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let client = client(mock_server.uri(), Arc::new(StaticProvider::default()));
    let err = client
        .get(
            "metrics/response_times",
            &[],
            Some(Duration::from_millis(50)),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, QuotegateError::UpstreamTimeout));
}

/// Test connection failure classification.
#[tokio::test]
async fn test_get_unreachable() {
    let client = client("http://127.0.0.1:1", Arc::new(StaticProvider::default()));
    let err = client.get("health", &[], None).await.unwrap_err();
    assert!(matches!(err, QuotegateError::UpstreamUnavailable(_)));
}

/// Test a 2xx response that is not JSON.
#[tokio::test]
async fn test_get_invalid_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    let client = client(mock_server.uri(), Arc::new(StaticProvider::default()));
    let err = client.get("health", &[], None).await.unwrap_err();
    assert!(matches!(err, QuotegateError::UpstreamUnavailable(_)));
}

// ============================================================================
// Token handling
// ============================================================================

/// Test that a 401 drops the cached token.
#[tokio::test]
async fn test_unauthorized_invalidates_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let provider = Arc::new(StaticProvider::default());
    let client = client(mock_server.uri(), provider.clone());

    for _ in 0..2 {
        let err = client.get("health", &[], None).await.unwrap_err();
        assert!(matches!(err, QuotegateError::UpstreamStatus { status: 401, .. }));
    }
    assert_eq!(provider.logins.load(Ordering::SeqCst), 2);
}

/// Test that other failures keep the cached token.
#[tokio::test]
async fn test_server_error_keeps_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&mock_server)
        .await;

    let provider = Arc::new(StaticProvider::default());
    let client = client(mock_server.uri(), provider.clone());

    for _ in 0..3 {
        let _ = client.get("health", &[], None).await;
    }
    assert_eq!(provider.logins.load(Ordering::SeqCst), 1);
}

/// Test that a failed login skips the upstream call.
#[tokio::test]
async fn test_login_failure_skips_upstream() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client(mock_server.uri(), Arc::new(RejectingProvider));
    let err = client.get("health", &[], None).await.unwrap_err();
    assert!(matches!(err, QuotegateError::Authentication(_)));
}
