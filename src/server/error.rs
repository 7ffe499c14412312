//! Error to HTTP response mapping.
//!
//! Every handler maps failures the same way:
//!
//! | Error | Status |
//! |---|---|
//! | `UpstreamTimeout` | 504 |
//! | `UpstreamUnavailable`, `Configuration` | 500 |
//! | `UpstreamStatus` | upstream status |
//! | `Authentication` | 502 |
//! | `InvalidQuery` | 400 |

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::QuotegateError;

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable reason (e.g. `upstream_timeout`).
    pub error: String,
    /// Short human-readable detail.
    pub detail: String,
    /// Upstream JSON payload, for upstream status errors only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream: Option<Value>,
}

impl From<&QuotegateError> for ErrorBody {
    fn from(err: &QuotegateError) -> Self {
        let upstream = match err {
            QuotegateError::UpstreamStatus { body, .. } => body.clone(),
            _ => None,
        };
        Self {
            error: err.reason().to_string(),
            detail: err.detail(),
            upstream,
        }
    }
}

impl IntoResponse for QuotegateError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorBody::from(&self))).into_response()
    }
}
