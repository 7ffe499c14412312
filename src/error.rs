//! Quotegate error types

/// Quotegate error types
///
/// Cloneable so a single failed computation can be handed to every caller
/// that was waiting on the same cache entry.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QuotegateError {
    // Identity provider errors
    #[error("authentication failed: {0}")]
    Authentication(String),

    // Upstream errors
    #[error("upstream returned {status}")]
    UpstreamStatus {
        status: u16,
        /// Upstream body, kept only when it was valid JSON.
        body: Option<serde_json::Value>,
    },

    #[error("upstream request timed out")]
    UpstreamTimeout,

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    // Client errors
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl QuotegateError {
    /// Short machine-readable reason, safe to show to clients.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "authentication_failed",
            Self::UpstreamStatus { .. } => "upstream_error",
            Self::UpstreamTimeout => "upstream_timeout",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::InvalidQuery(_) => "invalid_query",
            Self::Configuration(_) => "configuration_error",
        }
    }

    /// HTTP status this error should surface as.
    ///
    /// Upstream status codes pass through; anything that isn't a client or
    /// server error code falls back to 502.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Authentication(_) => 502,
            Self::UpstreamStatus { status, .. } if (400..=599).contains(status) => *status,
            Self::UpstreamStatus { .. } => 502,
            Self::UpstreamTimeout => 504,
            Self::InvalidQuery(_) => 400,
            Self::UpstreamUnavailable(_) | Self::Configuration(_) => 500,
        }
    }

    /// Client-facing detail text. Never contains internal error messages.
    pub fn detail(&self) -> String {
        match self {
            Self::Authentication(_) => "Upstream authentication failed".to_string(),
            Self::UpstreamStatus { status, .. } => format!("Upstream returned status {status}"),
            Self::UpstreamTimeout => "External API timeout".to_string(),
            // Describes the client's own input
            Self::InvalidQuery(message) => message.clone(),
            Self::UpstreamUnavailable(_) | Self::Configuration(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

/// Result type alias for Quotegate operations
pub type Result<T> = std::result::Result<T, QuotegateError>;
