//! The fixed set of upstream metrics resources.

use std::fmt;
use std::str::FromStr;

/// One of the metrics resources exposed under `/metrics`.
///
/// Each kind has an inbound slug (kebab-case, used in gateway paths) and an
/// upstream resource name (snake_case, below `metrics/` on the upstream).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    DailyActiveUsers,
    ApiRequests,
    NewSignups,
    EndpointError,
    FeatureUsage,
    CountryMetrics,
    ResponseTimes,
}

impl MetricKind {
    /// Every metrics resource, in routing order.
    pub const ALL: [MetricKind; 7] = [
        MetricKind::DailyActiveUsers,
        MetricKind::ApiRequests,
        MetricKind::NewSignups,
        MetricKind::EndpointError,
        MetricKind::FeatureUsage,
        MetricKind::CountryMetrics,
        MetricKind::ResponseTimes,
    ];

    /// Path segment on the gateway (e.g. `daily-active-users`).
    pub fn slug(self) -> &'static str {
        match self {
            Self::DailyActiveUsers => "daily-active-users",
            Self::ApiRequests => "api-requests",
            Self::NewSignups => "new-signups",
            Self::EndpointError => "endpoint-error",
            Self::FeatureUsage => "feature-usage",
            Self::CountryMetrics => "country-metrics",
            Self::ResponseTimes => "response-times",
        }
    }

    /// Resource name on the upstream (e.g. `daily_active_users`).
    pub fn resource(self) -> &'static str {
        match self {
            Self::DailyActiveUsers => "daily_active_users",
            Self::ApiRequests => "api_requests",
            Self::NewSignups => "new_signups",
            Self::EndpointError => "endpoint_error",
            Self::FeatureUsage => "feature_usage",
            Self::CountryMetrics => "country_metrics",
            Self::ResponseTimes => "response_times",
        }
    }

    /// Upstream endpoint path (e.g. `metrics/daily_active_users`).
    pub fn endpoint(self) -> String {
        format!("metrics/{}", self.resource())
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug() == s)
            .ok_or_else(|| format!("unknown metric: {s}"))
    }
}
