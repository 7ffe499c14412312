//! Telemetry metric name constants.
//!
//! Centralised metric names for gateway operations. The daemon or an
//! embedding application installs its own `metrics` recorder (e.g.
//! prometheus); without a recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `quotegate_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `cache`: response cache name (e.g. "main", "metrics")
//! - `endpoint`: upstream endpoint path (e.g. "health", "metrics/new_signups")
//! - `status`: outcome: "ok" or "error"

/// Total response cache hits: reads served from a stored entry.
///
/// Labels: `cache`.
pub const CACHE_HITS_TOTAL: &str = "quotegate_cache_hits_total";

/// Total response cache misses (each one runs at most one upstream call).
///
/// Labels: `cache`.
pub const CACHE_MISSES_TOTAL: &str = "quotegate_cache_misses_total";

/// Total misses that waited on another caller's in-flight computation
/// instead of running their own. Counted as neither hit nor miss.
///
/// Labels: `cache`.
pub const CACHE_COALESCED_TOTAL: &str = "quotegate_cache_coalesced_total";

/// Total upstream requests issued.
///
/// Labels: `endpoint`, `status` ("ok" | "error").
pub const UPSTREAM_REQUESTS_TOTAL: &str = "quotegate_upstream_requests_total";

/// Upstream request duration in seconds.
///
/// Labels: `endpoint`.
pub const UPSTREAM_DURATION_SECONDS: &str = "quotegate_upstream_duration_seconds";

/// Total identity provider logins.
///
/// Labels: `status` ("ok" | "error").
pub const LOGINS_TOTAL: &str = "quotegate_logins_total";
