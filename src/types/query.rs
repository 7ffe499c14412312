//! Query parameters accepted by the gateway.

use serde::Deserialize;

/// Number of quotes returned when `n` is not given.
pub const DEFAULT_QUOTE_COUNT: i64 = 3;

/// Query for `/quotes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct QuotesQuery {
    #[serde(default = "default_quote_count")]
    pub n: i64,
}

impl Default for QuotesQuery {
    fn default() -> Self {
        Self {
            n: DEFAULT_QUOTE_COUNT,
        }
    }
}

fn default_quote_count() -> i64 {
    DEFAULT_QUOTE_COUNT
}
