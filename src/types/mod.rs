//! Request types shared by the gateway and the HTTP surface.

pub mod metric;
pub mod query;

pub use metric::MetricKind;
pub use query::{DEFAULT_QUOTE_COUNT, QuotesQuery};
