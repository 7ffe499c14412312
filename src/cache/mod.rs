//! Caching subsystem.
//!
//! - [`ResponseCache`]: TTL cache for upstream JSON responses, one
//!   instance per upstream family (top-level and metrics), each with its
//!   own TTL. See [`response`] module docs for expiry and single-flight
//!   semantics.
//!
//! The bearer token has its own dedicated cache,
//! [`TokenCache`](crate::auth::TokenCache), since it holds exactly one value
//! and must never be exposed through generic lookups.

pub mod response;

pub use response::{CacheConfig, ResponseCache};
