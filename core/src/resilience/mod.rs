//! Resilience patterns for production deployment.
//!
//! Just exponential backoff for retries today: the order manager's
//! cancellation path is this crate's only RPC retry surface, since live
//! venue adapters (and the reconnect logic a circuit breaker would
//! guard) are out of scope here.

pub mod backoff;

pub use backoff::{BackoffConfig, ExponentialBackoff};
