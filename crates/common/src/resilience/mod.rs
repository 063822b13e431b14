//! Resilience patterns for fault tolerance
//!
//! Generic retry executor: an operation is re-issued under a pluggable
//! [`RetryPolicy`] with a fixed pause, and the caller always gets back the
//! last error that was observed.
//!
//! The executor has no knowledge of HTTP or of the ledger service. Domain
//! crates decide which failures are retryable by implementing
//! [`RetryPolicy`] for their own error type.

pub mod retry;

pub use retry::{
    RetryConfig, RetryConfigBuilder, RetryDecision, RetryError, RetryExecutor, RetryPolicy,
    RetryResult,
};
