//! Shared utilities.
//!
//! This module provides:
//! - Exponential-backoff retry for transient analyzer failures
//! - Timing metrics for per-service performance analysis

mod retry;
mod timing;

pub use retry::{retry_with_backoff, RetryPolicy};
pub use timing::{duration_to_ms, elapsed_ms, TimingStats};
