//! Error handling and service statistics.
//!
//! This module provides:
//! - The `AnalysisError` taxonomy shared by every analyzer
//! - Categorization of transport errors into that taxonomy
//! - Configuration and initialization error types
//! - Thread-safe per-service outcome counters

mod categorization;
mod stats;
mod types;

// Re-export public API
pub use categorization::{categorize_io_error, categorize_reqwest_error, categorize_status};
pub use stats::ServiceStats;
pub use types::{AnalysisError, ConfigError, ErrorKind, InitializationError};
