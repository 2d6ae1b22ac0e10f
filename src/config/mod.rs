//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, TTLs, limits)
//! - The `Config` struct shared by the library and the CLI

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{AiProvider, Config, LogFormat, LogLevel, ServiceTimeouts};
