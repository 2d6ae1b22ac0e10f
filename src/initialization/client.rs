//! HTTP client initialization.
//!
//! One `reqwest::Client` is shared by the reputation and AI clients so their
//! connection pools are reused across analyses.

use std::sync::Arc;
use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::{Config, DEFAULT_USER_AGENT};
use crate::error_handling::InitializationError;

/// Initializes the shared HTTP client for provider APIs.
///
/// The client timeout is the larger of the reputation and AI service timeouts;
/// the orchestrator enforces the per-service budget on top of it.
///
/// # Errors
///
/// Returns `InitializationError::HttpClientError` if client creation fails.
pub fn init_client(config: &Config) -> Result<Arc<reqwest::Client>, InitializationError> {
    let timeout = config
        .reputation_timeout_secs
        .max(config.ai_timeout_secs)
        .max(1);
    let client = ClientBuilder::new()
        .timeout(Duration::from_secs(timeout))
        .connect_timeout(Duration::from_secs(crate::config::TCP_CONNECT_TIMEOUT_SECS))
        .user_agent(DEFAULT_USER_AGENT)
        .build()?;
    Ok(Arc::new(client))
}
