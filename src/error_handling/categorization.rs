//! Error categorization.
//!
//! Maps transport-level failures (`reqwest::Error`, `std::io::Error`) and raw
//! HTTP statuses onto the shared `ErrorKind` taxonomy.

use crate::config::{HTTP_STATUS_FORBIDDEN, HTTP_STATUS_TOO_MANY_REQUESTS, HTTP_STATUS_UNAUTHORIZED};

use super::types::AnalysisError;

/// Categorizes a non-success HTTP status returned by a provider.
///
/// 429 is rate limiting, 401/403 are credential problems, everything else
/// becomes an API error that is retryable only for 5xx.
pub fn categorize_status(status: u16, body: &str) -> AnalysisError {
    let snippet: String = body.chars().take(200).collect();
    match status {
        HTTP_STATUS_TOO_MANY_REQUESTS => {
            AnalysisError::rate_limit(format!("Provider rate limit exceeded (429): {snippet}"))
        }
        HTTP_STATUS_UNAUTHORIZED | HTTP_STATUS_FORBIDDEN => AnalysisError::api_key_invalid(
            format!("Provider rejected credentials ({status}): {snippet}"),
        ),
        _ => AnalysisError::api(status, format!("Provider returned HTTP {status}: {snippet}")),
    }
}

/// Categorizes a `reqwest::Error` into an `AnalysisError`.
pub fn categorize_reqwest_error(error: &reqwest::Error) -> AnalysisError {
    if let Some(status) = error.status() {
        return categorize_status(status.as_u16(), "");
    }

    if error.is_timeout() {
        AnalysisError::timeout(format!("Request timed out: {error}"))
    } else if error.is_connect() || error.is_request() {
        AnalysisError::network(format!("Connection failed: {error}"))
    } else if error.is_decode() || error.is_body() {
        AnalysisError::parse(format!("Failed to decode provider response: {error}"))
    } else if error.is_builder() {
        AnalysisError::validation(format!("Invalid request: {error}"))
    } else {
        AnalysisError::unknown(error.to_string())
    }
}

/// Categorizes a socket-level `std::io::Error`.
pub fn categorize_io_error(error: &std::io::Error, context: &str) -> AnalysisError {
    use std::io::ErrorKind as Io;
    match error.kind() {
        Io::TimedOut | Io::WouldBlock => AnalysisError::timeout(format!("{context}: {error}")),
        Io::InvalidInput | Io::InvalidData => {
            AnalysisError::invalid_domain(format!("{context}: {error}"))
        }
        _ => AnalysisError::network(format!("{context}: {error}")),
    }
}
