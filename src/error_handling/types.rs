//! Error type definitions.
//!
//! Analyzer failures are values, not panics: every service converts its failure
//! into an `AnalysisError` carrying a kind from the shared taxonomy, a stable
//! machine-readable code and a retryable flag.

use std::fmt;

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use serde::{Deserialize, Serialize};
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// Error building the TLS client configuration.
    #[error("TLS configuration error: {0}")]
    TlsConfigError(String),
}

/// Rejected configuration (operational settings or scoring configuration).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Generic invalid setting.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Factor weights do not sum to 1.0 within tolerance.
    #[error("Scoring weights must sum to 1.0 (±{tolerance}), got {sum:.4}")]
    WeightSum { sum: f64, tolerance: f64 },

    /// Risk tier thresholds are out of order or too close together.
    #[error("Invalid risk thresholds: {0}")]
    Thresholds(String),

    /// A configuration file could not be read or parsed.
    #[error("Failed to load configuration: {0}")]
    Load(String),
}

/// Classification of analysis failures.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad input (URL, domain); never retried
    Validation,
    /// Connection-level failure
    Network,
    /// Operation exceeded its time budget
    Timeout,
    /// Provider throttled the request
    RateLimit,
    /// Provider has no record of the subject
    NotFound,
    /// Domain cannot be analysed (IP literal, no registrable domain)
    InvalidDomain,
    /// Estimated AI cost exceeds the configured ceiling
    CostThresholdExceeded,
    /// Provider rejected the credentials
    ApiKeyInvalid,
    /// Too few services succeeded to produce a score
    InsufficientServices,
    /// Provider returned an unexpected HTTP status
    ApiError,
    /// Provider response could not be parsed
    ParseError,
    /// Anything else
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidDomain => "invalid_domain",
            ErrorKind::CostThresholdExceeded => "cost_threshold_exceeded",
            ErrorKind::ApiKeyInvalid => "api_key_invalid",
            ErrorKind::InsufficientServices => "insufficient_services",
            ErrorKind::ApiError => "api_error",
            ErrorKind::ParseError => "parse_error",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// Whether failures of this kind are transient by default.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Network | ErrorKind::Timeout | ErrorKind::RateLimit
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed analysis, as reported by an analyzer or the orchestrator.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
#[serde(rename_all = "camelCase")]
pub struct AnalysisError {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl AnalysisError {
    /// Creates an error whose code and retryability follow from `kind`.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: kind.as_str().to_string(),
            message: message.into(),
            retryable: kind.is_retryable(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimit, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn invalid_domain(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidDomain, message)
    }

    pub fn cost_threshold_exceeded(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CostThresholdExceeded, message)
    }

    pub fn api_key_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ApiKeyInvalid, message)
    }

    pub fn insufficient_services(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InsufficientServices, message)
    }

    /// Unexpected HTTP status from a provider. 5xx responses are retryable.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ApiError, message)
            .with_code(format!("api_error_{status}"))
            .with_retryable((500..600).contains(&status))
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseError, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }
}
