//! url_risk library: multi-source URL risk scoring
//!
//! This library scores a URL for phishing, malware and scam risk by combining
//! four independent signals (threat reputation, WHOIS domain age, TLS
//! certificate health and an LLM content verdict) into one weighted 0-100
//! score with a risk tier and a confidence value.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use url_risk::{AnalysisOrchestrator, AnalyzeOptions, Config, ScoringConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let http = url_risk::initialization::init_client(&config)?;
//! let orchestrator = AnalysisOrchestrator::from_config(&config, http, ScoringConfig::default())?;
//!
//! let result = orchestrator
//!     .analyze_url("https://example.com", &AnalyzeOptions::default())
//!     .await;
//! println!("{:.1} ({})", result.final_score(), result.risk_level());
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod ai;
pub mod analyzers;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error_handling;
pub mod initialization;
pub mod orchestrator;
pub mod patterns;
pub mod reputation;
pub mod scoring;
pub mod tls;
pub mod utils;
pub mod validation;
pub mod whois;

#[cfg(test)]
mod test_support;

// Re-export public API
pub use analyzers::{AnalysisRequest, Analyzed, ServiceKind, ServiceResponse};
pub use config::{AiProvider, Config, LogFormat, LogLevel};
pub use error_handling::{AnalysisError, ConfigError, ErrorKind};
pub use orchestrator::{
    AnalysisOrchestrator, AnalysisServices, AnalysisStatistics, AnalyzeOptions,
    OrchestrationResult,
};
pub use scoring::{RiskLevel, ScoringCalculator, ScoringConfig, ScoringResult};
pub use validation::{validate_url, ParsedUrl, UrlValidationError};
