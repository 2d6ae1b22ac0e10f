//! Configuration types and CLI options.
//!
//! `Config` is both the library configuration (constructible with
//! `..Default::default()`) and the clap definition used by the binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::config::constants::*;
use crate::error_handling::ConfigError;

/// Logging level for the application.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// LLM provider used by the content analyzer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiProvider {
    /// OpenAI-compatible chat completions API
    #[value(name = "openai")]
    OpenAi,
    /// Anthropic messages API
    Anthropic,
}

impl AiProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiProvider::OpenAi => "openai",
            AiProvider::Anthropic => "anthropic",
        }
    }

    /// Default API base URL for the provider.
    pub fn default_api_base(&self) -> &'static str {
        match self {
            AiProvider::OpenAi => OPENAI_API_BASE,
            AiProvider::Anthropic => ANTHROPIC_API_BASE,
        }
    }
}

/// Library and CLI configuration.
///
/// # Examples
///
/// ```no_run
/// use url_risk::Config;
///
/// let config = Config {
///     min_successful_services: 1,
///     enable_cache: false,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "url_risk",
    version,
    about = "Scores URLs for phishing, malware and scam risk using reputation, WHOIS, TLS and AI signals"
)]
pub struct Config {
    /// URLs to analyze
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain")]
    pub log_format: LogFormat,

    /// Pretty-print JSON results
    #[arg(long)]
    pub pretty: bool,

    /// Bypass cached results and recompute every signal
    #[arg(long)]
    pub force_refresh: bool,

    /// Scoring experiment identifier
    #[arg(long)]
    pub experiment_id: Option<String>,

    /// Caller identifier recorded in the result metadata
    #[arg(long)]
    pub user_id: Option<String>,

    /// JSON file with a scoring configuration (weights, thresholds, strategy)
    #[arg(long, value_name = "PATH")]
    pub scoring_config: Option<PathBuf>,

    /// Threat-reputation API key
    #[arg(long, env = "REPUTATION_API_KEY", hide_env_values = true)]
    pub reputation_api_key: Option<String>,

    /// Threat-reputation API base URL
    #[arg(long, default_value = REPUTATION_API_BASE)]
    pub reputation_api_base: String,

    /// LLM provider for content analysis
    #[arg(long, value_enum, default_value = "openai")]
    pub ai_provider: AiProvider,

    /// LLM provider API key
    #[arg(long, env = "AI_API_KEY", hide_env_values = true)]
    pub ai_api_key: Option<String>,

    /// LLM provider API base URL (defaults to the provider's public endpoint)
    #[arg(long)]
    pub ai_api_base: Option<String>,

    /// LLM model name
    #[arg(long, default_value = DEFAULT_AI_MODEL)]
    pub ai_model: String,

    /// Maximum estimated cost of one AI analysis in USD
    #[arg(long, default_value_t = AI_COST_THRESHOLD_USD)]
    pub ai_cost_threshold: f64,

    /// Reputation service timeout in seconds
    #[arg(long, default_value_t = REPUTATION_TIMEOUT_SECS)]
    pub reputation_timeout_secs: u64,

    /// WHOIS service timeout in seconds
    #[arg(long, default_value_t = WHOIS_TIMEOUT_SECS)]
    pub whois_timeout_secs: u64,

    /// Certificate service timeout in seconds
    #[arg(long, default_value_t = SSL_TIMEOUT_SECS)]
    pub ssl_timeout_secs: u64,

    /// AI service timeout in seconds
    #[arg(long, default_value_t = AI_TIMEOUT_SECS)]
    pub ai_timeout_secs: u64,

    /// Scoring step timeout in milliseconds
    #[arg(long, default_value_t = SCORING_TIMEOUT_MS)]
    pub scoring_timeout_ms: u64,

    /// Overall analysis budget in seconds
    #[arg(long, default_value_t = ANALYSIS_TIMEOUT_SECS)]
    pub analysis_timeout_secs: u64,

    /// Maximum WHOIS retries after the first attempt
    #[arg(long, default_value_t = RETRY_MAX_RETRIES)]
    pub whois_max_retries: usize,

    /// Minimum number of services that must succeed to produce a score
    #[arg(long, default_value_t = MIN_SUCCESSFUL_SERVICES)]
    pub min_successful_services: usize,

    /// Disable result caching
    #[arg(long = "no-cache", action = ArgAction::SetFalse)]
    pub enable_cache: bool,

    /// Persist cached results as JSON files under this directory
    #[arg(long, value_name = "DIR", env = "URL_RISK_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Number of analyses kept for aggregate statistics
    #[arg(long, default_value_t = HISTORY_CAPACITY)]
    pub history_capacity: usize,

    /// Allow private, loopback and localhost targets
    #[arg(long)]
    pub allow_private_hosts: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            pretty: false,
            force_refresh: false,
            experiment_id: None,
            user_id: None,
            scoring_config: None,
            reputation_api_key: None,
            reputation_api_base: REPUTATION_API_BASE.to_string(),
            ai_provider: AiProvider::OpenAi,
            ai_api_key: None,
            ai_api_base: None,
            ai_model: DEFAULT_AI_MODEL.to_string(),
            ai_cost_threshold: AI_COST_THRESHOLD_USD,
            reputation_timeout_secs: REPUTATION_TIMEOUT_SECS,
            whois_timeout_secs: WHOIS_TIMEOUT_SECS,
            ssl_timeout_secs: SSL_TIMEOUT_SECS,
            ai_timeout_secs: AI_TIMEOUT_SECS,
            scoring_timeout_ms: SCORING_TIMEOUT_MS,
            analysis_timeout_secs: ANALYSIS_TIMEOUT_SECS,
            whois_max_retries: RETRY_MAX_RETRIES,
            min_successful_services: MIN_SUCCESSFUL_SERVICES,
            enable_cache: true,
            cache_dir: None,
            history_capacity: HISTORY_CAPACITY,
            allow_private_hosts: false,
        }
    }
}

/// Timeouts applied by the orchestrator around each stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceTimeouts {
    pub reputation: Duration,
    pub whois: Duration,
    pub ssl: Duration,
    pub ai: Duration,
    pub scoring: Duration,
    pub analysis: Duration,
}

impl Default for ServiceTimeouts {
    fn default() -> Self {
        Config::default().timeouts()
    }
}

impl Config {
    /// Per-stage timeouts derived from the configured values.
    pub fn timeouts(&self) -> ServiceTimeouts {
        ServiceTimeouts {
            reputation: Duration::from_secs(self.reputation_timeout_secs),
            whois: Duration::from_secs(self.whois_timeout_secs),
            ssl: Duration::from_secs(self.ssl_timeout_secs),
            ai: Duration::from_secs(self.ai_timeout_secs),
            scoring: Duration::from_millis(self.scoring_timeout_ms),
            analysis: Duration::from_secs(self.analysis_timeout_secs),
        }
    }

    /// AI API base URL, falling back to the provider default.
    pub fn ai_api_base(&self) -> String {
        self.ai_api_base
            .clone()
            .unwrap_or_else(|| self.ai_provider.default_api_base().to_string())
    }

    /// Checks the operational settings for consistency.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` when a timeout is zero, the overall budget is not
    /// larger than every service timeout, the minimum-services gate is outside
    /// `1..=4`, or the AI cost ceiling is negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = self.timeouts();
        let services = [
            ("reputation", t.reputation),
            ("whois", t.whois),
            ("ssl", t.ssl),
            ("ai", t.ai),
            ("scoring", t.scoring),
        ];
        for (name, timeout) in services {
            if timeout.is_zero() {
                return Err(ConfigError::Invalid(format!(
                    "{name} timeout must be greater than zero"
                )));
            }
        }
        let slowest = [t.reputation, t.whois, t.ssl, t.ai]
            .into_iter()
            .max()
            .unwrap_or_default();
        if t.analysis <= slowest {
            return Err(ConfigError::Invalid(format!(
                "analysis timeout ({}s) must exceed the slowest service timeout ({}s)",
                t.analysis.as_secs(),
                slowest.as_secs()
            )));
        }
        if !(1..=4).contains(&self.min_successful_services) {
            return Err(ConfigError::Invalid(format!(
                "min_successful_services must be between 1 and 4, got {}",
                self.min_successful_services
            )));
        }
        if !(self.ai_cost_threshold >= 0.0) {
            return Err(ConfigError::Invalid(
                "ai_cost_threshold must be a non-negative number".to_string(),
            ));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid(
                "history_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Warn),
            log::LevelFilter::Warn
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Info),
            log::LevelFilter::Info
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.min_successful_services, 2);
        assert_eq!(config.history_capacity, 100);
        assert!(config.enable_cache);
        assert!(!config.force_refresh);
        assert_eq!(config.ai_provider, AiProvider::OpenAi);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_parse_defaults_match_default_impl() {
        let parsed = Config::try_parse_from(["url_risk", "https://example.com"]).unwrap();
        let default = Config::default();
        assert_eq!(parsed.urls, vec!["https://example.com".to_string()]);
        assert_eq!(parsed.enable_cache, default.enable_cache);
        assert_eq!(parsed.timeouts(), default.timeouts());
        assert_eq!(parsed.whois_max_retries, default.whois_max_retries);
    }

    #[test]
    fn test_config_parse_no_cache_flag() {
        let parsed = Config::try_parse_from(["url_risk", "--no-cache", "example.com"]).unwrap();
        assert!(!parsed.enable_cache);
    }

    #[test]
    fn test_config_parse_ai_provider() {
        let parsed =
            Config::try_parse_from(["url_risk", "--ai-provider", "anthropic", "example.com"])
                .unwrap();
        assert_eq!(parsed.ai_provider, AiProvider::Anthropic);
        assert_eq!(parsed.ai_api_base(), ANTHROPIC_API_BASE);
    }

    #[test]
    fn test_validate_rejects_small_analysis_budget() {
        let config = Config {
            analysis_timeout_secs: 10,
            ai_timeout_secs: 30,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_min_services_out_of_range() {
        let zero = Config {
            min_successful_services: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());

        let five = Config {
            min_successful_services: 5,
            ..Default::default()
        };
        assert!(five.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = Config {
            ssl_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_cost_threshold() {
        let config = Config {
            ai_cost_threshold: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
