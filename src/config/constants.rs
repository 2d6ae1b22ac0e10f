//! Configuration constants.
//!
//! This module defines the defaults used throughout the application: per-service
//! timeouts, cache TTLs, retry parameters and input limits.

use std::time::Duration;

// URL validation
/// Maximum URL length (2048 characters), matching common browser and server limits.
pub const MAX_URL_LENGTH: usize = 2048;

// Service timeouts
/// Reputation API call timeout in seconds
pub const REPUTATION_TIMEOUT_SECS: u64 = 10;
/// WHOIS lookup timeout in seconds (covers every retry attempt)
pub const WHOIS_TIMEOUT_SECS: u64 = 15;
/// Timeout of a single WHOIS query in seconds
pub const WHOIS_QUERY_TIMEOUT_SECS: u64 = 5;
/// Certificate inspection timeout in seconds
pub const SSL_TIMEOUT_SECS: u64 = 10;
/// AI content analysis timeout in seconds
pub const AI_TIMEOUT_SECS: u64 = 30;
/// Scoring step timeout in milliseconds
pub const SCORING_TIMEOUT_MS: u64 = 5_000;
/// Soft budget for one whole orchestration. Larger than any single service timeout.
pub const ANALYSIS_TIMEOUT_SECS: u64 = 45;

/// TCP connection timeout in seconds
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 5;
/// TLS handshake timeout in seconds
pub const TLS_HANDSHAKE_TIMEOUT_SECS: u64 = 5;
/// Default port used for certificate inspection
pub const DEFAULT_TLS_PORT: u16 = 443;

// Retry strategy
/// Initial delay in milliseconds before the first retry
pub const RETRY_BASE_DELAY_MS: u64 = 500;
/// Maximum delay between retries in milliseconds
pub const RETRY_MAX_DELAY_MS: u64 = 8_000;
/// Maximum number of retries after the initial attempt
pub const RETRY_MAX_RETRIES: usize = 3;

// Cache TTLs
/// WHOIS results are cached for 24 hours by default
pub const WHOIS_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// Certificate analyses are cached for 6 hours by default
pub const SSL_CACHE_TTL: Duration = Duration::from_secs(6 * 60 * 60);
/// Reputation verdicts are cached for 24 hours
pub const REPUTATION_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// Full orchestration results are cached for 1 hour
pub const ORCHESTRATION_CACHE_TTL: Duration = Duration::from_secs(60 * 60);
/// Maximum entries held by one in-memory cache before the oldest are evicted
pub const MAX_CACHE_ENTRIES: usize = 10_000;

// Orchestration
/// Minimum number of services that must succeed before a result is scored
pub const MIN_SUCCESSFUL_SERVICES: usize = 2;
/// Number of completed analyses kept for aggregate statistics
pub const HISTORY_CAPACITY: usize = 100;
/// Concurrent analyses while warming the cache
pub const CACHE_WARM_CONCURRENCY: usize = 4;

// Fallback result
pub const FALLBACK_SCORE: f64 = 50.0;
pub const FALLBACK_CONFIDENCE: f64 = 0.3;

// Reputation provider
pub const REPUTATION_API_BASE: &str = "https://safebrowsing.googleapis.com/v4";
pub const REPUTATION_CLIENT_ID: &str = "url-risk";

// AI provider
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
pub const ANTHROPIC_API_VERSION: &str = "2023-06-01";
pub const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";
/// Ceiling on the estimated cost of a single AI analysis, in USD
pub const AI_COST_THRESHOLD_USD: f64 = 0.05;
/// Completion budget requested from the provider
pub const AI_MAX_OUTPUT_TOKENS: u32 = 800;

// HTTP status codes
pub const HTTP_STATUS_FORBIDDEN: u16 = 403;
pub const HTTP_STATUS_UNAUTHORIZED: u16 = 401;
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// User-Agent sent to third-party APIs.
pub const DEFAULT_USER_AGENT: &str = concat!("url_risk/", env!("CARGO_PKG_VERSION"));
