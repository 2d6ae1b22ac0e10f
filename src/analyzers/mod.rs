//! Analyzer traits.
//!
//! The orchestrator depends only on these four traits, so each signal source
//! can be replaced (a different reputation provider, a mock in tests) without
//! touching orchestration. Every analyzer reports failure as an
//! [`AnalysisError`] value and never panics on provider errors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum_macros::EnumIter as EnumIterMacro;

use crate::ai::AiAnalysis;
use crate::error_handling::AnalysisError;
use crate::patterns::UrlPatternAnalysis;
use crate::reputation::ReputationAnalysis;
use crate::tls::SslCertificateAnalysis;
use crate::validation::ParsedUrl;
use crate::whois::DomainAgeAnalysis;

/// The four external signal sources.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIterMacro, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    Reputation,
    Whois,
    Ssl,
    Ai,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Reputation => "reputation",
            ServiceKind::Whois => "whois",
            ServiceKind::Ssl => "ssl",
            ServiceKind::Ai => "ai",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceKind::Reputation => "Reputation",
            ServiceKind::Whois => "WHOIS",
            ServiceKind::Ssl => "SSL",
            ServiceKind::Ai => "AI",
        }
    }
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successful analysis together with how it was obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analyzed<T> {
    pub analysis: T,
    pub processing_time_ms: u64,
    pub from_cache: bool,
}

impl<T> Analyzed<T> {
    pub fn fresh(analysis: T, processing_time_ms: u64) -> Self {
        Self {
            analysis,
            processing_time_ms,
            from_cache: false,
        }
    }

    pub fn cached(analysis: T, processing_time_ms: u64) -> Self {
        Self {
            analysis,
            processing_time_ms,
            from_cache: true,
        }
    }
}

/// Service-level response: the `Result` of an analyzer flattened into the
/// shape reported to callers that use one service on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<AnalysisError>,
    pub from_cache: bool,
    pub processing_time_ms: u64,
}

impl<T> ServiceResponse<T> {
    pub fn from_result(result: Result<Analyzed<T>, AnalysisError>, elapsed_ms: u64) -> Self {
        match result {
            Ok(analyzed) => Self {
                success: true,
                data: Some(analyzed.analysis),
                error: None,
                from_cache: analyzed.from_cache,
                processing_time_ms: analyzed.processing_time_ms,
            },
            Err(error) => Self {
                success: false,
                data: None,
                error: Some(error),
                from_cache: false,
                processing_time_ms: elapsed_ms,
            },
        }
    }
}

/// Locally derived facts handed to the content analyzer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalContext {
    pub patterns: Option<UrlPatternAnalysis>,
    pub domain_age_days: Option<i64>,
    pub registrar: Option<String>,
    pub ssl_summary: Option<String>,
    pub reputation_summary: Option<String>,
}

/// Input shared by all analyzers for one URL.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub url: ParsedUrl,
    /// Skip cache reads (results are still written back)
    pub force_refresh: bool,
    pub context: TechnicalContext,
}

impl AnalysisRequest {
    pub fn new(url: ParsedUrl) -> Self {
        Self {
            url,
            force_refresh: false,
            context: TechnicalContext::default(),
        }
    }

    pub fn with_force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }

    pub fn with_context(mut self, context: TechnicalContext) -> Self {
        self.context = context;
        self
    }
}

/// Threat-intelligence lookup of the full URL.
#[async_trait]
pub trait ReputationAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> Result<Analyzed<ReputationAnalysis>, AnalysisError>;
}

/// Registration-record analysis of the registrable domain.
#[async_trait]
pub trait DomainAgeAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> Result<Analyzed<DomainAgeAnalysis>, AnalysisError>;
}

/// TLS certificate inspection of the host.
#[async_trait]
pub trait CertificateAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> Result<Analyzed<SslCertificateAnalysis>, AnalysisError>;
}

/// LLM-based content and intent classification.
#[async_trait]
pub trait ContentAnalyzer: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest)
        -> Result<Analyzed<AiAnalysis>, AnalysisError>;
}
