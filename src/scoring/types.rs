//! Scoring data structures.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::EnumIter as EnumIterMacro;

use crate::ai::AiAnalysis;
use crate::analyzers::Analyzed;
use crate::patterns::UrlPatternAnalysis;
use crate::reputation::ReputationAnalysis;
use crate::tls::SslCertificateAnalysis;
use crate::whois::DomainAgeAnalysis;

use super::config::{MissingDataStrategy, NormalizationMethod};

/// Risk tier of a final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signal a risk factor was derived from. Declaration order is the order of
/// `risk_factors` in every result.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIterMacro, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FactorType {
    Reputation,
    DomainAge,
    SslCertificate,
    AiAnalysis,
    /// Local URL-pattern findings; informational, never weighted
    TechnicalIndicators,
}

impl FactorType {
    /// The four weighted factors.
    pub const WEIGHTED: [FactorType; 4] = [
        FactorType::Reputation,
        FactorType::DomainAge,
        FactorType::SslCertificate,
        FactorType::AiAnalysis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FactorType::Reputation => "reputation",
            FactorType::DomainAge => "domain_age",
            FactorType::SslCertificate => "ssl_certificate",
            FactorType::AiAnalysis => "ai_analysis",
            FactorType::TechnicalIndicators => "technical_indicators",
        }
    }
}

impl fmt::Display for FactorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One weighted signal in a [`ScoringResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactor {
    #[serde(rename = "type")]
    pub factor_type: FactorType,
    /// Normalized risk, 0-100
    pub score: f64,
    /// 0-1
    pub confidence: f64,
    /// Weight actually applied (after redistribution)
    pub weight: f64,
    pub description: String,
    pub available: bool,
    pub processing_time_ms: u64,
    pub from_cache: bool,
}

/// Whatever the analyzers produced for one URL. Absent sources are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringInput {
    pub url: String,
    pub reputation: Option<Analyzed<ReputationAnalysis>>,
    pub whois: Option<Analyzed<DomainAgeAnalysis>>,
    pub ssl: Option<Analyzed<SslCertificateAnalysis>>,
    pub ai: Option<Analyzed<AiAnalysis>>,
    /// Local pattern analysis, reported as a zero-weight factor
    pub patterns: Option<UrlPatternAnalysis>,
}

impl ScoringInput {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Number of weighted factors present.
    pub fn available_count(&self) -> usize {
        [
            self.reputation.is_some(),
            self.whois.is_some(),
            self.ssl.is_some(),
            self.ai.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringMetadata {
    pub total_processing_time_ms: u64,
    /// Name of the configuration (base or experiment) that produced the score
    pub config_used: String,
    pub missing_factors: Vec<FactorType>,
    /// Weights applied to each weighted factor
    pub redistributed_weights: BTreeMap<FactorType, f64>,
    pub missing_data_strategy: MissingDataStrategy,
    pub normalization_method: NormalizationMethod,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experiment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub weighted_scores: BTreeMap<FactorType, f64>,
    pub normalized_scores: BTreeMap<FactorType, f64>,
    /// Native scores as reported by each source (WHOIS on 0-1, others 0-100)
    pub raw_scores: BTreeMap<FactorType, f64>,
    pub total_weight: f64,
}

/// Final weighted assessment of one URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringResult {
    pub url: String,
    pub final_score: f64,
    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub risk_factors: Vec<RiskFactor>,
    pub metadata: ScoringMetadata,
    pub breakdown: ScoreBreakdown,
}
