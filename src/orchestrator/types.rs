//! Orchestration result types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::analyzers::ServiceKind;
use crate::config::{FALLBACK_CONFIDENCE, FALLBACK_SCORE};
use crate::error_handling::AnalysisError;
use crate::scoring::{
    FactorType, MissingDataStrategy, NormalizationMethod, RiskFactor, RiskLevel, ScoreBreakdown,
    ScoringMetadata, ScoringResult,
};

/// Name reported as `configUsed` in fallback results.
pub const FALLBACK_CONFIG_NAME: &str = "fallback";

/// Per-call options of [`super::AnalysisOrchestrator::analyze_url`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyzeOptions {
    /// Skip every cache read; fresh results are still written back
    pub force_refresh: bool,
    pub experiment_id: Option<String>,
    pub user_id: Option<String>,
}

impl AnalyzeOptions {
    pub fn force_refresh() -> Self {
        Self {
            force_refresh: true,
            ..Self::default()
        }
    }
}

/// Outcome of one service call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSummary {
    pub success: bool,
    pub processing_time_ms: u64,
    pub from_cache: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<AnalysisError>,
}

impl ServiceSummary {
    pub fn succeeded(processing_time_ms: u64, from_cache: bool) -> Self {
        Self {
            success: true,
            processing_time_ms,
            from_cache,
            error: None,
        }
    }

    pub fn failed(error: AnalysisError, processing_time_ms: u64) -> Self {
        Self {
            success: false,
            processing_time_ms,
            from_cache: false,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationMetrics {
    pub services_executed: usize,
    pub services_succeeded: usize,
    pub services_failed: usize,
    pub total_processing_time_ms: u64,
    pub parallel_execution: bool,
    pub cache_enabled: bool,
    /// The whole result was served from the orchestration cache
    pub from_cache: bool,
}

/// Everything one `analyze_url` call produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationResult {
    pub url: String,
    pub scoring: ScoringResult,
    pub services: BTreeMap<ServiceKind, ServiceSummary>,
    pub metrics: OrchestrationMetrics,
    /// Set when the result is the neutral fallback rather than a real score
    pub fallback: bool,
    /// The failure that triggered the fallback
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<AnalysisError>,
    pub timestamp: DateTime<Utc>,
}

impl OrchestrationResult {
    /// The neutral result returned when no score could be computed: score 50,
    /// medium risk, confidence 0.3, every service failed with `error`.
    pub fn fallback(url: &str, error: AnalysisError, elapsed_ms: u64, cache_enabled: bool) -> Self {
        let now = Utc::now();
        let risk_factors = FactorType::WEIGHTED
            .into_iter()
            .map(|factor_type| RiskFactor {
                factor_type,
                score: 0.0,
                confidence: 0.0,
                weight: 0.0,
                description: error.message.clone(),
                available: false,
                processing_time_ms: 0,
                from_cache: false,
            })
            .collect();
        let services: BTreeMap<ServiceKind, ServiceSummary> = ServiceKind::iter()
            .map(|service| (service, ServiceSummary::failed(error.clone(), 0)))
            .collect();

        Self {
            url: url.to_string(),
            scoring: ScoringResult {
                url: url.to_string(),
                final_score: FALLBACK_SCORE,
                risk_level: RiskLevel::Medium,
                confidence: FALLBACK_CONFIDENCE,
                risk_factors,
                metadata: ScoringMetadata {
                    total_processing_time_ms: elapsed_ms,
                    config_used: FALLBACK_CONFIG_NAME.to_string(),
                    missing_factors: FactorType::WEIGHTED.to_vec(),
                    redistributed_weights: FactorType::WEIGHTED.into_iter().map(|f| (f, 0.0)).collect(),
                    missing_data_strategy: MissingDataStrategy::default(),
                    normalization_method: NormalizationMethod::default(),
                    timestamp: now,
                    experiment_id: None,
                    user_id: None,
                },
                breakdown: ScoreBreakdown::default(),
            },
            metrics: OrchestrationMetrics {
                services_executed: services.len(),
                services_succeeded: 0,
                services_failed: services.len(),
                total_processing_time_ms: elapsed_ms,
                parallel_execution: true,
                cache_enabled,
                from_cache: false,
            },
            services,
            fallback: true,
            error: Some(error),
            timestamp: now,
        }
    }

    pub fn final_score(&self) -> f64 {
        self.scoring.final_score
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.scoring.risk_level
    }

    /// Whether the URL was rejected before any analysis.
    pub fn is_validation_failure(&self) -> bool {
        self.error
            .as_ref()
            .is_some_and(|e| e.kind == crate::error_handling::ErrorKind::Validation)
    }
}
