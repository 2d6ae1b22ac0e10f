//! Scoring configuration and validation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error_handling::ConfigError;

use super::types::{FactorType, RiskLevel};

/// Allowed deviation of the weight sum from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.01;
/// Minimum distance between consecutive risk thresholds.
pub const MIN_THRESHOLD_GAP: f64 = 5.0;

/// How absent factors affect the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingDataStrategy {
    /// Scale the available weights up so they sum to 1.0
    #[default]
    Redistribute,
    /// Keep configured weights; the missing share is simply lost
    Penalty,
    /// Score the missing factor at `default_score` with its configured weight
    Default,
}

/// Mapping from a source's 0-100 risk to the score that gets weighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMethod {
    #[default]
    Linear,
    Logarithmic,
    Sigmoid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorWeights {
    pub reputation: f64,
    pub domain_age: f64,
    pub ssl_certificate: f64,
    pub ai_analysis: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            reputation: 0.40,
            domain_age: 0.25,
            ssl_certificate: 0.20,
            ai_analysis: 0.15,
        }
    }
}

impl FactorWeights {
    /// Configured weight of a factor; informational factors weigh nothing.
    pub fn get(&self, factor: FactorType) -> f64 {
        match factor {
            FactorType::Reputation => self.reputation,
            FactorType::DomainAge => self.domain_age,
            FactorType::SslCertificate => self.ssl_certificate,
            FactorType::AiAnalysis => self.ai_analysis,
            FactorType::TechnicalIndicators => 0.0,
        }
    }

    pub fn sum(&self) -> f64 {
        self.reputation + self.domain_age + self.ssl_certificate + self.ai_analysis
    }
}

/// Tier boundaries: `score <= low_risk_max` is low, `score >= high_risk_min`
/// is high, anything else is medium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskThresholds {
    pub low_risk_max: f64,
    pub medium_risk_max: f64,
    pub high_risk_min: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            low_risk_max: 30.0,
            medium_risk_max: 65.0,
            high_risk_min: 70.0,
        }
    }
}

impl RiskThresholds {
    pub fn classify(&self, score: f64) -> RiskLevel {
        if score <= self.low_risk_max {
            RiskLevel::Low
        } else if score >= self.high_risk_min {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        }
    }
}

/// Complete scoring configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringConfig {
    /// Reported in result metadata as `configUsed`
    pub name: String,
    pub weights: FactorWeights,
    pub thresholds: RiskThresholds,
    pub missing_data_strategy: MissingDataStrategy,
    /// Confidence lost per missing factor
    pub missing_factor_penalty: f64,
    pub minimum_confidence: f64,
    pub normalization: NormalizationMethod,
    /// Neutral score for the `default` strategy and for fully missing input
    pub default_score: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            weights: FactorWeights::default(),
            thresholds: RiskThresholds::default(),
            missing_data_strategy: MissingDataStrategy::default(),
            missing_factor_penalty: 0.1,
            minimum_confidence: 0.1,
            normalization: NormalizationMethod::default(),
            default_score: 50.0,
        }
    }
}

impl ScoringConfig {
    /// Checks the weight and threshold invariants.
    ///
    /// # Errors
    ///
    /// `WeightSum` when the weights do not sum to 1.0 within tolerance,
    /// `Thresholds` when tiers are out of order or closer than 5 points, and
    /// `Invalid` for any other out-of-range value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for factor in FactorType::WEIGHTED {
            let weight = self.weights.get(factor);
            if !(0.0..=1.0).contains(&weight) {
                return Err(ConfigError::Invalid(format!(
                    "Weight for {factor} must be within [0, 1], got {weight}"
                )));
            }
        }
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightSum {
                sum,
                tolerance: WEIGHT_SUM_TOLERANCE,
            });
        }

        let t = &self.thresholds;
        if t.low_risk_max < 0.0 || t.high_risk_min > 100.0 {
            return Err(ConfigError::Thresholds(
                "thresholds must lie within [0, 100]".to_string(),
            ));
        }
        if t.medium_risk_max - t.low_risk_max < MIN_THRESHOLD_GAP {
            return Err(ConfigError::Thresholds(format!(
                "mediumRiskMax ({}) must exceed lowRiskMax ({}) by at least {MIN_THRESHOLD_GAP}",
                t.medium_risk_max, t.low_risk_max
            )));
        }
        if t.high_risk_min - t.medium_risk_max < MIN_THRESHOLD_GAP {
            return Err(ConfigError::Thresholds(format!(
                "highRiskMin ({}) must exceed mediumRiskMax ({}) by at least {MIN_THRESHOLD_GAP}",
                t.high_risk_min, t.medium_risk_max
            )));
        }

        if !(0.0..=1.0).contains(&self.missing_factor_penalty) {
            return Err(ConfigError::Invalid(
                "missingFactorPenalty must be within [0, 1]".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.minimum_confidence) {
            return Err(ConfigError::Invalid(
                "minimumConfidence must be within [0, 1]".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.default_score) {
            return Err(ConfigError::Invalid(
                "defaultScore must be within [0, 100]".to_string(),
            ));
        }
        Ok(())
    }

    /// Reads a JSON configuration file and validates it. Missing fields take
    /// their default values.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
        let config: ScoringConfig = serde_json::from_str(&content)
            .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }
}
