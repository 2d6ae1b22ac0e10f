//! Weighted aggregation of the available signals into one score.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use chrono::Utc;
use log::{debug, warn};

use crate::error_handling::ConfigError;
use crate::utils::elapsed_ms;

use super::config::{MissingDataStrategy, ScoringConfig};
use super::normalize::{fraction_to_percent, normalize};
use super::types::{
    FactorType, RiskFactor, ScoreBreakdown, ScoringInput, ScoringMetadata, ScoringResult,
};

/// Confidence of the informational technical-indicators factor
const TECHNICAL_INDICATOR_CONFIDENCE: f64 = 0.5;

/// One available source, brought onto the common shape.
struct Signal {
    /// Native score of the source
    raw: f64,
    /// Score on the 0-100 risk scale, before normalization
    percent: f64,
    confidence: f64,
    description: String,
    processing_time_ms: u64,
    from_cache: bool,
}

/// Scores [`ScoringInput`]s with a base configuration and optional
/// per-experiment overrides.
#[derive(Debug, Clone)]
pub struct ScoringCalculator {
    config: ScoringConfig,
    experiments: HashMap<String, ScoringConfig>,
}

impl ScoringCalculator {
    /// # Errors
    ///
    /// Returns the validation error of an invalid `config`.
    pub fn new(config: ScoringConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            experiments: HashMap::new(),
        })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Registers (or replaces) the configuration used for `experiment_id`.
    pub fn register_experiment(
        &mut self,
        experiment_id: impl Into<String>,
        config: ScoringConfig,
    ) -> Result<(), ConfigError> {
        config.validate()?;
        self.experiments.insert(experiment_id.into(), config);
        Ok(())
    }

    pub fn experiment(&self, experiment_id: &str) -> Option<&ScoringConfig> {
        self.experiments.get(experiment_id)
    }

    pub fn remove_experiment(&mut self, experiment_id: &str) -> bool {
        self.experiments.remove(experiment_id).is_some()
    }

    pub fn experiment_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.experiments.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Computes the weighted score of `input`.
    ///
    /// An unknown `experiment_id` falls back to the base configuration. A
    /// fully missing input scores `default_score` at minimum confidence.
    pub fn calculate_score(
        &self,
        input: &ScoringInput,
        experiment_id: Option<&str>,
        user_id: Option<&str>,
    ) -> ScoringResult {
        let start = Instant::now();
        let (config, config_used) = self.resolve_config(experiment_id);

        let signals: BTreeMap<FactorType, Signal> = FactorType::WEIGHTED
            .into_iter()
            .filter_map(|factor| signal(input, factor).map(|s| (factor, s)))
            .collect();
        let missing: Vec<FactorType> = FactorType::WEIGHTED
            .into_iter()
            .filter(|f| !signals.contains_key(f))
            .collect();
        let weights = applied_weights(config, &signals);

        let mut breakdown = ScoreBreakdown::default();
        let mut risk_factors = Vec::with_capacity(FactorType::WEIGHTED.len() + 1);
        for factor in FactorType::WEIGHTED {
            let weight = weights.get(&factor).copied().unwrap_or(0.0);
            match signals.get(&factor) {
                Some(signal) => {
                    let normalized = normalize(signal.percent, config.normalization);
                    breakdown.raw_scores.insert(factor, signal.raw);
                    breakdown.normalized_scores.insert(factor, normalized);
                    breakdown.weighted_scores.insert(factor, normalized * weight);
                    risk_factors.push(RiskFactor {
                        factor_type: factor,
                        score: normalized,
                        confidence: signal.confidence,
                        weight,
                        description: signal.description.clone(),
                        available: true,
                        processing_time_ms: signal.processing_time_ms,
                        from_cache: signal.from_cache,
                    });
                }
                None => {
                    let substituted = config.missing_data_strategy == MissingDataStrategy::Default;
                    if substituted {
                        breakdown.normalized_scores.insert(factor, config.default_score);
                        breakdown
                            .weighted_scores
                            .insert(factor, config.default_score * weight);
                    }
                    risk_factors.push(RiskFactor {
                        factor_type: factor,
                        score: if substituted { config.default_score } else { 0.0 },
                        confidence: 0.0,
                        weight,
                        description: format!("{} data unavailable", factor_label(factor)),
                        available: false,
                        processing_time_ms: 0,
                        from_cache: false,
                    });
                }
            }
        }
        if let Some(patterns) = &input.patterns {
            let indicators = patterns.indicators();
            risk_factors.push(RiskFactor {
                factor_type: FactorType::TechnicalIndicators,
                score: f64::from(patterns.suspicious_score.min(100)),
                confidence: TECHNICAL_INDICATOR_CONFIDENCE,
                weight: 0.0,
                description: if patterns.is_failed() {
                    "URL pattern analysis failed".to_string()
                } else if indicators.is_empty() {
                    "No suspicious URL patterns".to_string()
                } else {
                    indicators.join("; ")
                },
                available: !patterns.is_failed(),
                processing_time_ms: 0,
                from_cache: false,
            });
        }

        breakdown.total_weight = weights.values().sum();
        let final_score = if signals.is_empty()
            && config.missing_data_strategy != MissingDataStrategy::Default
        {
            config.default_score
        } else {
            breakdown.weighted_scores.values().sum::<f64>().clamp(0.0, 100.0)
        };
        let risk_level = config.thresholds.classify(final_score);
        let confidence = overall_confidence(config, &signals, missing.len());

        let slowest_service_ms = signals
            .values()
            .map(|s| s.processing_time_ms)
            .max()
            .unwrap_or(0);
        debug!(
            "Scored {} with {config_used}: {final_score:.1} ({risk_level}), {} factor(s) missing",
            input.url,
            missing.len()
        );

        ScoringResult {
            url: input.url.clone(),
            final_score,
            risk_level,
            confidence,
            risk_factors,
            metadata: ScoringMetadata {
                total_processing_time_ms: slowest_service_ms + elapsed_ms(start),
                config_used,
                missing_factors: missing,
                redistributed_weights: weights,
                missing_data_strategy: config.missing_data_strategy,
                normalization_method: config.normalization,
                timestamp: Utc::now(),
                experiment_id: experiment_id.map(str::to_string),
                user_id: user_id.map(str::to_string),
            },
            breakdown,
        }
    }

    fn resolve_config(&self, experiment_id: Option<&str>) -> (&ScoringConfig, String) {
        match experiment_id {
            Some(id) => match self.experiments.get(id) {
                Some(config) => (config, id.to_string()),
                None => {
                    warn!("Unknown scoring experiment '{id}', using {}", self.config.name);
                    (&self.config, self.config.name.clone())
                }
            },
            None => (&self.config, self.config.name.clone()),
        }
    }
}

fn factor_label(factor: FactorType) -> &'static str {
    match factor {
        FactorType::Reputation => "Reputation",
        FactorType::DomainAge => "Domain age",
        FactorType::SslCertificate => "SSL certificate",
        FactorType::AiAnalysis => "AI analysis",
        FactorType::TechnicalIndicators => "Technical indicators",
    }
}

fn signal(input: &ScoringInput, factor: FactorType) -> Option<Signal> {
    match factor {
        FactorType::Reputation => input.reputation.as_ref().map(|r| {
            let a = &r.analysis;
            let description = if a.is_clean {
                "No threats found".to_string()
            } else {
                let types: Vec<&str> =
                    a.threat_matches.iter().map(|m| m.threat_type.as_str()).collect();
                format!(
                    "{} threat match(es): {}",
                    a.threat_matches.len(),
                    types.join(", ")
                )
            };
            Signal {
                raw: a.score,
                percent: a.score,
                confidence: a.confidence,
                description,
                processing_time_ms: r.processing_time_ms,
                from_cache: r.from_cache,
            }
        }),
        FactorType::DomainAge => input.whois.as_ref().map(|w| {
            let a = &w.analysis;
            let mut description = match a.age_in_days {
                Some(days) => format!("Domain registered {days} days ago"),
                None => "Domain age unknown".to_string(),
            };
            if a.privacy_protected {
                description.push_str(", registrant hidden by privacy service");
            }
            Signal {
                raw: a.score,
                percent: fraction_to_percent(a.score),
                confidence: a.confidence,
                description,
                processing_time_ms: w.processing_time_ms,
                from_cache: w.from_cache,
            }
        }),
        FactorType::SslCertificate => input.ssl.as_ref().map(|s| {
            let a = &s.analysis;
            let description = if a.validation.errors.is_empty() {
                format!(
                    "Valid certificate issued by {}, expires in {} days",
                    a.ca_trust.issuer, a.dates.days_until_expiry
                )
            } else {
                a.validation.errors.join("; ")
            };
            Signal {
                raw: a.score,
                percent: a.score,
                confidence: a.confidence,
                description,
                processing_time_ms: s.processing_time_ms,
                from_cache: s.from_cache,
            }
        }),
        FactorType::AiAnalysis => input.ai.as_ref().map(|ai| {
            let a = &ai.analysis;
            let description = if a.explanation.is_empty() {
                format!("AI classification: {}", a.scam_category.as_str())
            } else {
                format!("AI classification: {} ({})", a.scam_category.as_str(), a.explanation)
            };
            Signal {
                raw: a.risk_score,
                percent: a.risk_score,
                confidence: a.confidence,
                description,
                processing_time_ms: ai.processing_time_ms,
                from_cache: ai.from_cache,
            }
        }),
        FactorType::TechnicalIndicators => None,
    }
}

/// Weight applied to every weighted factor under the configured strategy.
fn applied_weights(
    config: &ScoringConfig,
    signals: &BTreeMap<FactorType, Signal>,
) -> BTreeMap<FactorType, f64> {
    let available_mass: f64 = signals.keys().map(|f| config.weights.get(*f)).sum();

    FactorType::WEIGHTED
        .into_iter()
        .map(|factor| {
            let configured = config.weights.get(factor);
            let available = signals.contains_key(&factor);
            let weight = match config.missing_data_strategy {
                MissingDataStrategy::Redistribute if !available => 0.0,
                MissingDataStrategy::Redistribute if available_mass > 0.0 => {
                    configured / available_mass
                }
                // Every available factor is weighted zero: share equally
                MissingDataStrategy::Redistribute => 1.0 / signals.len() as f64,
                MissingDataStrategy::Penalty if !available => 0.0,
                MissingDataStrategy::Penalty | MissingDataStrategy::Default => configured,
            };
            (factor, weight)
        })
        .collect()
}

/// Weighted mean of the available confidences, less the missing-factor
/// penalty, floored at the configured minimum.
fn overall_confidence(
    config: &ScoringConfig,
    signals: &BTreeMap<FactorType, Signal>,
    missing: usize,
) -> f64 {
    if signals.is_empty() {
        return config.minimum_confidence;
    }
    let weight_sum: f64 = signals.keys().map(|f| config.weights.get(*f)).sum();
    let mean = if weight_sum > 0.0 {
        signals
            .iter()
            .map(|(f, s)| s.confidence.clamp(0.0, 1.0) * config.weights.get(*f))
            .sum::<f64>()
            / weight_sum
    } else {
        signals.values().map(|s| s.confidence.clamp(0.0, 1.0)).sum::<f64>() / signals.len() as f64
    };
    let penalized = mean - config.missing_factor_penalty * missing as f64;
    penalized.clamp(config.minimum_confidence, 1.0)
}
