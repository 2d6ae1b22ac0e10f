//! Risk scoring.
//!
//! Combines whichever of the four signals (reputation, domain age, TLS
//! certificate, AI verdict) are available into a single 0-100 score with a
//! risk tier and an overall confidence. Missing signals are handled by the
//! configured strategy; by default their weight is redistributed
//! proportionally over the signals that are present.

mod calculator;
mod config;
mod normalize;
mod types;

pub use calculator::ScoringCalculator;
pub use config::{
    FactorWeights, MissingDataStrategy, NormalizationMethod, RiskThresholds, ScoringConfig,
    MIN_THRESHOLD_GAP, WEIGHT_SUM_TOLERANCE,
};
pub use normalize::{fraction_to_percent, normalize};
pub use types::{
    FactorType, RiskFactor, RiskLevel, ScoreBreakdown, ScoringInput, ScoringMetadata,
    ScoringResult,
};

#[cfg(test)]
mod tests;
