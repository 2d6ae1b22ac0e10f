//! Score normalization.
//!
//! Every source is first brought onto a 0-100 risk scale; the configured
//! method then reshapes that scale. All methods are monotonic and map the
//! range onto itself.

use super::config::NormalizationMethod;

/// Midpoint and steepness of the sigmoid curve.
const SIGMOID_MIDPOINT: f64 = 50.0;
const SIGMOID_SCALE: f64 = 10.0;

/// Applies `method` to a 0-100 score. Non-finite input is treated as 0.
pub fn normalize(score: f64, method: NormalizationMethod) -> f64 {
    let x = if score.is_finite() {
        score.clamp(0.0, 100.0)
    } else {
        0.0
    };
    let normalized = match method {
        NormalizationMethod::Linear => x,
        NormalizationMethod::Logarithmic => 100.0 * (1.0 + x).ln() / 101f64.ln(),
        NormalizationMethod::Sigmoid => {
            100.0 / (1.0 + (-(x - SIGMOID_MIDPOINT) / SIGMOID_SCALE).exp())
        }
    };
    normalized.clamp(0.0, 100.0)
}

/// Converts a 0-1 fraction to the 0-100 scale.
pub fn fraction_to_percent(value: f64) -> f64 {
    (value * 100.0).clamp(0.0, 100.0)
}
