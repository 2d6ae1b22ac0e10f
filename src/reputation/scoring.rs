//! Threat match severity scoring.

use chrono::{DateTime, Utc};

use crate::scoring::RiskLevel;

use super::types::{ReputationAnalysis, ReputationRiskFactor, ThreatMatch};

/// Added for every match beyond the most severe one.
const EXTRA_MATCH_POINTS: f64 = 5.0;
const HIGH_RISK_MIN: f64 = 70.0;
const MEDIUM_RISK_MIN: f64 = 30.0;
const MATCH_CONFIDENCE: f64 = 0.95;
const CLEAN_CONFIDENCE: f64 = 0.85;

/// Base severity of a threat type, 0-100.
pub fn threat_severity(threat_type: &str) -> f64 {
    match threat_type {
        "MALWARE" => 90.0,
        "SOCIAL_ENGINEERING" => 85.0,
        "POTENTIALLY_HARMFUL_APPLICATION" => 70.0,
        "UNWANTED_SOFTWARE" => 60.0,
        _ => 50.0,
    }
}

/// Share of users exposed on a platform.
pub fn platform_factor(platform_type: &str) -> f64 {
    match platform_type {
        "ANY_PLATFORM" | "ALL_PLATFORMS" => 1.0,
        "WINDOWS" => 0.95,
        "ANDROID" | "OSX" | "CHROME" => 0.9,
        "LINUX" | "IOS" => 0.85,
        _ => 0.8,
    }
}

fn describe(threat_type: &str) -> &'static str {
    match threat_type {
        "MALWARE" => "Distributes malware",
        "SOCIAL_ENGINEERING" => "Phishing or deceptive content",
        "POTENTIALLY_HARMFUL_APPLICATION" => "Hosts potentially harmful applications",
        "UNWANTED_SOFTWARE" => "Distributes unwanted software",
        _ => "Listed as a threat",
    }
}

/// Builds the analysis for `url` from the provider's matches.
pub fn analyze_matches(url: &str, matches: Vec<ThreatMatch>, now: DateTime<Utc>) -> ReputationAnalysis {
    let risk_factors: Vec<ReputationRiskFactor> = matches
        .iter()
        .map(|m| ReputationRiskFactor {
            threat_type: m.threat_type.clone(),
            platform_type: m.platform_type.clone(),
            score: threat_severity(&m.threat_type) * platform_factor(&m.platform_type),
            description: format!("{} ({})", describe(&m.threat_type), m.platform_type),
        })
        .collect();

    let score = match risk_factors.iter().map(|f| f.score).reduce(f64::max) {
        Some(max) => (max + EXTRA_MATCH_POINTS * (risk_factors.len() - 1) as f64).min(100.0),
        None => 0.0,
    };

    let risk_level = if score >= HIGH_RISK_MIN {
        RiskLevel::High
    } else if score >= MEDIUM_RISK_MIN {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    ReputationAnalysis {
        url: url.to_string(),
        is_clean: matches.is_empty(),
        confidence: if matches.is_empty() {
            CLEAN_CONFIDENCE
        } else {
            MATCH_CONFIDENCE
        },
        threat_matches: matches,
        risk_factors,
        score,
        risk_level,
        timestamp: now,
    }
}
