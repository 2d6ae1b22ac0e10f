//! Scoring invariants over real analyzer outputs, exercised through the
//! public API only.

mod common;

use chrono::{Duration, Utc};
use proptest::prelude::*;

use url_risk::ai::{AiAnalysis, ModelVerdict, ScamCategory};
use url_risk::config::AiProvider;
use url_risk::reputation::{analyze_matches, ThreatMatch};
use url_risk::scoring::{FactorType, MissingDataStrategy, ScoringInput};
use url_risk::tls::analyze_certificate;
use url_risk::whois::{analyze_record, WhoisRecord};
use url_risk::{Analyzed, RiskLevel, ScoringCalculator, ScoringConfig};

const URL: &str = "https://example.com/";
const THREAT_TYPES: &[&str] = &[
    "MALWARE",
    "SOCIAL_ENGINEERING",
    "UNWANTED_SOFTWARE",
    "POTENTIALLY_HARMFUL_APPLICATION",
];

fn input(
    threats: Option<Vec<usize>>,
    age_days: Option<i64>,
    ssl: bool,
    ai: Option<(f64, f64)>,
) -> ScoringInput {
    let now = Utc::now();
    ScoringInput {
        reputation: threats.map(|idx| {
            let matches = idx
                .into_iter()
                .map(|i| ThreatMatch {
                    threat_type: THREAT_TYPES[i].to_string(),
                    platform_type: "ANY_PLATFORM".to_string(),
                    threat_entry_type: Some("URL".to_string()),
                    url: Some(URL.to_string()),
                })
                .collect();
            Analyzed::fresh(analyze_matches(URL, matches, now), 3)
        }),
        whois: age_days.map(|days| {
            let record = WhoisRecord {
                creation_date: Some(now - Duration::days(days)),
                registrar: Some("MarkMonitor Inc.".to_string()),
                ..WhoisRecord::default()
            };
            Analyzed::fresh(analyze_record("example.com", &record, now), 7)
        }),
        ssl: ssl.then(|| {
            let chain = common::trusted_chain("example.com");
            Analyzed::fresh(
                analyze_certificate("example.com", 443, &chain, now).expect("valid chain"),
                11,
            )
        }),
        ai: ai.map(|(risk_score, confidence)| {
            let verdict = ModelVerdict {
                risk_score,
                confidence,
                primary_risks: Vec::new(),
                scam_category: ScamCategory::Other,
                indicators: Vec::new(),
                explanation: String::new(),
            };
            Analyzed::fresh(
                AiAnalysis::from_verdict(verdict, AiProvider::OpenAi, "gpt-4o-mini", None, 0.0, None),
                20,
            )
        }),
        ..ScoringInput::new(URL)
    }
}

fn strategy() -> impl Strategy<Value = MissingDataStrategy> {
    prop_oneof![
        Just(MissingDataStrategy::Redistribute),
        Just(MissingDataStrategy::Penalty),
        Just(MissingDataStrategy::Default),
    ]
}

proptest! {
    #[test]
    fn test_result_invariants(
        threats in prop::option::of(prop::collection::vec(0usize..4, 0..3)),
        age_days in prop::option::of(0i64..10_000),
        ssl in any::<bool>(),
        ai in prop::option::of((0.0f64..=100.0, 0.0f64..=1.0)),
        missing_data_strategy in strategy(),
    ) {
        let config = ScoringConfig { missing_data_strategy, ..ScoringConfig::default() };
        let calculator = ScoringCalculator::new(config.clone()).unwrap();
        let input = input(threats, age_days, ssl, ai);
        let result = calculator.calculate_score(&input, None, None);

        prop_assert!((0.0..=100.0).contains(&result.final_score));
        prop_assert_eq!(result.risk_level, config.thresholds.classify(result.final_score));
        prop_assert!(result.confidence >= config.minimum_confidence);
        prop_assert!(result.confidence <= 1.0);
        prop_assert_eq!(
            result.metadata.missing_factors.len(),
            4 - input.available_count()
        );

        if input.available_count() > 0
            && missing_data_strategy == MissingDataStrategy::Redistribute
        {
            let applied: f64 = FactorType::WEIGHTED
                .iter()
                .map(|f| result.metadata.redistributed_weights.get(f).copied().unwrap_or(0.0))
                .sum();
            prop_assert!((applied - 1.0).abs() <= 0.01, "applied weight {}", applied);
        }
    }
}

#[test]
fn test_no_signals_is_neutral() {
    let calculator = ScoringCalculator::new(ScoringConfig::default()).unwrap();
    let result = calculator.calculate_score(&input(None, None, false, None), None, None);
    assert_eq!(result.final_score, 50.0);
    assert_eq!(result.risk_level, RiskLevel::Medium);
    assert_eq!(result.confidence, ScoringConfig::default().minimum_confidence);
}

#[test]
fn test_young_domain_with_clean_reputation_is_medium() {
    let calculator = ScoringCalculator::new(ScoringConfig::default()).unwrap();
    let result = calculator.calculate_score(&input(Some(vec![]), Some(10), false, None), None, None);
    assert_eq!(result.risk_level, RiskLevel::Medium);
    assert!(result.breakdown.normalized_scores[&FactorType::DomainAge] >= 80.0);
}

#[test]
fn test_scoring_config_file_round_trip() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"name": "strict", "thresholds": {{"lowRiskMax": 20, "mediumRiskMax": 50, "highRiskMin": 55}}}}"#
    )
    .unwrap();
    let config = ScoringConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.name, "strict");
    assert_eq!(config.thresholds.classify(52.0), RiskLevel::Medium);
    assert_eq!(config.thresholds.classify(55.0), RiskLevel::High);
    assert_eq!(config.weights, ScoringConfig::default().weights);

    let mut bad = tempfile::NamedTempFile::new().unwrap();
    write!(bad, r#"{{"weights": {{"reputation": 0.9}}}}"#).unwrap();
    assert!(ScoringConfig::load_from_file(bad.path()).is_err());
}
