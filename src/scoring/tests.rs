use super::*;
use crate::ai::ScamCategory;
use crate::patterns::UrlPatternAnalysis;
use crate::test_support::{
    ai_verdict, clean_reputation, domain_age, fresh, healthy_certificate, phishing_reputation,
};
use proptest::prelude::*;

const URL: &str = "https://example.com/";

fn calculator() -> ScoringCalculator {
    ScoringCalculator::new(ScoringConfig::default()).unwrap()
}

fn factor(result: &ScoringResult, factor_type: FactorType) -> &RiskFactor {
    result
        .risk_factors
        .iter()
        .find(|f| f.factor_type == factor_type)
        .unwrap()
}

fn full_input() -> ScoringInput {
    ScoringInput {
        url: URL.to_string(),
        reputation: fresh(clean_reputation(URL)),
        whois: fresh(domain_age("example.com", Some(9000), 0.1)),
        ssl: fresh(healthy_certificate("example.com")),
        ai: fresh(ai_verdict(10.0, 0.9, ScamCategory::Legitimate)),
        patterns: None,
    }
}

#[test]
fn test_new_domain_with_clean_reputation() {
    // Only reputation (clean) and a 10-day-old domain are available
    let input = ScoringInput {
        reputation: fresh(clean_reputation(URL)),
        whois: fresh(domain_age("example.com", Some(10), 0.8)),
        ..ScoringInput::new(URL)
    };
    let result = calculator().calculate_score(&input, None, None);

    let rep_weight = 0.40 / 0.65;
    let age_weight = 0.25 / 0.65;
    assert!((result.metadata.redistributed_weights[&FactorType::Reputation] - rep_weight).abs() < 1e-9);
    assert!((result.metadata.redistributed_weights[&FactorType::DomainAge] - age_weight).abs() < 1e-9);
    assert_eq!(result.metadata.redistributed_weights[&FactorType::SslCertificate], 0.0);
    assert!((result.breakdown.total_weight - 1.0).abs() < 1e-9);

    // 80 * 0.25 / 0.65
    assert!((result.final_score - 30.769).abs() < 0.01);
    assert_eq!(result.risk_level, RiskLevel::Medium);
    assert_eq!(
        result.metadata.missing_factors,
        vec![FactorType::SslCertificate, FactorType::AiAnalysis]
    );
    assert_eq!(result.breakdown.raw_scores[&FactorType::DomainAge], 0.8);
    assert_eq!(result.breakdown.normalized_scores[&FactorType::DomainAge], 80.0);
}

#[test]
fn test_all_factors_available() {
    let result = calculator().calculate_score(&full_input(), None, None);

    assert!(result.metadata.missing_factors.is_empty());
    assert_eq!(result.risk_level, RiskLevel::Low);
    // 0 * 0.4 + 10 * 0.25 + 0 * 0.2 + 10 * 0.15
    assert!((result.final_score - 4.0).abs() < 1e-9);
    assert!((result.breakdown.total_weight - 1.0).abs() < 1e-9);
    assert_eq!(result.risk_factors.len(), 4);
    assert!(result.risk_factors.iter().all(|f| f.available));
    assert_eq!(result.metadata.config_used, "default");
}

#[test]
fn test_phishing_match_dominates() {
    let input = ScoringInput {
        reputation: fresh(phishing_reputation("http://phish.test/")),
        ai: fresh(ai_verdict(95.0, 0.9, ScamCategory::Phishing)),
        ..ScoringInput::new("http://phish.test/")
    };
    let result = calculator().calculate_score(&input, None, None);
    assert_eq!(result.risk_level, RiskLevel::High);
    assert!(result.final_score >= 70.0);
    assert!(factor(&result, FactorType::Reputation)
        .description
        .contains("SOCIAL_ENGINEERING"));
}

#[test]
fn test_empty_input_is_neutral() {
    let result = calculator().calculate_score(&ScoringInput::new(URL), None, None);
    assert_eq!(result.final_score, 50.0);
    assert_eq!(result.risk_level, RiskLevel::Medium);
    assert_eq!(result.confidence, 0.1);
    assert_eq!(result.metadata.missing_factors.len(), 4);
    assert_eq!(result.breakdown.total_weight, 0.0);
    assert!(result.risk_factors.iter().all(|f| !f.available));
}

#[test]
fn test_penalty_strategy_keeps_configured_weights() {
    let config = ScoringConfig {
        missing_data_strategy: MissingDataStrategy::Penalty,
        ..ScoringConfig::default()
    };
    let input = ScoringInput {
        whois: fresh(domain_age("example.com", Some(10), 0.8)),
        ai: fresh(ai_verdict(60.0, 0.7, ScamCategory::Other)),
        ..ScoringInput::new(URL)
    };
    let result = ScoringCalculator::new(config)
        .unwrap()
        .calculate_score(&input, None, None);

    assert!((result.breakdown.total_weight - 0.40).abs() < 1e-9);
    // 80 * 0.25 + 60 * 0.15
    assert!((result.final_score - 29.0).abs() < 1e-9);
    assert_eq!(factor(&result, FactorType::Reputation).weight, 0.0);
}

#[test]
fn test_default_strategy_substitutes_neutral_score() {
    let config = ScoringConfig {
        missing_data_strategy: MissingDataStrategy::Default,
        ..ScoringConfig::default()
    };
    let input = ScoringInput {
        reputation: fresh(clean_reputation(URL)),
        ..ScoringInput::new(URL)
    };
    let result = ScoringCalculator::new(config)
        .unwrap()
        .calculate_score(&input, None, None);

    // 0 * 0.4 + 50 * (0.25 + 0.2 + 0.15)
    assert!((result.final_score - 30.0).abs() < 1e-9);
    assert!((result.breakdown.total_weight - 1.0).abs() < 1e-9);
    let ssl = factor(&result, FactorType::SslCertificate);
    assert!(!ssl.available);
    assert_eq!(ssl.score, 50.0);
}

#[test]
fn test_confidence_penalized_per_missing_factor() {
    let input = ScoringInput {
        reputation: fresh(clean_reputation(URL)),
        ..ScoringInput::new(URL)
    };
    let result = calculator().calculate_score(&input, None, None);
    // clean reputation confidence 0.85, three factors missing
    assert!((result.confidence - 0.55).abs() < 1e-9);

    let result = calculator().calculate_score(&full_input(), None, None);
    assert!(result.confidence > 0.55);
}

#[test]
fn test_experiment_config_is_applied() {
    let mut calc = calculator();
    let experiment = ScoringConfig {
        name: "age-heavy".to_string(),
        weights: FactorWeights {
            reputation: 0.1,
            domain_age: 0.7,
            ssl_certificate: 0.1,
            ai_analysis: 0.1,
        },
        ..ScoringConfig::default()
    };
    calc.register_experiment("exp-1", experiment).unwrap();
    assert_eq!(calc.experiment_ids(), vec!["exp-1".to_string()]);

    let input = full_input();
    let base = calc.calculate_score(&input, None, None);
    let exp = calc.calculate_score(&input, Some("exp-1"), Some("user-7"));
    assert_eq!(exp.metadata.config_used, "exp-1");
    assert_eq!(exp.metadata.experiment_id.as_deref(), Some("exp-1"));
    assert_eq!(exp.metadata.user_id.as_deref(), Some("user-7"));
    assert!(exp.final_score > base.final_score);

    let unknown = calc.calculate_score(&input, Some("missing"), None);
    assert_eq!(unknown.metadata.config_used, "default");
    assert_eq!(unknown.final_score, base.final_score);

    assert!(calc.remove_experiment("exp-1"));
    assert!(!calc.remove_experiment("exp-1"));
}

#[test]
fn test_invalid_experiment_rejected() {
    let mut calc = calculator();
    let mut bad = ScoringConfig::default();
    bad.weights.ai_analysis = 0.9;
    assert!(calc.register_experiment("bad", bad).is_err());
    assert!(calc.experiment_ids().is_empty());
}

#[test]
fn test_technical_indicators_are_informational() {
    let mut input = full_input();
    let without = calculator().calculate_score(&input, None, None);

    input.patterns = Some(UrlPatternAnalysis {
        has_suspicious_tld: true,
        suspicious_tld: Some("top".to_string()),
        suspicious_score: 20,
        ..UrlPatternAnalysis::default()
    });
    let with = calculator().calculate_score(&input, None, None);

    assert_eq!(with.final_score, without.final_score);
    assert_eq!(with.breakdown.total_weight, without.breakdown.total_weight);
    let technical = factor(&with, FactorType::TechnicalIndicators);
    assert_eq!(technical.weight, 0.0);
    assert_eq!(technical.score, 20.0);
    assert!(technical.description.contains(".top"));

    input.patterns = Some(UrlPatternAnalysis::failed());
    let failed = calculator().calculate_score(&input, None, None);
    assert!(!factor(&failed, FactorType::TechnicalIndicators).available);
}

#[test]
fn test_zero_weight_factor_alone_gets_full_weight() {
    let config = ScoringConfig {
        weights: FactorWeights {
            reputation: 0.5,
            domain_age: 0.3,
            ssl_certificate: 0.2,
            ai_analysis: 0.0,
        },
        ..ScoringConfig::default()
    };
    let input = ScoringInput {
        ai: fresh(ai_verdict(80.0, 0.8, ScamCategory::Malware)),
        ..ScoringInput::new(URL)
    };
    let result = ScoringCalculator::new(config)
        .unwrap()
        .calculate_score(&input, None, None);
    assert_eq!(result.metadata.redistributed_weights[&FactorType::AiAnalysis], 1.0);
    assert_eq!(result.final_score, 80.0);
}

#[test]
fn test_result_serializes_camel_case() {
    let result = calculator().calculate_score(&full_input(), None, None);
    let json = serde_json::to_value(&result).unwrap();
    assert!(json["finalScore"].is_number());
    assert_eq!(json["riskLevel"], "low");
    assert_eq!(json["riskFactors"][0]["type"], "reputation");
    assert!(json["metadata"]["redistributedWeights"]["domain_age"].is_number());
    assert!(json["breakdown"]["totalWeight"].is_number());
}

fn arb_input() -> impl Strategy<Value = ScoringInput> {
    (
        proptest::option::of(0.0f64..=100.0),
        proptest::option::of(0.0f64..=1.0),
        proptest::option::of(0.0f64..=100.0),
        proptest::option::of((0.0f64..=100.0, 0.0f64..=1.0)),
    )
        .prop_map(|(rep, whois, ssl, ai)| {
            let mut input = ScoringInput::new(URL);
            input.reputation = rep.and_then(|score| {
                let mut analysis = clean_reputation(URL);
                analysis.score = score;
                fresh(analysis)
            });
            input.whois = whois.and_then(|score| fresh(domain_age("example.com", Some(100), score)));
            input.ssl = ssl.and_then(|score| {
                let mut analysis = healthy_certificate("example.com");
                analysis.score = score;
                fresh(analysis)
            });
            input.ai = ai.and_then(|(score, confidence)| {
                fresh(ai_verdict(score, confidence, ScamCategory::Other))
            });
            input
        })
}

fn arb_strategy() -> impl Strategy<Value = MissingDataStrategy> {
    prop_oneof![
        Just(MissingDataStrategy::Redistribute),
        Just(MissingDataStrategy::Penalty),
        Just(MissingDataStrategy::Default),
    ]
}

fn arb_normalization() -> impl Strategy<Value = NormalizationMethod> {
    prop_oneof![
        Just(NormalizationMethod::Linear),
        Just(NormalizationMethod::Logarithmic),
        Just(NormalizationMethod::Sigmoid),
    ]
}

proptest! {
    #[test]
    fn prop_score_bounds_and_tier(
        input in arb_input(),
        strategy in arb_strategy(),
        normalization in arb_normalization(),
    ) {
        let config = ScoringConfig {
            missing_data_strategy: strategy,
            normalization,
            ..ScoringConfig::default()
        };
        let result = ScoringCalculator::new(config.clone())
            .unwrap()
            .calculate_score(&input, None, None);

        prop_assert!((0.0..=100.0).contains(&result.final_score));
        prop_assert_eq!(result.risk_level, config.thresholds.classify(result.final_score));
        prop_assert!(result.confidence >= config.minimum_confidence);
        prop_assert!(result.confidence <= 1.0);
        prop_assert_eq!(
            result.metadata.missing_factors.len() + input.available_count(),
            4
        );
    }

    #[test]
    fn prop_redistributed_weights_sum_to_one(input in arb_input()) {
        prop_assume!(input.available_count() > 0);
        let result = calculator().calculate_score(&input, None, None);
        prop_assert!((result.breakdown.total_weight - 1.0).abs() <= WEIGHT_SUM_TOLERANCE);
    }
}
