//! End-to-end analyses through the production services, with the provider
//! APIs replaced by a local mock server.

mod common;

use std::sync::Arc;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use url_risk::ai::{AiClient, AiService};
use url_risk::config::AiProvider;
use url_risk::{
    AnalysisOrchestrator, AnalyzeOptions, ErrorKind, RiskLevel, ScoringCalculator, ScoringConfig,
    ServiceKind,
};

use common::{
    mount_ai, mount_reputation, registered_days_ago, services, trusted_chain, REGISTERED_2001,
};

fn orchestrator(services: url_risk::AnalysisServices) -> AnalysisOrchestrator {
    let calculator = ScoringCalculator::new(ScoringConfig::default()).expect("default config");
    AnalysisOrchestrator::new(services, calculator)
}

#[tokio::test]
async fn test_established_domain_scores_low() {
    let server = MockServer::start().await;
    mount_reputation(&server, &[]).await;
    mount_ai(&server, 5.0, "legitimate").await;

    let orchestrator = orchestrator(services(
        &server,
        REGISTERED_2001,
        Some(trusted_chain("example.com")),
    ));
    let result = orchestrator
        .analyze_url("https://example.com", &AnalyzeOptions::default())
        .await;

    assert!(!result.fallback, "unexpected fallback: {:?}", result.error);
    assert_eq!(result.url, "https://example.com/");
    assert_eq!(result.metrics.services_succeeded, 4);
    assert_eq!(result.risk_level(), RiskLevel::Low);
    assert!(result.scoring.confidence > 0.7);
    assert!(result.scoring.metadata.missing_factors.is_empty());

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["scoring"]["riskLevel"], "low");
    assert_eq!(json["services"]["whois"]["success"], true);
}

#[tokio::test]
async fn test_phishing_site_scores_high() {
    let server = MockServer::start().await;
    mount_reputation(&server, &["SOCIAL_ENGINEERING"]).await;
    mount_ai(&server, 92.0, "phishing").await;

    // Fresh registration, no certificate served
    let orchestrator = orchestrator(services(&server, &registered_days_ago(5), None));
    let result = orchestrator
        .analyze_url(
            "https://paypa1-secure-login.com/verify?account=1",
            &AnalyzeOptions::default(),
        )
        .await;

    assert!(!result.fallback);
    assert_eq!(result.risk_level(), RiskLevel::High);
    assert!(result.final_score() >= 70.0);
    assert!(!result.services[&ServiceKind::Ssl].success);
    assert_eq!(result.metrics.services_succeeded, 3);
}

#[tokio::test]
async fn test_unregistered_domain_still_scored() {
    let server = MockServer::start().await;
    mount_reputation(&server, &[]).await;
    mount_ai(&server, 30.0, "other").await;

    let orchestrator = orchestrator(services(
        &server,
        "No match for \"NOPE-UNREGISTERED.COM\".\n",
        Some(trusted_chain("nope-unregistered.com")),
    ));
    let result = orchestrator
        .analyze_url("https://nope-unregistered.com/", &AnalyzeOptions::default())
        .await;

    assert!(!result.fallback);
    let whois = &result.services[&ServiceKind::Whois];
    assert_eq!(whois.error.as_ref().unwrap().kind, ErrorKind::NotFound);
    assert_eq!(result.metrics.services_succeeded, 3);
}

#[tokio::test]
async fn test_cost_gate_skips_ai_request() {
    let server = MockServer::start().await;
    mount_reputation(&server, &[]).await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut services = services(&server, REGISTERED_2001, Some(trusted_chain("example.com")));
    services.ai = Arc::new(
        AiService::new(AiClient::new(
            Arc::new(reqwest::Client::new()),
            AiProvider::OpenAi,
            server.uri(),
            Some("sk-test".to_string()),
            "gpt-4o",
        ))
        .with_cost_threshold(0.000_001),
    );

    let result = orchestrator(services)
        .analyze_url("https://example.com/", &AnalyzeOptions::default())
        .await;

    assert!(!result.fallback);
    let ai = &result.services[&ServiceKind::Ai];
    assert_eq!(
        ai.error.as_ref().unwrap().kind,
        ErrorKind::CostThresholdExceeded
    );
    assert_eq!(result.metrics.services_succeeded, 3);
}

#[tokio::test]
async fn test_providers_down_yields_neutral_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let orchestrator = orchestrator(services(&server, "Domain not found.\n", None));
    let result = orchestrator
        .analyze_url("https://example.com/", &AnalyzeOptions::default())
        .await;

    assert!(result.fallback);
    assert_eq!(result.final_score(), 50.0);
    assert_eq!(result.risk_level(), RiskLevel::Medium);
    assert_eq!(result.scoring.confidence, 0.3);
    assert_eq!(
        result.error.as_ref().unwrap().kind,
        ErrorKind::InsufficientServices
    );
    assert_eq!(result.services.len(), 4);
    assert!(result.services.values().all(|s| !s.success));
}

#[tokio::test]
async fn test_second_analysis_served_from_cache() {
    let server = MockServer::start().await;
    mount_reputation(&server, &[]).await;
    mount_ai(&server, 5.0, "legitimate").await;

    let orchestrator = orchestrator(services(
        &server,
        REGISTERED_2001,
        Some(trusted_chain("example.com")),
    ));
    let first = orchestrator
        .analyze_url("https://example.com/", &AnalyzeOptions::default())
        .await;
    let second = orchestrator
        .analyze_url("https://example.com/", &AnalyzeOptions::default())
        .await;

    assert!(second.metrics.from_cache);
    assert_eq!(first.scoring.final_score, second.scoring.final_score);
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2, "one reputation and one AI request");

    // Forced refresh reaches every provider again
    let refreshed = orchestrator
        .analyze_url("https://example.com/", &AnalyzeOptions::force_refresh())
        .await;
    assert!(!refreshed.metrics.from_cache);
    assert_eq!(server.received_requests().await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_invalid_urls_are_rejected() {
    let server = MockServer::start().await;
    let orchestrator = orchestrator(services(&server, REGISTERED_2001, None));

    for input in ["", "ftp://example.com/file", "http://127.0.0.1/admin", "http://localhost:8080/"] {
        let result = orchestrator
            .analyze_url(input, &AnalyzeOptions::default())
            .await;
        assert!(result.is_validation_failure(), "{input:?} should be rejected");
    }
    assert!(server.received_requests().await.unwrap().is_empty());
    assert_eq!(orchestrator.statistics().await.total_analyses, 0);
}
