// Shared builders for integration tests: in-process WHOIS and certificate
// sources plus a wiremock server standing in for the reputation and LLM APIs.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use url_risk::ai::{AiClient, AiService};
use url_risk::cache::MemoryCache;
use url_risk::config::AiProvider;
use url_risk::error_handling::AnalysisError;
use url_risk::orchestrator::AnalysisServices;
use url_risk::reputation::{ReputationClient, ReputationService};
use url_risk::tls::{CertificateChainInfo, CertificateDetails, CertificateSource, SslService};
use url_risk::utils::RetryPolicy;
use url_risk::whois::{WhoisClient, WhoisService, WhoisTransport};

pub const REGISTERED_2001: &str = "Domain Name: EXAMPLE.COM\nCreation Date: 2001-05-01T00:00:00Z\nRegistrar: MarkMonitor Inc.\nName Server: NS1.EXAMPLE.COM\n";

/// Registry that answers every query with the same text.
pub struct StaticWhois(pub String);

#[async_trait]
impl WhoisTransport for StaticWhois {
    async fn lookup(&self, _domain: &str) -> Result<String, AnalysisError> {
        Ok(self.0.clone())
    }
}

/// Certificate source that serves a fixed chain, or fails every handshake.
pub struct StaticCertificate(pub Option<CertificateChainInfo>);

#[async_trait]
impl CertificateSource for StaticCertificate {
    async fn fetch(&self, host: &str, port: u16) -> Result<CertificateChainInfo, AnalysisError> {
        self.0
            .clone()
            .ok_or_else(|| AnalysisError::network(format!("connection refused by {host}:{port}")))
    }
}

/// Creation date `days` ago, formatted the way registries print it.
#[allow(dead_code)] // Used by some test files
pub fn registered_days_ago(days: i64) -> String {
    let created = Utc::now() - ChronoDuration::days(days);
    format!(
        "Creation Date: {}\nRegistrar: NameCheap, Inc.\n",
        created.format("%Y-%m-%dT%H:%M:%SZ")
    )
}

/// A valid, publicly trusted certificate for `host`.
pub fn trusted_chain(host: &str) -> CertificateChainInfo {
    let now = Utc::now();
    CertificateChainInfo {
        certificates: vec![CertificateDetails {
            subject: format!("CN={host}"),
            issuer: "C=US, O=DigiCert Inc, CN=DigiCert Global G2 TLS RSA SHA256 2020 CA1".to_string(),
            subject_cn: Some(host.to_string()),
            issuer_cn: Some("DigiCert Global G2 TLS RSA SHA256 2020 CA1".to_string()),
            issuer_org: Some("DigiCert Inc".to_string()),
            serial_number: "0a:1b:2c".to_string(),
            not_before: now - ChronoDuration::days(200),
            not_after: now + ChronoDuration::days(165),
            subject_alt_names: vec![host.to_string(), format!("www.{host}")],
            key_algorithm: "RSA".to_string(),
            key_size_bits: Some(2048),
            signature_algorithm: "sha256WithRSAEncryption".to_string(),
            policy_oids: vec!["2.23.140.1.2.2".to_string()],
            is_self_signed: false,
        }],
        chain_verified: true,
        verification_error: None,
        tls_version: Some("TLSv1_3".to_string()),
        cipher_suite: Some("TLS13_AES_256_GCM_SHA384".to_string()),
    }
}

/// Reputation API answering with the given matches (empty body when none).
pub async fn mount_reputation(server: &MockServer, threat_types: &[&str]) {
    let body = if threat_types.is_empty() {
        json!({})
    } else {
        let matches: Vec<_> = threat_types
            .iter()
            .map(|t| {
                json!({
                    "threatType": t,
                    "platformType": "ANY_PLATFORM",
                    "threatEntryType": "URL",
                    "threat": {"url": "https://example.com/"}
                })
            })
            .collect();
        json!({ "matches": matches })
    };
    Mock::given(method("POST"))
        .and(path("/threatMatches:find"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// OpenAI-compatible endpoint returning a verdict with the given risk score.
pub async fn mount_ai(server: &MockServer, risk_score: f64, category: &str) {
    let verdict = json!({
        "risk_score": risk_score,
        "confidence": 0.9,
        "primary_risks": [],
        "scam_category": category,
        "indicators": [],
        "explanation": "integration test verdict"
    });
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": verdict.to_string()}}],
            "usage": {"prompt_tokens": 400, "completion_tokens": 80}
        })))
        .mount(server)
        .await;
}

/// Production services wired to `server`, an in-process registry and a
/// fixed certificate source.
pub fn services(
    server: &MockServer,
    whois_text: &str,
    chain: Option<CertificateChainInfo>,
) -> AnalysisServices {
    let http = Arc::new(reqwest::Client::new());
    let timeout = Duration::from_secs(5);

    let reputation = ReputationService::new(
        ReputationClient::new(http.clone(), server.uri(), Some("rep-key".to_string())),
        Arc::new(MemoryCache::new(64)),
    )
    .with_timeout(timeout);
    let whois = WhoisService::new(
        WhoisClient::new(Box::new(StaticWhois(whois_text.to_string()))),
        Arc::new(MemoryCache::new(64)),
    )
    .with_timeout(timeout);
    let ssl = SslService::new(Box::new(StaticCertificate(chain)), Arc::new(MemoryCache::new(64)))
        .with_timeout(timeout);
    let ai = AiService::new(AiClient::new(
        http,
        AiProvider::OpenAi,
        server.uri(),
        Some("sk-test".to_string()),
        "gpt-4o-mini".to_string(),
    ))
    .with_retry(RetryPolicy::none())
    .with_timeout(timeout);

    AnalysisServices {
        reputation: Arc::new(reputation),
        whois: Arc::new(whois),
        ssl: Arc::new(ssl),
        ai: Arc::new(ai),
    }
}
