//! Builders for analysis results used across unit tests.

use chrono::{Duration, Utc};

use crate::ai::{AiAnalysis, ScamCategory};
use crate::analyzers::Analyzed;
use crate::config::AiProvider;
use crate::reputation::{analyze_matches, ReputationAnalysis, ThreatMatch};
use crate::tls::{analyze_certificate, CertificateChainInfo, CertificateDetails, SslCertificateAnalysis};
use crate::whois::DomainAgeAnalysis;

pub(crate) fn clean_reputation(url: &str) -> ReputationAnalysis {
    analyze_matches(url, Vec::new(), Utc::now())
}

pub(crate) fn phishing_reputation(url: &str) -> ReputationAnalysis {
    let matches = vec![ThreatMatch {
        threat_type: "SOCIAL_ENGINEERING".to_string(),
        platform_type: "ANY_PLATFORM".to_string(),
        threat_entry_type: Some("URL".to_string()),
        url: Some(url.to_string()),
    }];
    analyze_matches(url, matches, Utc::now())
}

/// WHOIS result with the given native (0-1) score.
pub(crate) fn domain_age(domain: &str, age_in_days: Option<i64>, score: f64) -> DomainAgeAnalysis {
    let now = Utc::now();
    DomainAgeAnalysis {
        domain: domain.to_string(),
        age_in_days,
        registration_date: age_in_days.map(|d| now - Duration::days(d)),
        expiration_date: None,
        updated_date: None,
        registrar: None,
        nameservers: Vec::new(),
        status: Vec::new(),
        score,
        confidence: if age_in_days.is_some() { 0.8 } else { 0.5 },
        privacy_protected: false,
        registrant_country: None,
        registrant_org: None,
        risk_factors: Vec::new(),
        analyzed_at: now,
    }
}

/// Certificate analysis of a healthy, publicly trusted certificate.
pub(crate) fn healthy_certificate(host: &str) -> SslCertificateAnalysis {
    let now = Utc::now();
    let leaf = CertificateDetails {
        subject: format!("CN={host}"),
        issuer: "C=US, O=Let's Encrypt, CN=R11".to_string(),
        subject_cn: Some(host.to_string()),
        issuer_cn: Some("R11".to_string()),
        issuer_org: Some("Let's Encrypt".to_string()),
        serial_number: "04:2a".to_string(),
        not_before: now - Duration::days(45),
        not_after: now + Duration::days(45),
        subject_alt_names: vec![host.to_string()],
        key_algorithm: "ECDSA".to_string(),
        key_size_bits: Some(256),
        signature_algorithm: "ecdsa-with-SHA256".to_string(),
        policy_oids: Vec::new(),
        is_self_signed: false,
    };
    let chain = CertificateChainInfo {
        certificates: vec![leaf],
        chain_verified: true,
        verification_error: None,
        tls_version: Some("TLSv1_3".to_string()),
        cipher_suite: None,
    };
    match analyze_certificate(host, 443, &chain, now) {
        Ok(analysis) => analysis,
        Err(e) => panic!("fixture certificate rejected: {e}"),
    }
}

pub(crate) fn ai_verdict(risk_score: f64, confidence: f64, category: ScamCategory) -> AiAnalysis {
    AiAnalysis {
        risk_score,
        confidence,
        primary_risks: Vec::new(),
        scam_category: category,
        indicators: Vec::new(),
        explanation: String::new(),
        provider: AiProvider::OpenAi,
        model: "gpt-4o-mini".to_string(),
        token_usage: None,
        estimated_cost_usd: 0.0,
        cost_usd: None,
    }
}

pub(crate) fn fresh<T>(analysis: T) -> Option<Analyzed<T>> {
    Some(Analyzed::fresh(analysis, 10))
}
