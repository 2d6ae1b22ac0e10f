//! WHOIS risk scoring.
//!
//! Turns a parsed [`WhoisRecord`] into a [`DomainAgeAnalysis`]. Pure: the
//! reference time is passed in so results are reproducible.

use chrono::{DateTime, Utc};

use crate::error_handling::AnalysisError;

use super::parse::{
    is_availability_status, is_not_found_response, is_rate_limited_response, parse_whois_text,
};
use super::types::{DomainAgeAnalysis, WhoisFactorKind, WhoisRecord, WhoisRiskFactor};

const PRIVACY_RISK: f64 = 0.3;
const SUSPICIOUS_STATUS_RISK: f64 = 0.7;
const UNKNOWN_REGISTRAR_RISK: f64 = 0.2;

/// Registrar substrings and the risk they carry. Brand-protection registrars
/// score lowest; registrars frequently abused for throwaway domains highest.
const REGISTRAR_RISK: &[(&str, f64)] = &[
    ("markmonitor", 0.0),
    ("csc corporate", 0.0),
    ("com laude", 0.0),
    ("safenames", 0.0),
    ("godaddy", 0.05),
    ("google", 0.05),
    ("squarespace", 0.05),
    ("amazon", 0.05),
    ("cloudflare", 0.05),
    ("gandi", 0.05),
    ("network solutions", 0.05),
    ("tucows", 0.1),
    ("enom", 0.1),
    ("ovh", 0.1),
    ("ionos", 0.1),
    ("name.com", 0.1),
    ("namecheap", 0.15),
    ("porkbun", 0.15),
    ("dynadot", 0.15),
    ("hostinger", 0.15),
    ("namesilo", 0.25),
    ("alibaba", 0.25),
    ("publicdomainregistry", 0.3),
    ("reg.ru", 0.3),
];

/// EPP statuses that suggest the domain is being taken down or abandoned.
const SUSPICIOUS_STATUSES: &[&str] = &["hold", "redemption", "pendingdelete"];

/// Parses `raw` and scores it.
///
/// # Errors
///
/// `not_found` (not retryable) when the registry says the domain does not
/// exist, `rate_limit` when the server refused to answer.
pub fn analyze_whois_text(
    domain: &str,
    raw: &str,
    now: DateTime<Utc>,
) -> Result<DomainAgeAnalysis, AnalysisError> {
    let record = parse_whois_text(raw);
    // DENIC and EURid answer unregistered names with a status line
    if record.creation_date.is_none() && record.status.iter().any(|s| is_availability_status(s)) {
        return Err(AnalysisError::not_found(format!("Domain not found: {domain}")));
    }
    if record.is_empty() {
        if is_rate_limited_response(raw) {
            return Err(AnalysisError::rate_limit(format!(
                "WHOIS server rate limited the query for {domain}"
            )));
        }
        if raw.trim().is_empty() || is_not_found_response(raw) {
            return Err(AnalysisError::not_found(format!("Domain not found: {domain}")));
        }
    }
    Ok(analyze_record(domain, &record, now))
}

/// Scores an already parsed record.
pub fn analyze_record(domain: &str, record: &WhoisRecord, now: DateTime<Utc>) -> DomainAgeAnalysis {
    let age_in_days = record
        .creation_date
        .map(|created| (now - created).num_days().max(0));

    let mut risk_factors = Vec::new();

    if let Some(days) = age_in_days {
        let (score, description) = age_risk(days);
        risk_factors.push(WhoisRiskFactor {
            kind: WhoisFactorKind::DomainAge,
            score,
            description,
        });
    }

    if record.privacy_protected {
        risk_factors.push(WhoisRiskFactor {
            kind: WhoisFactorKind::PrivacyProtection,
            score: PRIVACY_RISK,
            description: "Registrant identity hidden by a privacy service".to_string(),
        });
    }

    if let Some(registrar) = &record.registrar {
        let score = registrar_risk(registrar);
        risk_factors.push(WhoisRiskFactor {
            kind: WhoisFactorKind::RegistrarTrust,
            score,
            description: format!("Registered through {registrar}"),
        });
    }

    if let Some(status) = record.status.iter().find(|s| is_suspicious_status(s)) {
        risk_factors.push(WhoisRiskFactor {
            kind: WhoisFactorKind::SuspiciousStatus,
            score: SUSPICIOUS_STATUS_RISK,
            description: format!("Domain status {status}"),
        });
    }

    let score = risk_factors
        .iter()
        .fold(0.0, |total, f| total + f.score)
        .clamp(0.0, 1.0);

    let mut confidence: f64 = 0.5;
    if age_in_days.is_some() {
        confidence += 0.3;
    }
    if record.registrar.is_some() {
        confidence += 0.1;
    }
    if record.privacy_protected {
        confidence += 0.1;
    }

    DomainAgeAnalysis {
        domain: domain.to_string(),
        age_in_days,
        registration_date: record.creation_date,
        expiration_date: record.expiration_date,
        updated_date: record.updated_date,
        registrar: record.registrar.clone(),
        nameservers: record.nameservers.clone(),
        status: record.status.clone(),
        score,
        confidence: confidence.min(1.0),
        privacy_protected: record.privacy_protected,
        registrant_country: record.registrant_country.clone(),
        registrant_org: record.registrant_org.clone(),
        risk_factors,
        analyzed_at: now,
    }
}

fn age_risk(days: i64) -> (f64, String) {
    let score = match days {
        d if d < 30 => 0.8,
        d if d < 90 => 0.6,
        d if d < 365 => 0.4,
        d if d < 730 => 0.2,
        _ => 0.1,
    };
    (score, format!("Domain registered {days} days ago"))
}

fn registrar_risk(registrar: &str) -> f64 {
    let lower = registrar.to_lowercase();
    REGISTRAR_RISK
        .iter()
        .find(|(name, _)| lower.contains(name))
        .map(|(_, risk)| *risk)
        .unwrap_or(UNKNOWN_REGISTRAR_RISK)
}

fn is_suspicious_status(status: &str) -> bool {
    let lower = status.to_lowercase();
    SUSPICIOUS_STATUSES.iter().any(|s| lower.contains(s))
}
