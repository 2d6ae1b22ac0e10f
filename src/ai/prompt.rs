//! Prompt construction.

use crate::analyzers::TechnicalContext;
use crate::validation::ParsedUrl;

pub const SYSTEM_PROMPT: &str = "You are a security analyst who classifies URLs for fraud and \
malware risk. Judge only from the URL and the technical facts provided. Respond with a single \
JSON object and nothing else.";

const RESPONSE_SCHEMA: &str = r#"{
  "risk_score": <integer 0-100, higher is more dangerous>,
  "confidence": <number 0-1>,
  "primary_risks": [<short strings>],
  "scam_category": "phishing" | "malware" | "financial_scam" | "tech_support_scam" | "fake_shop" | "cryptocurrency" | "romance" | "legitimate" | "other",
  "indicators": [<short strings naming concrete evidence>],
  "explanation": "<one or two sentences>"
}"#;

/// Builds the user message for `url`.
pub fn build_prompt(url: &ParsedUrl, context: &TechnicalContext) -> String {
    let mut prompt = String::with_capacity(1024);
    prompt.push_str("Assess the risk of this URL.\n\n");
    prompt.push_str(&format!("URL: {}\n", url.normalized));
    prompt.push_str(&format!("Hostname: {}\n", url.display_hostname));
    if let Some(root) = &url.root_domain {
        prompt.push_str(&format!("Registrable domain: {root}\n"));
    }
    if url.is_ip_literal {
        prompt.push_str("Host is a raw IP address\n");
    }

    prompt.push_str("\nTechnical context:\n");
    let facts = context_facts(context);
    if facts.is_empty() {
        prompt.push_str("- none available\n");
    }
    for fact in facts {
        prompt.push_str("- ");
        prompt.push_str(&fact);
        prompt.push('\n');
    }

    prompt.push_str("\nRespond with JSON in exactly this shape:\n");
    prompt.push_str(RESPONSE_SCHEMA);
    prompt
}

fn context_facts(context: &TechnicalContext) -> Vec<String> {
    let mut facts = Vec::new();
    match context.domain_age_days {
        Some(days) => facts.push(format!("Domain age: {days} days")),
        None => facts.push("Domain age: unknown".to_string()),
    }
    if let Some(registrar) = &context.registrar {
        facts.push(format!("Registrar: {registrar}"));
    }
    if let Some(ssl) = &context.ssl_summary {
        facts.push(format!("TLS certificate: {ssl}"));
    }
    if let Some(reputation) = &context.reputation_summary {
        facts.push(format!("Threat intelligence: {reputation}"));
    }
    if let Some(patterns) = context.patterns.as_ref().filter(|p| !p.is_failed()) {
        let indicators = patterns.indicators();
        if indicators.is_empty() {
            facts.push("URL structure: no suspicious patterns".to_string());
        } else {
            facts.push(format!(
                "URL structure (suspicion {}/100): {}",
                patterns.suspicious_score,
                indicators.join("; ")
            ));
        }
    }
    facts
}
