//! AI analysis data structures.

use serde::{Deserialize, Serialize};

use crate::config::AiProvider;

/// Scam family named by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScamCategory {
    Phishing,
    Malware,
    FinancialScam,
    TechSupportScam,
    FakeShop,
    Cryptocurrency,
    Romance,
    Legitimate,
    Other,
}

impl ScamCategory {
    /// Lenient mapping from free-form model output.
    pub fn from_label(label: &str) -> Self {
        let normalized: String = label
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        match normalized.as_str() {
            "phishing" | "credential_phishing" | "credential_theft" => ScamCategory::Phishing,
            "malware" | "malware_distribution" => ScamCategory::Malware,
            "financial_scam" | "financial" | "investment_scam" => ScamCategory::FinancialScam,
            "tech_support_scam" | "tech_support" => ScamCategory::TechSupportScam,
            "fake_shop" | "fake_store" | "shopping_scam" => ScamCategory::FakeShop,
            "cryptocurrency" | "crypto_scam" | "crypto" => ScamCategory::Cryptocurrency,
            "romance" | "romance_scam" => ScamCategory::Romance,
            "legitimate" | "none" | "safe" | "benign" => ScamCategory::Legitimate,
            _ => ScamCategory::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScamCategory::Phishing => "phishing",
            ScamCategory::Malware => "malware",
            ScamCategory::FinancialScam => "financial_scam",
            ScamCategory::TechSupportScam => "tech_support_scam",
            ScamCategory::FakeShop => "fake_shop",
            ScamCategory::Cryptocurrency => "cryptocurrency",
            ScamCategory::Romance => "romance",
            ScamCategory::Legitimate => "legitimate",
            ScamCategory::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Verdict fields the model is asked to return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelVerdict {
    /// 0-100
    pub risk_score: f64,
    /// 0-1
    pub confidence: f64,
    pub primary_risks: Vec<String>,
    pub scam_category: ScamCategory,
    pub indicators: Vec<String>,
    pub explanation: String,
}

/// LLM content and intent classification of one URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysis {
    /// 0-100
    pub risk_score: f64,
    /// 0-1
    pub confidence: f64,
    pub primary_risks: Vec<String>,
    pub scam_category: ScamCategory,
    pub indicators: Vec<String>,
    pub explanation: String,
    pub provider: AiProvider,
    pub model: String,
    pub token_usage: Option<TokenUsage>,
    /// Cost predicted before the call
    pub estimated_cost_usd: f64,
    /// Cost from the usage the provider reported
    pub cost_usd: Option<f64>,
}

impl AiAnalysis {
    pub fn from_verdict(
        verdict: ModelVerdict,
        provider: AiProvider,
        model: &str,
        token_usage: Option<TokenUsage>,
        estimated_cost_usd: f64,
        cost_usd: Option<f64>,
    ) -> Self {
        Self {
            risk_score: verdict.risk_score,
            confidence: verdict.confidence,
            primary_risks: verdict.primary_risks,
            scam_category: verdict.scam_category,
            indicators: verdict.indicators,
            explanation: verdict.explanation,
            provider,
            model: model.to_string(),
            token_usage,
            estimated_cost_usd,
            cost_usd,
        }
    }
}
