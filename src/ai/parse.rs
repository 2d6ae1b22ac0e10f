//! Model response parsing.
//!
//! Models do not always honour the JSON-only instruction: answers arrive
//! wrapped in code fences or with prose around the object, and numeric fields
//! come back as strings or on the wrong scale. Parsing is lenient about all
//! of that and strict about the result ranges.

use serde::Deserialize;
use serde_json::Value;

use crate::error_handling::AnalysisError;

use super::types::{ModelVerdict, ScamCategory};

#[derive(Debug, Deserialize)]
struct RawVerdict {
    #[serde(default, alias = "riskScore")]
    risk_score: Option<Value>,
    #[serde(default)]
    confidence: Option<Value>,
    #[serde(default, alias = "primaryRisks")]
    primary_risks: Option<Value>,
    #[serde(default, alias = "scamCategory")]
    scam_category: Option<String>,
    #[serde(default)]
    indicators: Option<Value>,
    #[serde(default)]
    explanation: Option<String>,
}

/// Parses the text content of a model answer into a verdict.
///
/// # Errors
///
/// `parse_error` when no JSON object can be found or `risk_score` is missing.
pub fn parse_verdict(content: &str) -> Result<ModelVerdict, AnalysisError> {
    let json = extract_json_object(content)
        .ok_or_else(|| AnalysisError::parse("Model response contains no JSON object"))?;
    let raw: RawVerdict = serde_json::from_str(json)
        .map_err(|e| AnalysisError::parse(format!("Invalid JSON in model response: {e}")))?;

    let risk_score = raw
        .risk_score
        .as_ref()
        .and_then(as_number)
        .ok_or_else(|| AnalysisError::parse("Model response has no numeric risk_score"))?;

    // Some models answer confidence as a percentage
    let confidence = match raw.confidence.as_ref().and_then(as_number) {
        Some(c) if c > 1.0 => c / 100.0,
        Some(c) => c,
        None => 0.5,
    };

    Ok(ModelVerdict {
        risk_score: risk_score.clamp(0.0, 100.0),
        confidence: confidence.clamp(0.0, 1.0),
        primary_risks: string_list(raw.primary_risks),
        scam_category: raw
            .scam_category
            .as_deref()
            .map(ScamCategory::from_label)
            .unwrap_or(ScamCategory::Other),
        indicators: string_list(raw.indicators),
        explanation: raw.explanation.unwrap_or_default(),
    })
}

/// Returns the outermost `{...}` span of `content`.
fn extract_json_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn string_list(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Null | Value::String(_) => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}
