//! Threat-intelligence HTTP client (Safe Browsing v4 `threatMatches:find`).

use std::sync::Arc;

use log::debug;

use crate::config::REPUTATION_CLIENT_ID;
use crate::error_handling::{categorize_reqwest_error, categorize_status, AnalysisError};

use super::types::{
    ClientInfo, FindThreatMatchesRequest, FindThreatMatchesResponse, ThreatEntry, ThreatInfo,
    ThreatMatch,
};

const THREAT_TYPES: &[&str] = &[
    "MALWARE",
    "SOCIAL_ENGINEERING",
    "UNWANTED_SOFTWARE",
    "POTENTIALLY_HARMFUL_APPLICATION",
];
const PLATFORM_TYPES: &[&str] = &["ANY_PLATFORM"];
const THREAT_ENTRY_TYPES: &[&str] = &["URL"];

pub struct ReputationClient {
    http: Arc<reqwest::Client>,
    api_base: String,
    api_key: Option<String>,
}

impl ReputationClient {
    pub fn new(http: Arc<reqwest::Client>, api_base: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    /// Looks `url` up against every threat list.
    ///
    /// # Errors
    ///
    /// `api_key_invalid` without any request when no key is configured;
    /// otherwise the categorized HTTP or decoding failure.
    pub async fn find_threat_matches(&self, url: &str) -> Result<Vec<ThreatMatch>, AnalysisError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(
                AnalysisError::api_key_invalid("No reputation API key configured")
                    .with_code("api_key_missing"),
            );
        };

        let body = FindThreatMatchesRequest {
            client: ClientInfo {
                client_id: REPUTATION_CLIENT_ID,
                client_version: env!("CARGO_PKG_VERSION"),
            },
            threat_info: ThreatInfo {
                threat_types: THREAT_TYPES,
                platform_types: PLATFORM_TYPES,
                threat_entry_types: THREAT_ENTRY_TYPES,
                threat_entries: vec![ThreatEntry {
                    url: url.to_string(),
                }],
            },
        };

        let endpoint = format!("{}/threatMatches:find", self.api_base);
        debug!("Checking {url} against threat lists");
        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| categorize_reqwest_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(categorize_status(status.as_u16(), &text));
        }

        let text = response
            .text()
            .await
            .map_err(|e| categorize_reqwest_error(&e))?;
        // Some deployments answer a clean lookup with an empty body
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let parsed: FindThreatMatchesResponse = serde_json::from_str(&text)
            .map_err(|e| AnalysisError::parse(format!("Invalid reputation response: {e}")))?;
        Ok(parsed.matches.into_iter().map(ThreatMatch::from).collect())
    }
}
