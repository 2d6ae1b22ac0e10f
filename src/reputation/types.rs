//! Reputation data structures and provider wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::RiskLevel;

/// One threat list entry that matched the URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatMatch {
    /// e.g. `MALWARE`, `SOCIAL_ENGINEERING`
    pub threat_type: String,
    /// e.g. `ANY_PLATFORM`, `WINDOWS`
    pub platform_type: String,
    pub threat_entry_type: Option<String>,
    /// The matched URL as echoed by the provider
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReputationRiskFactor {
    pub threat_type: String,
    pub platform_type: String,
    /// Severity scaled by platform reach, 0-100
    pub score: f64,
    pub description: String,
}

/// Threat-intelligence verdict for one URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReputationAnalysis {
    pub url: String,
    pub is_clean: bool,
    pub threat_matches: Vec<ThreatMatch>,
    pub risk_factors: Vec<ReputationRiskFactor>,
    /// 0-100
    pub score: f64,
    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

// Safe Browsing v4 `threatMatches:find` wire types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FindThreatMatchesRequest<'a> {
    pub client: ClientInfo<'a>,
    pub threat_info: ThreatInfo<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ClientInfo<'a> {
    pub client_id: &'a str,
    pub client_version: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ThreatInfo<'a> {
    pub threat_types: &'a [&'a str],
    pub platform_types: &'a [&'a str],
    pub threat_entry_types: &'a [&'a str],
    pub threat_entries: Vec<ThreatEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ThreatEntry {
    pub url: String,
}

/// An empty body (`{}`) means no match.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct FindThreatMatchesResponse {
    #[serde(default)]
    pub matches: Vec<WireThreatMatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireThreatMatch {
    pub threat_type: String,
    pub platform_type: String,
    #[serde(default)]
    pub threat_entry_type: Option<String>,
    #[serde(default)]
    pub threat: Option<ThreatEntry>,
}

impl From<WireThreatMatch> for ThreatMatch {
    fn from(wire: WireThreatMatch) -> Self {
        ThreatMatch {
            threat_type: wire.threat_type,
            platform_type: wire.platform_type,
            threat_entry_type: wire.threat_entry_type,
            url: wire.threat.map(|t| t.url),
        }
    }
}
