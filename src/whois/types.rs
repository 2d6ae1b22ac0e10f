//! WHOIS data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fields recovered from a free-text WHOIS response.
///
/// Every field is optional: registries differ wildly in what they publish and
/// how they label it, and an unparsed field is not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoisRecord {
    /// Domain creation date
    pub creation_date: Option<DateTime<Utc>>,
    /// Domain expiration date
    pub expiration_date: Option<DateTime<Utc>>,
    /// Domain updated date
    pub updated_date: Option<DateTime<Utc>>,
    /// Registrar name
    pub registrar: Option<String>,
    /// Registrar's own WHOIS server, when the registry refers to one
    pub registrar_whois_server: Option<String>,
    pub registrant_country: Option<String>,
    pub registrant_org: Option<String>,
    pub admin_country: Option<String>,
    pub admin_org: Option<String>,
    pub tech_country: Option<String>,
    pub tech_org: Option<String>,
    /// EPP status codes (e.g., "clientTransferProhibited")
    pub status: Vec<String>,
    /// Nameservers, lowercased and deduplicated
    pub nameservers: Vec<String>,
    /// A privacy or proxy service hides the registrant
    pub privacy_protected: bool,
}

impl WhoisRecord {
    /// Whether nothing useful was parsed.
    pub fn is_empty(&self) -> bool {
        self.creation_date.is_none()
            && self.expiration_date.is_none()
            && self.registrar.is_none()
            && self.nameservers.is_empty()
            && self.status.is_empty()
    }
}

/// Kind of WHOIS-derived risk factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhoisFactorKind {
    DomainAge,
    PrivacyProtection,
    RegistrarTrust,
    SuspiciousStatus,
}

/// One contribution to the WHOIS risk score (0-1 scale).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoisRiskFactor {
    pub kind: WhoisFactorKind,
    pub score: f64,
    pub description: String,
}

/// Risk assessment derived from one WHOIS lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainAgeAnalysis {
    pub domain: String,
    pub age_in_days: Option<i64>,
    pub registration_date: Option<DateTime<Utc>>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub updated_date: Option<DateTime<Utc>>,
    pub registrar: Option<String>,
    pub nameservers: Vec<String>,
    pub status: Vec<String>,
    /// Risk on a 0-1 scale
    pub score: f64,
    /// 0-1
    pub confidence: f64,
    pub privacy_protected: bool,
    pub registrant_country: Option<String>,
    pub registrant_org: Option<String>,
    pub risk_factors: Vec<WhoisRiskFactor>,
    /// When the analysis was computed; fixes the age calculation
    pub analyzed_at: DateTime<Utc>,
}
