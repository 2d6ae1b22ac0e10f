//! Certificate data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fields extracted from one X.509 certificate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateDetails {
    pub subject: String,
    pub issuer: String,
    pub subject_cn: Option<String>,
    pub issuer_cn: Option<String>,
    pub issuer_org: Option<String>,
    pub serial_number: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    /// DNS names from the Subject Alternative Name extension
    pub subject_alt_names: Vec<String>,
    /// "RSA", "ECDSA", "Ed25519" or the raw OID
    pub key_algorithm: String,
    pub key_size_bits: Option<u32>,
    pub signature_algorithm: String,
    /// Certificate policy and extension OIDs
    pub policy_oids: Vec<String>,
    /// Subject and issuer are identical
    pub is_self_signed: bool,
}

/// What a TLS handshake revealed about the served chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateChainInfo {
    /// Leaf first
    pub certificates: Vec<CertificateDetails>,
    /// The chain validated against the web PKI roots for this host
    pub chain_verified: bool,
    pub verification_error: Option<String>,
    pub tls_version: Option<String>,
    pub cipher_suite: Option<String>,
}

impl CertificateChainInfo {
    pub fn leaf(&self) -> Option<&CertificateDetails> {
        self.certificates.first()
    }
}

/// CA/Browser Forum validation level, from the certificate policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationLevel {
    Extended,
    Organization,
    Domain,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaTrustLevel {
    High,
    Medium,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CryptoStrength {
    Strong,
    Adequate,
    Weak,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateDates {
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub age_in_days: i64,
    /// Negative once expired
    pub days_until_expiry: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaTrustInfo {
    pub issuer: String,
    pub issuer_org: Option<String>,
    pub trust_level: CaTrustLevel,
    pub validation_level: ValidationLevel,
    /// Risk contribution of the issuer alone, 0-100
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityAssessment {
    pub key_algorithm: String,
    pub key_size_bits: Option<u32>,
    pub signature_algorithm: String,
    pub tls_version: Option<String>,
    pub cipher_suite: Option<String>,
    pub weak_key: bool,
    pub weak_signature: bool,
    pub weak_protocol: bool,
    pub strength: CryptoStrength,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateValidation {
    pub is_valid: bool,
    pub expired: bool,
    pub not_yet_valid: bool,
    pub self_signed: bool,
    pub chain_valid: bool,
    pub domain_match: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SslFactorKind {
    Expired,
    NotYetValid,
    SelfSigned,
    ChainInvalid,
    DomainMismatch,
    UntrustedCa,
    WeakCrypto,
    WeakProtocol,
    NewCertificate,
    ExpiringSoon,
}

/// One contribution to the certificate risk score, in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SslRiskFactor {
    pub kind: SslFactorKind,
    pub score: f64,
    pub description: String,
}

/// Risk assessment of the certificate served by one host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SslCertificateAnalysis {
    pub host: String,
    pub port: u16,
    pub certificate: CertificateDetails,
    pub chain_length: usize,
    pub dates: CertificateDates,
    pub ca_trust: CaTrustInfo,
    pub security: SecurityAssessment,
    pub validation: CertificateValidation,
    /// Risk on a 0-100 scale
    pub score: f64,
    /// 0-1
    pub confidence: f64,
    pub risk_factors: Vec<SslRiskFactor>,
    pub analyzed_at: DateTime<Utc>,
}
