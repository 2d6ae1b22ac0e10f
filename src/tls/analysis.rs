//! Certificate risk analysis.
//!
//! Pure functions from a handshake result to an [`SslCertificateAnalysis`].
//! The score is in points (0-100); factors add up and are capped.

use chrono::{DateTime, Utc};

use crate::error_handling::AnalysisError;

use super::types::{
    CaTrustInfo, CaTrustLevel, CertificateChainInfo, CertificateDates, CertificateDetails,
    CertificateValidation, CryptoStrength, SecurityAssessment, SslCertificateAnalysis,
    SslFactorKind, SslRiskFactor, ValidationLevel,
};

const EXPIRED_POINTS: f64 = 40.0;
const NOT_YET_VALID_POINTS: f64 = 40.0;
const SELF_SIGNED_POINTS: f64 = 35.0;
const CHAIN_INVALID_POINTS: f64 = 30.0;
const DOMAIN_MISMATCH_POINTS: f64 = 30.0;
const UNTRUSTED_CA_POINTS: f64 = 15.0;
const WEAK_CRYPTO_POINTS: f64 = 15.0;
const WEAK_PROTOCOL_POINTS: f64 = 10.0;
const BRAND_NEW_CERT_POINTS: f64 = 15.0;
const NEW_CERT_POINTS: f64 = 5.0;
const EXPIRING_SOON_POINTS: f64 = 5.0;

/// Issuer substrings of well-established commercial and platform CAs.
const HIGH_TRUST_CAS: &[&str] = &[
    "digicert",
    "sectigo",
    "comodo",
    "globalsign",
    "entrust",
    "godaddy",
    "starfield",
    "amazon",
    "google trust services",
    "microsoft",
    "apple",
    "identrust",
    "certum",
];

/// Free or automated CAs: trusted by browsers but also the default choice of
/// throwaway phishing hosts.
const MEDIUM_TRUST_CAS: &[&str] = &[
    "let's encrypt",
    "zerossl",
    "buypass",
    "ssl.com",
    "cloudflare",
    "cpanel",
];

const EV_POLICY_OID: &str = "2.23.140.1.1";
const OV_POLICY_OID: &str = "2.23.140.1.2.2";
const DV_POLICY_OID: &str = "2.23.140.1.2.1";

/// Checks if a TLS version is considered weak (< TLS 1.2)
///
/// Accepts the spellings produced by different stacks ("TLSv1_3", "TLS 1.2",
/// "tls1.1", "SSLv3"). Unknown versions are treated as weak.
pub(crate) fn is_weak_tls(version: &str) -> bool {
    let version_normalized = version
        .to_lowercase()
        .replace(' ', "")
        .replace('_', ".")
        .replace("tlsv", "tls");

    !(version_normalized.contains("tls1.3") || version_normalized.contains("tls1.2"))
}

/// Whether `host` is covered by `pattern`, honouring a single leading
/// wildcard label (`*.example.com` matches `a.example.com` only).
pub fn hostname_matches(pattern: &str, host: &str) -> bool {
    let pattern = pattern.trim_end_matches('.').to_lowercase();
    let host = host.trim_end_matches('.').to_lowercase();

    match pattern.strip_prefix("*.") {
        Some(suffix) => match host.split_once('.') {
            Some((label, rest)) => !label.is_empty() && rest == suffix,
            None => false,
        },
        None => pattern == host,
    }
}

/// Whether the certificate names `host`. SANs take precedence; the subject
/// CN is only consulted when the certificate has no DNS SANs.
pub fn certificate_matches_host(cert: &CertificateDetails, host: &str) -> bool {
    if cert.subject_alt_names.is_empty() {
        cert.subject_cn
            .as_deref()
            .is_some_and(|cn| hostname_matches(cn, host))
    } else {
        cert.subject_alt_names
            .iter()
            .any(|san| hostname_matches(san, host))
    }
}

fn ca_trust(cert: &CertificateDetails) -> CaTrustInfo {
    let haystack = format!(
        "{} {}",
        cert.issuer_org.as_deref().unwrap_or_default(),
        cert.issuer_cn.as_deref().unwrap_or(&cert.issuer)
    )
    .to_lowercase();

    let trust_level = if cert.is_self_signed {
        CaTrustLevel::Unknown
    } else if HIGH_TRUST_CAS.iter().any(|ca| haystack.contains(ca)) {
        CaTrustLevel::High
    } else if MEDIUM_TRUST_CAS.iter().any(|ca| haystack.contains(ca)) {
        CaTrustLevel::Medium
    } else {
        CaTrustLevel::Unknown
    };

    let has_policy = |oid: &str| cert.policy_oids.iter().any(|p| p == oid);
    let validation_level = if has_policy(EV_POLICY_OID) {
        ValidationLevel::Extended
    } else if has_policy(OV_POLICY_OID) {
        ValidationLevel::Organization
    } else if has_policy(DV_POLICY_OID) {
        ValidationLevel::Domain
    } else {
        ValidationLevel::Unknown
    };

    let score = match trust_level {
        CaTrustLevel::High => 0.0,
        CaTrustLevel::Medium => 10.0,
        CaTrustLevel::Unknown => 40.0,
    };

    CaTrustInfo {
        issuer: cert.issuer.clone(),
        issuer_org: cert.issuer_org.clone(),
        trust_level,
        validation_level,
        score,
    }
}

fn security_assessment(
    cert: &CertificateDetails,
    chain: &CertificateChainInfo,
) -> SecurityAssessment {
    let weak_key = match (cert.key_algorithm.as_str(), cert.key_size_bits) {
        ("RSA", Some(bits)) => bits < 2048,
        ("DSA", _) => true,
        ("ECDSA", Some(bits)) => bits < 256,
        _ => false,
    };
    let signature = cert.signature_algorithm.to_lowercase();
    let weak_signature = signature.contains("md5") || signature.contains("sha1");
    let weak_protocol = chain.tls_version.as_deref().is_some_and(is_weak_tls);

    let strength = if weak_key || weak_signature || weak_protocol {
        CryptoStrength::Weak
    } else if cert.key_algorithm == "RSA" && cert.key_size_bits.is_some_and(|b| b < 3072) {
        CryptoStrength::Adequate
    } else {
        CryptoStrength::Strong
    };

    SecurityAssessment {
        key_algorithm: cert.key_algorithm.clone(),
        key_size_bits: cert.key_size_bits,
        signature_algorithm: cert.signature_algorithm.clone(),
        tls_version: chain.tls_version.clone(),
        cipher_suite: chain.cipher_suite.clone(),
        weak_key,
        weak_signature,
        weak_protocol,
        strength,
    }
}

/// Analyzes the chain served by `host:port`.
///
/// # Errors
///
/// Returns `not_found` when the server presented no certificate.
pub fn analyze_certificate(
    host: &str,
    port: u16,
    chain: &CertificateChainInfo,
    now: DateTime<Utc>,
) -> Result<SslCertificateAnalysis, AnalysisError> {
    let cert = chain.leaf().ok_or_else(|| {
        AnalysisError::not_found(format!("{host}:{port} presented no certificate"))
    })?;

    let dates = CertificateDates {
        issued_at: cert.not_before,
        expires_at: cert.not_after,
        age_in_days: (now - cert.not_before).num_days(),
        days_until_expiry: (cert.not_after - now).num_days(),
    };
    let ca_trust = ca_trust(cert);
    let security = security_assessment(cert, chain);

    let expired = now > cert.not_after;
    let not_yet_valid = now < cert.not_before;
    let domain_match = certificate_matches_host(cert, host);

    let mut errors = Vec::new();
    if expired {
        errors.push(format!("Certificate expired on {}", cert.not_after.date_naive()));
    }
    if not_yet_valid {
        errors.push(format!(
            "Certificate not valid before {}",
            cert.not_before.date_naive()
        ));
    }
    if cert.is_self_signed {
        errors.push("Certificate is self-signed".to_string());
    }
    if !chain.chain_verified {
        errors.push(
            chain
                .verification_error
                .clone()
                .unwrap_or_else(|| "Certificate chain could not be verified".to_string()),
        );
    }
    if !domain_match {
        errors.push(format!("Certificate does not cover {host}"));
    }

    let validation = CertificateValidation {
        is_valid: errors.is_empty(),
        expired,
        not_yet_valid,
        self_signed: cert.is_self_signed,
        chain_valid: chain.chain_verified,
        domain_match,
        errors,
    };

    let mut risk_factors = Vec::new();
    let mut add = |kind, score, description: String| {
        risk_factors.push(SslRiskFactor {
            kind,
            score,
            description,
        })
    };

    if expired {
        add(
            SslFactorKind::Expired,
            EXPIRED_POINTS,
            format!("Expired {} days ago", -dates.days_until_expiry),
        );
    }
    if not_yet_valid {
        add(
            SslFactorKind::NotYetValid,
            NOT_YET_VALID_POINTS,
            "Certificate validity period has not started".to_string(),
        );
    }
    if cert.is_self_signed {
        add(
            SslFactorKind::SelfSigned,
            SELF_SIGNED_POINTS,
            "Self-signed certificate".to_string(),
        );
    }
    if !chain.chain_verified {
        add(
            SslFactorKind::ChainInvalid,
            CHAIN_INVALID_POINTS,
            "Chain does not lead to a trusted root".to_string(),
        );
    }
    if !domain_match {
        add(
            SslFactorKind::DomainMismatch,
            DOMAIN_MISMATCH_POINTS,
            format!("Certificate issued for other names than {host}"),
        );
    }
    if ca_trust.trust_level == CaTrustLevel::Unknown && !cert.is_self_signed {
        add(
            SslFactorKind::UntrustedCa,
            UNTRUSTED_CA_POINTS,
            format!("Unrecognised issuer {}", cert.issuer),
        );
    }
    if security.weak_key || security.weak_signature {
        add(
            SslFactorKind::WeakCrypto,
            WEAK_CRYPTO_POINTS,
            format!(
                "Weak key or signature ({} {:?}, {})",
                security.key_algorithm, security.key_size_bits, security.signature_algorithm
            ),
        );
    }
    if security.weak_protocol {
        add(
            SslFactorKind::WeakProtocol,
            WEAK_PROTOCOL_POINTS,
            format!(
                "Outdated protocol {}",
                security.tls_version.as_deref().unwrap_or("unknown")
            ),
        );
    }
    if !not_yet_valid && dates.age_in_days < 7 {
        add(
            SslFactorKind::NewCertificate,
            BRAND_NEW_CERT_POINTS,
            format!("Certificate issued {} days ago", dates.age_in_days),
        );
    } else if !not_yet_valid && dates.age_in_days < 30 {
        add(
            SslFactorKind::NewCertificate,
            NEW_CERT_POINTS,
            format!("Certificate issued {} days ago", dates.age_in_days),
        );
    }
    if !expired && dates.days_until_expiry < 7 {
        add(
            SslFactorKind::ExpiringSoon,
            EXPIRING_SOON_POINTS,
            format!("Expires in {} days", dates.days_until_expiry),
        );
    }

    let score = risk_factors
        .iter()
        .map(|f| f.score)
        .sum::<f64>()
        .clamp(0.0, 100.0);

    let mut confidence: f64 = 0.6;
    if chain.certificates.len() > 1 {
        confidence += 0.2;
    }
    if ca_trust.trust_level != CaTrustLevel::Unknown {
        confidence += 0.1;
    }

    Ok(SslCertificateAnalysis {
        host: host.to_string(),
        port,
        certificate: cert.clone(),
        chain_length: chain.certificates.len(),
        dates,
        ca_trust,
        security,
        validation,
        score,
        confidence: confidence.min(1.0),
        risk_factors,
        analyzed_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::ErrorKind;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn leaf() -> CertificateDetails {
        CertificateDetails {
            subject: "CN=www.example.com".to_string(),
            issuer: "C=US, O=DigiCert Inc, CN=DigiCert Global G2 TLS RSA SHA256 2020 CA1"
                .to_string(),
            subject_cn: Some("www.example.com".to_string()),
            issuer_cn: Some("DigiCert Global G2 TLS RSA SHA256 2020 CA1".to_string()),
            issuer_org: Some("DigiCert Inc".to_string()),
            serial_number: "0a:1b".to_string(),
            not_before: now() - Duration::days(200),
            not_after: now() + Duration::days(165),
            subject_alt_names: vec!["example.com".to_string(), "*.example.com".to_string()],
            key_algorithm: "ECDSA".to_string(),
            key_size_bits: Some(256),
            signature_algorithm: "sha256WithRSAEncryption".to_string(),
            policy_oids: vec![OV_POLICY_OID.to_string()],
            is_self_signed: false,
        }
    }

    fn intermediate() -> CertificateDetails {
        CertificateDetails {
            subject: "CN=DigiCert Global G2 TLS RSA SHA256 2020 CA1".to_string(),
            is_self_signed: false,
            policy_oids: vec![],
            ..leaf()
        }
    }

    fn chain(certs: Vec<CertificateDetails>, verified: bool) -> CertificateChainInfo {
        CertificateChainInfo {
            certificates: certs,
            chain_verified: verified,
            verification_error: (!verified).then(|| "UnknownIssuer".to_string()),
            tls_version: Some("TLSv1_3".to_string()),
            cipher_suite: Some("TLS13_AES_256_GCM_SHA384".to_string()),
        }
    }

    #[test]
    fn test_healthy_certificate_scores_zero() {
        let analysis = analyze_certificate(
            "www.example.com",
            443,
            &chain(vec![leaf(), intermediate()], true),
            now(),
        )
        .unwrap();

        assert_eq!(analysis.score, 0.0);
        assert!(analysis.validation.is_valid);
        assert!(analysis.risk_factors.is_empty());
        assert_eq!(analysis.ca_trust.trust_level, CaTrustLevel::High);
        assert_eq!(analysis.ca_trust.validation_level, ValidationLevel::Organization);
        assert!((analysis.confidence - 0.9).abs() < 1e-9);
        assert_eq!(analysis.chain_length, 2);
    }

    #[test]
    fn test_self_signed_expired_mismatch_is_capped() {
        let cert = CertificateDetails {
            issuer: "CN=localhost".to_string(),
            issuer_cn: Some("localhost".to_string()),
            issuer_org: None,
            subject_alt_names: vec!["localhost".to_string()],
            not_before: now() - Duration::days(800),
            not_after: now() - Duration::days(70),
            is_self_signed: true,
            ..leaf()
        };
        let analysis =
            analyze_certificate("paypal-secure.tk", 443, &chain(vec![cert], false), now())
                .unwrap();

        assert_eq!(analysis.score, 100.0);
        assert!(analysis.validation.expired);
        assert!(analysis.validation.self_signed);
        assert!(!analysis.validation.domain_match);
        assert!(!analysis.validation.is_valid);
        assert!((analysis.confidence - 0.6).abs() < 1e-9);
        assert!(!analysis
            .risk_factors
            .iter()
            .any(|f| f.kind == SslFactorKind::UntrustedCa));
    }

    #[test]
    fn test_new_lets_encrypt_certificate() {
        let cert = CertificateDetails {
            issuer: "C=US, O=Let's Encrypt, CN=R11".to_string(),
            issuer_cn: Some("R11".to_string()),
            issuer_org: Some("Let's Encrypt".to_string()),
            not_before: now() - Duration::days(2),
            not_after: now() + Duration::days(88),
            policy_oids: vec![DV_POLICY_OID.to_string()],
            ..leaf()
        };
        let analysis =
            analyze_certificate("login.example.com", 443, &chain(vec![cert], true), now())
                .unwrap();

        assert_eq!(analysis.ca_trust.trust_level, CaTrustLevel::Medium);
        assert_eq!(analysis.ca_trust.validation_level, ValidationLevel::Domain);
        assert_eq!(analysis.score, BRAND_NEW_CERT_POINTS);
    }

    #[test]
    fn test_weak_crypto_and_protocol() {
        let cert = CertificateDetails {
            key_algorithm: "RSA".to_string(),
            key_size_bits: Some(1024),
            signature_algorithm: "sha1WithRSAEncryption".to_string(),
            ..leaf()
        };
        let mut info = chain(vec![cert], true);
        info.tls_version = Some("TLSv1_0".to_string());

        let analysis = analyze_certificate("www.example.com", 443, &info, now()).unwrap();
        assert!(analysis.security.weak_key);
        assert!(analysis.security.weak_signature);
        assert!(analysis.security.weak_protocol);
        assert_eq!(analysis.security.strength, CryptoStrength::Weak);
        assert_eq!(analysis.score, WEAK_CRYPTO_POINTS + WEAK_PROTOCOL_POINTS);
    }

    #[test]
    fn test_expiring_soon() {
        let cert = CertificateDetails {
            not_after: now() + Duration::days(3),
            ..leaf()
        };
        let analysis =
            analyze_certificate("example.com", 443, &chain(vec![cert], true), now()).unwrap();
        assert_eq!(analysis.score, EXPIRING_SOON_POINTS);
        assert!(!analysis.validation.expired);
    }

    #[test]
    fn test_empty_chain() {
        let err = analyze_certificate("example.com", 443, &chain(vec![], true), now())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_hostname_matching() {
        assert!(hostname_matches("example.com", "EXAMPLE.com."));
        assert!(hostname_matches("*.example.com", "www.example.com"));
        assert!(!hostname_matches("*.example.com", "example.com"));
        assert!(!hostname_matches("*.example.com", "a.b.example.com"));
        assert!(!hostname_matches("*.example.com", "evil-example.com"));
    }

    #[test]
    fn test_cn_used_only_without_sans() {
        let mut cert = leaf();
        cert.subject_alt_names.clear();
        assert!(certificate_matches_host(&cert, "www.example.com"));

        cert.subject_alt_names = vec!["other.test".to_string()];
        assert!(!certificate_matches_host(&cert, "www.example.com"));
    }

    #[test]
    fn test_is_weak_tls() {
        assert!(!is_weak_tls("TLSv1_3"));
        assert!(!is_weak_tls("TLS 1.2"));
        assert!(!is_weak_tls("tls1.2"));
        assert!(is_weak_tls("TLSv1_1"));
        assert!(is_weak_tls("SSLv3"));
        assert!(is_weak_tls("Unknown"));
        assert!(is_weak_tls(""));
    }
}
