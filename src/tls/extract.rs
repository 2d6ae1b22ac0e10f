//! Certificate extraction utilities.

use chrono::{DateTime, Utc};
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::{GeneralName, ParsedExtension};
use x509_parser::public_key::PublicKey;

use crate::error_handling::AnalysisError;

use super::types::CertificateDetails;

/// Parses one DER certificate into [`CertificateDetails`].
pub(crate) fn parse_certificate(der: &[u8]) -> Result<CertificateDetails, AnalysisError> {
    let (_, cert) = x509_parser::parse_x509_certificate(der)
        .map_err(|e| AnalysisError::parse(format!("Invalid X.509 certificate: {e}")))?;
    let tbs_cert = &cert.tbs_certificate;

    let not_before = timestamp(tbs_cert.validity.not_before.timestamp(), "not_before")?;
    let not_after = timestamp(tbs_cert.validity.not_after.timestamp(), "not_after")?;

    let key_algorithm_oid = tbs_cert.subject_pki.algorithm.algorithm.to_id_string();
    let key_algorithm = key_algorithm_name(&key_algorithm_oid);
    let key_size_bits = match tbs_cert.subject_pki.parsed() {
        Ok(PublicKey::RSA(rsa)) => u32::try_from(rsa.key_size()).ok(),
        Ok(PublicKey::EC(point)) => u32::try_from(point.key_size()).ok(),
        _ if key_algorithm == "Ed25519" => Some(256),
        _ if key_algorithm == "Ed448" => Some(456),
        _ => None,
    };

    let issuer_org = tbs_cert
        .issuer
        .iter_organization()
        .next()
        .and_then(|org| org.as_str().ok())
        .map(str::to_string);

    let details = CertificateDetails {
        subject: tbs_cert.subject.to_string(),
        issuer: tbs_cert.issuer.to_string(),
        subject_cn: first_common_name(&tbs_cert.subject),
        issuer_cn: first_common_name(&tbs_cert.issuer),
        issuer_org,
        serial_number: tbs_cert.raw_serial_as_string(),
        not_before,
        not_after,
        subject_alt_names: extract_certificate_sans(&cert),
        key_algorithm,
        key_size_bits,
        signature_algorithm: signature_algorithm_name(
            &cert.signature_algorithm.algorithm.to_id_string(),
        ),
        policy_oids: extract_certificate_oids(&cert),
        is_self_signed: tbs_cert.subject.as_raw() == tbs_cert.issuer.as_raw(),
    };
    Ok(details)
}

fn timestamp(secs: i64, field: &str) -> Result<DateTime<Utc>, AnalysisError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| AnalysisError::parse(format!("Certificate {field} out of range")))
}

fn first_common_name(name: &x509_parser::x509::X509Name<'_>) -> Option<String> {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string)
}

fn key_algorithm_name(oid: &str) -> String {
    match oid {
        "1.2.840.113549.1.1.1" => "RSA".to_string(),
        "1.2.840.10045.2.1" => "ECDSA".to_string(),
        "1.3.101.112" => "Ed25519".to_string(),
        "1.3.101.113" => "Ed448".to_string(),
        "1.2.840.10040.4.1" => "DSA".to_string(),
        // Unknown algorithms keep their OID
        other => other.to_string(),
    }
}

fn signature_algorithm_name(oid: &str) -> String {
    match oid {
        "1.2.840.113549.1.1.4" => "md5WithRSAEncryption",
        "1.2.840.113549.1.1.5" => "sha1WithRSAEncryption",
        "1.2.840.113549.1.1.11" => "sha256WithRSAEncryption",
        "1.2.840.113549.1.1.12" => "sha384WithRSAEncryption",
        "1.2.840.113549.1.1.13" => "sha512WithRSAEncryption",
        "1.2.840.113549.1.1.10" => "rsassaPss",
        "1.2.840.10045.4.1" => "ecdsa-with-SHA1",
        "1.2.840.10045.4.3.2" => "ecdsa-with-SHA256",
        "1.2.840.10045.4.3.3" => "ecdsa-with-SHA384",
        "1.2.840.10045.4.3.4" => "ecdsa-with-SHA512",
        "1.3.101.112" => "Ed25519",
        "1.3.101.113" => "Ed448",
        other => other,
    }
    .to_string()
}

/// Extracts all relevant OIDs from an X.509 certificate.
///
/// Covers the extension OIDs themselves, Certificate Policies (validation
/// levels: DV, OV, EV) and Extended Key Usage purposes.
pub(crate) fn extract_certificate_oids(cert: &X509Certificate<'_>) -> Vec<String> {
    let mut oids: Vec<String> = Vec::new();

    for ext in cert.extensions() {
        oids.push(ext.oid.to_id_string());

        match ext.parsed_extension() {
            // 2.23.140.1.1 (EV), 2.23.140.1.2.1 (DV), 2.23.140.1.2.2 (OV)
            ParsedExtension::CertificatePolicies(ref policies) => {
                oids.extend(policies.iter().map(|policy| policy.policy_id.to_id_string()));
            }
            ParsedExtension::ExtendedKeyUsage(ref eku) => {
                if eku.server_auth {
                    oids.push("1.3.6.1.5.5.7.3.1".to_string());
                }
                if eku.client_auth {
                    oids.push("1.3.6.1.5.5.7.3.2".to_string());
                }
                if eku.code_signing {
                    oids.push("1.3.6.1.5.5.7.3.3".to_string());
                }
            }
            _ => {}
        }
    }

    oids.sort();
    oids.dedup();
    oids
}

/// Extracts DNS names from the Subject Alternative Name extension.
///
/// IP addresses, e-mail addresses and other name types are ignored.
pub(crate) fn extract_certificate_sans(cert: &X509Certificate<'_>) -> Vec<String> {
    let mut sans = Vec::new();

    for ext in cert.extensions() {
        if let ParsedExtension::SubjectAlternativeName(ref san) = ext.parsed_extension() {
            for general_name in &san.general_names {
                if let GeneralName::DNSName(dns_name) = general_name {
                    sans.push(dns_name.to_lowercase());
                }
            }
        }
    }

    sans
}
