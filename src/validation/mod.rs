//! URL validation and normalization.
//!
//! Every analysis starts here: raw input is trimmed, given an `https://` scheme
//! when it has none, checked against the length limit and the http/https
//! allowlist, and decomposed into a [`ParsedUrl`].

mod host;

use std::net::IpAddr;

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::{Host, Url};

use crate::config::MAX_URL_LENGTH;
use crate::error_handling::AnalysisError;

pub(crate) use host::{is_localhost_domain, is_private_ipv4, is_private_ipv6};

/// Why a URL was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UrlValidationError {
    #[error("URL is empty")]
    Empty,

    #[error("URL exceeds maximum length ({len} > {max})")]
    TooLong { len: usize, max: usize },

    #[error("Malformed URL: {0}")]
    Malformed(String),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("URL has no host")]
    MissingHost,

    #[error("Private or local host not allowed: {0}")]
    DisallowedHost(String),
}

impl From<UrlValidationError> for AnalysisError {
    fn from(err: UrlValidationError) -> Self {
        let code = match &err {
            UrlValidationError::Empty => "url_empty",
            UrlValidationError::TooLong { .. } => "url_too_long",
            UrlValidationError::Malformed(_) => "url_malformed",
            UrlValidationError::UnsupportedScheme(_) => "url_unsupported_scheme",
            UrlValidationError::MissingHost => "url_missing_host",
            UrlValidationError::DisallowedHost(_) => "url_disallowed_host",
        };
        AnalysisError::validation(err.to_string()).with_code(code)
    }
}

/// Options controlling URL acceptance.
#[derive(Debug, Clone, Copy)]
pub struct ValidationOptions {
    pub max_length: usize,
    pub allow_private_hosts: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            max_length: MAX_URL_LENGTH,
            allow_private_hosts: false,
        }
    }
}

/// A validated, normalized URL and its components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedUrl {
    /// Input as supplied by the caller (trimmed)
    pub original: String,
    /// Canonical serialization; also the cache key of a whole analysis
    pub normalized: String,
    /// `http` or `https`
    pub protocol: String,
    /// Lowercased ASCII (punycode) host, without brackets for IPv6
    pub hostname: String,
    /// Host as the user would read it (IDNA decoded)
    pub display_hostname: String,
    pub port: Option<u16>,
    pub path: String,
    pub query: Option<String>,
    pub query_params: Vec<(String, String)>,
    pub is_ip_literal: bool,
    /// Registrable domain, absent for IP literals and bare suffixes
    pub root_domain: Option<String>,
    pub subdomain: Option<String>,
    pub tld: Option<String>,
}

impl ParsedUrl {
    /// Port used for TLS inspection.
    pub fn tls_port(&self) -> u16 {
        self.port.unwrap_or(crate::config::DEFAULT_TLS_PORT)
    }

    pub fn is_https(&self) -> bool {
        self.protocol == "https"
    }
}

/// Validates and normalizes a URL with the default options.
pub fn validate_url(input: &str) -> Result<ParsedUrl, UrlValidationError> {
    validate_url_with(input, &ValidationOptions::default())
}

/// Validates and normalizes a URL.
///
/// Adds an `https://` prefix if the input has no scheme, then requires a
/// syntactically valid http/https URL with a host. Private and localhost
/// targets are rejected unless `options.allow_private_hosts` is set.
///
/// # Errors
///
/// Returns the first [`UrlValidationError`] encountered.
pub fn validate_url_with(
    input: &str,
    options: &ValidationOptions,
) -> Result<ParsedUrl, UrlValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlValidationError::Empty);
    }

    // Check URL length before normalization
    if trimmed.len() > options.max_length {
        warn!(
            "Rejecting URL exceeding maximum length ({} > {})",
            trimmed.len(),
            options.max_length
        );
        return Err(UrlValidationError::TooLong {
            len: trimmed.len(),
            max: options.max_length,
        });
    }

    let candidate = if has_explicit_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    // The prefix can push an input over the limit
    if candidate.len() > options.max_length {
        return Err(UrlValidationError::TooLong {
            len: candidate.len(),
            max: options.max_length,
        });
    }

    let parsed =
        Url::parse(&candidate).map_err(|e| UrlValidationError::Malformed(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(UrlValidationError::UnsupportedScheme(other.to_string())),
    }

    let host = parsed.host().ok_or(UrlValidationError::MissingHost)?;
    let (hostname, ip) = match host {
        Host::Domain(d) => {
            if d.is_empty() {
                return Err(UrlValidationError::MissingHost);
            }
            (d.trim_end_matches('.').to_lowercase(), None)
        }
        Host::Ipv4(v4) => (v4.to_string(), Some(IpAddr::V4(v4))),
        Host::Ipv6(v6) => (v6.to_string(), Some(IpAddr::V6(v6))),
    };

    if !options.allow_private_hosts {
        let private = match ip {
            Some(IpAddr::V4(v4)) => is_private_ipv4(v4),
            Some(IpAddr::V6(v6)) => is_private_ipv6(v6),
            None => is_localhost_domain(&hostname),
        };
        if private {
            return Err(UrlValidationError::DisallowedHost(hostname));
        }
    }

    let is_ip_literal = ip.is_some();
    let (root_domain, subdomain, tld) = if is_ip_literal {
        (None, None, None)
    } else {
        split_domain(&hostname)
    };

    let display_hostname = if is_ip_literal {
        hostname.clone()
    } else {
        let (unicode, result) = idna::domain_to_unicode(&hostname);
        if result.is_ok() {
            unicode
        } else {
            hostname.clone()
        }
    };

    let query_params = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    Ok(ParsedUrl {
        original: trimmed.to_string(),
        normalized: parsed.to_string(),
        protocol: parsed.scheme().to_string(),
        hostname,
        display_hostname,
        port: parsed.port(),
        path: parsed.path().to_string(),
        query: parsed.query().map(str::to_string),
        query_params,
        is_ip_literal,
        root_domain,
        subdomain,
        tld,
    })
}

/// Whether `input` already carries a scheme.
///
/// `example.com:8080` and `localhost:3000` look like `scheme:rest` to a URL
/// parser; they are treated as scheme-less host:port inputs.
fn has_explicit_scheme(input: &str) -> bool {
    if input.contains("://") {
        return true;
    }
    let Some((head, rest)) = input.split_once(':') else {
        return false;
    };
    let scheme_like = !head.is_empty()
        && head.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && head
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !scheme_like || head.contains('.') {
        return false;
    }
    let port_like = rest
        .split(['/', '?', '#'])
        .next()
        .is_some_and(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
    !port_like
}

/// Splits a hostname into (registrable domain, subdomain, public suffix).
fn split_domain(hostname: &str) -> (Option<String>, Option<String>, Option<String>) {
    let tld = psl::suffix_str(hostname).map(str::to_string);
    let root = psl::domain_str(hostname).map(str::to_string);
    let subdomain = root.as_deref().and_then(|root| {
        hostname
            .strip_suffix(root)
            .and_then(|prefix| prefix.strip_suffix('.'))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    });
    (root, subdomain, tld)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adds_https_when_scheme_missing() {
        let parsed = validate_url("example.com").unwrap();
        assert_eq!(parsed.normalized, "https://example.com/");
        assert_eq!(parsed.protocol, "https");
        assert_eq!(parsed.hostname, "example.com");
    }

    #[test]
    fn test_preserves_http() {
        let parsed = validate_url("http://example.com/a").unwrap();
        assert_eq!(parsed.protocol, "http");
        assert_eq!(parsed.path, "/a");
    }

    #[test]
    fn test_host_with_port_without_scheme() {
        let parsed = validate_url("example.com:8080/path?query=value").unwrap();
        assert_eq!(parsed.port, Some(8080));
        assert_eq!(parsed.tls_port(), 8080);
        assert_eq!(parsed.path, "/path");
        assert_eq!(
            parsed.query_params,
            vec![("query".to_string(), "value".to_string())]
        );
    }

    #[test]
    fn test_rejects_unsupported_schemes() {
        for input in [
            "ftp://example.com",
            "javascript:alert(1)",
            "mailto:user@example.com",
            "file:///etc/passwd",
            "data:text/html,hi",
        ] {
            assert!(
                matches!(
                    validate_url(input),
                    Err(UrlValidationError::UnsupportedScheme(_))
                ),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(validate_url("not a valid url!!!").is_err());
        assert_eq!(validate_url("   "), Err(UrlValidationError::Empty));
    }

    #[test]
    fn test_rejects_excessive_length() {
        let long = format!("https://example.com/{}", "a".repeat(MAX_URL_LENGTH));
        assert!(matches!(
            validate_url(&long),
            Err(UrlValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_prefix_can_exceed_length() {
        let input = format!("example.com/{}", "a".repeat(MAX_URL_LENGTH - 15));
        assert!(input.len() <= MAX_URL_LENGTH);
        assert!(matches!(
            validate_url(&input),
            Err(UrlValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_rejects_private_hosts_by_default() {
        for input in [
            "http://127.0.0.1/",
            "http://10.1.2.3",
            "http://[::1]/",
            "http://localhost:3000",
            "https://printer.local",
        ] {
            assert!(
                matches!(
                    validate_url(input),
                    Err(UrlValidationError::DisallowedHost(_))
                ),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_allows_private_hosts_when_configured() {
        let options = ValidationOptions {
            allow_private_hosts: true,
            ..Default::default()
        };
        let parsed = validate_url_with("http://127.0.0.1:8080/", &options).unwrap();
        assert!(parsed.is_ip_literal);
        assert_eq!(parsed.root_domain, None);
    }

    #[test]
    fn test_public_ip_literal() {
        let parsed = validate_url("http://203.0.113.7/login.php").unwrap();
        assert!(parsed.is_ip_literal);
        assert_eq!(parsed.hostname, "203.0.113.7");
        assert_eq!(parsed.tld, None);
    }

    #[test]
    fn test_domain_components() {
        let parsed = validate_url("https://secure.login.example.co.uk/x").unwrap();
        assert_eq!(parsed.root_domain.as_deref(), Some("example.co.uk"));
        assert_eq!(parsed.subdomain.as_deref(), Some("secure.login"));
        assert_eq!(parsed.tld.as_deref(), Some("co.uk"));

        let parsed = validate_url("https://example.com").unwrap();
        assert_eq!(parsed.subdomain, None);
    }

    #[test]
    fn test_hostname_lowercased() {
        let parsed = validate_url("HTTPS://WWW.Example.COM/Path").unwrap();
        assert_eq!(parsed.hostname, "www.example.com");
        assert_eq!(parsed.path, "/Path");
    }

    #[test]
    fn test_idn_display_hostname() {
        // Cyrillic 'а' in place of Latin 'a'
        let parsed = validate_url("https://p\u{0430}ypal.com/").unwrap();
        assert!(parsed.hostname.starts_with("xn--"));
        assert_eq!(parsed.display_hostname, "p\u{0430}ypal.com");
    }

    #[test]
    fn test_validation_error_converts_to_analysis_error() {
        let err: AnalysisError = UrlValidationError::MissingHost.into();
        assert_eq!(err.kind, crate::error_handling::ErrorKind::Validation);
        assert_eq!(err.code, "url_missing_host");
        assert!(!err.retryable);
    }
}
