//! Domain extraction and normalization utilities.
//!
//! This module provides functions to extract and normalize domain names using
//! the Public Suffix List (PSL) to correctly identify registrable domains.
//!
//! Key functions:
//! - `extract_domain()` - Extracts the registrable domain from a URL
//! - `normalize_domain_input()` - Accepts a bare domain or a URL and returns the
//!   registrable domain used for WHOIS lookups

use crate::error_handling::AnalysisError;

/// Extracts the registrable domain from a URL.
///
/// # Errors
///
/// Returns `invalid_domain` if the URL cannot be parsed, has no host, is an IP
/// address, or has no registrable domain (e.g. a bare public suffix).
///
/// Multi-part suffixes are handled by the PSL, so
/// `https://www.example.co.uk` yields `example.co.uk`.
pub fn extract_domain(url: &str) -> Result<String, AnalysisError> {
    let parsed = url::Url::parse(url)
        .map_err(|e| AnalysisError::invalid_domain(format!("Failed to parse URL {url}: {e}")))?;

    let host = match parsed.host() {
        Some(url::Host::Domain(d)) => d.to_string(),
        Some(url::Host::Ipv4(_)) | Some(url::Host::Ipv6(_)) => {
            return Err(AnalysisError::invalid_domain(format!(
                "IP addresses do not have registrable domains: {}",
                parsed.host_str().unwrap_or_default()
            )))
        }
        None => {
            return Err(AnalysisError::invalid_domain(format!(
                "URL '{url}' has no host component"
            )))
        }
    };

    registrable_domain(&host)
}

/// Returns the registrable domain of a hostname.
///
/// # Errors
///
/// Returns `invalid_domain` for IP literals and hosts with no registrable part.
pub fn registrable_domain(host: &str) -> Result<String, AnalysisError> {
    let host = host.trim().trim_end_matches('.').to_lowercase();
    if host.is_empty() {
        return Err(AnalysisError::invalid_domain("Empty domain"));
    }
    let unbracketed = host.trim_start_matches('[').trim_end_matches(']');
    if unbracketed.parse::<std::net::IpAddr>().is_ok() {
        return Err(AnalysisError::invalid_domain(format!(
            "IP addresses do not have registrable domains: {host}"
        )));
    }
    if !host
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        || host.split('.').any(str::is_empty)
    {
        return Err(AnalysisError::invalid_domain(format!(
            "Not a valid domain name: {host}"
        )));
    }

    psl::domain_str(&host)
        .map(str::to_string)
        .ok_or_else(|| AnalysisError::invalid_domain(format!("No registrable domain in {host}")))
}

/// Normalizes WHOIS input: either a bare domain (`WWW.Example.com.`) or a URL.
///
/// Unicode hostnames are converted to their ASCII form before the PSL lookup.
pub fn normalize_domain_input(input: &str) -> Result<String, AnalysisError> {
    let trimmed = input.trim();
    if trimmed.contains("://") {
        return extract_domain(trimmed);
    }
    let host = trimmed
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    // Strip a port, but leave bracketed IPv6 literals for the IP check
    let host = match host.rsplit_once(':') {
        Some((h, port)) if !h.contains(':') && port.chars().all(|c| c.is_ascii_digit()) => h,
        _ => host,
    };
    let ascii = if host.is_ascii() {
        host.to_string()
    } else {
        idna::domain_to_ascii(host)
            .map_err(|e| AnalysisError::invalid_domain(format!("Invalid IDN {host}: {e}")))?
    };
    registrable_domain(&ascii)
}

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
