//! WHOIS lookups.
//!
//! Registry discovery, RDAP fallback and per-server rate limiting are handled
//! by the `whois-service` crate. This module only hands its raw text to our own
//! parser, so every registry format goes through the same scoring path.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::sync::OnceCell;
use whois_service::WhoisResponse;

use crate::config::WHOIS_QUERY_TIMEOUT_SECS;
use crate::error_handling::AnalysisError;

use super::parse::parse_whois_text;

/// Fetches the raw WHOIS text for one registrable domain.
#[async_trait]
pub trait WhoisTransport: Send + Sync {
    async fn lookup(&self, domain: &str) -> Result<String, AnalysisError>;
}

/// Transport backed by `whois_service::WhoisClient`.
///
/// The client bootstraps its server list on creation, so it is built on the
/// first lookup and shared afterwards.
#[derive(Default)]
pub struct RegistryTransport {
    client: OnceCell<whois_service::WhoisClient>,
}

impl RegistryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    async fn client(&self) -> Result<&whois_service::WhoisClient, AnalysisError> {
        self.client
            .get_or_try_init(|| async {
                whois_service::WhoisClient::new().await.map_err(|e| {
                    AnalysisError::network(format!("Failed to create WHOIS client: {e}"))
                        .with_code("whois_client_init")
                })
            })
            .await
    }
}

#[async_trait]
impl WhoisTransport for RegistryTransport {
    async fn lookup(&self, domain: &str) -> Result<String, AnalysisError> {
        let client = self.client().await?;
        let response = client
            .lookup(domain)
            .await
            .map_err(|e| AnalysisError::network(format!("WHOIS lookup for {domain} failed: {e}")))?;
        Ok(response_text(&response))
    }
}

/// Raw registry text, or the crate's structured fields rendered as WHOIS lines
/// when the raw answer is not line-oriented (RDAP JSON).
fn response_text(response: &WhoisResponse) -> String {
    let Some(parsed) = response.parsed_data.as_ref() else {
        return response.raw_data.clone();
    };

    let mut lines = Vec::new();
    if let Some(created) = &parsed.creation_date {
        lines.push(format!("Creation Date: {created}"));
    }
    if let Some(expires) = &parsed.expiration_date {
        lines.push(format!("Registry Expiry Date: {expires}"));
    }
    if let Some(updated) = &parsed.updated_date {
        lines.push(format!("Updated Date: {updated}"));
    }
    if let Some(registrar) = &parsed.registrar {
        lines.push(format!("Registrar: {registrar}"));
    }
    if let Some(registrant) = &parsed.registrant_name {
        lines.push(format!("Registrant Organization: {registrant}"));
    }
    lines.extend(parsed.status.iter().map(|s| format!("Domain Status: {s}")));
    lines.extend(parsed.name_servers.iter().map(|ns| format!("Name Server: {ns}")));

    merge_structured(&response.raw_data, &lines)
}

fn merge_structured(raw: &str, structured: &[String]) -> String {
    if structured.is_empty() || !parse_whois_text(raw).is_empty() {
        return raw.to_string();
    }
    let mut text = structured.join("\n");
    text.push('\n');
    text.push_str(raw);
    text
}

/// Fetches WHOIS text through a [`WhoisTransport`] with a per-query deadline.
pub struct WhoisClient {
    transport: Box<dyn WhoisTransport>,
    timeout: Duration,
}

impl WhoisClient {
    pub fn new(transport: Box<dyn WhoisTransport>) -> Self {
        Self {
            transport,
            timeout: Duration::from_secs(WHOIS_QUERY_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the raw WHOIS text for a registrable domain.
    pub async fn fetch(&self, domain: &str) -> Result<String, AnalysisError> {
        debug!("Querying WHOIS for {domain}");
        match tokio::time::timeout(self.timeout, self.transport.lookup(domain)).await {
            Ok(result) => result,
            Err(_) => Err(AnalysisError::timeout(format!(
                "WHOIS query for {domain} timed out after {}s",
                self.timeout.as_secs()
            ))),
        }
    }
}
