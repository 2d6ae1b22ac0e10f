//! URL reputation analysis.
//!
//! Looks the full URL up in a threat-intelligence service and maps the
//! returned threat matches to a severity-weighted score. Results are cached
//! per normalized URL (scheme, host, path and query).

mod client;
mod scoring;
mod types;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};

use crate::analyzers::{AnalysisRequest, Analyzed, ReputationAnalyzer};
use crate::cache::{cache_key, Cache};
use crate::config::{REPUTATION_CACHE_TTL, REPUTATION_TIMEOUT_SECS};
use crate::error_handling::AnalysisError;
use crate::utils::elapsed_ms;
use crate::validation::ParsedUrl;

pub use client::ReputationClient;
pub use scoring::{analyze_matches, platform_factor, threat_severity};
pub use types::{ReputationAnalysis, ReputationRiskFactor, ThreatMatch};

const CACHE_NAMESPACE: &str = "reputation";

/// The URL form that is looked up and cached: no fragment, no default port.
pub fn reputation_url(url: &ParsedUrl) -> String {
    let mut key = format!("{}://{}", url.protocol, url.hostname);
    if let Some(port) = url.port {
        key.push_str(&format!(":{port}"));
    }
    key.push_str(&url.path);
    if let Some(query) = url.query.as_deref().filter(|q| !q.is_empty()) {
        key.push('?');
        key.push_str(query);
    }
    key
}

/// Cached reputation analyzer.
pub struct ReputationService {
    client: ReputationClient,
    cache: Arc<dyn Cache<ReputationAnalysis>>,
    ttl: Duration,
    timeout: Duration,
}

impl ReputationService {
    pub fn new(client: ReputationClient, cache: Arc<dyn Cache<ReputationAnalysis>>) -> Self {
        Self {
            client,
            cache,
            ttl: REPUTATION_CACHE_TTL,
            timeout: Duration::from_secs(REPUTATION_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn check_url(
        &self,
        url: &ParsedUrl,
        force_refresh: bool,
    ) -> Result<Analyzed<ReputationAnalysis>, AnalysisError> {
        let start = Instant::now();
        let lookup_url = reputation_url(url);
        let key = cache_key(CACHE_NAMESPACE, &lookup_url);

        if !force_refresh {
            if let Some(cached) = self.cache.get(&key).await {
                debug!("Reputation cache hit for {lookup_url}");
                return Ok(Analyzed::cached(cached, elapsed_ms(start)));
            }
        }

        let matches = tokio::time::timeout(self.timeout, self.client.find_threat_matches(&lookup_url))
            .await
            .map_err(|_| {
                AnalysisError::timeout(format!(
                    "Reputation lookup exceeded {}s",
                    self.timeout.as_secs()
                ))
            })??;
        let analysis = analyze_matches(&lookup_url, matches, Utc::now());

        info!(
            "Reputation for {lookup_url}: {} match(es), score {:.0}",
            analysis.threat_matches.len(),
            analysis.score
        );
        if let Err(e) = self.cache.set(&key, analysis.clone(), self.ttl).await {
            warn!("Failed to cache reputation result for {lookup_url}: {e}");
        }
        Ok(Analyzed::fresh(analysis, elapsed_ms(start)))
    }
}

#[async_trait]
impl ReputationAnalyzer for ReputationService {
    async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> Result<Analyzed<ReputationAnalysis>, AnalysisError> {
        self.check_url(&request.url, request.force_refresh).await
    }
}
