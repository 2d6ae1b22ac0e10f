//! WHOIS domain age analysis.
//!
//! Fetches the registration record of the registrable domain, parses it, and scores the domain by age, privacy, registrar and
//! status. Results are cached per domain.

mod client;
mod parse;
mod scoring;
mod types;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};

use crate::analyzers::{AnalysisRequest, Analyzed, DomainAgeAnalyzer, ServiceResponse};
use crate::cache::{cache_key, Cache};
use crate::config::{WHOIS_CACHE_TTL, WHOIS_TIMEOUT_SECS};
use crate::domain::normalize_domain_input;
use crate::error_handling::AnalysisError;
use crate::utils::{elapsed_ms, retry_with_backoff, RetryPolicy};

pub use client::{RegistryTransport, WhoisClient, WhoisTransport};
pub use parse::parse_whois_text;
pub use scoring::{analyze_record, analyze_whois_text};
pub use types::{DomainAgeAnalysis, WhoisFactorKind, WhoisRecord, WhoisRiskFactor};

const CACHE_NAMESPACE: &str = "whois";

/// Cached, retrying WHOIS analyzer.
pub struct WhoisService {
    client: WhoisClient,
    cache: Arc<dyn Cache<DomainAgeAnalysis>>,
    ttl: Duration,
    retry: RetryPolicy,
    timeout: Duration,
}

impl WhoisService {
    pub fn new(client: WhoisClient, cache: Arc<dyn Cache<DomainAgeAnalysis>>) -> Self {
        Self {
            client,
            cache,
            ttl: WHOIS_CACHE_TTL,
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(WHOIS_TIMEOUT_SECS),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Analyzes a bare domain or URL and reports the outcome as a service response.
    pub async fn analyze_domain(
        &self,
        input: &str,
        force_refresh: bool,
    ) -> ServiceResponse<DomainAgeAnalysis> {
        let start = Instant::now();
        let result = match normalize_domain_input(input) {
            Ok(domain) => self.lookup(&domain, force_refresh).await,
            Err(e) => Err(e),
        };
        ServiceResponse::from_result(result, elapsed_ms(start))
    }

    /// Looks up an already normalized registrable domain.
    pub async fn lookup(
        &self,
        domain: &str,
        force_refresh: bool,
    ) -> Result<Analyzed<DomainAgeAnalysis>, AnalysisError> {
        let start = Instant::now();
        let key = cache_key(CACHE_NAMESPACE, domain);

        if !force_refresh {
            if let Some(cached) = self.cache.get(&key).await {
                debug!("WHOIS cache hit for {domain}");
                return Ok(Analyzed::cached(cached, elapsed_ms(start)));
            }
        }

        let client = &self.client;
        let attempt = move || async move {
            let text = client.fetch(domain).await?;
            analyze_whois_text(domain, &text, Utc::now())
        };
        let analysis = tokio::time::timeout(
            self.timeout,
            retry_with_backoff(&self.retry, &format!("WHOIS lookup for {domain}"), attempt),
        )
        .await
        .map_err(|_| {
            AnalysisError::timeout(format!(
                "WHOIS lookup for {domain} exceeded {}s",
                self.timeout.as_secs()
            ))
        })??;

        info!(
            "WHOIS for {domain}: age {:?} days, score {:.2}",
            analysis.age_in_days, analysis.score
        );
        if let Err(e) = self.cache.set(&key, analysis.clone(), self.ttl).await {
            warn!("Failed to cache WHOIS result for {domain}: {e}");
        }
        Ok(Analyzed::fresh(analysis, elapsed_ms(start)))
    }
}

#[async_trait]
impl DomainAgeAnalyzer for WhoisService {
    async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> Result<Analyzed<DomainAgeAnalysis>, AnalysisError> {
        let url = &request.url;
        if url.is_ip_literal {
            return Err(AnalysisError::invalid_domain(format!(
                "{} is an IP address and has no WHOIS record",
                url.hostname
            )));
        }
        let domain = match &url.root_domain {
            Some(root) => root.clone(),
            None => normalize_domain_input(&url.hostname)?,
        };
        self.lookup(&domain, request.force_refresh).await
    }
}
