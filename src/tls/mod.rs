//! TLS certificate analysis.
//!
//! This module connects to the target host and scores its certificate:
//! - Validity period, age and time to expiry
//! - Chain verification against the web PKI roots
//! - Hostname coverage (SANs, wildcard aware)
//! - Issuer trust and validation level
//! - Key, signature and protocol strength
//!
//! Uses `tokio-rustls` for async TLS connections and `x509-parser` for certificate parsing.

mod analysis;
mod extract;
mod fetch;
mod types;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};

use crate::analyzers::{AnalysisRequest, Analyzed, CertificateAnalyzer};
use crate::cache::{cache_key, Cache};
use crate::config::{DEFAULT_TLS_PORT, SSL_CACHE_TTL, SSL_TIMEOUT_SECS};
use crate::error_handling::AnalysisError;
use crate::utils::elapsed_ms;

pub use analysis::{analyze_certificate, certificate_matches_host, hostname_matches};
pub use fetch::{CertificateSource, TlsCertificateSource};
pub use types::{
    CaTrustInfo, CaTrustLevel, CertificateChainInfo, CertificateDates, CertificateDetails,
    CertificateValidation, CryptoStrength, SecurityAssessment, SslCertificateAnalysis,
    SslFactorKind, SslRiskFactor, ValidationLevel,
};

const CACHE_NAMESPACE: &str = "ssl";

/// Cached certificate analyzer.
pub struct SslService {
    source: Box<dyn CertificateSource>,
    cache: Arc<dyn Cache<SslCertificateAnalysis>>,
    ttl: Duration,
    timeout: Duration,
}

impl SslService {
    pub fn new(
        source: Box<dyn CertificateSource>,
        cache: Arc<dyn Cache<SslCertificateAnalysis>>,
    ) -> Self {
        Self {
            source,
            cache,
            ttl: SSL_CACHE_TTL,
            timeout: Duration::from_secs(SSL_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Retrieves and scores the certificate served by `host:port`.
    ///
    /// Retrieval is not retried: a failed handshake is a stable property of
    /// the host for the duration of one analysis.
    pub async fn analyze_host(
        &self,
        host: &str,
        port: u16,
        force_refresh: bool,
    ) -> Result<Analyzed<SslCertificateAnalysis>, AnalysisError> {
        let start = Instant::now();
        let host = host.trim_end_matches('.').to_lowercase();
        let key = cache_key(CACHE_NAMESPACE, &format!("{host}:{port}"));

        if !force_refresh {
            if let Some(cached) = self.cache.get(&key).await {
                debug!("SSL cache hit for {host}:{port}");
                return Ok(Analyzed::cached(cached, elapsed_ms(start)));
            }
        }

        let chain = tokio::time::timeout(self.timeout, self.source.fetch(&host, port))
            .await
            .map_err(|_| {
                AnalysisError::timeout(format!(
                    "Certificate retrieval for {host}:{port} exceeded {}s",
                    self.timeout.as_secs()
                ))
            })??;
        let analysis = analyze_certificate(&host, port, &chain, Utc::now())?;

        info!(
            "SSL for {host}:{port}: score {:.0}, valid {}",
            analysis.score, analysis.validation.is_valid
        );
        if let Err(e) = self.cache.set(&key, analysis.clone(), self.ttl).await {
            warn!("Failed to cache SSL result for {host}:{port}: {e}");
        }
        Ok(Analyzed::fresh(analysis, elapsed_ms(start)))
    }
}

#[async_trait]
impl CertificateAnalyzer for SslService {
    async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> Result<Analyzed<SslCertificateAnalysis>, AnalysisError> {
        let url = &request.url;
        // Plain-HTTP URLs are still checked for a certificate on the default port
        let port = if url.is_https() {
            url.tls_port()
        } else {
            DEFAULT_TLS_PORT
        };
        self.analyze_host(&url.hostname, port, request.force_refresh)
            .await
    }
}
