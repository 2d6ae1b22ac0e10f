//! Analysis orchestration.
//!
//! One `analyze_url` call runs the full pipeline:
//! validate → pattern analysis → four services in parallel → minimum-services
//! gate → scoring → result. Service failures are recorded per service and
//! never abort the others. A systemic failure (too few services, scoring
//! failure, overall timeout) yields the neutral fallback result instead of an
//! error, so callers always get a well-formed [`OrchestrationResult`].

mod history;
mod settle;
mod types;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use crate::ai::{AiClient, AiService};
use crate::analyzers::{
    AnalysisRequest, Analyzed, CertificateAnalyzer, ContentAnalyzer, DomainAgeAnalyzer,
    ReputationAnalyzer, ServiceKind, TechnicalContext,
};
use crate::cache::{cache_key, Cache, CacheError, FileCache, MemoryCache};
use crate::config::{
    Config, ServiceTimeouts, CACHE_WARM_CONCURRENCY, HISTORY_CAPACITY, MAX_CACHE_ENTRIES,
    MIN_SUCCESSFUL_SERVICES, ORCHESTRATION_CACHE_TTL,
};
use crate::error_handling::{AnalysisError, ConfigError, ServiceStats};
use crate::patterns::analyze_parsed;
use crate::reputation::{ReputationClient, ReputationService};
use crate::scoring::{ScoringCalculator, ScoringConfig, ScoringInput};
use crate::tls::{SslService, TlsCertificateSource};
use crate::utils::{elapsed_ms, RetryPolicy, TimingStats};
use crate::validation::{validate_url_with, ParsedUrl, ValidationOptions};
use crate::whois::{RegistryTransport, WhoisClient, WhoisService};

pub use history::{AnalysisStatistics, HistoryEntry, HistoryRing, RiskDistribution};
pub use types::{
    AnalyzeOptions, OrchestrationMetrics, OrchestrationResult, ServiceSummary,
    FALLBACK_CONFIG_NAME,
};

use settle::{run_isolated, Settled};

const CACHE_NAMESPACE: &str = "analysis";

/// The four analyzers used by an orchestrator.
#[derive(Clone)]
pub struct AnalysisServices {
    pub reputation: Arc<dyn ReputationAnalyzer>,
    pub whois: Arc<dyn DomainAgeAnalyzer>,
    pub ssl: Arc<dyn CertificateAnalyzer>,
    pub ai: Arc<dyn ContentAnalyzer>,
}

impl AnalysisServices {
    /// Builds the production analyzers. Caches live in memory, or as JSON
    /// files under `config.cache_dir` when set.
    pub fn from_config(config: &Config, http: Arc<reqwest::Client>) -> Self {
        let timeouts = config.timeouts();

        let reputation = ReputationService::new(
            ReputationClient::new(
                http.clone(),
                config.reputation_api_base.clone(),
                config.reputation_api_key.clone(),
            ),
            make_cache(config.cache_dir.as_deref(), "reputation"),
        )
        .with_timeout(timeouts.reputation);

        let whois = WhoisService::new(
            WhoisClient::new(Box::new(RegistryTransport::new())),
            make_cache(config.cache_dir.as_deref(), "whois"),
        )
        .with_retry(RetryPolicy::default().with_max_retries(config.whois_max_retries))
        .with_timeout(timeouts.whois);

        let ssl = SslService::new(
            Box::new(TlsCertificateSource::default()),
            make_cache(config.cache_dir.as_deref(), "ssl"),
        )
        .with_timeout(timeouts.ssl);

        let ai = AiService::new(AiClient::new(
            http,
            config.ai_provider,
            config.ai_api_base(),
            config.ai_api_key.clone(),
            config.ai_model.clone(),
        ))
        .with_cost_threshold(config.ai_cost_threshold)
        .with_timeout(timeouts.ai);

        Self {
            reputation: Arc::new(reputation),
            whois: Arc::new(whois),
            ssl: Arc::new(ssl),
            ai: Arc::new(ai),
        }
    }
}

/// In-memory cache, or a file cache under `dir/namespace`.
pub fn make_cache<V>(dir: Option<&Path>, namespace: &str) -> Arc<dyn Cache<V>>
where
    V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    match dir {
        Some(dir) => Arc::new(FileCache::new(dir.join(namespace))),
        None => Arc::new(MemoryCache::new(MAX_CACHE_ENTRIES)),
    }
}

/// Coordinates the analyzers, the scoring calculator and the result cache.
pub struct AnalysisOrchestrator {
    services: AnalysisServices,
    calculator: RwLock<Arc<ScoringCalculator>>,
    cache: Option<Arc<dyn Cache<OrchestrationResult>>>,
    cache_ttl: Duration,
    timeouts: ServiceTimeouts,
    min_successful_services: usize,
    validation: ValidationOptions,
    history: Mutex<HistoryRing>,
    stats: ServiceStats,
    timing: TimingStats,
}

impl AnalysisOrchestrator {
    /// Creates an orchestrator with default timeouts, an in-memory result
    /// cache and the default minimum of successful services.
    pub fn new(services: AnalysisServices, calculator: ScoringCalculator) -> Self {
        Self {
            services,
            calculator: RwLock::new(Arc::new(calculator)),
            cache: Some(Arc::new(MemoryCache::new(MAX_CACHE_ENTRIES))),
            cache_ttl: ORCHESTRATION_CACHE_TTL,
            timeouts: ServiceTimeouts::default(),
            min_successful_services: MIN_SUCCESSFUL_SERVICES,
            validation: ValidationOptions::default(),
            history: Mutex::new(HistoryRing::new(HISTORY_CAPACITY)),
            stats: ServiceStats::new(),
            timing: TimingStats::new(),
        }
    }

    /// Builds the production orchestrator described by `config`.
    ///
    /// # Errors
    ///
    /// Returns the validation error of `config` or `scoring`.
    pub fn from_config(
        config: &Config,
        http: Arc<reqwest::Client>,
        scoring: ScoringConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let calculator = ScoringCalculator::new(scoring)?;
        let cache = config
            .enable_cache
            .then(|| make_cache(config.cache_dir.as_deref(), CACHE_NAMESPACE));

        Ok(Self::new(AnalysisServices::from_config(config, http), calculator)
            .with_cache(cache)
            .with_timeouts(config.timeouts())
            .with_min_successful_services(config.min_successful_services)
            .with_history_capacity(config.history_capacity)
            .with_validation_options(ValidationOptions {
                allow_private_hosts: config.allow_private_hosts,
                ..ValidationOptions::default()
            }))
    }

    /// Replaces the result cache; `None` disables result caching.
    pub fn with_cache(mut self, cache: Option<Arc<dyn Cache<OrchestrationResult>>>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_timeouts(mut self, timeouts: ServiceTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_min_successful_services(mut self, min: usize) -> Self {
        self.min_successful_services = min;
        self
    }

    pub fn with_validation_options(mut self, options: ValidationOptions) -> Self {
        self.validation = options;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history = Mutex::new(HistoryRing::new(capacity));
        self
    }

    /// Analyzes one URL. Never fails: systemic failures produce the fallback
    /// result and an invalid URL produces a fallback tagged `validation`.
    pub async fn analyze_url(&self, url: &str, options: &AnalyzeOptions) -> OrchestrationResult {
        let start = Instant::now();
        let cache_enabled = self.cache.is_some();

        let parsed = match validate_url_with(url, &self.validation) {
            Ok(parsed) => parsed,
            Err(e) => {
                let error = AnalysisError::from(e);
                warn!("Rejected URL {url:?}: {error}");
                self.stats.record_error(error.kind);
                return OrchestrationResult::fallback(url, error, elapsed_ms(start), cache_enabled);
            }
        };

        // Experiment results are never cached: the key does not carry the config
        let result_cache = self
            .cache
            .as_ref()
            .filter(|_| options.experiment_id.is_none());
        let key = cache_key(CACHE_NAMESPACE, &parsed.normalized);

        if let (Some(cache), false) = (result_cache, options.force_refresh) {
            if let Some(mut cached) = cache.get(&key).await {
                debug!("Analysis cache hit for {}", parsed.normalized);
                cached.metrics.from_cache = true;
                cached.metrics.total_processing_time_ms = elapsed_ms(start);
                self.record(&cached).await;
                return cached;
            }
        }

        let normalized = parsed.normalized.clone();
        let outcome =
            tokio::time::timeout(self.timeouts.analysis, self.run_pipeline(parsed, options, start))
                .await
                .unwrap_or_else(|_| {
                    Err(AnalysisError::timeout(format!(
                        "Analysis exceeded {}s",
                        self.timeouts.analysis.as_secs()
                    )))
                });

        let result = match outcome {
            Ok(result) => {
                if let Some(cache) = result_cache {
                    if let Err(e) = cache.set(&key, result.clone(), self.cache_ttl).await {
                        warn!("Failed to cache analysis of {normalized}: {e}");
                    }
                }
                info!(
                    "Analyzed {normalized}: {:.1} ({}), confidence {:.2}, {}/{} services",
                    result.scoring.final_score,
                    result.scoring.risk_level,
                    result.scoring.confidence,
                    result.metrics.services_succeeded,
                    result.metrics.services_executed
                );
                result
            }
            Err(error) => {
                warn!("Analysis of {normalized} fell back to a neutral score: {error}");
                self.stats.record_error(error.kind);
                OrchestrationResult::fallback(&normalized, error, elapsed_ms(start), cache_enabled)
            }
        };

        self.timing.record_total(result.metrics.total_processing_time_ms);
        self.record(&result).await;
        result
    }

    async fn run_pipeline(
        &self,
        parsed: ParsedUrl,
        options: &AnalyzeOptions,
        start: Instant,
    ) -> Result<OrchestrationResult, AnalysisError> {
        let patterns = analyze_parsed(&parsed);
        let context = TechnicalContext {
            patterns: Some(patterns.clone()),
            ..TechnicalContext::default()
        };
        let request = Arc::new(
            AnalysisRequest::new(parsed.clone())
                .with_force_refresh(options.force_refresh)
                .with_context(context),
        );

        let t = self.timeouts;
        let (reputation, whois, ssl, ai) = tokio::join!(
            run_isolated(ServiceKind::Reputation, t.reputation, {
                let (service, request) = (self.services.reputation.clone(), request.clone());
                async move { service.analyze(&request).await }
            }),
            run_isolated(ServiceKind::Whois, t.whois, {
                let (service, request) = (self.services.whois.clone(), request.clone());
                async move { service.analyze(&request).await }
            }),
            run_isolated(ServiceKind::Ssl, t.ssl, {
                let (service, request) = (self.services.ssl.clone(), request.clone());
                async move { service.analyze(&request).await }
            }),
            run_isolated(ServiceKind::Ai, t.ai, {
                let (service, request) = (self.services.ai.clone(), request.clone());
                async move { service.analyze(&request).await }
            }),
        );

        let mut services = BTreeMap::new();
        let input = ScoringInput {
            url: parsed.normalized.clone(),
            reputation: self.settle(reputation, &mut services),
            whois: self.settle(whois, &mut services),
            ssl: self.settle(ssl, &mut services),
            ai: self.settle(ai, &mut services),
            patterns: Some(patterns),
        };

        let succeeded = input.available_count();
        if succeeded < self.min_successful_services {
            return Err(AnalysisError::insufficient_services(format!(
                "Only {succeeded} of {} services succeeded (minimum {})",
                services.len(),
                self.min_successful_services
            )));
        }

        let calculator = self.calculator.read().await.clone();
        let experiment_id = options.experiment_id.clone();
        let user_id = options.user_id.clone();
        let scoring = tokio::time::timeout(
            t.scoring,
            tokio::task::spawn_blocking(move || {
                calculator.calculate_score(&input, experiment_id.as_deref(), user_id.as_deref())
            }),
        )
        .await
        .map_err(|_| {
            AnalysisError::timeout(format!("Scoring exceeded {}ms", t.scoring.as_millis()))
        })?
        .map_err(|e| AnalysisError::unknown(format!("Scoring failed: {e}")).with_code("scoring_failed"))?;

        let executed = services.len();
        Ok(OrchestrationResult {
            url: parsed.normalized,
            scoring,
            metrics: OrchestrationMetrics {
                services_executed: executed,
                services_succeeded: succeeded,
                services_failed: executed - succeeded,
                total_processing_time_ms: elapsed_ms(start),
                parallel_execution: true,
                cache_enabled: self.cache.is_some(),
                from_cache: false,
            },
            services,
            fallback: false,
            error: None,
            timestamp: chrono::Utc::now(),
        })
    }

    /// Records the outcome of one service and returns its analysis on success.
    fn settle<T>(
        &self,
        settled: Settled<T>,
        summaries: &mut BTreeMap<ServiceKind, ServiceSummary>,
    ) -> Option<Analyzed<T>> {
        let service = settled.service;
        self.timing.record_service(service, settled.elapsed_ms);
        match settled.result {
            Ok(analyzed) => {
                self.stats.record_success(service, analyzed.from_cache);
                summaries.insert(
                    service,
                    ServiceSummary::succeeded(analyzed.processing_time_ms, analyzed.from_cache),
                );
                Some(analyzed)
            }
            Err(error) => {
                warn!("{} service failed: {error}", service.display_name());
                self.stats.record_failure(service, error.kind);
                summaries.insert(service, ServiceSummary::failed(error, settled.elapsed_ms));
                None
            }
        }
    }

    async fn record(&self, result: &OrchestrationResult) {
        self.history.lock().await.push(HistoryEntry::from(result));
    }

    /// Computes and caches fresh results for `urls`, a few at a time.
    /// Returns the number of results stored.
    pub async fn warm_cache(&self, urls: &[String]) -> usize {
        if self.cache.is_none() {
            warn!("Cache warming requested with caching disabled");
            return 0;
        }
        let options = AnalyzeOptions::force_refresh();
        let stored = stream::iter(urls)
            .map(|url| self.analyze_url(url, &options))
            .buffer_unordered(CACHE_WARM_CONCURRENCY)
            .filter(|result| futures::future::ready(!result.fallback))
            .count()
            .await;
        info!("Warmed analysis cache with {stored} of {} URL(s)", urls.len());
        stored
    }

    /// Drops every cached analysis result.
    pub async fn clear_cache(&self) -> Result<(), CacheError> {
        match &self.cache {
            Some(cache) => cache.clear().await,
            None => Ok(()),
        }
    }

    /// Drops the cached result for `url`. Returns whether one existed.
    pub async fn invalidate(&self, url: &str) -> Result<bool, CacheError> {
        let Some(cache) = &self.cache else {
            return Ok(false);
        };
        let id = validate_url_with(url, &self.validation)
            .map(|parsed| parsed.normalized)
            .unwrap_or_else(|_| url.trim().to_string());
        cache.invalidate(&cache_key(CACHE_NAMESPACE, &id)).await
    }

    /// Drops cached results whose URL matches a glob such as
    /// `https://*.example.com/*`. Returns the number removed.
    pub async fn invalidate_pattern(&self, pattern: &str) -> Result<usize, CacheError> {
        match &self.cache {
            Some(cache) => {
                cache
                    .invalidate_pattern(&cache_key(CACHE_NAMESPACE, pattern))
                    .await
            }
            None => Ok(0),
        }
    }

    pub async fn scoring_config(&self) -> ScoringConfig {
        self.calculator.read().await.config().clone()
    }

    /// Replaces the base scoring configuration. An invalid configuration is
    /// rejected and the current one stays in effect. Registered experiments
    /// are kept.
    pub async fn update_scoring_config(&self, config: ScoringConfig) -> Result<(), ConfigError> {
        let mut guard = self.calculator.write().await;
        let mut next = ScoringCalculator::new(config)?;
        for id in guard.experiment_ids() {
            if let Some(experiment) = guard.experiment(&id) {
                next.register_experiment(id, experiment.clone())?;
            }
        }
        *guard = Arc::new(next);
        info!("Scoring configuration updated");
        Ok(())
    }

    pub async fn register_experiment(
        &self,
        experiment_id: &str,
        config: ScoringConfig,
    ) -> Result<(), ConfigError> {
        let mut guard = self.calculator.write().await;
        let mut next = ScoringCalculator::clone(&guard);
        next.register_experiment(experiment_id, config)?;
        *guard = Arc::new(next);
        Ok(())
    }

    pub async fn remove_experiment(&self, experiment_id: &str) -> bool {
        let mut guard = self.calculator.write().await;
        let mut next = ScoringCalculator::clone(&guard);
        let removed = next.remove_experiment(experiment_id);
        *guard = Arc::new(next);
        removed
    }

    /// Aggregates over the recent analyses.
    pub async fn statistics(&self) -> AnalysisStatistics {
        self.history.lock().await.statistics()
    }

    pub fn service_stats(&self) -> &ServiceStats {
        &self.stats
    }

    pub fn timing_stats(&self) -> &TimingStats {
        &self.timing
    }
}
