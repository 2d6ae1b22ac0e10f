//! AI content analysis.
//!
//! Sends the URL and the technical context gathered so far to an LLM and
//! parses its JSON verdict. Every call is priced before it is made: if the
//! worst-case cost exceeds the configured ceiling the call is refused.

mod client;
mod parse;
mod pricing;
mod prompt;
mod types;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, info};

use crate::analyzers::{AnalysisRequest, Analyzed, ContentAnalyzer, TechnicalContext};
use crate::config::{AI_COST_THRESHOLD_USD, AI_TIMEOUT_SECS};
use crate::error_handling::AnalysisError;
use crate::utils::{elapsed_ms, retry_with_backoff, RetryPolicy};
use crate::validation::ParsedUrl;

pub use client::{AiClient, Completion};
pub use parse::parse_verdict;
pub use pricing::{estimate_cost, estimate_tokens, pricing_for, ModelPricing};
pub use prompt::{build_prompt, SYSTEM_PROMPT};
pub use types::{AiAnalysis, ModelVerdict, ScamCategory, TokenUsage};

/// Costs are accumulated in millionths of a dollar.
const MICRO_USD: f64 = 1_000_000.0;

/// Token and cost totals across all calls of one service.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UsageTotals {
    pub requests: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: f64,
}

/// Cost-gated, retrying LLM analyzer.
pub struct AiService {
    client: AiClient,
    cost_threshold_usd: f64,
    retry: RetryPolicy,
    timeout: Duration,
    requests: AtomicU64,
    input_tokens: AtomicU64,
    output_tokens: AtomicU64,
    cost_micro_usd: AtomicU64,
}

impl AiService {
    pub fn new(client: AiClient) -> Self {
        Self {
            client,
            cost_threshold_usd: AI_COST_THRESHOLD_USD,
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(AI_TIMEOUT_SECS),
            requests: AtomicU64::new(0),
            input_tokens: AtomicU64::new(0),
            output_tokens: AtomicU64::new(0),
            cost_micro_usd: AtomicU64::new(0),
        }
    }

    pub fn with_cost_threshold(mut self, cost_threshold_usd: f64) -> Self {
        self.cost_threshold_usd = cost_threshold_usd;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Totals across every completed call so far.
    pub fn usage(&self) -> UsageTotals {
        UsageTotals {
            requests: self.requests.load(Ordering::Relaxed),
            input_tokens: self.input_tokens.load(Ordering::Relaxed),
            output_tokens: self.output_tokens.load(Ordering::Relaxed),
            cost_usd: self.cost_micro_usd.load(Ordering::Relaxed) as f64 / MICRO_USD,
        }
    }

    /// Classifies `url`.
    ///
    /// # Errors
    ///
    /// `cost_threshold_exceeded` before any request when the estimate is over
    /// the ceiling; otherwise the provider, parse or timeout failure.
    pub async fn analyze_content(
        &self,
        url: &ParsedUrl,
        context: &TechnicalContext,
    ) -> Result<Analyzed<AiAnalysis>, AnalysisError> {
        let start = Instant::now();
        let provider = self.client.provider();
        let model = self.client.model();

        let user_prompt = build_prompt(url, context);
        let full_prompt = format!("{SYSTEM_PROMPT}\n{user_prompt}");
        let estimated_cost =
            estimate_cost(provider, model, &full_prompt, self.client.max_output_tokens());
        if estimated_cost > self.cost_threshold_usd {
            return Err(AnalysisError::cost_threshold_exceeded(format!(
                "Estimated cost ${estimated_cost:.4} exceeds threshold ${:.4}",
                self.cost_threshold_usd
            )));
        }
        debug!(
            "AI analysis of {} with {model}, estimated cost ${estimated_cost:.5}",
            url.normalized
        );

        let client = &self.client;
        let user_prompt = user_prompt.as_str();
        let operation = format!("AI analysis of {}", url.normalized);
        let completion = tokio::time::timeout(
            self.timeout,
            retry_with_backoff(&self.retry, &operation, move || async move {
                let completion = client.complete(SYSTEM_PROMPT, user_prompt).await?;
                let verdict = parse_verdict(&completion.content)?;
                Ok((completion.usage, verdict))
            }),
        )
        .await
        .map_err(|_| {
            AnalysisError::timeout(format!(
                "AI analysis exceeded {}s",
                self.timeout.as_secs()
            ))
        })?;
        let (usage, verdict) = completion?;

        let actual_cost = usage.map(|u| pricing_for(provider, model).cost(u.input_tokens, u.output_tokens));
        self.record_usage(usage, actual_cost);

        let analysis = AiAnalysis::from_verdict(verdict, provider, model, usage, estimated_cost, actual_cost);
        info!(
            "AI verdict for {}: {} ({:.0}/100)",
            url.normalized,
            analysis.scam_category.as_str(),
            analysis.risk_score
        );
        Ok(Analyzed::fresh(analysis, elapsed_ms(start)))
    }

    fn record_usage(&self, usage: Option<TokenUsage>, cost_usd: Option<f64>) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if let Some(usage) = usage {
            self.input_tokens
                .fetch_add(u64::from(usage.input_tokens), Ordering::Relaxed);
            self.output_tokens
                .fetch_add(u64::from(usage.output_tokens), Ordering::Relaxed);
        }
        if let Some(cost) = cost_usd {
            self.cost_micro_usd
                .fetch_add((cost * MICRO_USD).round() as u64, Ordering::Relaxed);
        }
    }
}

#[async_trait]
impl ContentAnalyzer for AiService {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<Analyzed<AiAnalysis>, AnalysisError> {
        self.analyze_content(&request.url, &request.context).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AiProvider;
    use crate::error_handling::ErrorKind;
    use crate::validation::validate_url;
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(server: &MockServer) -> AiService {
        let client = AiClient::new(
            Arc::new(reqwest::Client::new()),
            AiProvider::OpenAi,
            server.uri(),
            Some("sk-test".to_string()),
            "gpt-4o-mini",
        );
        AiService::new(client).with_retry(RetryPolicy {
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            max_retries: 2,
        })
    }

    fn verdict_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}],
            "usage": {"prompt_tokens": 1000, "completion_tokens": 100}
        })
    }

    #[tokio::test]
    async fn test_successful_analysis_records_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(verdict_body(
                r#"{"risk_score": 92, "confidence": 0.85, "scam_category": "phishing",
                    "primary_risks": ["credential theft"], "indicators": ["brand in subdomain"],
                    "explanation": "Impersonates a bank login."}"#,
            )))
            .expect(1)
            .mount(&server)
            .await;
        let service = service(&server);
        let url = validate_url("https://secure-login.example-bank.top/verify").unwrap();

        let result = service
            .analyze_content(&url, &TechnicalContext::default())
            .await
            .unwrap();
        assert!(!result.from_cache);
        assert_eq!(result.analysis.risk_score, 92.0);
        assert_eq!(result.analysis.scam_category, ScamCategory::Phishing);
        assert_eq!(result.analysis.provider, AiProvider::OpenAi);
        assert!(result.analysis.estimated_cost_usd > 0.0);

        // 1000 * 0.15 + 100 * 0.60 per million tokens
        let expected_cost = 0.00021;
        assert!((result.analysis.cost_usd.unwrap() - expected_cost).abs() < 1e-9);
        let usage = service.usage();
        assert_eq!(usage.requests, 1);
        assert_eq!(usage.input_tokens, 1000);
        assert_eq!(usage.output_tokens, 100);
        assert!((usage.cost_usd - expected_cost).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_cost_threshold_blocks_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(verdict_body("{}")))
            .expect(0)
            .mount(&server)
            .await;
        let service = service(&server).with_cost_threshold(0.000_001);
        let url = validate_url("https://example.com/").unwrap();

        let err = service
            .analyze_content(&url, &TechnicalContext::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::CostThresholdExceeded);
        assert_eq!(err.code, "cost_threshold_exceeded");
        assert!(!err.retryable);
        assert_eq!(service.usage().requests, 0);
    }

    #[tokio::test]
    async fn test_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(verdict_body(r#"{"risk_score": 5, "scam_category": "legitimate"}"#)),
            )
            .mount(&server)
            .await;
        let url = validate_url("https://example.com/").unwrap();

        let result = service(&server)
            .analyze_content(&url, &TechnicalContext::default())
            .await
            .unwrap();
        assert_eq!(result.analysis.scam_category, ScamCategory::Legitimate);
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_credentials_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        let url = validate_url("https://example.com/").unwrap();

        let err = service(&server)
            .analyze_content(&url, &TechnicalContext::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ApiKeyInvalid);
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(500))
                    .set_body_json(verdict_body(r#"{"risk_score": 5}"#)),
            )
            .mount(&server)
            .await;
        let url = validate_url("https://example.com/").unwrap();

        let err = service(&server)
            .with_timeout(Duration::from_millis(50))
            .analyze_content(&url, &TechnicalContext::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
    }
}
