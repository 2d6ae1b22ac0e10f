//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `url_risk` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - JSON output of each analysis
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;
use tokio::io::{AsyncBufReadExt, BufReader};

use url_risk::initialization::{init_client, init_crypto_provider, init_logger_with};
use url_risk::{AnalysisOrchestrator, AnalyzeOptions, Config, OrchestrationResult, ScoringConfig};

/// Exit code when at least one input was not a valid URL.
const EXIT_INVALID_INPUT: i32 = 2;

#[tokio::main]
async fn main() -> Result<()> {
    // API keys may live in a .env file next to the working directory or the executable
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let config = Config::parse();

    init_logger_with(config.log_level.clone().into(), config.log_format.clone())
        .context("Failed to initialize logger")?;
    init_crypto_provider();

    match run(config).await {
        Ok(code) => {
            if code != 0 {
                process::exit(code);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("url_risk error: {:#}", e);
            process::exit(1);
        }
    }
}

async fn run(config: Config) -> Result<i32> {
    let scoring = match &config.scoring_config {
        Some(path) => ScoringConfig::load_from_file(path)
            .with_context(|| format!("Failed to load scoring config {}", path.display()))?,
        None => ScoringConfig::default(),
    };

    let http = init_client(&config).context("Failed to initialize HTTP client")?;
    let orchestrator = AnalysisOrchestrator::from_config(&config, http, scoring)
        .context("Invalid configuration")?;

    let urls = if config.urls.is_empty() || config.urls == ["-"] {
        read_stdin_urls().await?
    } else {
        config.urls.clone()
    };
    if urls.is_empty() {
        anyhow::bail!("No URLs to analyze");
    }

    let options = AnalyzeOptions {
        force_refresh: config.force_refresh,
        experiment_id: config.experiment_id.clone(),
        user_id: config.user_id.clone(),
    };

    let mut results = Vec::with_capacity(urls.len());
    for url in &urls {
        let result = orchestrator.analyze_url(url, &options).await;
        let json = if config.pretty {
            serde_json::to_string_pretty(&result)
        } else {
            serde_json::to_string(&result)
        }
        .context("Failed to serialize result")?;
        println!("{json}");
        results.push(result);
    }

    orchestrator.timing_stats().log_summary();
    Ok(evaluate_exit_code(&results))
}

/// Reads one URL per line from stdin, skipping blank lines and `#` comments.
async fn read_stdin_urls() -> Result<Vec<String>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut urls = Vec::new();
    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read URLs from stdin")?
    {
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            urls.push(trimmed.to_string());
        }
    }
    Ok(urls)
}

/// Fallback scores are still reported with exit code 0; only rejected input fails.
fn evaluate_exit_code(results: &[OrchestrationResult]) -> i32 {
    if results.iter().any(OrchestrationResult::is_validation_failure) {
        EXIT_INVALID_INPUT
    } else {
        0
    }
}
