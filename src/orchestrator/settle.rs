//! Isolated service execution.
//!
//! Each analyzer call runs as its own task under its own timeout. A timeout,
//! an error or a panic in one task becomes that service's failure and never
//! affects the others.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::analyzers::{Analyzed, ServiceKind};
use crate::error_handling::AnalysisError;
use crate::utils::elapsed_ms;

/// Settled outcome of one service call.
pub(crate) struct Settled<T> {
    pub service: ServiceKind,
    pub result: Result<Analyzed<T>, AnalysisError>,
    pub elapsed_ms: u64,
}

/// Spawns `task` and waits for it under `timeout`. Never fails.
pub(crate) async fn run_isolated<T, F>(service: ServiceKind, timeout: Duration, task: F) -> Settled<T>
where
    T: Send + 'static,
    F: Future<Output = Result<Analyzed<T>, AnalysisError>> + Send + 'static,
{
    let start = Instant::now();
    let handle = tokio::spawn(tokio::time::timeout(timeout, task));
    let result = match handle.await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(AnalysisError::timeout(format!(
            "{} service exceeded {}ms",
            service.display_name(),
            timeout.as_millis()
        ))),
        Err(join_error) if join_error.is_panic() => Err(AnalysisError::unknown(format!(
            "{} service panicked",
            service.display_name()
        ))
        .with_code("service_panicked")),
        Err(join_error) => Err(AnalysisError::unknown(format!(
            "{} service task failed: {join_error}",
            service.display_name()
        ))),
    };
    Settled {
        service,
        result,
        elapsed_ms: elapsed_ms(start),
    }
}
