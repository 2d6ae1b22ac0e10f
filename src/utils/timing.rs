//! Timing metrics for performance analysis.
//!
//! Per-service processing times are accumulated in atomics so every concurrent
//! analysis can record without locking.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use strum::IntoEnumIterator;

use crate::analyzers::ServiceKind;

/// Converts a duration to whole milliseconds, saturating.
pub fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Milliseconds elapsed since `start`.
pub fn elapsed_ms(start: Instant) -> u64 {
    duration_to_ms(start.elapsed())
}

/// Aggregated processing times across analyses.
#[derive(Debug)]
pub struct TimingStats {
    count: AtomicU64,
    total_sum_ms: AtomicU64,
    service_sum_ms: HashMap<ServiceKind, AtomicU64>,
    service_count: HashMap<ServiceKind, AtomicU64>,
}

impl Default for TimingStats {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingStats {
    pub fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
            total_sum_ms: AtomicU64::new(0),
            service_sum_ms: ServiceKind::iter().map(|s| (s, AtomicU64::new(0))).collect(),
            service_count: ServiceKind::iter().map(|s| (s, AtomicU64::new(0))).collect(),
        }
    }

    /// Records one service call.
    pub fn record_service(&self, service: ServiceKind, ms: u64) {
        if let Some(sum) = self.service_sum_ms.get(&service) {
            sum.fetch_add(ms, Ordering::Relaxed);
        }
        if let Some(count) = self.service_count.get(&service) {
            count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records one whole analysis.
    pub fn record_total(&self, ms: u64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.total_sum_ms.fetch_add(ms, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Average end-to-end time in milliseconds.
    pub fn average_total_ms(&self) -> Option<u64> {
        let count = self.count();
        (count > 0).then(|| self.total_sum_ms.load(Ordering::Relaxed) / count)
    }

    /// Average time of one service in milliseconds.
    pub fn average_service_ms(&self, service: ServiceKind) -> Option<u64> {
        let count = self
            .service_count
            .get(&service)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0);
        let sum = self
            .service_sum_ms
            .get(&service)
            .map(|s| s.load(Ordering::Relaxed))
            .unwrap_or(0);
        (count > 0).then(|| sum / count)
    }

    /// Logs a summary of timing statistics.
    pub fn log_summary(&self) {
        let Some(avg_total) = self.average_total_ms() else {
            log::info!("No timing data collected");
            return;
        };

        log::info!("=== Timing Metrics Summary ({} URLs) ===", self.count());
        log::info!("  {:20} {:>6} ms", "Total:", avg_total);
        for service in ServiceKind::iter() {
            if let Some(avg) = self.average_service_ms(service) {
                let label = format!("{}:", service.display_name());
                let pct = if avg_total == 0 {
                    0.0
                } else {
                    avg as f64 / avg_total as f64 * 100.0
                };
                log::info!("  {:20} {:>6} ms ({:.1}%)", label, avg, pct);
            }
        }
    }
}
