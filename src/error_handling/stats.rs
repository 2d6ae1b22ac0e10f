//! Service outcome statistics.
//!
//! Thread-safe counters for per-service successes and failures and per-kind
//! error totals, shared by every `analyze_url` call of one orchestrator.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use crate::analyzers::ServiceKind;

use super::types::ErrorKind;

/// Thread-safe service statistics tracker.
///
/// All counters are created up front for every `ServiceKind` and `ErrorKind`,
/// so increments never allocate and never miss.
pub struct ServiceStats {
    successes: HashMap<ServiceKind, AtomicUsize>,
    failures: HashMap<ServiceKind, AtomicUsize>,
    cache_hits: HashMap<ServiceKind, AtomicUsize>,
    errors: HashMap<ErrorKind, AtomicUsize>,
}

impl Default for ServiceStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceStats {
    pub fn new() -> Self {
        let counters = || {
            ServiceKind::iter()
                .map(|service| (service, AtomicUsize::new(0)))
                .collect::<HashMap<_, _>>()
        };
        let errors = ErrorKind::iter()
            .map(|kind| (kind, AtomicUsize::new(0)))
            .collect();

        ServiceStats {
            successes: counters(),
            failures: counters(),
            cache_hits: counters(),
            errors,
        }
    }

    /// Records a successful service call.
    pub fn record_success(&self, service: ServiceKind, from_cache: bool) {
        increment(&self.successes, &service);
        if from_cache {
            increment(&self.cache_hits, &service);
        }
    }

    /// Records a failed service call and the kind of failure.
    pub fn record_failure(&self, service: ServiceKind, kind: ErrorKind) {
        increment(&self.failures, &service);
        increment(&self.errors, &kind);
    }

    /// Records an orchestration-level error not tied to one service.
    pub fn record_error(&self, kind: ErrorKind) {
        increment(&self.errors, &kind);
    }

    pub fn success_count(&self, service: ServiceKind) -> usize {
        load(&self.successes, &service)
    }

    pub fn failure_count(&self, service: ServiceKind) -> usize {
        load(&self.failures, &service)
    }

    pub fn cache_hit_count(&self, service: ServiceKind) -> usize {
        load(&self.cache_hits, &service)
    }

    pub fn error_count(&self, kind: ErrorKind) -> usize {
        load(&self.errors, &kind)
    }

    /// Fraction of calls to `service` that succeeded, or `None` before any call.
    pub fn success_rate(&self, service: ServiceKind) -> Option<f64> {
        let ok = self.success_count(service);
        let total = ok + self.failure_count(service);
        (total > 0).then(|| ok as f64 / total as f64)
    }

    pub fn total_errors(&self) -> usize {
        ErrorKind::iter().map(|k| self.error_count(k)).sum()
    }
}

fn increment<K: std::hash::Hash + Eq + std::fmt::Debug>(
    map: &HashMap<K, AtomicUsize>,
    key: &K,
) {
    if let Some(counter) = map.get(key) {
        counter.fetch_add(1, Ordering::Relaxed);
    } else {
        log::error!("No counter registered for {:?}", key);
    }
}

fn load<K: std::hash::Hash + Eq>(map: &HashMap<K, AtomicUsize>, key: &K) -> usize {
    map.get(key).map(|c| c.load(Ordering::SeqCst)).unwrap_or(0)
}
