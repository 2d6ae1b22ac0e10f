//! Bounded history of completed analyses and the statistics derived from it.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::analyzers::ServiceKind;
use crate::scoring::RiskLevel;

use super::types::OrchestrationResult;

/// Condensed record of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub url: String,
    pub final_score: f64,
    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub processing_time_ms: u64,
    pub from_cache: bool,
    pub fallback: bool,
    pub services_succeeded: BTreeMap<ServiceKind, bool>,
    pub timestamp: DateTime<Utc>,
}

impl From<&OrchestrationResult> for HistoryEntry {
    fn from(result: &OrchestrationResult) -> Self {
        Self {
            url: result.url.clone(),
            final_score: result.scoring.final_score,
            risk_level: result.scoring.risk_level,
            confidence: result.scoring.confidence,
            processing_time_ms: result.metrics.total_processing_time_ms,
            from_cache: result.metrics.from_cache,
            fallback: result.fallback,
            services_succeeded: result
                .services
                .iter()
                .map(|(service, summary)| (*service, summary.success))
                .collect(),
            timestamp: result.timestamp,
        }
    }
}

/// Fixed-capacity ring of the most recent analyses; the oldest entry is
/// evicted first.
#[derive(Debug)]
pub struct HistoryRing {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl HistoryRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn statistics(&self) -> AnalysisStatistics {
        AnalysisStatistics::from_entries(self.entries.iter())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskDistribution {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

/// Aggregates over the history ring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisStatistics {
    pub total_analyses: usize,
    pub fallback_count: usize,
    pub average_score: f64,
    pub average_confidence: f64,
    pub average_processing_time_ms: f64,
    pub risk_distribution: RiskDistribution,
    /// Share of analyses served from the orchestration cache
    pub cache_hit_rate: f64,
    pub service_success_rates: BTreeMap<ServiceKind, f64>,
}

impl AnalysisStatistics {
    fn from_entries<'a>(entries: impl Iterator<Item = &'a HistoryEntry>) -> Self {
        let entries: Vec<&HistoryEntry> = entries.collect();
        let total = entries.len();
        if total == 0 {
            return Self::default();
        }
        let n = total as f64;
        let mean = |f: fn(&HistoryEntry) -> f64| entries.iter().map(|e| f(e)).sum::<f64>() / n;

        let mut risk_distribution = RiskDistribution::default();
        for entry in &entries {
            match entry.risk_level {
                RiskLevel::Low => risk_distribution.low += 1,
                RiskLevel::Medium => risk_distribution.medium += 1,
                RiskLevel::High => risk_distribution.high += 1,
            }
        }

        let service_success_rates = ServiceKind::iter()
            .map(|service| {
                let ok = entries
                    .iter()
                    .filter(|e| e.services_succeeded.get(&service).copied().unwrap_or(false))
                    .count();
                (service, ok as f64 / n)
            })
            .collect();

        Self {
            total_analyses: total,
            fallback_count: entries.iter().filter(|e| e.fallback).count(),
            average_score: mean(|e| e.final_score),
            average_confidence: mean(|e| e.confidence),
            average_processing_time_ms: mean(|e| e.processing_time_ms as f64),
            risk_distribution,
            cache_hit_rate: entries.iter().filter(|e| e.from_cache).count() as f64 / n,
            service_success_rates,
        }
    }
}
