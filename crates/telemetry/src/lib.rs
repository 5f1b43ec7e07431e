//! Request metrics for the generation layer.
//!
//! Thread-safe, append-only: one [`RequestMetric`] per orchestrated call,
//! aggregated on demand into [`PerformanceStats`]. Purely observational —
//! nothing here ever feeds back into control flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use uuid::Uuid;

/// One orchestrated request, from first attempt to final outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMetric {
    /// Unique identifier.
    pub id: String,
    /// Which provider served (or failed) the request.
    pub provider: String,
    /// When the orchestrator started working on the request.
    pub started_at: DateTime<Utc>,
    /// When the final outcome was known (None while in flight).
    pub ended_at: Option<DateTime<Utc>>,
    /// Whether the request ultimately succeeded.
    pub success: bool,
    /// The final error message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RequestMetric {
    /// Start tracking a request against `provider`.
    pub fn start(provider: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            provider: provider.into(),
            started_at: Utc::now(),
            ended_at: None,
            success: false,
            error: None,
        }
    }

    /// Mark the request as finished.
    pub fn finish(mut self, success: bool, error: Option<String>) -> Self {
        self.ended_at = Some(Utc::now());
        self.success = success;
        self.error = error;
        self
    }

    /// Wall-clock duration in milliseconds, if the request has finished.
    pub fn duration_ms(&self) -> Option<u64> {
        self.ended_at.map(|end| {
            end.signed_duration_since(self.started_at)
                .num_milliseconds()
                .max(0) as u64
        })
    }
}

/// Aggregated view over the metrics log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    /// Percentage in [0, 100]; 0 when no requests were recorded.
    pub success_rate: f64,
    pub min_duration_ms: Option<u64>,
    pub avg_duration_ms: Option<u64>,
    pub max_duration_ms: Option<u64>,
}

/// Thread-safe append-only metrics log.
///
/// Contention is expected to be low and appends are O(1), so a single
/// `RwLock<Vec<_>>` is sufficient.
#[derive(Debug, Default)]
pub struct MetricsLog {
    entries: RwLock<Vec<RequestMetric>>,
}

impl MetricsLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finished metric.
    pub fn record(&self, metric: RequestMetric) {
        self.entries.write().unwrap().push(metric);
    }

    /// A point-in-time copy of every recorded metric.
    pub fn snapshot(&self) -> Vec<RequestMetric> {
        self.entries.read().unwrap().clone()
    }

    /// Number of recorded metrics.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }

    /// Drop all recorded metrics.
    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }

    /// Aggregate the log into summary statistics.
    pub fn stats(&self) -> PerformanceStats {
        let entries = self.entries.read().unwrap();
        let total = entries.len();
        let successful = entries.iter().filter(|m| m.success).count();
        let durations: Vec<u64> = entries.iter().filter_map(|m| m.duration_ms()).collect();

        let success_rate = if total == 0 {
            0.0
        } else {
            successful as f64 * 100.0 / total as f64
        };

        let (min, max) = (
            durations.iter().min().copied(),
            durations.iter().max().copied(),
        );
        let avg = if durations.is_empty() {
            None
        } else {
            Some(durations.iter().sum::<u64>() / durations.len() as u64)
        };

        PerformanceStats {
            total_requests: total,
            successful_requests: successful,
            failed_requests: total - successful,
            success_rate,
            min_duration_ms: min,
            avg_duration_ms: avg,
            max_duration_ms: max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_log_has_zeroed_stats() {
        let log = MetricsLog::new();
        let stats = log.stats();
        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.avg_duration_ms, None);
    }

    #[test]
    fn records_success_and_failure() {
        let log = MetricsLog::new();
        log.record(RequestMetric::start("gemini").finish(true, None));
        log.record(RequestMetric::start("gemini").finish(false, Some("timeout".into())));

        let stats = log.stats();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.successful_requests, 1);
        assert_eq!(stats.failed_requests, 1);
        assert_eq!(stats.success_rate, 50.0);
        assert!(stats.min_duration_ms.is_some());

        let last = &log.snapshot()[1];
        assert_eq!(last.error.as_deref(), Some("timeout"));
        assert!(last.duration_ms().is_some());
    }

    #[test]
    fn clear_empties_the_log() {
        let log = MetricsLog::new();
        log.record(RequestMetric::start("mock").finish(true, None));
        assert_eq!(log.len(), 1);
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn unfinished_metric_has_no_duration() {
        let metric = RequestMetric::start("mock");
        assert_eq!(metric.duration_ms(), None);
        assert!(!metric.success);
    }

    #[test]
    fn concurrent_appends_do_not_lose_entries() {
        let log = std::sync::Arc::new(MetricsLog::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let log = log.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        log.record(RequestMetric::start("mock").finish(true, None));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(log.len(), 400);
    }
}
