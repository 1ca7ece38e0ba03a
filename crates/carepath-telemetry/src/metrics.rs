//! Metrics collection and reporting

use carepath_core::Method;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Names of the metrics emitted through the `metrics` facade
pub mod names {
    pub const REQUESTS_TOTAL: &str = "carepath_requests_total";
    pub const DECISIONS_TOTAL: &str = "carepath_decisions_total";
    pub const CACHE_LOOKUPS_TOTAL: &str = "carepath_cache_lookups_total";
    pub const FAULTS_TOTAL: &str = "carepath_faults_total";
    pub const DECISION_LATENCY_US: &str = "carepath_decision_latency_us";
}

/// Metrics collector for decision engine monitoring
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<MetricsInner>,
}

#[derive(Default)]
struct MetricsInner {
    total_requests: AtomicU64,
    crisis: AtomicU64,
    contextual: AtomicU64,
    classified: AtomicU64,
    fallback: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    faults: AtomicU64,
    total_latency_us: AtomicU64,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::default()),
        }
    }

    /// Record an inbound request
    pub fn record_request(&self) {
        self.inner.total_requests.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(names::REQUESTS_TOTAL).increment(1);
    }

    /// Record which path produced a response
    pub fn record_decision(&self, method: Method) {
        let counter = match method {
            Method::Crisis => &self.inner.crisis,
            Method::ContextualOverride => &self.inner.contextual,
            Method::MlClassification => &self.inner.classified,
            Method::Fallback => &self.inner.fallback,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(names::DECISIONS_TOTAL, "method" => method.as_str()).increment(1);
    }

    /// Record a cache lookup
    pub fn record_cache_lookup(&self, hit: bool) {
        let (counter, result) = if hit {
            (&self.inner.cache_hits, "hit")
        } else {
            (&self.inner.cache_misses, "miss")
        };
        counter.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(names::CACHE_LOOKUPS_TOTAL, "result" => result).increment(1);
    }

    /// Record a degraded pipeline step
    pub fn record_fault(&self, step: &'static str) {
        self.inner.faults.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(names::FAULTS_TOTAL, "step" => step).increment(1);
    }

    /// Record end-to-end latency
    pub fn record_latency(&self, latency_us: u64) {
        self.inner
            .total_latency_us
            .fetch_add(latency_us, Ordering::Relaxed);
        metrics::histogram!(names::DECISION_LATENCY_US).record(latency_us as f64);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.inner.total_requests.load(Ordering::Relaxed),
            crisis: self.inner.crisis.load(Ordering::Relaxed),
            contextual: self.inner.contextual.load(Ordering::Relaxed),
            classified: self.inner.classified.load(Ordering::Relaxed),
            fallback: self.inner.fallback.load(Ordering::Relaxed),
            cache_hits: self.inner.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.inner.cache_misses.load(Ordering::Relaxed),
            faults: self.inner.faults.load(Ordering::Relaxed),
            total_latency_us: self.inner.total_latency_us.load(Ordering::Relaxed),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of current metrics
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub crisis: u64,
    pub contextual: u64,
    pub classified: u64,
    pub fallback: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub faults: u64,
    pub total_latency_us: u64,
}

impl MetricsSnapshot {
    /// Calculate average latency per request
    pub fn avg_latency_us(&self) -> u64 {
        if self.total_requests == 0 {
            0
        } else {
            self.total_latency_us / self.total_requests
        }
    }

    /// Fraction of cache lookups that hit
    pub fn cache_hit_rate(&self) -> f64 {
        let lookups = self.cache_hits + self.cache_misses;
        if lookups == 0 {
            0.0
        } else {
            self.cache_hits as f64 / lookups as f64
        }
    }

    /// Fraction of requests answered by the crisis path
    pub fn crisis_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.crisis as f64 / self.total_requests as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collection() {
        let metrics = MetricsCollector::new();

        metrics.record_request();
        metrics.record_request();
        metrics.record_decision(Method::Crisis);
        metrics.record_decision(Method::Fallback);
        metrics.record_cache_lookup(false);
        metrics.record_cache_lookup(true);
        metrics.record_fault("classifier");
        metrics.record_latency(4000);
        metrics.record_latency(2000);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_requests, 2);
        assert_eq!(snapshot.crisis, 1);
        assert_eq!(snapshot.fallback, 1);
        assert_eq!(snapshot.faults, 1);
        assert_eq!(snapshot.avg_latency_us(), 3000);
        assert_eq!(snapshot.cache_hit_rate(), 0.5);
        assert_eq!(snapshot.crisis_rate(), 0.5);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = MetricsCollector::new().snapshot();
        assert_eq!(snapshot.avg_latency_us(), 0);
        assert_eq!(snapshot.cache_hit_rate(), 0.0);
    }
}
