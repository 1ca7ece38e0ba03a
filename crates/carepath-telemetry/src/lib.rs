//! CarePath Telemetry
//!
//! Metrics for the decision engine.
//!
//! Provides:
//! - An in-process collector with per-method decision counts, cache hit rate and latency
//! - Recording helpers that also emit through the `metrics` facade for Prometheus export

pub mod metrics;

pub use crate::metrics::{MetricsCollector, MetricsSnapshot};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::metrics::{MetricsCollector, MetricsSnapshot};
}
