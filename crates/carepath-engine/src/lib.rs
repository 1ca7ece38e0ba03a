//! CarePath Decision Engine
//!
//! Turns a caregiver's free-text question into a formatted, safety-checked
//! response. Crisis language always wins, then known scenarios, then the
//! statistical classifier, with a generic safe fallback when nothing is
//! trustworthy.

pub mod cache;
pub mod config;
pub mod engine;
pub mod formatter;
pub mod templates;

pub use cache::{ResponseCache, ResponseStore};
pub use config::{CacheConfig, DataSources, EngineConfig};
pub use engine::{DecisionEngine, DecisionEngineBuilder};
pub use formatter::{ResponseFormatter, DISCLAIMER_MARKER, EMERGENCY_MARKER};
pub use templates::ResponseLibrary;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::engine::DecisionEngine;
    pub use carepath_core::{Category, Method, Query, ResponseEnvelope};
}
