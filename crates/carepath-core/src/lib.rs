//! CarePath Core
//!
//! Core types and utilities shared across CarePath components.
//!
//! This crate provides:
//! - Domain types for queries, categories, decision methods and response envelopes
//! - Error types and result handling
//! - Text normalization and cache key derivation

pub mod error;
pub mod text;
pub mod types;

pub use error::{Error, Result};
pub use text::{cache_key, is_answerable, normalize};
pub use types::{Category, Method, Query, ResponseEnvelope};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::text::{cache_key, normalize};
    pub use crate::types::{Category, Method, Query, ResponseEnvelope};
}
