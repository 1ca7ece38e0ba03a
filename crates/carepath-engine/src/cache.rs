//! Response cache keyed by normalized query hash
//!
//! Bounded LRU with TTL expiry behind a single lock. Entries are advisory:
//! the engine treats any cache failure as a miss.

use crate::config::CacheConfig;
use carepath_core::{Error, ResponseEnvelope, Result};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

/// Storage seam for computed responses
pub trait ResponseStore: Send + Sync {
    /// Fetch a live entry
    fn get(&self, key: &str) -> Result<Option<ResponseEnvelope>>;

    /// Store an entry; the last writer wins
    fn put(&self, key: &str, envelope: &ResponseEnvelope) -> Result<()>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    response: ResponseEnvelope,
    inserted_at: Instant,
}

/// In-process LRU response cache with TTL
pub struct ResponseCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
}

impl ResponseCache {
    /// Create a cache
    ///
    /// * `max_entries` - Maximum number of responses kept
    /// * `ttl` - How long a response stays servable
    pub fn new(max_entries: usize, ttl: Duration) -> Result<Self> {
        let capacity = NonZeroUsize::new(max_entries)
            .ok_or_else(|| Error::config("cache max_entries must be greater than zero"))?;
        if ttl.is_zero() {
            return Err(Error::config("cache ttl must be greater than zero"));
        }

        Ok(Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        })
    }

    /// Create from configuration
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Self::new(config.max_entries, Duration::from_secs(config.ttl_secs))
    }

    /// Drop expired entries
    pub fn prune_expired(&self) -> usize {
        let mut entries = self.entries.lock();

        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.inserted_at.elapsed() >= self.ttl)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            entries.pop(key);
        }

        expired.len()
    }

    /// Current number of entries, including expired ones not yet pruned
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl ResponseStore for ResponseCache {
    fn get(&self, key: &str) -> Result<Option<ResponseEnvelope>> {
        let mut entries = self.entries.lock();

        if let Some(entry) = entries.get(key) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Ok(Some(entry.response.clone()));
            }
        } else {
            return Ok(None);
        }

        // Expired
        entries.pop(key);
        Ok(None)
    }

    fn put(&self, key: &str, envelope: &ResponseEnvelope) -> Result<()> {
        if envelope.is_crisis {
            return Err(Error::cache("crisis responses are never cached"));
        }

        self.entries.lock().put(
            key.to_string(),
            CacheEntry {
                response: envelope.clone(),
                inserted_at: Instant::now(),
            },
        );
        Ok(())
    }
}
