//! Memory Backend Module
//!
//! In-process store with lazy TTL expiration and optional LRU eviction.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;
use url::Url;

use crate::backend::{CacheBackend, CacheEntry, LruTracker};
use crate::error::{CacheError, Result};

#[derive(Debug, Default)]
struct MemoryState {
    entries: HashMap<String, CacheEntry>,
    lru: LruTracker,
}

impl MemoryState {
    fn remove(&mut self, key: &str) -> bool {
        self.lru.remove(key);
        self.entries.remove(key).is_some()
    }

    /// Removes every expired entry, returning how many were removed.
    fn remove_expired(&mut self) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove(key);
        }
        expired.len()
    }
}

// == Memory Backend ==
/// In-process cache store.
///
/// Entries live as long as the backend; expired entries are dropped by the
/// read that observes them or by [`CacheBackend::purge_expired`].
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
    /// Maximum number of entries, None = unbounded
    max_entries: Option<usize>,
}

impl MemoryBackend {
    /// Creates an unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding at most `max_entries` entries, evicting the
    /// least recently used one when full.
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            state: Mutex::default(),
            max_entries: Some(max_entries.max(1)),
        }
    }

    /// Creates a store from a `memory://` URL, honoring `?max_entries=N`.
    pub fn from_url(url: &Url) -> Result<Self> {
        let max_entries = url
            .query_pairs()
            .find(|(name, _)| name == "max_entries")
            .map(|(_, value)| {
                value
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| {
                        CacheError::Configuration(format!(
                            "max_entries must be a positive integer, got '{value}'"
                        ))
                    })
            })
            .transpose()?;

        Ok(match max_entries {
            Some(n) => Self::with_capacity(n),
            None => Self::new(),
        })
    }

    /// Number of stored entries, expired ones included until they are evicted.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut state = self.state.lock();

        let Some(entry) = state.entries.get(key) else {
            return Ok(None);
        };
        if entry.is_expired() {
            state.remove(key);
            debug!("Evicted expired entry '{}'", key);
            return Ok(None);
        }

        let value = entry.value.clone();
        state.lru.touch(key);
        Ok(Some(value))
    }

    fn set(&self, key: &str, value: &[u8], ttl: Option<u64>) -> Result<()> {
        let mut state = self.state.lock();

        let is_overwrite = state.entries.contains_key(key);
        if let Some(max) = self.max_entries {
            // Expired entries give up their slots before live ones are evicted
            if !is_overwrite && state.entries.len() >= max && state.remove_expired() == 0 {
                if let Some(evicted) = state.lru.evict_oldest() {
                    state.entries.remove(&evicted);
                    debug!("Evicted least recently used entry '{}'", evicted);
                }
            }
        }

        state
            .entries
            .insert(key.to_string(), CacheEntry::new(value.to_vec(), ttl));
        state.lru.touch(key);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.state.lock().remove(key);
        Ok(())
    }

    fn purge_expired(&self) -> Result<usize> {
        Ok(self.state.lock().remove_expired())
    }
}
