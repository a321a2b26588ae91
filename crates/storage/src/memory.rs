//! In-memory cache backend.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use serde_json::Value;
use tracing::debug;
use super::{CacheBackend, CacheEntry, CacheError, Expire, Result};

/// Process-local cache backend.
///
/// Shared between requests through an `Arc`; every operation takes the single
/// map lock for its own duration only.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, live or not.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheBackend for MemoryCache {
    fn get(&self, cid: &str) -> Result<Option<CacheEntry>> {
        let entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        let now = chrono::Utc::now();
        Ok(entries
            .get(cid)
            .filter(|entry| entry.expire.is_live(now))
            .cloned())
    }

    fn set(&self, cid: &str, data: Value, expire: Expire, tags: BTreeSet<String>) -> Result<()> {
        let entry = CacheEntry {
            cid: cid.to_string(),
            data,
            expire,
            tags,
            created: chrono::Utc::now(),
        };
        self.entries
            .lock()
            .map_err(|_| CacheError::Poisoned)?
            .insert(cid.to_string(), entry);
        Ok(())
    }

    fn delete(&self, cid: &str) -> Result<()> {
        self.entries
            .lock()
            .map_err(|_| CacheError::Poisoned)?
            .remove(cid);
        Ok(())
    }

    fn invalidate_tags(&self, tags: &[String]) -> Result<usize> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        let before = entries.len();
        entries.retain(|_, entry| !entry.has_any_tag(tags));
        let removed = before - entries.len();
        debug!(?tags, removed, "Invalidated cache tags");
        Ok(removed)
    }

    fn clear(&self) -> Result<()> {
        self.entries.lock().map_err(|_| CacheError::Poisoned)?.clear();
        Ok(())
    }
}
