//! Cache backend trait abstraction.

use std::collections::BTreeSet;
use entity_progress_core::Time;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A lock was poisoned by a panicking writer
    #[error("cache lock poisoned")]
    Poisoned,
}

/// When an entry stops being served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expire {
    /// Lives until deleted or invalidated by tag
    Permanent,
    /// Not served after this moment
    At(Time),
}

impl Expire {
    /// Whether an entry with this expiry is still valid at `now`.
    pub fn is_live(&self, now: Time) -> bool {
        match self {
            Expire::Permanent => true,
            Expire::At(at) => *at > now,
        }
    }
}

/// A stored cache item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Cache id
    pub cid: String,

    /// Cached payload
    pub data: Value,

    /// Expiry
    pub expire: Expire,

    /// Tags that invalidate the entry
    pub tags: BTreeSet<String>,

    /// When the entry was written
    pub created: Time,
}

impl CacheEntry {
    /// Whether any of the given tags is carried by this entry.
    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.iter().any(|tag| self.tags.contains(tag))
    }
}

/// Persistent key-value cache with tag invalidation.
///
/// Operations are atomic per key. Nothing is assumed about consistency across
/// keys; concurrent writers of one key resolve as last writer wins.
pub trait CacheBackend: Send + Sync {
    /// Load a live entry.
    fn get(&self, cid: &str) -> Result<Option<CacheEntry>>;

    /// Store an entry, replacing any previous one under the same id.
    fn set(&self, cid: &str, data: Value, expire: Expire, tags: BTreeSet<String>) -> Result<()>;

    /// Remove an entry. Removing a missing entry is not an error.
    fn delete(&self, cid: &str) -> Result<()>;

    /// Remove every entry carrying any of the tags. Returns how many were removed.
    fn invalidate_tags(&self, tags: &[String]) -> Result<usize>;

    /// Remove everything.
    fn clear(&self) -> Result<()>;
}
