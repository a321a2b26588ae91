//! Cache identifiers and cache tag collection.

use std::collections::BTreeSet;
use serde::{Deserialize, Serialize};
use crate::entity::Entity;
use crate::field::FieldDefinition;

/// Namespace and base tag of every progress cache entry.
pub const DEFAULT_NAMESPACE: &str = "entity.progress";

/// Cache id of an entity's aggregate progress.
pub fn progress_cid(namespace: &str, entity_type: &str, entity_id: &str) -> String {
    format!("{namespace}.{entity_type}.{entity_id}")
}

/// Something whose changes must invalidate cached results derived from it.
pub trait CacheableDependency {
    /// Tags naming this object.
    fn cache_tags(&self) -> Vec<String>;
}

impl CacheableDependency for Entity {
    fn cache_tags(&self) -> Vec<String> {
        vec![self.key().to_string()]
    }
}

impl CacheableDependency for FieldDefinition {
    fn cache_tags(&self) -> Vec<String> {
        vec![format!(
            "config:field.field.{}.{}.{}",
            self.entity_type, self.bundle, self.name
        )]
    }
}

/// Collector of cache tags gathered while computing a result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheableMetadata {
    tags: BTreeSet<String>,
}

impl CacheableMetadata {
    /// Empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add raw tags.
    pub fn add_cache_tags<I, S>(&mut self, tags: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Add the tags of a dependency.
    pub fn add_cacheable_dependency(&mut self, dependency: &dyn CacheableDependency) -> &mut Self {
        self.tags.extend(dependency.cache_tags());
        self
    }

    /// Fold another collector into this one.
    pub fn merge(&mut self, other: &CacheableMetadata) -> &mut Self {
        self.tags.extend(other.tags.iter().cloned());
        self
    }

    /// Collected tags, sorted and deduplicated.
    pub fn cache_tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Whether a tag was collected.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}
