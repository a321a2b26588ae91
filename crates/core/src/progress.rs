//! Progress result model.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::entity::Entity;
use crate::field::FieldDefinition;

/// Field name -> whether the field counts as done.
pub type CompletionMap = BTreeMap<String, bool>;

/// Percentage of complete fields, rounded half up.
///
/// An entity with nothing to complete is vacuously 100% complete.
pub fn percent(complete: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let complete = complete.min(total);
    // floor(complete * 100 / total + 0.5) in integers
    let rounded = (complete * 200 + total) / (total * 2);
    rounded as u8
}

/// Definitions of the fields counted, split by outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressFields {
    /// Fields that are done
    #[serde(default)]
    pub complete: Vec<FieldDefinition>,

    /// Fields still missing
    #[serde(default)]
    pub incomplete: Vec<FieldDefinition>,
}

/// Cache information attached to a result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultCache {
    /// Key parts the result is stored under
    pub keys: Vec<String>,

    /// Tags that invalidate the result
    pub tags: Vec<String>,
}

/// Completion status of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressResult {
    /// Number of fields counted
    pub total: usize,

    /// Fields done
    pub complete: usize,

    /// Fields not done
    pub incomplete: usize,

    /// Percentage done (0-100)
    pub percent: u8,

    /// Entity type id
    pub entity_type: String,

    /// Entity id
    pub entity_id: String,

    /// Human readable entity type
    pub entity_type_label: String,

    /// Counted field definitions by outcome
    pub fields: ProgressFields,

    /// Free-form data for downstream consumers
    #[serde(default)]
    pub extra: Map<String, Value>,

    /// Cache keys and tags
    #[serde(default)]
    pub cache: ResultCache,
}

impl ProgressResult {
    /// Totals for an entity from its completion map. Field buckets start empty.
    pub fn from_completion(entity: &Entity, completion: &CompletionMap) -> Self {
        let total = completion.len();
        let complete = completion.values().filter(|done| **done).count();
        Self {
            total,
            complete,
            incomplete: total - complete,
            percent: percent(complete, total),
            entity_type: entity.entity_type.clone(),
            entity_id: entity.id.clone(),
            entity_type_label: entity.entity_type_label.clone(),
            fields: ProgressFields::default(),
            extra: Map::new(),
            cache: ResultCache::default(),
        }
    }

    /// Whether every counted field is done.
    pub fn is_complete(&self) -> bool {
        self.incomplete == 0
    }
}
