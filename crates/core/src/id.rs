//! Entity identifiers.

use serde::{Deserialize, Serialize};

/// Identity of an entity: its type and id.
///
/// Displays as `{entity_type}:{id}`, which doubles as the entity's cache tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    /// Entity type id (e.g. `node`, `user`)
    pub entity_type: String,

    /// Entity id within its type
    pub id: String,
}

impl EntityKey {
    /// Create a new key.
    pub fn new(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.id)
    }
}
