//! Capabilities the engine consumes from its host.
//!
//! The host owns entities, field definitions and access control; the engine
//! only reads them through these traits.

use std::collections::{BTreeMap, HashMap, HashSet};
use entity_progress_core::{Entity, EntityKey, FieldDefinition};
use serde::{Deserialize, Serialize};

/// Registry of field definitions per entity type and bundle.
pub trait FieldDefinitionProvider: Send + Sync {
    /// All definitions of a bundle, in definition order.
    fn field_definitions(&self, entity_type: &str, bundle: &str) -> Vec<FieldDefinition>;

    /// One definition by name.
    fn field_definition(&self, entity_type: &str, bundle: &str, name: &str) -> Option<FieldDefinition> {
        self.field_definitions(entity_type, bundle)
            .into_iter()
            .find(|definition| definition.name == name)
    }
}

/// Loads entities targeted by reference fields.
pub trait EntityStore: Send + Sync {
    /// Load an entity; `None` when it does not exist.
    fn load(&self, entity_type: &str, id: &str) -> Option<Entity>;
}

/// Field-level access checks for the current viewer.
pub trait FieldAccess: Send + Sync {
    /// Whether the viewer may update the field on this entity.
    fn can_update(&self, entity: &Entity, field_name: &str) -> bool;
}

/// Grants update access to every field.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl FieldAccess for AllowAll {
    fn can_update(&self, _entity: &Entity, _field_name: &str) -> bool {
        true
    }
}

/// Hook allowed to add or remove fields from an entity's progress selection.
pub trait FieldSelectionAlter: Send + Sync {
    /// Mutate the selection in place.
    fn alter(&self, fields: &mut BTreeMap<String, FieldDefinition>, entity: &Entity);
}

impl<F> FieldSelectionAlter for F
where
    F: Fn(&mut BTreeMap<String, FieldDefinition>, &Entity) + Send + Sync,
{
    fn alter(&self, fields: &mut BTreeMap<String, FieldDefinition>, entity: &Entity) {
        self(fields, entity)
    }
}

/// Serializable snapshot of a host: definitions, entities and denied updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostFixture {
    /// Field definitions of every bundle
    #[serde(default)]
    pub definitions: Vec<FieldDefinition>,

    /// Entities
    #[serde(default)]
    pub entities: Vec<Entity>,

    /// `(entity_type, id, field)` triples the viewer may not update
    #[serde(default)]
    pub deny_update: Vec<(String, String, String)>,
}

/// Host backed by plain collections.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHost {
    definitions: Vec<FieldDefinition>,
    entities: HashMap<EntityKey, Entity>,
    denied: HashSet<(EntityKey, String)>,
}

impl InMemoryHost {
    /// Empty host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a field definition.
    pub fn with_definition(mut self, definition: FieldDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Register an entity, replacing any entity with the same key.
    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.insert_entity(entity);
        self
    }

    /// Deny update access to one field of one entity.
    pub fn deny_update(mut self, key: EntityKey, field_name: impl Into<String>) -> Self {
        self.denied.insert((key, field_name.into()));
        self
    }

    /// Register or replace an entity.
    pub fn insert_entity(&mut self, entity: Entity) {
        self.entities.insert(entity.key(), entity);
    }

    /// Look up a registered entity.
    pub fn entity(&self, entity_type: &str, id: &str) -> Option<&Entity> {
        self.entities.get(&EntityKey::new(entity_type, id))
    }
}

impl From<HostFixture> for InMemoryHost {
    fn from(fixture: HostFixture) -> Self {
        let mut host = InMemoryHost::new();
        host.definitions = fixture.definitions;
        for entity in fixture.entities {
            host.insert_entity(entity);
        }
        host.denied = fixture
            .deny_update
            .into_iter()
            .map(|(entity_type, id, field)| (EntityKey::new(entity_type, id), field))
            .collect();
        host
    }
}

impl FieldDefinitionProvider for InMemoryHost {
    fn field_definitions(&self, entity_type: &str, bundle: &str) -> Vec<FieldDefinition> {
        self.definitions
            .iter()
            .filter(|d| d.entity_type == entity_type && d.bundle == bundle)
            .cloned()
            .collect()
    }

    fn field_definition(&self, entity_type: &str, bundle: &str, name: &str) -> Option<FieldDefinition> {
        self.definitions
            .iter()
            .find(|d| d.entity_type == entity_type && d.bundle == bundle && d.name == name)
            .cloned()
    }
}

impl EntityStore for InMemoryHost {
    fn load(&self, entity_type: &str, id: &str) -> Option<Entity> {
        self.entity(entity_type, id).cloned()
    }
}

impl FieldAccess for InMemoryHost {
    fn can_update(&self, entity: &Entity, field_name: &str) -> bool {
        !self.denied.contains(&(entity.key(), field_name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entity_progress_core::FieldType;
    use serde_json::json;

    #[test]
    fn test_definitions_are_scoped_to_bundle() {
        let host = InMemoryHost::new()
            .with_definition(FieldDefinition::new("node", "page", "title", FieldType::Boolean))
            .with_definition(FieldDefinition::new("node", "article", "title", FieldType::Boolean))
            .with_definition(FieldDefinition::new("node", "page", "body", FieldType::Boolean));

        let names: Vec<_> = host
            .field_definitions("node", "page")
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["title", "body"]);
        assert!(host.field_definition("node", "article", "body").is_none());
    }

    #[test]
    fn test_access_denial() {
        let entity = Entity::new("user", "user", "1");
        let host = InMemoryHost::new()
            .with_entity(entity.clone())
            .deny_update(entity.key(), "field_secret");

        assert!(!host.can_update(&entity, "field_secret"));
        assert!(host.can_update(&entity, "field_name"));
        assert!(AllowAll.can_update(&entity, "field_secret"));
    }

    #[test]
    fn test_from_fixture() {
        let fixture: HostFixture = serde_json::from_value(json!({
            "definitions": [{
                "name": "field_age", "entity_type": "user", "bundle": "user",
                "field_type": "boolean"
            }],
            "entities": [{"entity_type": "user", "bundle": "user", "id": "1"}],
            "deny_update": [["user", "1", "field_age"]]
        }))
        .unwrap();
        let host = InMemoryHost::from(fixture);

        let entity = host.load("user", "1").unwrap();
        assert!(!host.can_update(&entity, "field_age"));
        assert_eq!(host.field_definitions("user", "user").len(), 1);
        assert!(host.load("user", "2").is_none());
    }
}
