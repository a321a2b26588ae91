//! Entity model - the record being evaluated and its field values.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::field::FieldType;
use crate::id::EntityKey;

/// One value of a field, as a bag of named properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldItem(pub BTreeMap<String, Value>);

impl FieldItem {
    /// Item with a single `value` property.
    pub fn value(value: impl Into<Value>) -> Self {
        let mut props = BTreeMap::new();
        props.insert("value".to_string(), value.into());
        Self(props)
    }

    /// Item referencing another entity.
    pub fn reference(target_type: impl Into<String>, target_id: impl Into<String>) -> Self {
        let mut props = BTreeMap::new();
        props.insert("target_type".to_string(), Value::String(target_type.into()));
        props.insert("target_id".to_string(), Value::String(target_id.into()));
        Self(props)
    }

    /// Set an extra property.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// A named property.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// The `value` property, if set and not null.
    pub fn main_value(&self) -> Option<&Value> {
        self.get("value").filter(|v| !v.is_null())
    }

    /// Referenced entity id as a string.
    pub fn target_id(&self) -> Option<String> {
        match self.get("target_id")? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Referenced entity type, when the item names one.
    pub fn target_type(&self) -> Option<&str> {
        self.get("target_type").and_then(Value::as_str)
    }

    /// The host's native emptiness check for an item of the given type.
    ///
    /// Signature items are judged on all of their properties, so an item
    /// carrying only metadata reads as non-empty.
    pub fn is_empty_for(&self, field_type: &FieldType) -> bool {
        match field_type {
            FieldType::Signature => self.0.values().all(is_blank),
            _ if field_type.is_reference() => self.target_id().is_none(),
            _ => self.get("value").map_or(true, is_blank),
        }
    }
}

/// Whether a raw value counts as blank (missing content).
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Whether a raw value is "empty" in the loose sense: blank, `false`, `0`
/// or `"0"`.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f == 0.0),
        Value::String(s) => s.is_empty() || s == "0",
        other => is_blank(other),
    }
}

/// Integer reading of a raw value; strings that do not parse read as 0.
pub fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => Some(s.trim().parse().unwrap_or(0)),
        Value::Array(_) | Value::Object(_) => Some(1),
    }
}

/// The ordered values of one field on one entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldItemList {
    /// Items in delta order
    pub items: Vec<FieldItem>,
}

impl FieldItemList {
    /// Create a list from items.
    pub fn new(items: Vec<FieldItem>) -> Self {
        Self { items }
    }

    /// The first item's `value` property, if set.
    pub fn first_value(&self) -> Option<&Value> {
        self.items.first().and_then(FieldItem::main_value)
    }

    /// Number of items that are not empty by the native check.
    pub fn filter_empty_count(&self, field_type: &FieldType) -> usize {
        self.items
            .iter()
            .filter(|item| !item.is_empty_for(field_type))
            .count()
    }

    /// Native emptiness: no non-empty item.
    pub fn is_empty(&self, field_type: &FieldType) -> bool {
        self.filter_empty_count(field_type) == 0
    }
}

/// A record made of named fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Entity type id
    pub entity_type: String,

    /// Human readable entity type label
    #[serde(default)]
    pub entity_type_label: String,

    /// Bundle (sub-type) of the entity
    pub bundle: String,

    /// Entity id
    pub id: String,

    /// Stored field values by field name
    #[serde(default)]
    pub fields: BTreeMap<String, FieldItemList>,
}

impl Entity {
    /// Create an entity without field values.
    pub fn new(
        entity_type: impl Into<String>,
        bundle: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        let entity_type = entity_type.into();
        Self {
            entity_type_label: entity_type.clone(),
            entity_type,
            bundle: bundle.into(),
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Set the entity type label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.entity_type_label = label.into();
        self
    }

    /// Set a field's items.
    pub fn with_field(mut self, name: impl Into<String>, items: Vec<FieldItem>) -> Self {
        self.fields.insert(name.into(), FieldItemList::new(items));
        self
    }

    /// Identity of this entity.
    pub fn key(&self) -> EntityKey {
        EntityKey::new(&self.entity_type, &self.id)
    }

    /// Stored values of a field; `None` when nothing is stored.
    pub fn field(&self, name: &str) -> Option<&FieldItemList> {
        self.fields.get(name)
    }
}
