//! Field definitions - the schema side of an entity's fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key under which progress settings are stored, both as a storage-level
/// setting and as a third-party settings provider.
pub const SETTINGS_KEY: &str = "entity_progress";

/// Semantic type of a field, as far as completion is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    /// On/off value stored as 0 or 1
    Boolean,
    /// Signature capture; its native emptiness check cannot be trusted
    Signature,
    /// Reference to other entities
    EntityReference,
    /// Reference to specific revisions of other entities
    EntityReferenceRevisions,
    /// Any other type, judged by its native emptiness check
    Other(String),
}

impl FieldType {
    /// Host type name.
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Boolean => "boolean",
            FieldType::Signature => "field_signature",
            FieldType::EntityReference => "entity_reference",
            FieldType::EntityReferenceRevisions => "entity_reference_revisions",
            FieldType::Other(name) => name,
        }
    }

    /// Whether values of this type point at other entities.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            FieldType::EntityReference | FieldType::EntityReferenceRevisions
        )
    }
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "boolean" => FieldType::Boolean,
            "field_signature" => FieldType::Signature,
            "entity_reference" => FieldType::EntityReference,
            "entity_reference_revisions" => FieldType::EntityReferenceRevisions,
            _ => FieldType::Other(name),
        }
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.as_str().to_string()
    }
}

/// How many values a field may hold.
///
/// Serialized as an integer; `-1` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Cardinality {
    /// At most this many values
    Limited(u32),
    /// Any number of values
    Unlimited,
}

impl Default for Cardinality {
    fn default() -> Self {
        Cardinality::Limited(1)
    }
}

impl From<i64> for Cardinality {
    fn from(value: i64) -> Self {
        if value < 0 {
            Cardinality::Unlimited
        } else {
            Cardinality::Limited(u32::try_from(value).unwrap_or(u32::MAX))
        }
    }
}

impl From<Cardinality> for i64 {
    fn from(cardinality: Cardinality) -> Self {
        match cardinality {
            Cardinality::Limited(n) => i64::from(n),
            Cardinality::Unlimited => -1,
        }
    }
}

/// Where a definition keeps its raw progress configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SettingsSource {
    /// No progress configuration at all
    #[default]
    None,

    /// Storage-level field settings; progress options live under
    /// [`SETTINGS_KEY`].
    BaseField {
        /// Raw field settings
        #[serde(default)]
        settings: Map<String, Value>,
    },

    /// Bundle-level configuration; progress options are the third-party
    /// settings of the [`SETTINGS_KEY`] provider.
    BundleField {
        /// Third-party settings keyed by provider
        #[serde(default)]
        third_party_settings: Map<String, Value>,
    },
}

/// Capability of exposing raw progress settings.
///
/// Settings resolution only talks to this trait, never to the concrete
/// definition kind.
pub trait ProgressSettingsSource {
    /// The raw progress settings blob, if the definition carries a non-empty one.
    fn raw_progress_settings(&self) -> Option<&Map<String, Value>>;
}

/// A field definition attached to an entity type and bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Machine name
    pub name: String,

    /// Human readable label
    #[serde(default)]
    pub label: String,

    /// Entity type the field belongs to
    pub entity_type: String,

    /// Bundle the field belongs to
    pub bundle: String,

    /// Semantic field type
    pub field_type: FieldType,

    /// Number of values allowed
    #[serde(default)]
    pub cardinality: Cardinality,

    /// Default target entity type for reference fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,

    /// Raw progress configuration
    #[serde(default)]
    pub settings: SettingsSource,
}

impl FieldDefinition {
    /// Create a definition without progress configuration.
    pub fn new(
        entity_type: impl Into<String>,
        bundle: impl Into<String>,
        name: impl Into<String>,
        field_type: FieldType,
    ) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            entity_type: entity_type.into(),
            bundle: bundle.into(),
            field_type,
            cardinality: Cardinality::default(),
            target_type: None,
            settings: SettingsSource::None,
        }
    }

    /// Set the cardinality.
    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    /// Set the default reference target type.
    pub fn with_target_type(mut self, target_type: impl Into<String>) -> Self {
        self.target_type = Some(target_type.into());
        self
    }

    /// Set the settings source.
    pub fn with_settings(mut self, settings: SettingsSource) -> Self {
        self.settings = settings;
        self
    }

    /// Attach progress options as storage-level settings.
    pub fn with_base_progress(self, options: Value) -> Self {
        let mut settings = Map::new();
        settings.insert(SETTINGS_KEY.to_string(), options);
        self.with_settings(SettingsSource::BaseField { settings })
    }

    /// Attach progress options as bundle-level third-party settings.
    pub fn with_bundle_progress(self, options: Value) -> Self {
        let mut third_party_settings = Map::new();
        third_party_settings.insert(SETTINGS_KEY.to_string(), options);
        self.with_settings(SettingsSource::BundleField { third_party_settings })
    }
}

impl ProgressSettingsSource for FieldDefinition {
    fn raw_progress_settings(&self) -> Option<&Map<String, Value>> {
        let raw = match &self.settings {
            SettingsSource::None => None,
            SettingsSource::BaseField { settings } => settings.get(SETTINGS_KEY),
            SettingsSource::BundleField { third_party_settings } => {
                third_party_settings.get(SETTINGS_KEY)
            }
        };
        raw.and_then(Value::as_object).filter(|map| !map.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_type_from_host_name() {
        assert_eq!(FieldType::from("boolean".to_string()), FieldType::Boolean);
        assert_eq!(FieldType::from("field_signature".to_string()), FieldType::Signature);
        assert!(FieldType::from("entity_reference_revisions".to_string()).is_reference());
        assert_eq!(
            FieldType::from("string".to_string()),
            FieldType::Other("string".to_string())
        );
    }

    #[test]
    fn test_cardinality_serde() {
        let unlimited: Cardinality = serde_json::from_value(json!(-1)).unwrap();
        assert_eq!(unlimited, Cardinality::Unlimited);
        let three: Cardinality = serde_json::from_value(json!(3)).unwrap();
        assert_eq!(three, Cardinality::Limited(3));
        assert_eq!(serde_json::to_value(Cardinality::Unlimited).unwrap(), json!(-1));
    }

    #[test]
    fn test_raw_settings_from_either_source() {
        let base = FieldDefinition::new("node", "page", "title", FieldType::Other("string".into()))
            .with_base_progress(json!({"enable": true}));
        assert_eq!(base.raw_progress_settings().unwrap()["enable"], json!(true));

        let bundle = FieldDefinition::new("node", "page", "body", FieldType::Other("text".into()))
            .with_bundle_progress(json!({"enable": 1}));
        assert_eq!(bundle.raw_progress_settings().unwrap()["enable"], json!(1));
    }

    #[test]
    fn test_raw_settings_empty_blob_is_none() {
        let def = FieldDefinition::new("node", "page", "title", FieldType::Boolean)
            .with_base_progress(json!({}));
        assert!(def.raw_progress_settings().is_none());

        let plain = FieldDefinition::new("node", "page", "title", FieldType::Boolean);
        assert!(plain.raw_progress_settings().is_none());
    }

    #[test]
    fn test_definition_deserializes_with_defaults() {
        let def: FieldDefinition = serde_json::from_value(json!({
            "name": "field_tags",
            "entity_type": "node",
            "bundle": "article",
            "field_type": "entity_reference",
            "cardinality": -1,
            "target_type": "taxonomy_term",
            "settings": {"kind": "bundle_field", "third_party_settings": {
                "entity_progress": {"enable": true}
            }}
        }))
        .unwrap();
        assert_eq!(def.field_type, FieldType::EntityReference);
        assert_eq!(def.cardinality, Cardinality::Unlimited);
        assert!(def.raw_progress_settings().is_some());
        assert_eq!(def.name, "field_tags");
    }
}
