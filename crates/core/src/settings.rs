//! Progress settings - the normalized per-field configuration.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::entity::is_falsy;
use crate::field::ProgressSettingsSource;

/// Normalized progress configuration of one field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSettings {
    /// Field participates in completion at all
    pub enable: bool,

    /// Another field that must be satisfied for this one to count
    pub dependency: Option<String>,

    /// Drop this field once its dependency already satisfies the pair
    pub optional: bool,

    /// Boolean fields: `0` is the complete signal instead of `1`
    pub zero: bool,

    /// Boolean fields: `0` or `1` both count standalone; only `1` counts
    /// when evaluated as a dependency
    pub zero_one: bool,

    /// Invert the dependency outcome
    pub negate: bool,

    /// Every allowed value of a bounded multi-value field must be filled
    pub all: bool,
}

impl ProgressSettings {
    /// Resolve settings from a definition.
    ///
    /// Top-level keys of the raw blob replace the defaults one by one;
    /// unknown keys are ignored.
    pub fn resolve(source: &dyn ProgressSettingsSource) -> Self {
        let mut settings = Self::default();
        let Some(raw) = source.raw_progress_settings() else {
            return settings;
        };

        for (key, value) in raw {
            match key.as_str() {
                "enable" => settings.enable = !is_falsy(value),
                "dependency" => settings.dependency = dependency_name(value),
                "optional" => settings.optional = !is_falsy(value),
                "zero" => settings.zero = !is_falsy(value),
                "zero_one" => settings.zero_one = !is_falsy(value),
                "negate" => settings.negate = !is_falsy(value),
                "all" => settings.all = !is_falsy(value),
                _ => {}
            }
        }
        settings
    }

    /// Effective predicate options for evaluating this field.
    pub fn completion_options(&self) -> CompletionOptions {
        CompletionOptions::from(self)
    }
}

fn dependency_name(value: &Value) -> Option<String> {
    match value {
        Value::String(name) if !name.is_empty() => Some(name.clone()),
        _ => None,
    }
}

/// Flags in effect for one completeness check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompletionOptions {
    /// Boolean `0` is complete
    pub zero: bool,
    /// Boolean `0` or `1` is complete
    pub zero_one: bool,
    /// All bounded items must be non-empty
    pub all: bool,
}

impl From<&ProgressSettings> for CompletionOptions {
    fn from(settings: &ProgressSettings) -> Self {
        Self {
            zero: settings.zero,
            zero_one: settings.zero_one,
            all: settings.all,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldDefinition, FieldType};
    use serde_json::json;

    fn def(options: Value) -> FieldDefinition {
        FieldDefinition::new("node", "page", "field_x", FieldType::Boolean)
            .with_bundle_progress(options)
    }

    #[test]
    fn test_defaults_without_configuration() {
        let plain = FieldDefinition::new("node", "page", "field_x", FieldType::Boolean);
        assert_eq!(ProgressSettings::resolve(&plain), ProgressSettings::default());
    }

    #[test]
    fn test_overrides_replace_defaults_key_by_key() {
        let settings = ProgressSettings::resolve(&def(json!({
            "enable": true,
            "dependency": "field_age",
            "optional": 1,
        })));
        assert!(settings.enable);
        assert_eq!(settings.dependency.as_deref(), Some("field_age"));
        assert!(settings.optional);
        assert!(!settings.zero);
        assert!(!settings.zero_one);
        assert!(!settings.negate);
        assert!(!settings.all);
    }

    #[test]
    fn test_lenient_values() {
        let settings = ProgressSettings::resolve(&def(json!({
            "enable": "1",
            "dependency": "",
            "zero": "0",
            "negate": 0,
            "all": "yes",
            "unknown": true,
        })));
        assert!(settings.enable);
        assert!(settings.dependency.is_none());
        assert!(!settings.zero);
        assert!(!settings.negate);
        assert!(settings.all);
    }

    #[test]
    fn test_null_dependency_is_none() {
        let settings = ProgressSettings::resolve(&def(json!({"enable": true, "dependency": null})));
        assert!(settings.dependency.is_none());
    }

    #[test]
    fn test_completion_options_from_settings() {
        let settings = ProgressSettings {
            zero_one: true,
            all: true,
            ..Default::default()
        };
        let options = settings.completion_options();
        assert!(options.zero_one);
        assert!(options.all);
        assert!(!options.zero);
    }
}
