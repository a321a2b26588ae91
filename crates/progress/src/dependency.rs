//! Dependency gate between fields.
//!
//! A field may name another field as its dependency. The gate decides whether
//! the field takes part in completion at all, given the dependency's state:
//! - a field depending on itself or on a missing field never passes,
//! - two fields naming each other form a mutual pair that passes without
//!   recursing,
//! - otherwise the dependency must itself pass (forced) and be complete.

use entity_progress_core::{is_falsy, Entity, FieldDefinition, FieldType, ProgressSettings};
use tracing::{debug, warn};
use crate::manager::{ProgressManager, Trail};
use crate::memo::ValidityKey;

impl ProgressManager {
    /// Whether a definition takes part in the entity's progress.
    ///
    /// `force` evaluates the gate for a field that another field depends on:
    /// `enable` and `optional` are ignored. A forced call always recomputes and
    /// only refreshes the forced memo entry.
    pub(crate) fn is_definition_progress(
        &self,
        entity: &Entity,
        definition: &FieldDefinition,
        force: bool,
        trail: &mut Trail,
    ) -> bool {
        let key = ValidityKey::new(entity, &definition.name, force);
        if !force {
            if let Some(valid) = self.memo.validity(&key) {
                return valid;
            }
        }
        if !trail.begin_validation(key.clone()) {
            warn!(
                entity = %entity.key(),
                field = %definition.name,
                "Dependency cycle, excluding field"
            );
            trail.cut();
            return false;
        }

        let mark = trail.mark();
        let valid = self.resolve_gate(entity, definition, force, trail);
        trail.end_validation(&key);
        // Gate outcomes inside a dependency cycle depend on where it was entered.
        if trail.mark() == mark {
            self.memo.put_validity(key, valid);
        }
        valid
    }

    fn resolve_gate(
        &self,
        entity: &Entity,
        definition: &FieldDefinition,
        force: bool,
        trail: &mut Trail,
    ) -> bool {
        let settings = ProgressSettings::resolve(definition);
        if !force && !settings.enable {
            return false;
        }
        let Some(dependency) = settings.dependency.as_deref().filter(|_| settings.enable) else {
            return true;
        };

        if dependency == definition.name {
            warn!(field = %definition.name, "Field cannot depend on itself");
            return false;
        }
        let Some(dependency_definition) = self.field_definition(entity, dependency) else {
            warn!(field = %definition.name, dependency, "Dependency field does not exist");
            return false;
        };
        let dependency_settings = ProgressSettings::resolve(&dependency_definition);

        if dependency_settings.dependency.as_deref() == Some(definition.name.as_str()) {
            // Mutual pair: an optional side drops out once the other side
            // already satisfies the pair.
            if settings.optional {
                let own_complete = self.is_field_complete(
                    entity,
                    &definition.name,
                    settings.completion_options(),
                    None,
                    trail,
                );
                return own_complete
                    || !self.is_field_complete(
                        entity,
                        dependency,
                        dependency_settings.completion_options(),
                        None,
                        trail,
                    );
            }
            return true;
        }

        if !self.is_definition_progress(entity, &dependency_definition, true, trail) {
            debug!(field = %definition.name, dependency, "Dependency gate closed");
            return false;
        }
        let mut satisfied =
            self.is_dependency_complete(entity, &dependency_definition, &dependency_settings, trail);
        if settings.negate {
            satisfied = !satisfied;
        }
        if !force && settings.optional {
            return false;
        }
        satisfied
    }

    /// Completion of a field when read as someone else's dependency.
    ///
    /// A `zero_one` boolean counts either value standalone, but as a dependency
    /// only a non-zero value satisfies.
    fn is_dependency_complete(
        &self,
        entity: &Entity,
        definition: &FieldDefinition,
        settings: &ProgressSettings,
        trail: &mut Trail,
    ) -> bool {
        let complete = self.is_field_complete(
            entity,
            &definition.name,
            settings.completion_options(),
            None,
            trail,
        );
        if settings.zero_one && definition.field_type == FieldType::Boolean {
            if let Some(value) = entity.field(&definition.name).and_then(|f| f.first_value()) {
                return !is_falsy(value);
            }
        }
        complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use entity_progress_core::FieldItem;
    use serde_json::json;

    fn gate(manager: &ProgressManager, entity: &Entity, field: &str, force: bool) -> bool {
        let definition = manager.field_definition(entity, field).unwrap();
        manager.is_definition_progress(entity, &definition, force, &mut Trail::starting_at(entity.key()))
    }

    #[test]
    fn test_disabled_field_only_passes_when_forced() {
        let host = InMemoryHost::new().with_definition(text("field_name", json!({})));
        let (manager, _) = manager_for(host);
        let entity = user("1");
        assert!(!gate(&manager, &entity, "field_name", false));
        assert!(gate(&manager, &entity, "field_name", true));
    }

    #[test]
    fn test_no_dependency_passes() {
        let host = InMemoryHost::new().with_definition(text("field_name", json!({"enable": true})));
        let (manager, _) = manager_for(host);
        assert!(gate(&manager, &user("1"), "field_name", false));
    }

    #[test]
    fn test_self_dependency_never_passes() {
        let host = InMemoryHost::new()
            .with_definition(text("field_name", json!({"enable": true, "dependency": "field_name"})));
        let (manager, _) = manager_for(host);
        let filled = user("1").with_field("field_name", vec![FieldItem::value("x")]);
        assert!(!gate(&manager, &filled, "field_name", false));
        assert!(!gate(&manager, &user("2"), "field_name", false));
    }

    #[test]
    fn test_missing_dependency_never_passes() {
        let host = InMemoryHost::new()
            .with_definition(text("field_name", json!({"enable": true, "dependency": "field_gone"})));
        let (manager, _) = manager_for(host);
        assert!(!gate(&manager, &user("1"), "field_name", false));
    }

    #[test]
    fn test_chained_dependency_requires_complete_dependency() {
        let host = InMemoryHost::new()
            .with_definition(boolean("field_employed", json!({"enable": true})))
            .with_definition(text("field_employer", json!({"enable": true, "dependency": "field_employed"})));
        let (manager, _) = manager_for(host);
        let employed = user("1").with_field("field_employed", vec![FieldItem::value(1)]);
        let unemployed = user("2").with_field("field_employed", vec![FieldItem::value(0)]);

        assert!(gate(&manager, &employed, "field_employer", false));
        assert!(!gate(&manager, &unemployed, "field_employer", false));
    }

    #[test]
    fn test_chained_dependency_ignores_dependency_enable() {
        // The dependency is evaluated forced, so it need not be enabled itself.
        let host = InMemoryHost::new()
            .with_definition(boolean("field_employed", json!({})))
            .with_definition(text("field_employer", json!({"enable": true, "dependency": "field_employed"})));
        let (manager, _) = manager_for(host);
        let employed = user("1").with_field("field_employed", vec![FieldItem::value(1)]);
        assert!(gate(&manager, &employed, "field_employer", false));
    }

    #[test]
    fn test_negate_inverts_dependency() {
        let host = InMemoryHost::new()
            .with_definition(boolean("field_employed", json!({"enable": true})))
            .with_definition(text(
                "field_reason",
                json!({"enable": true, "dependency": "field_employed", "negate": true}),
            ));
        let (manager, _) = manager_for(host);
        let employed = user("1").with_field("field_employed", vec![FieldItem::value(1)]);
        let unemployed = user("2").with_field("field_employed", vec![FieldItem::value(0)]);

        assert!(!gate(&manager, &employed, "field_reason", false));
        assert!(gate(&manager, &unemployed, "field_reason", false));
    }

    #[test]
    fn test_chained_optional_excluded_unless_forced() {
        let host = InMemoryHost::new()
            .with_definition(boolean("field_employed", json!({"enable": true})))
            .with_definition(text(
                "field_employer",
                json!({"enable": true, "dependency": "field_employed", "optional": true}),
            ));
        let (manager, _) = manager_for(host);
        let employed = user("1").with_field("field_employed", vec![FieldItem::value(1)]);

        assert!(!gate(&manager, &employed, "field_employer", false));
        assert!(gate(&manager, &employed, "field_employer", true));
        // The forced result did not overwrite the normal one.
        assert!(!gate(&manager, &employed, "field_employer", false));
    }

    #[test]
    fn test_zero_one_dependency_needs_one() {
        let host = InMemoryHost::new()
            .with_definition(boolean("field_age", json!({"enable": true, "zero_one": true})))
            .with_definition(text("field_bio", json!({"enable": true, "dependency": "field_age"})));
        let (manager, _) = manager_for(host);
        let zero = user("1").with_field("field_age", vec![FieldItem::value(0)]);
        let one = user("2").with_field("field_age", vec![FieldItem::value(1)]);
        let unset = user("3");

        assert!(!gate(&manager, &zero, "field_bio", false));
        assert!(gate(&manager, &one, "field_bio", false));
        assert!(!gate(&manager, &unset, "field_bio", false));
    }

    #[test]
    fn test_mutual_pair_passes_regardless_of_values() {
        let host = InMemoryHost::new()
            .with_definition(text("field_phone", json!({"enable": true, "dependency": "field_email"})))
            .with_definition(text("field_email", json!({"enable": true, "dependency": "field_phone"})));
        let (manager, _) = manager_for(host);
        let empty = user("1");
        let phone = user("2").with_field("field_phone", vec![FieldItem::value("555")]);

        for entity in [&empty, &phone] {
            assert!(gate(&manager, entity, "field_phone", false));
            assert!(gate(&manager, entity, "field_email", false));
        }
    }

    #[test]
    fn test_mutual_pair_optional_side_drops_out() {
        let host = InMemoryHost::new()
            .with_definition(text("field_phone", json!({"enable": true, "dependency": "field_email"})))
            .with_definition(text(
                "field_email",
                json!({"enable": true, "dependency": "field_phone", "optional": true}),
            ));
        let (manager, _) = manager_for(host);
        let phone_only = user("1").with_field("field_phone", vec![FieldItem::value("555")]);
        let email_only = user("2").with_field("field_email", vec![FieldItem::value("a@b.c")]);
        let neither = user("3");

        assert!(!gate(&manager, &phone_only, "field_email", false));
        assert!(gate(&manager, &email_only, "field_email", false));
        assert!(gate(&manager, &neither, "field_email", false));
    }

    #[test]
    fn test_dependency_cycle_fails_closed() {
        let host = InMemoryHost::new()
            .with_definition(text("field_a", json!({"enable": true, "dependency": "field_b"})))
            .with_definition(text("field_b", json!({"enable": true, "dependency": "field_c"})))
            .with_definition(text("field_c", json!({"enable": true, "dependency": "field_a"})));
        let (manager, _) = manager_for(host);
        let entity = user("1")
            .with_field("field_a", vec![FieldItem::value("a")])
            .with_field("field_b", vec![FieldItem::value("b")])
            .with_field("field_c", vec![FieldItem::value("c")]);

        assert!(!gate(&manager, &entity, "field_a", false));
    }
}
