//! Builders shared by the engine's unit tests.

use std::sync::Arc;
use entity_progress_core::{Entity, FieldDefinition, FieldType};
use serde_json::Value;
use crate::manager::ProgressManager;

pub use crate::host::InMemoryHost;

pub fn manager_for(host: InMemoryHost) -> (ProgressManager, Arc<InMemoryHost>) {
    let host = Arc::new(host);
    let manager = ProgressManager::new(host.clone(), host.clone()).with_access(host.clone());
    (manager, host)
}

pub fn user(id: &str) -> Entity {
    Entity::new("user", "user", id).with_label("User")
}

pub fn profile(id: &str) -> Entity {
    Entity::new("profile", "address", id).with_label("Profile")
}

pub fn text_type() -> FieldType {
    FieldType::Other("string".to_string())
}

pub fn text(name: &str, options: Value) -> FieldDefinition {
    FieldDefinition::new("user", "user", name, text_type()).with_bundle_progress(options)
}

pub fn boolean(name: &str, options: Value) -> FieldDefinition {
    FieldDefinition::new("user", "user", name, FieldType::Boolean).with_bundle_progress(options)
}

pub fn reference(name: &str, target_type: &str, options: Value) -> FieldDefinition {
    reference_on("user", "user", name, target_type, options)
}

pub fn reference_on(
    entity_type: &str,
    bundle: &str,
    name: &str,
    target_type: &str,
    options: Value,
) -> FieldDefinition {
    FieldDefinition::new(entity_type, bundle, name, FieldType::EntityReference)
        .with_target_type(target_type)
        .with_base_progress(options)
}

pub fn profile_text(name: &str, options: Value) -> FieldDefinition {
    FieldDefinition::new("profile", "address", name, text_type()).with_bundle_progress(options)
}
