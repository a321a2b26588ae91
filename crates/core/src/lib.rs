//! Entity progress data models.
//!
//! This crate defines the entities, field definitions, progress settings and
//! progress results shared by the completion engine and its cache layer.

#![warn(missing_docs)]

mod id;
mod entity;
mod field;
mod settings;
mod progress;
mod cache;

pub use id::EntityKey;
pub use entity::{Entity, FieldItem, FieldItemList, as_int, is_blank, is_falsy};
pub use field::{
    Cardinality, FieldDefinition, FieldType, ProgressSettingsSource, SettingsSource, SETTINGS_KEY,
};
pub use settings::{CompletionOptions, ProgressSettings};
pub use progress::{CompletionMap, ProgressFields, ProgressResult, ResultCache, percent};
pub use cache::{CacheableDependency, CacheableMetadata, DEFAULT_NAMESPACE, progress_cid};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
