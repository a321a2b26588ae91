//! Entity progress engine.
//!
//! Decides which fields of an entity take part in completion, evaluates each
//! of them, and aggregates the outcome into a cached progress result.

#![warn(missing_docs)]

pub mod config;
pub mod host;
pub mod memo;
pub mod manager;
mod selector;
mod dependency;
mod evaluator;

#[cfg(test)]
mod test_support;

pub use config::{ConfigError, ProgressConfig};
pub use host::{
    AllowAll, EntityStore, FieldAccess, FieldDefinitionProvider, FieldSelectionAlter, HostFixture,
    InMemoryHost,
};
pub use memo::{FieldSelection, RequestMemo};
pub use manager::ProgressManager;
