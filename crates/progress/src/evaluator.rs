//! Field completeness predicates.

use entity_progress_core::{
    as_int, is_falsy, CacheableMetadata, Cardinality, CompletionOptions, Entity, FieldDefinition,
    FieldItemList, FieldType,
};
use tracing::warn;
use crate::manager::{ProgressManager, Trail};

impl ProgressManager {
    /// Whether one field of an entity counts as done under the given options.
    ///
    /// Field definitions and referenced entities are recorded in `metadata`.
    pub(crate) fn is_field_complete(
        &self,
        entity: &Entity,
        field_name: &str,
        options: CompletionOptions,
        mut metadata: Option<&mut CacheableMetadata>,
        trail: &mut Trail,
    ) -> bool {
        let Some(definition) = self.field_definition(entity, field_name) else {
            return false;
        };
        if let Some(metadata) = metadata.as_deref_mut() {
            metadata.add_cacheable_dependency(&definition);
        }

        let empty = FieldItemList::default();
        let items = entity.field(field_name).unwrap_or(&empty);

        if options.all {
            if let Cardinality::Limited(limit) = definition.cardinality {
                if limit as usize != items.filter_empty_count(&definition.field_type) {
                    return false;
                }
            }
        }

        match &definition.field_type {
            FieldType::Boolean => boolean_complete(items, options),
            // The signature type's own emptiness check is unreliable.
            FieldType::Signature => items
                .items
                .iter()
                .any(|item| item.main_value().is_some_and(|value| !is_falsy(value))),
            FieldType::EntityReference | FieldType::EntityReferenceRevisions => {
                self.references_complete(&definition, items, metadata, trail)
            }
            FieldType::Other(_) => !items.is_empty(&definition.field_type),
        }
    }

    /// Definition of a field on the entity's bundle; `None` if the entity has no such field.
    pub(crate) fn field_definition(&self, entity: &Entity, field_name: &str) -> Option<FieldDefinition> {
        self.definitions
            .field_definition(&entity.entity_type, &entity.bundle, field_name)
    }

    fn references_complete(
        &self,
        definition: &FieldDefinition,
        items: &FieldItemList,
        mut metadata: Option<&mut CacheableMetadata>,
        trail: &mut Trail,
    ) -> bool {
        let children: Vec<Entity> = items
            .items
            .iter()
            .filter_map(|item| {
                let id = item.target_id()?;
                let target_type = item.target_type().or(definition.target_type.as_deref())?;
                self.entities.load(target_type, &id)
            })
            .collect();
        if children.is_empty() {
            return false;
        }

        let mut complete = true;
        for child in &children {
            if let Some(metadata) = metadata.as_deref_mut() {
                metadata.add_cacheable_dependency(child);
            }

            let key = child.key();
            if trail.contains(&key) {
                warn!(entity = %key, field = %definition.name, "Reference cycle, treating field as incomplete");
                trail.cut();
                complete = false;
                continue;
            }
            if let Some(max) = self.config.max_reference_depth {
                if trail.depth() > max {
                    warn!(entity = %key, max, "Reference depth exceeded, treating field as incomplete");
                    trail.cut();
                    complete = false;
                    continue;
                }
            }

            let child_progress = self.progress_with(child, trail);
            // The child's result carries everything it was built from.
            if let Some(metadata) = metadata.as_deref_mut() {
                metadata.add_cache_tags(child_progress.cache.tags.iter().cloned());
            }
            if child_progress.incomplete > 0 {
                complete = false;
            }
        }
        complete
    }
}

fn boolean_complete(items: &FieldItemList, options: CompletionOptions) -> bool {
    let Some(value) = items.first_value().and_then(as_int) else {
        return false;
    };
    if options.zero {
        value == 0
    } else if options.zero_one {
        value == 0 || value == 1
    } else {
        value == 1
    }
}
