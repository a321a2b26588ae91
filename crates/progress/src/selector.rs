//! Field selection - which definitions take part in an entity's progress.

use entity_progress_core::Entity;
use tracing::debug;
use crate::manager::{ProgressManager, Trail};
use crate::memo::FieldSelection;

impl ProgressManager {
    /// Definitions of the entity's bundle that pass the dependency gate,
    /// after alteration hooks ran. Memoized per entity.
    pub(crate) fn select_fields(&self, entity: &Entity, trail: &mut Trail) -> FieldSelection {
        let key = entity.key();
        if let Some(selection) = self.memo.selection(&key) {
            return selection;
        }

        let mark = trail.mark();
        let mut selection = FieldSelection::new();
        for definition in self
            .definitions
            .field_definitions(&entity.entity_type, &entity.bundle)
        {
            if self.is_definition_progress(entity, &definition, false, trail) {
                selection.insert(definition.name.clone(), definition);
            }
        }
        for alter in &self.alters {
            alter.alter(&mut selection, entity);
        }

        debug!(
            entity = %key,
            fields = ?selection.keys().collect::<Vec<_>>(),
            "Selected progress fields"
        );
        if trail.is_reusable(&key, mark) {
            self.memo.put_selection(key, selection.clone());
        }
        selection
    }
}
