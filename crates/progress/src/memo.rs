//! Request-scoped memo tables.
//!
//! Each table sits behind its own lock. Locks are taken for a single lookup or
//! insert and never held while evaluating, so recursive evaluation cannot
//! deadlock on them.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use entity_progress_core::{
    CacheableMetadata, CompletionMap, Entity, EntityKey, FieldDefinition, ProgressResult,
};

/// Fields selected for progress, by name.
pub type FieldSelection = BTreeMap<String, FieldDefinition>;

/// Key of a memoized dependency validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidityKey {
    /// Entity type id
    pub entity_type: String,
    /// Entity bundle
    pub bundle: String,
    /// Entity id
    pub entity_id: String,
    /// Field being validated
    pub field_name: String,
    /// Whether this is the forced evaluation
    pub force: bool,
}

impl ValidityKey {
    /// Key for a field of an entity.
    pub fn new(entity: &Entity, field_name: &str, force: bool) -> Self {
        Self {
            entity_type: entity.entity_type.clone(),
            bundle: entity.bundle.clone(),
            entity_id: entity.id.clone(),
            field_name: field_name.to_string(),
            force,
        }
    }

    fn belongs_to(&self, key: &EntityKey) -> bool {
        self.entity_type == key.entity_type && self.entity_id == key.id
    }
}

/// A completion map with the cache tags gathered while building it.
#[derive(Debug, Clone, Default)]
pub struct MemoizedCompletion {
    /// Per-field outcome
    pub completion: CompletionMap,
    /// Tags collected during evaluation
    pub metadata: CacheableMetadata,
}

/// Memo tables for one request.
#[derive(Debug, Default)]
pub struct RequestMemo {
    selection: Mutex<HashMap<EntityKey, FieldSelection>>,
    completion: Mutex<HashMap<EntityKey, MemoizedCompletion>>,
    progress: Mutex<HashMap<EntityKey, ProgressResult>>,
    validity: Mutex<HashMap<ValidityKey, bool>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RequestMemo {
    /// Empty memo.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn selection(&self, key: &EntityKey) -> Option<FieldSelection> {
        lock(&self.selection).get(key).cloned()
    }

    pub(crate) fn put_selection(&self, key: EntityKey, selection: FieldSelection) {
        lock(&self.selection).insert(key, selection);
    }

    pub(crate) fn completion(&self, key: &EntityKey) -> Option<MemoizedCompletion> {
        lock(&self.completion).get(key).cloned()
    }

    pub(crate) fn put_completion(&self, key: EntityKey, completion: MemoizedCompletion) {
        lock(&self.completion).insert(key, completion);
    }

    pub(crate) fn progress(&self, key: &EntityKey) -> Option<ProgressResult> {
        lock(&self.progress).get(key).cloned()
    }

    pub(crate) fn put_progress(&self, key: EntityKey, progress: ProgressResult) {
        lock(&self.progress).insert(key, progress);
    }

    pub(crate) fn validity(&self, key: &ValidityKey) -> Option<bool> {
        lock(&self.validity).get(key).copied()
    }

    pub(crate) fn put_validity(&self, key: ValidityKey, valid: bool) {
        lock(&self.validity).insert(key, valid);
    }

    /// Forget everything memoized for one entity.
    pub fn evict(&self, key: &EntityKey) {
        lock(&self.selection).remove(key);
        lock(&self.completion).remove(key);
        lock(&self.progress).remove(key);
        lock(&self.validity).retain(|k, _| !k.belongs_to(key));
    }

    /// Forget everything.
    pub fn clear(&self) {
        lock(&self.selection).clear();
        lock(&self.completion).clear();
        lock(&self.progress).clear();
        lock(&self.validity).clear();
    }
}
