//! Progress manager - the entry point of the engine.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use entity_progress_core::{
    CacheableMetadata, CompletionMap, Entity, EntityKey, ProgressResult, ProgressSettings,
    ResultCache, progress_cid,
};
use entity_progress_storage::{CacheBackend, Expire};
use tracing::{debug, warn};
use crate::config::ProgressConfig;
use crate::host::{AllowAll, EntityStore, FieldAccess, FieldDefinitionProvider, FieldSelectionAlter};
use crate::memo::{FieldSelection, MemoizedCompletion, RequestMemo, ValidityKey};

/// Evaluation path of one top-level call.
///
/// Tracks the entities whose progress is being computed and the dependency
/// validations in flight, so cyclic data fails closed instead of recursing.
/// Every time a cycle or depth guard cuts evaluation short it is counted:
/// results computed below the root while a cut happened depend on the path
/// and are not memoized.
#[derive(Debug, Default)]
pub(crate) struct Trail {
    entities: Vec<EntityKey>,
    validations: HashSet<ValidityKey>,
    cuts: usize,
}

impl Trail {
    pub(crate) fn starting_at(key: EntityKey) -> Self {
        Self {
            entities: vec![key],
            ..Default::default()
        }
    }

    pub(crate) fn contains(&self, key: &EntityKey) -> bool {
        self.entities.contains(key)
    }

    pub(crate) fn depth(&self) -> usize {
        self.entities.len()
    }

    fn push(&mut self, key: EntityKey) -> bool {
        if self.contains(&key) {
            return false;
        }
        self.entities.push(key);
        true
    }

    fn pop(&mut self) {
        self.entities.pop();
    }

    pub(crate) fn begin_validation(&mut self, key: ValidityKey) -> bool {
        self.validations.insert(key)
    }

    pub(crate) fn end_validation(&mut self, key: &ValidityKey) {
        self.validations.remove(key);
    }

    /// Record that a guard cut evaluation short.
    pub(crate) fn cut(&mut self) {
        self.cuts += 1;
    }

    /// Marker to compare against with [`Trail::is_reusable`].
    pub(crate) fn mark(&self) -> usize {
        self.cuts
    }

    /// Whether a result for `key` computed since `mark` holds on any path.
    pub(crate) fn is_reusable(&self, key: &EntityKey, mark: usize) -> bool {
        self.cuts == mark || self.entities.first() == Some(key)
    }
}

/// Computes and caches entity completion.
///
/// One manager is meant to serve one request: its memo tables live as long as
/// the manager. The persistent cache backend is shared between managers.
pub struct ProgressManager {
    pub(crate) definitions: Arc<dyn FieldDefinitionProvider>,
    pub(crate) entities: Arc<dyn EntityStore>,
    pub(crate) access: Arc<dyn FieldAccess>,
    pub(crate) alters: Vec<Arc<dyn FieldSelectionAlter>>,
    pub(crate) cache: Option<Arc<dyn CacheBackend>>,
    pub(crate) config: ProgressConfig,
    pub(crate) memo: RequestMemo,
}

impl ProgressManager {
    /// Create a manager without persistent cache; every field is updatable.
    pub fn new(
        definitions: Arc<dyn FieldDefinitionProvider>,
        entities: Arc<dyn EntityStore>,
    ) -> Self {
        Self {
            definitions,
            entities,
            access: Arc::new(AllowAll),
            alters: Vec::new(),
            cache: None,
            config: ProgressConfig::default(),
            memo: RequestMemo::new(),
        }
    }

    /// Set the access checker.
    pub fn with_access(mut self, access: Arc<dyn FieldAccess>) -> Self {
        self.access = access;
        self
    }

    /// Register a selection alteration hook.
    pub fn with_alter(mut self, alter: Arc<dyn FieldSelectionAlter>) -> Self {
        self.alters.push(alter);
        self
    }

    /// Set the persistent cache backend.
    pub fn with_cache(mut self, cache: Arc<dyn CacheBackend>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: ProgressConfig) -> Self {
        self.config = config;
        self
    }

    /// Configuration in use.
    pub fn config(&self) -> &ProgressConfig {
        &self.config
    }

    /// Progress of an entity; `None` only when no entity is given.
    ///
    /// With `no_cache`, everything memoized or persisted for the entity is
    /// dropped before computing.
    pub fn get_progress(&self, entity: Option<&Entity>, no_cache: bool) -> Option<ProgressResult> {
        entity.map(|entity| self.entity_progress(entity, no_cache))
    }

    /// Progress of an entity.
    pub fn entity_progress(&self, entity: &Entity, no_cache: bool) -> ProgressResult {
        if no_cache {
            self.invalidate_entity(entity);
        }
        self.progress_with(entity, &mut Trail::default())
    }

    /// Per-field completion of an entity, for fields the viewer may update.
    pub fn get_field_progress(&self, entity: &Entity) -> CompletionMap {
        self.field_progress_with(entity, None, &mut Trail::starting_at(entity.key()))
    }

    /// Field definitions taking part in the entity's progress.
    pub fn field_definitions(&self, entity: &Entity) -> FieldSelection {
        self.select_fields(entity, &mut Trail::starting_at(entity.key()))
    }

    /// Drop memoized and persisted results of an entity.
    pub fn invalidate_entity(&self, entity: &Entity) {
        let key = entity.key();
        self.memo.evict(&key);
        if let Some(cache) = &self.cache {
            let cid = self.cid(entity);
            if let Err(e) = cache.delete(&cid) {
                warn!(%cid, error = %e, "Failed to delete cached progress");
            }
        }
        debug!(entity = %key, "Invalidated progress");
    }

    /// Drop every memo of this request. The persistent cache is untouched.
    pub fn reset(&self) {
        self.memo.clear();
    }

    fn cid(&self, entity: &Entity) -> String {
        progress_cid(&self.config.cache_namespace, &entity.entity_type, &entity.id)
    }

    pub(crate) fn progress_with(&self, entity: &Entity, trail: &mut Trail) -> ProgressResult {
        let key = entity.key();
        if let Some(progress) = self.memo.progress(&key) {
            debug!(entity = %key, "Progress memo hit");
            return progress;
        }

        let cid = self.cid(entity);
        if let Some(progress) = self.cache_get(&cid) {
            debug!(%cid, "Progress cache hit");
            self.memo.put_progress(key, progress.clone());
            return progress;
        }

        let mark = trail.mark();
        let pushed = trail.push(key.clone());
        let mut metadata = CacheableMetadata::new();
        metadata.add_cache_tags(self.config.base_cache_tags.iter().cloned());

        let completion = self.field_progress_with(entity, Some(&mut metadata), trail);
        let definitions = self.select_fields(entity, trail);
        let reusable = trail.is_reusable(&key, mark);
        if pushed {
            trail.pop();
        }

        let mut progress = ProgressResult::from_completion(entity, &completion);
        for (field_name, done) in &completion {
            if !self.access.can_update(entity, field_name) {
                continue;
            }
            let Some(definition) = definitions.get(field_name) else {
                continue;
            };
            if *done {
                progress.fields.complete.push(definition.clone());
            } else {
                progress.fields.incomplete.push(definition.clone());
            }
        }
        progress.cache = ResultCache {
            keys: vec![
                self.config.cache_namespace.clone(),
                entity.entity_type.clone(),
                entity.id.clone(),
            ],
            tags: metadata.cache_tags().iter().cloned().collect(),
        };

        debug!(
            entity = %key,
            total = progress.total,
            complete = progress.complete,
            percent = progress.percent,
            "Computed progress"
        );
        if reusable {
            self.cache_set(&cid, &progress, metadata.cache_tags());
            self.memo.put_progress(key, progress.clone());
        } else {
            debug!(entity = %key, "Progress depends on the evaluation path, not caching");
        }
        progress
    }

    pub(crate) fn field_progress_with(
        &self,
        entity: &Entity,
        metadata: Option<&mut CacheableMetadata>,
        trail: &mut Trail,
    ) -> CompletionMap {
        let key = entity.key();
        if let Some(memoized) = self.memo.completion(&key) {
            if let Some(metadata) = metadata {
                metadata.merge(&memoized.metadata);
            }
            return memoized.completion;
        }

        let mark = trail.mark();
        let mut collected = CacheableMetadata::new();
        collected.add_cacheable_dependency(entity);

        let mut completion = CompletionMap::new();
        for (field_name, definition) in self.select_fields(entity, trail) {
            if !self.access.can_update(entity, &field_name) {
                continue;
            }
            let settings = ProgressSettings::resolve(&definition);
            let done = self.is_field_complete(
                entity,
                &field_name,
                settings.completion_options(),
                Some(&mut collected),
                trail,
            );
            completion.insert(field_name, done);
        }

        if let Some(metadata) = metadata {
            metadata.merge(&collected);
        }
        if trail.is_reusable(&key, mark) {
            self.memo.put_completion(
                key,
                MemoizedCompletion {
                    completion: completion.clone(),
                    metadata: collected,
                },
            );
        }
        completion
    }

    fn cache_get(&self, cid: &str) -> Option<ProgressResult> {
        if !self.config.persistent_cache {
            return None;
        }
        let cache = self.cache.as_ref()?;
        let entry = match cache.get(cid) {
            Ok(entry) => entry?,
            Err(e) => {
                warn!(%cid, error = %e, "Cache read failed, recomputing");
                return None;
            }
        };
        match serde_json::from_value(entry.data) {
            Ok(progress) => Some(progress),
            Err(e) => {
                warn!(%cid, error = %e, "Discarding unreadable cached progress");
                None
            }
        }
    }

    fn cache_set(&self, cid: &str, progress: &ProgressResult, tags: &BTreeSet<String>) {
        if !self.config.persistent_cache {
            return;
        }
        let Some(cache) = &self.cache else {
            return;
        };
        let data = match serde_json::to_value(progress) {
            Ok(data) => data,
            Err(e) => {
                warn!(%cid, error = %e, "Failed to serialize progress");
                return;
            }
        };
        if let Err(e) = cache.set(cid, data, Expire::Permanent, tags.clone()) {
            warn!(%cid, error = %e, "Failed to persist progress");
        }
    }
}
