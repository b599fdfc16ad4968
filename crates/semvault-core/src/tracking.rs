//! Dirty-entity bookkeeping.
//!
//! The tracker records which entities of one model were added, removed or
//! mutated since the last accepted state, so a caller can decide whether a
//! save is needed at all. Identity is reference identity (see
//! [`ModelEntity::ref_key`]): two loads of the same entity are different
//! instances and tracked separately.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::model::ModelEntity;

/// Records pending changes to one model's entities.
///
/// Attached to a [`SemanticModel`](crate::model::SemanticModel) at most once;
/// all methods take `&self` and are safe to call from multiple tasks.
#[derive(Default)]
pub struct ChangeTracker {
    dirty: Mutex<HashMap<usize, ModelEntity>>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entity as changed. Idempotent per instance.
    pub fn mark_dirty(&self, entity: &ModelEntity) {
        self.dirty.lock().insert(entity.ref_key(), entity.clone());
    }

    pub fn is_dirty(&self, entity: &ModelEntity) -> bool {
        self.dirty.lock().contains_key(&entity.ref_key())
    }

    /// Whether any change is pending.
    pub fn has_changes(&self) -> bool {
        !self.dirty.lock().is_empty()
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty.lock().len()
    }

    /// Snapshot of the entities pending acceptance.
    pub fn dirty_entities(&self) -> Vec<ModelEntity> {
        self.dirty.lock().values().cloned().collect()
    }

    /// Forget all pending changes. Touches only the in-memory set, never
    /// persisted storage.
    pub fn clear(&self) {
        self.dirty.lock().clear();
    }
}

impl std::fmt::Debug for ChangeTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeTracker")
            .field("dirty", &self.dirty.lock().len())
            .finish()
    }
}
