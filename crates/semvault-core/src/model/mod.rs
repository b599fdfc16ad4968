//! The semantic model aggregate.
//!
//! A [`SemanticModel`] owns three entity collections (tables, views, stored
//! procedures). Each collection is either eager (an in-memory `Vec`) or lazy
//! (backed by a [`LazyEntityList`] that defers to storage on first read);
//! lazy loading is enabled per model, once, by the persistence layer.
//!
//! All mutation goes through `&self` methods so a model can be shared via
//! `Arc` across tasks. A disposed model refuses every operation.

mod entity;

pub use entity::{
    Annotated, Annotations, Column, EntityKind, ModelEntity, StoredProcedure, Table, TableIndex,
    View,
};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use thiserror::Error;

use crate::lazy::{EntityLoader, LazyEntityList, LazyError};
use crate::security::{validate_input_security, SecurityError};
use crate::tracking::ChangeTracker;

/// Errors raised by model construction and mutation.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("entity '{name}' already exists in the model")]
    DuplicateEntity { name: String },

    #[error("model '{name}' has been disposed")]
    Disposed { name: String },

    #[error("collection is lazy-loaded; mutate through the repository instead")]
    LazyLoadingEnabled,

    #[error(transparent)]
    Security(#[from] SecurityError),

    #[error(transparent)]
    Lazy(#[from] LazyError),
}

/// The semantic model of one source database.
pub struct SemanticModel {
    name: String,
    source: Option<String>,
    description: RwLock<Option<String>>,

    tables: RwLock<Vec<Arc<Table>>>,
    views: RwLock<Vec<Arc<View>>>,
    stored_procedures: RwLock<Vec<Arc<StoredProcedure>>>,

    lazy_tables: OnceLock<LazyEntityList<Table>>,
    lazy_views: OnceLock<LazyEntityList<View>>,
    lazy_stored_procedures: OnceLock<LazyEntityList<StoredProcedure>>,

    tracker: OnceLock<Arc<ChangeTracker>>,
    disposed: AtomicBool,
}

impl SemanticModel {
    /// Create an empty model.
    ///
    /// # Errors
    ///
    /// Rejects names that fail input security validation (injection
    /// patterns, control bytes, repetition floods).
    pub fn new(name: impl Into<String>) -> Result<Self, ModelError> {
        let name = name.into();
        validate_input_security(&name, "model name")?;
        Ok(Self {
            name,
            source: None,
            description: RwLock::new(None),
            tables: RwLock::new(Vec::new()),
            views: RwLock::new(Vec::new()),
            stored_procedures: RwLock::new(Vec::new()),
            lazy_tables: OnceLock::new(),
            lazy_views: OnceLock::new(),
            lazy_stored_procedures: OnceLock::new(),
            tracker: OnceLock::new(),
            disposed: AtomicBool::new(false),
        })
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        *self.description.write() = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn description(&self) -> Option<String> {
        self.description.read().clone()
    }

    pub fn set_description(&self, text: impl Into<String>) -> Result<(), ModelError> {
        let text = text.into();
        validate_input_security(&text, "model description")?;
        *self.description.write() = Some(text);
        Ok(())
    }

    fn ensure_live(&self) -> Result<(), ModelError> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(ModelError::Disposed {
                name: self.name.clone(),
            });
        }
        Ok(())
    }

    // ---- collections ----

    /// Tables of the model, loading them first if the model is lazy.
    pub async fn tables(&self) -> Result<Vec<Arc<Table>>, ModelError> {
        self.ensure_live()?;
        match self.lazy_tables.get() {
            Some(lazy) => Ok(lazy.get().await?.as_ref().clone()),
            None => Ok(self.tables.read().clone()),
        }
    }

    /// Views of the model, loading them first if the model is lazy.
    pub async fn views(&self) -> Result<Vec<Arc<View>>, ModelError> {
        self.ensure_live()?;
        match self.lazy_views.get() {
            Some(lazy) => Ok(lazy.get().await?.as_ref().clone()),
            None => Ok(self.views.read().clone()),
        }
    }

    /// Stored procedures of the model, loading them first if the model is
    /// lazy.
    pub async fn stored_procedures(&self) -> Result<Vec<Arc<StoredProcedure>>, ModelError> {
        self.ensure_live()?;
        match self.lazy_stored_procedures.get() {
            Some(lazy) => Ok(lazy.get().await?.as_ref().clone()),
            None => Ok(self.stored_procedures.read().clone()),
        }
    }

    /// Every entity of the model as a tagged union, tables first.
    pub async fn entities(&self) -> Result<Vec<ModelEntity>, ModelError> {
        let mut all = Vec::new();
        all.extend(self.tables().await?.into_iter().map(ModelEntity::Table));
        all.extend(self.views().await?.into_iter().map(ModelEntity::View));
        all.extend(
            self.stored_procedures()
                .await?
                .into_iter()
                .map(ModelEntity::StoredProcedure),
        );
        Ok(all)
    }

    pub async fn entity_count(&self) -> Result<usize, ModelError> {
        Ok(self.tables().await?.len()
            + self.views().await?.len()
            + self.stored_procedures().await?.len())
    }

    // ---- mutation ----

    /// Add a table, rejecting duplicates by qualified name.
    pub fn add_table(&self, table: Table) -> Result<Arc<Table>, ModelError> {
        self.ensure_live()?;
        if self.lazy_tables.get().is_some() {
            return Err(ModelError::LazyLoadingEnabled);
        }
        let mut tables = self.tables.write();
        if tables
            .iter()
            .any(|t| same_entity(&t.schema, &t.name, &table.schema, &table.name))
        {
            return Err(ModelError::DuplicateEntity {
                name: format!("{}.{}", table.schema, table.name),
            });
        }
        let table = Arc::new(table);
        tables.push(table.clone());
        drop(tables);
        self.notify_dirty(ModelEntity::Table(table.clone()));
        Ok(table)
    }

    /// Remove a table by qualified name, returning it if present.
    pub fn remove_table(
        &self,
        schema: &str,
        name: &str,
    ) -> Result<Option<Arc<Table>>, ModelError> {
        self.ensure_live()?;
        if self.lazy_tables.get().is_some() {
            return Err(ModelError::LazyLoadingEnabled);
        }
        let mut tables = self.tables.write();
        let position = tables
            .iter()
            .position(|t| same_entity(&t.schema, &t.name, schema, name));
        let removed = position.map(|i| tables.remove(i));
        drop(tables);
        if let Some(table) = &removed {
            self.notify_dirty(ModelEntity::Table(table.clone()));
        }
        Ok(removed)
    }

    /// Add a view, rejecting duplicates by qualified name.
    pub fn add_view(&self, view: View) -> Result<Arc<View>, ModelError> {
        self.ensure_live()?;
        if self.lazy_views.get().is_some() {
            return Err(ModelError::LazyLoadingEnabled);
        }
        let mut views = self.views.write();
        if views
            .iter()
            .any(|v| same_entity(&v.schema, &v.name, &view.schema, &view.name))
        {
            return Err(ModelError::DuplicateEntity {
                name: format!("{}.{}", view.schema, view.name),
            });
        }
        let view = Arc::new(view);
        views.push(view.clone());
        drop(views);
        self.notify_dirty(ModelEntity::View(view.clone()));
        Ok(view)
    }

    /// Remove a view by qualified name, returning it if present.
    pub fn remove_view(&self, schema: &str, name: &str) -> Result<Option<Arc<View>>, ModelError> {
        self.ensure_live()?;
        if self.lazy_views.get().is_some() {
            return Err(ModelError::LazyLoadingEnabled);
        }
        let mut views = self.views.write();
        let position = views
            .iter()
            .position(|v| same_entity(&v.schema, &v.name, schema, name));
        let removed = position.map(|i| views.remove(i));
        drop(views);
        if let Some(view) = &removed {
            self.notify_dirty(ModelEntity::View(view.clone()));
        }
        Ok(removed)
    }

    /// Add a stored procedure, rejecting duplicates by qualified name.
    pub fn add_stored_procedure(
        &self,
        procedure: StoredProcedure,
    ) -> Result<Arc<StoredProcedure>, ModelError> {
        self.ensure_live()?;
        if self.lazy_stored_procedures.get().is_some() {
            return Err(ModelError::LazyLoadingEnabled);
        }
        let mut procedures = self.stored_procedures.write();
        if procedures
            .iter()
            .any(|p| same_entity(&p.schema, &p.name, &procedure.schema, &procedure.name))
        {
            return Err(ModelError::DuplicateEntity {
                name: format!("{}.{}", procedure.schema, procedure.name),
            });
        }
        let procedure = Arc::new(procedure);
        procedures.push(procedure.clone());
        drop(procedures);
        self.notify_dirty(ModelEntity::StoredProcedure(procedure.clone()));
        Ok(procedure)
    }

    /// Remove a stored procedure by qualified name, returning it if present.
    pub fn remove_stored_procedure(
        &self,
        schema: &str,
        name: &str,
    ) -> Result<Option<Arc<StoredProcedure>>, ModelError> {
        self.ensure_live()?;
        if self.lazy_stored_procedures.get().is_some() {
            return Err(ModelError::LazyLoadingEnabled);
        }
        let mut procedures = self.stored_procedures.write();
        let position = procedures
            .iter()
            .position(|p| same_entity(&p.schema, &p.name, schema, name));
        let removed = position.map(|i| procedures.remove(i));
        drop(procedures);
        if let Some(procedure) = &removed {
            self.notify_dirty(ModelEntity::StoredProcedure(procedure.clone()));
        }
        Ok(removed)
    }

    // ---- lookup ----

    pub async fn find_table(
        &self,
        schema: &str,
        name: &str,
    ) -> Result<Option<Arc<Table>>, ModelError> {
        Ok(self
            .tables()
            .await?
            .into_iter()
            .find(|t| same_entity(&t.schema, &t.name, schema, name)))
    }

    pub async fn find_view(
        &self,
        schema: &str,
        name: &str,
    ) -> Result<Option<Arc<View>>, ModelError> {
        Ok(self
            .views()
            .await?
            .into_iter()
            .find(|v| same_entity(&v.schema, &v.name, schema, name)))
    }

    pub async fn find_stored_procedure(
        &self,
        schema: &str,
        name: &str,
    ) -> Result<Option<Arc<StoredProcedure>>, ModelError> {
        Ok(self
            .stored_procedures()
            .await?
            .into_iter()
            .find(|p| same_entity(&p.schema, &p.name, schema, name)))
    }

    // ---- change tracking ----

    /// Attach a change tracker, or return the one already attached.
    pub fn enable_change_tracking(&self) -> Arc<ChangeTracker> {
        self.tracker
            .get_or_init(|| Arc::new(ChangeTracker::new()))
            .clone()
    }

    pub fn change_tracker(&self) -> Option<Arc<ChangeTracker>> {
        self.tracker.get().cloned()
    }

    /// Record an entity as modified, if tracking is enabled.
    ///
    /// Call after enriching an already-added entity; additions and removals
    /// are recorded automatically.
    pub fn mark_modified(&self, entity: &ModelEntity) {
        self.notify_dirty(entity.clone());
    }

    fn notify_dirty(&self, entity: ModelEntity) {
        if let Some(tracker) = self.tracker.get() {
            tracker.mark_dirty(&entity);
        }
    }

    // ---- lazy loading ----

    /// Switch all three collections to deferred loading.
    ///
    /// Only the first call takes effect; eager contents are discarded in
    /// favor of the loaders. Direct mutation is rejected afterwards.
    pub fn enable_lazy_loading(
        &self,
        tables: EntityLoader<Table>,
        views: EntityLoader<View>,
        stored_procedures: EntityLoader<StoredProcedure>,
    ) {
        let newly_set = self
            .lazy_tables
            .set(LazyEntityList::new(tables))
            .is_ok();
        if !newly_set {
            return;
        }
        let _ = self.lazy_views.set(LazyEntityList::new(views));
        let _ = self
            .lazy_stored_procedures
            .set(LazyEntityList::new(stored_procedures));

        self.tables.write().clear();
        self.views.write().clear();
        self.stored_procedures.write().clear();
    }

    pub fn is_lazy(&self) -> bool {
        self.lazy_tables.get().is_some()
    }

    /// Drop any memoized lazy collections so the next read hits storage.
    pub fn invalidate_lazy(&self) {
        if let Some(lazy) = self.lazy_tables.get() {
            lazy.invalidate();
        }
        if let Some(lazy) = self.lazy_views.get() {
            lazy.invalidate();
        }
        if let Some(lazy) = self.lazy_stored_procedures.get() {
            lazy.invalidate();
        }
    }

    // ---- lifecycle ----

    /// Release the model. Idempotent; every later operation fails with
    /// [`ModelError::Disposed`].
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.tables.write().clear();
        self.views.write().clear();
        self.stored_procedures.write().clear();
        self.invalidate_lazy();
        if let Some(tracker) = self.tracker.get() {
            tracker.clear();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for SemanticModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticModel")
            .field("name", &self.name)
            .field("lazy", &self.is_lazy())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Qualified-name equality; SQL identifiers compare case-insensitively.
fn same_entity(schema_a: &str, name_a: &str, schema_b: &str, name_b: &str) -> bool {
    schema_a.eq_ignore_ascii_case(schema_b) && name_a.eq_ignore_ascii_case(name_b)
}
