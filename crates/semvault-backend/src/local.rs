//! Local disk persistence strategy.
//!
//! Stores one model per directory:
//!
//! ```text
//! <modelDir>/semanticmodel.json
//! <modelDir>/index.json
//! <modelDir>/tables/<schema>.<name>.json
//! <modelDir>/views/<schema>.<name>.json
//! <modelDir>/storedprocedures/<schema>.<name>.json
//! ```
//!
//! Full saves stage everything in a sibling directory first and move files
//! into place, so a crashed save never leaves a target lacking
//! previously-working data. The staging directory is a sibling of the target
//! so every move is a same-filesystem rename.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use semvault_core::security::{is_path_within_directory, validate_and_sanitize_path};
use semvault_core::{
    EntityKind, EntityLoader, LazyError, ModelEntity, SemanticModel, StoredProcedure, Table, View,
};

use crate::documents::{
    EntityRef, ModelDocument, ModelIndex, DELETE_LOCK_FILE, FORMAT_VERSION, INDEX_FILE,
    MODEL_DOCUMENT_FILE,
};
use crate::error::BackendError;
use crate::traits::PersistenceStrategy;

/// Monotonic suffix so concurrent saves in one process get distinct staging
/// directories.
static STAGING_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Persistence strategy backed by the local filesystem.
pub struct LocalDiskStrategy {
    /// Permit paths beyond the classic 260-character limit.
    allow_extended_paths: bool,
}

impl LocalDiskStrategy {
    pub fn new() -> Self {
        Self {
            allow_extended_paths: false,
        }
    }

    pub fn with_extended_paths(mut self, allow: bool) -> Self {
        self.allow_extended_paths = allow;
        self
    }

    fn validated(&self, path: &Path) -> Result<PathBuf, BackendError> {
        Ok(validate_and_sanitize_path(path, self.allow_extended_paths)?)
    }

    fn staging_dir_for(dir: &Path) -> PathBuf {
        let nonce = STAGING_COUNTER.fetch_add(1, Ordering::Relaxed);
        let name = format!(
            ".{}.staging-{}-{}",
            dir.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "model".to_string()),
            std::process::id(),
            nonce
        );
        dir.with_file_name(name)
    }
}

impl Default for LocalDiskStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersistenceStrategy for LocalDiskStrategy {
    fn strategy_name(&self) -> &'static str {
        "local-disk"
    }

    async fn save_model(&self, model: &SemanticModel, path: &Path) -> Result<(), BackendError> {
        let dir = self.validated(path)?;

        // Materializes lazy collections too, and fails fast on a disposed
        // model.
        let tables = model.tables().await?;
        let views = model.views().await?;
        let procedures = model.stored_procedures().await?;

        let staging = Self::staging_dir_for(&dir);
        let result = stage_model(model, &staging, &tables, &views, &procedures).await;
        let result = match result {
            Ok(()) => promote_staging(&staging, &dir).await,
            Err(e) => Err(e),
        };
        if result.is_err() {
            if let Err(cleanup) = tokio::fs::remove_dir_all(&staging).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!(staging = %staging.display(), error = %cleanup, "failed to clean staging directory");
                }
            }
            return result;
        }

        info!(
            model = model.name(),
            dir = %dir.display(),
            tables = tables.len(),
            views = views.len(),
            stored_procedures = procedures.len(),
            "model saved"
        );
        Ok(())
    }

    async fn load_model(&self, path: &Path) -> Result<Arc<SemanticModel>, BackendError> {
        let dir = self.validated(path)?;
        let doc = read_model_document(&dir).await?;
        let model = model_from_document(&doc)?;

        for entity in &doc.entities {
            match entity.kind {
                EntityKind::Table => {
                    if let Some(table) = read_entity::<Table>(&dir, entity).await? {
                        model.add_table(table)?;
                    }
                }
                EntityKind::View => {
                    if let Some(view) = read_entity::<View>(&dir, entity).await? {
                        model.add_view(view)?;
                    }
                }
                EntityKind::StoredProcedure => {
                    if let Some(procedure) = read_entity::<StoredProcedure>(&dir, entity).await? {
                        model.add_stored_procedure(procedure)?;
                    }
                }
            }
        }

        debug!(model = doc.name, dir = %dir.display(), "model loaded eagerly");
        Ok(Arc::new(model))
    }

    async fn load_model_lazy(&self, path: &Path) -> Result<Arc<SemanticModel>, BackendError> {
        let dir = self.validated(path)?;
        let doc = read_model_document(&dir).await?;
        let model = model_from_document(&doc)?;

        // The loaders hydrate the root document's references, the same set
        // an eager load sees. Stale entity files left by an earlier save
        // are never picked up.
        let mut tables = Vec::new();
        let mut views = Vec::new();
        let mut procedures = Vec::new();
        for entity in &doc.entities {
            match entity.kind {
                EntityKind::Table => tables.push(entity.clone()),
                EntityKind::View => views.push(entity.clone()),
                EntityKind::StoredProcedure => procedures.push(entity.clone()),
            }
        }

        model.enable_lazy_loading(
            reference_loader::<Table>(dir.clone(), tables),
            reference_loader::<View>(dir.clone(), views),
            reference_loader::<StoredProcedure>(dir.clone(), procedures),
        );

        debug!(model = doc.name, dir = %dir.display(), "model loaded lazily");
        Ok(Arc::new(model))
    }

    async fn exists(&self, path: &Path) -> Result<bool, BackendError> {
        let dir = self.validated(path)?;
        Ok(tokio::fs::metadata(dir.join(MODEL_DOCUMENT_FILE))
            .await
            .is_ok())
    }

    async fn list_models(&self, root: &Path) -> Result<Vec<String>, BackendError> {
        let root = self.validated(root)?;
        let mut reader = match tokio::fs::read_dir(&root).await {
            Ok(reader) => reader,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            if tokio::fs::metadata(entry.path().join(MODEL_DOCUMENT_FILE))
                .await
                .is_ok()
            {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete_model(&self, path: &Path) -> Result<bool, BackendError> {
        let dir = self.validated(path)?;
        match tokio::fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(BackendError::not_a_model(&dir)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        }
        if tokio::fs::metadata(dir.join(MODEL_DOCUMENT_FILE))
            .await
            .is_err()
        {
            return Err(BackendError::not_a_model(&dir));
        }

        // Claim the directory before recursive removal; another process
        // writing into it can at least observe the marker. Failure to
        // create it surfaces as an I/O error.
        tokio::fs::write(
            dir.join(DELETE_LOCK_FILE),
            std::process::id().to_string().as_bytes(),
        )
        .await?;

        tokio::fs::remove_dir_all(&dir).await?;
        info!(dir = %dir.display(), "model deleted");
        Ok(true)
    }
}

/// Serialize the full model into the staging directory.
async fn stage_model(
    model: &SemanticModel,
    staging: &Path,
    tables: &[Arc<Table>],
    views: &[Arc<View>],
    procedures: &[Arc<StoredProcedure>],
) -> Result<(), BackendError> {
    tokio::fs::create_dir_all(staging).await?;

    let mut refs = Vec::new();
    stage_collection(staging, EntityKind::Table, tables, &mut refs, |t| {
        ModelEntity::Table(t.clone())
    })
    .await?;
    stage_collection(staging, EntityKind::View, views, &mut refs, |v| {
        ModelEntity::View(v.clone())
    })
    .await?;
    stage_collection(
        staging,
        EntityKind::StoredProcedure,
        procedures,
        &mut refs,
        |p| ModelEntity::StoredProcedure(p.clone()),
    )
    .await?;

    let doc = ModelDocument::for_model(model, refs);
    write_json(&staging.join(INDEX_FILE), &ModelIndex::from_refs(&doc.entities)).await?;
    write_json(&staging.join(MODEL_DOCUMENT_FILE), &doc).await?;
    Ok(())
}

async fn stage_collection<T: Serialize>(
    staging: &Path,
    kind: EntityKind,
    items: &[Arc<T>],
    refs: &mut Vec<EntityRef>,
    wrap: impl Fn(&Arc<T>) -> ModelEntity,
) -> Result<(), BackendError> {
    let dir = staging.join(kind.dir_name());
    tokio::fs::create_dir_all(&dir).await?;
    for item in items {
        let entity = wrap(item);
        let file_name = entity.file_name()?;
        write_json(&dir.join(&file_name), item.as_ref()).await?;
        refs.push(EntityRef::for_entity(&entity, &file_name));
    }
    Ok(())
}

/// Move staged files into the final directory.
///
/// A fresh target is claimed with one directory rename; an existing target
/// is updated file by file, root document last, since its presence marks a
/// complete model. Entity files of entities dropped since the previous save
/// can survive an update; the root document's references are authoritative.
async fn promote_staging(staging: &Path, dir: &Path) -> Result<(), BackendError> {
    if tokio::fs::metadata(dir).await.is_err() {
        if let Some(parent) = dir.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::rename(staging, dir).await?;
        return Ok(());
    }

    tokio::fs::rename(staging.join(INDEX_FILE), dir.join(INDEX_FILE)).await?;
    for kind in [
        EntityKind::Table,
        EntityKind::View,
        EntityKind::StoredProcedure,
    ] {
        let from = staging.join(kind.dir_name());
        let to = dir.join(kind.dir_name());
        tokio::fs::create_dir_all(&to).await?;
        let mut reader = tokio::fs::read_dir(&from).await?;
        while let Some(entry) = reader.next_entry().await? {
            tokio::fs::rename(entry.path(), to.join(entry.file_name())).await?;
        }
    }
    tokio::fs::rename(
        staging.join(MODEL_DOCUMENT_FILE),
        dir.join(MODEL_DOCUMENT_FILE),
    )
    .await?;
    tokio::fs::remove_dir_all(staging).await?;
    Ok(())
}

async fn read_model_document(dir: &Path) -> Result<ModelDocument, BackendError> {
    let doc_path = dir.join(MODEL_DOCUMENT_FILE);
    let bytes = match tokio::fs::read(&doc_path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(BackendError::model_not_found(dir));
        }
        Err(e) => return Err(e.into()),
    };
    let doc: ModelDocument = serde_json::from_slice(&bytes)
        .map_err(|e| BackendError::corrupt(&doc_path, e.to_string()))?;
    if doc.format_version > FORMAT_VERSION {
        return Err(BackendError::unsupported_format(
            &doc_path,
            doc.format_version,
            FORMAT_VERSION,
        ));
    }
    Ok(doc)
}

fn model_from_document(doc: &ModelDocument) -> Result<SemanticModel, BackendError> {
    let mut model = SemanticModel::new(&doc.name)?;
    if let Some(source) = &doc.source {
        model = model.with_source(source);
    }
    if let Some(description) = &doc.description {
        model = model.with_description(description);
    }
    Ok(model)
}

/// Read one referenced entity file.
///
/// A reference whose file vanished is skipped with a warning. A reference
/// escaping the model directory marks the document corrupt.
async fn read_entity<T: DeserializeOwned>(
    dir: &Path,
    entity: &EntityRef,
) -> Result<Option<T>, BackendError> {
    let file = dir.join(&entity.path);
    if !is_path_within_directory(dir, &file) {
        return Err(BackendError::corrupt(
            dir.join(MODEL_DOCUMENT_FILE),
            format!("entity reference '{}' escapes the model directory", entity.path),
        ));
    }
    let bytes = match tokio::fs::read(&file).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(file = %file.display(), "referenced entity file is missing, skipping");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    let item: T = serde_json::from_slice(&bytes)
        .map_err(|e| BackendError::corrupt(&file, e.to_string()))?;
    Ok(Some(item))
}

/// Build a deferred loader hydrating one kind's referenced entity files.
fn reference_loader<T: DeserializeOwned + Send + Sync + 'static>(
    dir: PathBuf,
    refs: Vec<EntityRef>,
) -> EntityLoader<T> {
    Arc::new(move || {
        let dir = dir.clone();
        let refs = refs.clone();
        Box::pin(async move {
            let mut items = Vec::with_capacity(refs.len());
            for entity in &refs {
                let item = read_entity::<T>(&dir, entity)
                    .await
                    .map_err(|e| LazyError::load(e.to_string()))?;
                if let Some(item) = item {
                    items.push(Arc::new(item));
                }
            }
            Ok(items)
        })
    })
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), BackendError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use semvault_core::{Annotated, Column};
    use tempfile::TempDir;

    fn sample_model() -> SemanticModel {
        let model = SemanticModel::new("Sales")
            .unwrap()
            .with_source("mssql://prod/sales");
        model
            .add_table(Table::new("dbo", "Customer").with_columns(vec![
                Column::new("Id", "int"),
                Column::new("Name", "nvarchar(100)"),
            ]))
            .unwrap();
        model.add_table(Table::new("dbo", "Order")).unwrap();
        model.add_view(View::new("dbo", "vw_Revenue")).unwrap();
        model
            .add_stored_procedure(StoredProcedure::new("dbo", "usp_GetCustomer"))
            .unwrap();
        model
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("Sales");
        let strategy = LocalDiskStrategy::new();
        let model = sample_model();

        strategy.save_model(&model, &dir).await.unwrap();
        let loaded = strategy.load_model(&dir).await.unwrap();

        assert_eq!(loaded.name(), "Sales");
        assert_eq!(loaded.source(), Some("mssql://prod/sales"));
        assert_eq!(loaded.tables().await.unwrap().len(), 2);
        assert_eq!(loaded.views().await.unwrap().len(), 1);
        assert_eq!(loaded.stored_procedures().await.unwrap().len(), 1);

        let customer = loaded.find_table("dbo", "Customer").await.unwrap().unwrap();
        assert_eq!(customer.columns.len(), 2);
    }

    #[tokio::test]
    async fn test_save_produces_full_layout() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("Sales");
        let strategy = LocalDiskStrategy::new();

        let model = SemanticModel::new("Sales").unwrap();
        model.add_table(Table::new("dbo", "Customer")).unwrap();
        strategy.save_model(&model, &dir).await.unwrap();

        assert!(dir.join(MODEL_DOCUMENT_FILE).is_file());
        assert!(dir.join(INDEX_FILE).is_file());
        assert!(dir.join("tables/dbo.Customer.json").is_file());
        // Empty collections still get their directories.
        assert!(dir.join("views").is_dir());
        assert!(dir.join("storedprocedures").is_dir());
        assert_eq!(std::fs::read_dir(dir.join("views")).unwrap().count(), 0);

        let index: ModelIndex =
            serde_json::from_slice(&std::fs::read(dir.join(INDEX_FILE)).unwrap()).unwrap();
        assert_eq!(index.table_count, 1);
        assert_eq!(index.tables, vec!["tables/dbo.Customer.json"]);
    }

    #[tokio::test]
    async fn test_root_document_holds_references_not_bodies() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("Sales");
        let strategy = LocalDiskStrategy::new();
        strategy.save_model(&sample_model(), &dir).await.unwrap();

        let doc: ModelDocument =
            serde_json::from_slice(&std::fs::read(dir.join(MODEL_DOCUMENT_FILE)).unwrap())
                .unwrap();
        assert_eq!(doc.entities.len(), 4);
        assert!(doc
            .entities
            .iter()
            .any(|e| e.path == "tables/dbo.Customer.json"));
    }

    #[tokio::test]
    async fn test_save_preserves_annotations() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("Sales");
        let strategy = LocalDiskStrategy::new();
        let model = sample_model();
        let customer = model.find_table("dbo", "Customer").await.unwrap().unwrap();
        customer.set_semantic_description("Customer master data.");

        strategy.save_model(&model, &dir).await.unwrap();
        let loaded = strategy.load_model(&dir).await.unwrap();
        let customer = loaded.find_table("dbo", "Customer").await.unwrap().unwrap();

        assert_eq!(
            customer.semantic_description().as_deref(),
            Some("Customer master data.")
        );
        assert!(customer.semantic_description_updated().is_some());
    }

    #[tokio::test]
    async fn test_load_missing_model_names_the_path() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("Nope");
        let strategy = LocalDiskStrategy::new();
        let result = strategy.load_model(&dir).await;
        match result {
            Err(BackendError::ModelNotFound { path }) => assert_eq!(path, dir),
            other => panic!("expected ModelNotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_corrupt_root_document() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("Broken");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(MODEL_DOCUMENT_FILE), b"{ not json").unwrap();

        let strategy = LocalDiskStrategy::new();
        let result = strategy.load_model(&dir).await;
        assert!(matches!(result, Err(BackendError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn test_escaping_entity_reference_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("Evil");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(MODEL_DOCUMENT_FILE),
            br#"{"format_version": 1, "name": "Evil", "saved_at": "2026-01-01T00:00:00Z",
                 "entities": [{"kind": "Table", "schema": "dbo", "name": "T",
                               "path": "../outside.json"}]}"#,
        )
        .unwrap();

        let strategy = LocalDiskStrategy::new();
        let result = strategy.load_model(&dir).await;
        assert!(matches!(result, Err(BackendError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn test_newer_format_rejected() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("Future");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(MODEL_DOCUMENT_FILE),
            br#"{"format_version": 99, "name": "Future", "saved_at": "2026-01-01T00:00:00Z"}"#,
        )
        .unwrap();

        let strategy = LocalDiskStrategy::new();
        let result = strategy.load_model(&dir).await;
        assert!(matches!(
            result,
            Err(BackendError::UnsupportedFormat { found: 99, .. })
        ));
    }

    #[tokio::test]
    async fn test_exists_and_idempotent_delete() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("Sales");
        let strategy = LocalDiskStrategy::new();

        assert!(!strategy.exists(&dir).await.unwrap());
        strategy.save_model(&sample_model(), &dir).await.unwrap();
        assert!(strategy.exists(&dir).await.unwrap());

        assert!(strategy.delete_model(&dir).await.unwrap());
        assert!(!strategy.exists(&dir).await.unwrap());
        // Second delete is a no-op, not an error.
        assert!(!strategy.delete_model(&dir).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_foreign_directory_fails() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("NotAModel");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("random.txt"), b"keep me").unwrap();

        let strategy = LocalDiskStrategy::new();
        let result = strategy.delete_model(&dir).await;
        assert!(matches!(result, Err(BackendError::NotAModel { .. })));
        assert!(dir.join("random.txt").is_file());
    }

    #[tokio::test]
    async fn test_list_models() {
        let temp = TempDir::new().unwrap();
        let strategy = LocalDiskStrategy::new();

        assert!(strategy.list_models(temp.path()).await.unwrap().is_empty());

        strategy
            .save_model(
                &SemanticModel::new("Beta").unwrap(),
                &temp.path().join("Beta"),
            )
            .await
            .unwrap();
        strategy
            .save_model(
                &SemanticModel::new("Alpha").unwrap(),
                &temp.path().join("Alpha"),
            )
            .await
            .unwrap();
        // A stray directory without a root document is not a model.
        std::fs::create_dir_all(temp.path().join("junk")).unwrap();

        let names = strategy.list_models(temp.path()).await.unwrap();
        assert_eq!(names, vec!["Alpha".to_string(), "Beta".to_string()]);
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let temp = TempDir::new().unwrap();
        let strategy = LocalDiskStrategy::new();
        let bad = temp.path().join("..").join("escape");
        let result = strategy.load_model(&bad).await;
        assert!(matches!(result, Err(BackendError::Security(_))));
    }

    #[tokio::test]
    async fn test_lazy_load_defers_until_first_read() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("Sales");
        let strategy = LocalDiskStrategy::new();
        strategy.save_model(&sample_model(), &dir).await.unwrap();

        let lazy = strategy.load_model_lazy(&dir).await.unwrap();
        assert!(lazy.is_lazy());

        // Remove a referenced file after the lazy handle exists; the first
        // read reflects it because nothing was loaded yet.
        std::fs::remove_file(dir.join("tables/dbo.Order.json")).unwrap();

        let tables = lazy.tables().await.unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "Customer");
    }

    #[tokio::test]
    async fn test_lazy_load_matches_eager_after_overwrite() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("Sales");
        let strategy = LocalDiskStrategy::new();
        strategy.save_model(&sample_model(), &dir).await.unwrap();

        // Overwrite with a smaller model; the dbo.Order entity file from
        // the first save survives on disk but is no longer referenced.
        let updated = SemanticModel::new("Sales").unwrap();
        updated.add_table(Table::new("dbo", "Customer")).unwrap();
        strategy.save_model(&updated, &dir).await.unwrap();
        assert!(dir.join("tables/dbo.Order.json").is_file());

        let eager = strategy.load_model(&dir).await.unwrap();
        let lazy = strategy.load_model_lazy(&dir).await.unwrap();

        assert_eq!(eager.tables().await.unwrap().len(), 1);
        assert_eq!(lazy.tables().await.unwrap().len(), 1);
        assert!(lazy.find_table("dbo", "Order").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites_existing() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("Sales");
        let strategy = LocalDiskStrategy::new();
        strategy.save_model(&sample_model(), &dir).await.unwrap();

        let updated = SemanticModel::new("Sales").unwrap();
        updated.add_table(Table::new("dbo", "Customer")).unwrap();
        strategy.save_model(&updated, &dir).await.unwrap();

        let loaded = strategy.load_model(&dir).await.unwrap();
        assert_eq!(loaded.tables().await.unwrap().len(), 1);
        assert!(loaded.views().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_staging_leaves_target_untouched() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("Sales");
        let strategy = LocalDiskStrategy::new();
        strategy.save_model(&sample_model(), &dir).await.unwrap();

        // A disposed model fails before staging begins.
        let broken = SemanticModel::new("Sales").unwrap();
        broken.dispose();
        assert!(strategy.save_model(&broken, &dir).await.is_err());

        let loaded = strategy.load_model(&dir).await.unwrap();
        assert_eq!(loaded.tables().await.unwrap().len(), 2);
    }
}
