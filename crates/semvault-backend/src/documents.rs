//! On-disk documents of the local-disk layout.
//!
//! A stored model is a directory holding a root document, an index summary
//! and one JSON file per entity. The root document carries only identity and
//! references; entity bodies live in their own files so the root stays small
//! and acyclic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use semvault_core::{EntityKind, ModelEntity, SemanticModel};

/// File name of the root document inside a model directory.
pub const MODEL_DOCUMENT_FILE: &str = "semanticmodel.json";

/// File name of the summary document for fast external inspection.
pub const INDEX_FILE: &str = "index.json";

/// Lock file created inside a model directory before recursive deletion.
pub const DELETE_LOCK_FILE: &str = ".delete.lock";

/// Current on-disk format version. Documents written by a newer build are
/// rejected on load.
pub const FORMAT_VERSION: u32 = 1;

/// Reference to one entity file, relative to the model directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub schema: String,
    pub name: String,
    /// Relative path of the entity file, e.g. `tables/dbo.Customer.json`.
    pub path: String,
}

impl EntityRef {
    pub fn for_entity(entity: &ModelEntity, file_name: &str) -> Self {
        Self {
            kind: entity.kind(),
            schema: entity.schema().to_string(),
            name: entity.name().to_string(),
            path: format!("{}/{}", entity.kind().dir_name(), file_name),
        }
    }
}

/// Root document of a stored model.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelDocument {
    pub format_version: u32,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub entities: Vec<EntityRef>,
}

impl ModelDocument {
    pub fn for_model(model: &SemanticModel, entities: Vec<EntityRef>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            name: model.name().to_string(),
            source: model.source().map(str::to_string),
            description: model.description(),
            saved_at: Utc::now(),
            entities,
        }
    }
}

/// Summary of a stored model: counts plus relative paths per kind.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ModelIndex {
    pub table_count: usize,
    pub view_count: usize,
    pub stored_procedure_count: usize,
    pub tables: Vec<String>,
    pub views: Vec<String>,
    pub stored_procedures: Vec<String>,
}

impl ModelIndex {
    pub fn from_refs(refs: &[EntityRef]) -> Self {
        let mut index = Self::default();
        for entity in refs {
            match entity.kind {
                EntityKind::Table => index.tables.push(entity.path.clone()),
                EntityKind::View => index.views.push(entity.path.clone()),
                EntityKind::StoredProcedure => {
                    index.stored_procedures.push(entity.path.clone())
                }
            }
        }
        index.table_count = index.tables.len();
        index.view_count = index.views.len();
        index.stored_procedure_count = index.stored_procedures.len();
        index
    }
}
