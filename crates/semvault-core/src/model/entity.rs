//! Entity kinds of the semantic model.
//!
//! Tables, views and stored procedures are plain serde value structs that
//! deserialize directly into their final form. Mutable enrichment state
//! (descriptions, usage flags) lives in a shared [`Annotations`] block behind
//! a `parking_lot::RwLock` so an `Arc`-shared entity can still be enriched.
//!
//! [`ModelEntity`] is a closed tagged union over the three kinds; every
//! dispatch is an exhaustive match, there is no open virtual hierarchy.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::security::{sanitize_entity_name, SecurityError};

/// The closed set of entity kinds a semantic model contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Table,
    View,
    StoredProcedure,
}

impl EntityKind {
    /// Human-readable kind name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Table => "table",
            EntityKind::View => "view",
            EntityKind::StoredProcedure => "stored procedure",
        }
    }

    /// Sub-directory this kind is persisted under.
    pub fn dir_name(&self) -> &'static str {
        match self {
            EntityKind::Table => "tables",
            EntityKind::View => "views",
            EntityKind::StoredProcedure => "storedprocedures",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mutable enrichment state shared by all entity kinds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Annotations {
    /// Human-authored description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// AI-generated semantic description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_description: Option<String>,

    /// When the semantic description was last set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_description_updated: Option<DateTime<Utc>>,

    /// Entity is flagged as not used.
    #[serde(default)]
    pub not_used: bool,

    /// Reason the entity was flagged as not used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_used_reason: Option<String>,
}

/// Read/write access to the enrichment state of an entity.
///
/// The external description-generation collaborator only needs
/// [`set_semantic_description`](Annotated::set_semantic_description); the
/// rest round out the surface for extraction and reporting callers.
pub trait Annotated {
    fn annotations(&self) -> &RwLock<Annotations>;

    fn description(&self) -> Option<String> {
        self.annotations().read().description.clone()
    }

    fn set_description(&self, text: impl Into<String>) {
        self.annotations().write().description = Some(text.into());
    }

    fn semantic_description(&self) -> Option<String> {
        self.annotations().read().semantic_description.clone()
    }

    fn semantic_description_updated(&self) -> Option<DateTime<Utc>> {
        self.annotations().read().semantic_description_updated
    }

    /// Set the AI-generated description and stamp the update time.
    fn set_semantic_description(&self, text: impl Into<String>) {
        let mut annotations = self.annotations().write();
        annotations.semantic_description = Some(text.into());
        annotations.semantic_description_updated = Some(Utc::now());
    }

    fn is_not_used(&self) -> bool {
        self.annotations().read().not_used
    }

    fn not_used_reason(&self) -> Option<String> {
        self.annotations().read().not_used_reason.clone()
    }

    fn mark_not_used(&self, reason: impl Into<String>) {
        let mut annotations = self.annotations().write();
        annotations.not_used = true;
        annotations.not_used_reason = Some(reason.into());
    }

    fn clear_not_used(&self) {
        let mut annotations = self.annotations().write();
        annotations.not_used = false;
        annotations.not_used_reason = None;
    }
}

/// A column of a table or view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// SQL type as reported by the source database (e.g. `nvarchar(50)`).
    pub data_type: String,
    #[serde(default)]
    pub is_nullable: bool,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_nullable: false,
            is_primary_key: false,
            description: None,
        }
    }
}

/// An index on a table or view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableIndex {
    pub name: String,
    #[serde(default)]
    pub is_unique: bool,
    #[serde(default)]
    pub is_primary: bool,
    /// Column names covered by the index, in key order.
    pub columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A table of the source database.
#[derive(Debug, Serialize, Deserialize)]
pub struct Table {
    pub schema: String,
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub indexes: Vec<TableIndex>,
    #[serde(default)]
    annotations: RwLock<Annotations>,
}

impl Table {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
            annotations: RwLock::new(Annotations::default()),
        }
    }

    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_indexes(mut self, indexes: Vec<TableIndex>) -> Self {
        self.indexes = indexes;
        self
    }
}

impl Annotated for Table {
    fn annotations(&self) -> &RwLock<Annotations> {
        &self.annotations
    }
}

/// A view of the source database.
#[derive(Debug, Serialize, Deserialize)]
pub struct View {
    pub schema: String,
    pub name: String,
    /// View definition text, when the extractor captured it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub indexes: Vec<TableIndex>,
    #[serde(default)]
    annotations: RwLock<Annotations>,
}

impl View {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            definition: None,
            columns: Vec::new(),
            indexes: Vec::new(),
            annotations: RwLock::new(Annotations::default()),
        }
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = Some(definition.into());
        self
    }

    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }
}

impl Annotated for View {
    fn annotations(&self) -> &RwLock<Annotations> {
        &self.annotations
    }
}

/// A stored procedure of the source database.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoredProcedure {
    pub schema: String,
    pub name: String,
    /// Parameter list as reported by the source database.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<String>,
    /// Procedure body, when the extractor captured it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(default)]
    annotations: RwLock<Annotations>,
}

impl StoredProcedure {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            parameters: None,
            definition: None,
            annotations: RwLock::new(Annotations::default()),
        }
    }

    pub fn with_parameters(mut self, parameters: impl Into<String>) -> Self {
        self.parameters = Some(parameters.into());
        self
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = Some(definition.into());
        self
    }
}

impl Annotated for StoredProcedure {
    fn annotations(&self) -> &RwLock<Annotations> {
        &self.annotations
    }
}

/// A reference to one entity of a semantic model, tagged by kind.
#[derive(Debug, Clone)]
pub enum ModelEntity {
    Table(Arc<Table>),
    View(Arc<View>),
    StoredProcedure(Arc<StoredProcedure>),
}

impl ModelEntity {
    pub fn kind(&self) -> EntityKind {
        match self {
            ModelEntity::Table(_) => EntityKind::Table,
            ModelEntity::View(_) => EntityKind::View,
            ModelEntity::StoredProcedure(_) => EntityKind::StoredProcedure,
        }
    }

    pub fn schema(&self) -> &str {
        match self {
            ModelEntity::Table(t) => &t.schema,
            ModelEntity::View(v) => &v.schema,
            ModelEntity::StoredProcedure(p) => &p.schema,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ModelEntity::Table(t) => &t.name,
            ModelEntity::View(v) => &v.name,
            ModelEntity::StoredProcedure(p) => &p.name,
        }
    }

    /// `schema.name` display form.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema(), self.name())
    }

    /// Sanitized file name this entity is persisted under.
    pub fn file_name(&self) -> Result<String, SecurityError> {
        let safe = sanitize_entity_name(&self.qualified_name(), true)?;
        Ok(format!("{}.json", safe))
    }

    /// Identity key for change tracking.
    ///
    /// Reference identity: the key is the `Arc` allocation address, not a
    /// stable (schema, name) pair. Dirty state therefore does not survive a
    /// reload from storage.
    pub fn ref_key(&self) -> usize {
        match self {
            ModelEntity::Table(t) => Arc::as_ptr(t) as usize,
            ModelEntity::View(v) => Arc::as_ptr(v) as usize,
            ModelEntity::StoredProcedure(p) => Arc::as_ptr(p) as usize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_dir_names() {
        assert_eq!(EntityKind::Table.dir_name(), "tables");
        assert_eq!(EntityKind::View.dir_name(), "views");
        assert_eq!(EntityKind::StoredProcedure.dir_name(), "storedprocedures");
    }

    #[test]
    fn test_qualified_name_and_file_name() {
        let table = Arc::new(Table::new("dbo", "Customer"));
        let entity = ModelEntity::Table(table);
        assert_eq!(entity.qualified_name(), "dbo.Customer");
        assert_eq!(entity.file_name().unwrap(), "dbo.Customer.json");
    }

    #[test]
    fn test_file_name_is_sanitized() {
        let view = Arc::new(View::new("sales", "orders/by:region"));
        let entity = ModelEntity::View(view);
        assert_eq!(entity.file_name().unwrap(), "sales.orders_by_region.json");
    }

    #[test]
    fn test_semantic_description_stamps_time() {
        let table = Table::new("dbo", "Customer");
        assert!(table.semantic_description().is_none());
        assert!(table.semantic_description_updated().is_none());

        table.set_semantic_description("Customer master data.");
        assert_eq!(
            table.semantic_description().as_deref(),
            Some("Customer master data.")
        );
        assert!(table.semantic_description_updated().is_some());
    }

    #[test]
    fn test_not_used_flag() {
        let proc = StoredProcedure::new("dbo", "usp_Legacy");
        assert!(!proc.is_not_used());

        proc.mark_not_used("superseded by usp_LegacyV2");
        assert!(proc.is_not_used());
        assert_eq!(
            proc.not_used_reason().as_deref(),
            Some("superseded by usp_LegacyV2")
        );

        proc.clear_not_used();
        assert!(!proc.is_not_used());
        assert!(proc.not_used_reason().is_none());
    }

    #[test]
    fn test_ref_key_is_reference_identity() {
        let a = Arc::new(Table::new("dbo", "Customer"));
        let b = Arc::new(Table::new("dbo", "Customer"));

        let ea = ModelEntity::Table(a.clone());
        let ea2 = ModelEntity::Table(a);
        let eb = ModelEntity::Table(b);

        assert_eq!(ea.ref_key(), ea2.ref_key());
        // Same (schema, name), different instance, different key.
        assert_ne!(ea.ref_key(), eb.ref_key());
    }

    #[test]
    fn test_table_serde_round_trip() {
        let table = Table::new("dbo", "Customer")
            .with_columns(vec![
                Column::new("Id", "int"),
                Column::new("Name", "nvarchar(100)"),
            ])
            .with_indexes(vec![TableIndex {
                name: "PK_Customer".to_string(),
                is_unique: true,
                is_primary: true,
                columns: vec!["Id".to_string()],
                description: None,
            }]);
        table.set_description("Customer master data");

        let json = serde_json::to_string_pretty(&table).unwrap();
        let back: Table = serde_json::from_str(&json).unwrap();

        assert_eq!(back.schema, "dbo");
        assert_eq!(back.name, "Customer");
        assert_eq!(back.columns.len(), 2);
        assert_eq!(back.indexes.len(), 1);
        assert_eq!(back.description().as_deref(), Some("Customer master data"));
    }
}
