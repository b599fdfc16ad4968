//! Semvault core - the semantic model aggregate and its supporting machinery.
//!
//! This crate holds everything the persistence layer operates on but that is
//! independent of any storage backend:
//!
//! - [`model`]: the [`SemanticModel`] aggregate (tables, views, stored
//!   procedures with columns and indexes) and the closed [`ModelEntity`]
//!   union over its entity kinds.
//! - [`security`]: path and entity-name validators that guard every
//!   filesystem-facing operation against traversal and injection.
//! - [`lazy`]: a single-flight, memoized deferred loader for one entity
//!   collection.
//! - [`tracking`]: per-model dirty-entity bookkeeping.

pub mod lazy;
pub mod model;
pub mod security;
pub mod tracking;

pub use lazy::{EntityLoader, LazyEntityList, LazyError};
pub use model::{
    Annotated, Annotations, Column, EntityKind, ModelEntity, ModelError, SemanticModel,
    StoredProcedure, Table, TableIndex, View,
};
pub use security::SecurityError;
pub use tracking::ChangeTracker;
