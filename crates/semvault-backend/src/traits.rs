//! Persistence strategy trait definition.
//!
//! Defines the async interface every storage backend implements. The
//! repository only ever talks to a `dyn PersistenceStrategy`, so local disk
//! and remote backends are interchangeable.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use semvault_core::SemanticModel;

use crate::error::BackendError;

/// Storage backend for semantic models.
///
/// `path` always identifies one model's storage location (a directory for
/// the local-disk strategy, a key prefix for remote ones); only
/// [`list_models`](Self::list_models) takes a root holding many models.
///
/// Implementations must validate every caller-supplied path before touching
/// storage, and must keep a full save atomic from the caller's viewpoint: a
/// crash never leaves the target lacking previously-working data.
#[async_trait]
pub trait PersistenceStrategy: Send + Sync {
    /// Stable identifier of the strategy, used in cache keys.
    fn strategy_name(&self) -> &'static str;

    /// Persist the full model at `path`, overwriting any model stored there.
    async fn save_model(&self, model: &SemanticModel, path: &Path) -> Result<(), BackendError>;

    /// Load the model stored at `path`, materializing all entity
    /// collections. Fails with [`BackendError::ModelNotFound`] when nothing
    /// is stored there.
    async fn load_model(&self, path: &Path) -> Result<Arc<SemanticModel>, BackendError>;

    /// Load the model stored at `path` with deferred entity collections.
    ///
    /// Backends that cannot defer sub-collection reads fall back to an
    /// eager load.
    async fn load_model_lazy(&self, path: &Path) -> Result<Arc<SemanticModel>, BackendError> {
        self.load_model(path).await
    }

    /// Check whether a model is stored at `path`.
    async fn exists(&self, path: &Path) -> Result<bool, BackendError>;

    /// List the names of all models stored under `root`.
    async fn list_models(&self, root: &Path) -> Result<Vec<String>, BackendError>;

    /// Delete the model stored at `path`.
    ///
    /// # Returns
    /// `true` if a model was deleted; a missing `path` is a no-op returning
    /// `false`. A `path` that exists but holds no recognizable model fails
    /// with [`BackendError::NotAModel`].
    async fn delete_model(&self, path: &Path) -> Result<bool, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test that the trait is object-safe
    fn _assert_object_safe(_: &dyn PersistenceStrategy) {}
}
