//! Semvault backend - persistence strategies, caching and the repository.
//!
//! The [`PersistenceStrategy`] trait defines how a semantic model is stored;
//! [`LocalDiskStrategy`] implements it on the local filesystem. The
//! [`ModelRepository`] fronts named strategies with an optional [`ModelCache`]
//! and two-tier concurrency control, and is what applications should use.

pub mod cache;
pub mod documents;
pub mod error;
pub mod keys;
pub mod local;
pub mod repository;
pub mod traits;

pub use cache::{CacheStatistics, MemoryModelCache, ModelCache};
pub use documents::{
    EntityRef, ModelDocument, ModelIndex, FORMAT_VERSION, INDEX_FILE, MODEL_DOCUMENT_FILE,
};
pub use error::BackendError;
pub use keys::cache_key;
pub use local::LocalDiskStrategy;
pub use repository::{LoadOptions, ModelRepository, ModelRepositoryBuilder};
pub use traits::PersistenceStrategy;
