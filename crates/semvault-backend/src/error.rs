//! Backend error types.

use std::path::PathBuf;
use thiserror::Error;

use semvault_core::{LazyError, ModelError, SecurityError};

/// Errors that can occur during persistence and repository operations.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Input failed path or name validation
    #[error("security validation failed: {0}")]
    Security(#[from] SecurityError),

    /// Model-level failure (duplicate, disposed, lazy restriction)
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Deferred load failed
    #[error("lazy load failed: {0}")]
    Lazy(#[from] LazyError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No model stored at the given location
    #[error("no semantic model found at '{path}'")]
    ModelNotFound { path: PathBuf },

    /// The target exists but is not a recognizable model directory
    #[error("'{path}' exists but is not a semantic model directory")]
    NotAModel { path: PathBuf },

    /// Stored data could not be interpreted
    #[error("stored model at '{path}' is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },

    /// Storage format is newer than this build understands
    #[error("stored model at '{path}' uses format version {found}, expected at most {supported}")]
    UnsupportedFormat {
        path: PathBuf,
        found: u32,
        supported: u32,
    },

    /// Repository has been disposed
    #[error("repository has been disposed")]
    RepositoryDisposed,

    /// Generic error with context
    #[error("{context}: {message}")]
    WithContext { context: String, message: String },
}

impl BackendError {
    /// Create a ModelNotFound error.
    pub fn model_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ModelNotFound { path: path.into() }
    }

    /// Create a NotAModel error.
    pub fn not_a_model(path: impl Into<PathBuf>) -> Self {
        Self::NotAModel { path: path.into() }
    }

    /// Create a Corrupt error.
    pub fn corrupt(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an UnsupportedFormat error.
    pub fn unsupported_format(path: impl Into<PathBuf>, found: u32, supported: u32) -> Self {
        Self::UnsupportedFormat {
            path: path.into(),
            found,
            supported,
        }
    }

    /// Add context to any error.
    pub fn with_context(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BackendError::model_not_found("/data/models/sales");
        assert!(err.to_string().contains("/data/models/sales"));

        let err = BackendError::not_a_model("/data/misc");
        assert!(err.to_string().contains("not a semantic model directory"));

        let err = BackendError::corrupt("/data/models/sales/semanticmodel.json", "truncated file");
        assert!(err.to_string().contains("corrupt"));
        assert!(err.to_string().contains("truncated file"));
    }

    #[test]
    fn test_unsupported_format() {
        let err = BackendError::unsupported_format("/data/m/semanticmodel.json", 7, 1);
        assert!(err.to_string().contains('7'));
        assert!(err.to_string().contains('1'));
    }

    #[test]
    fn test_with_context() {
        let err = BackendError::with_context("saving model", "disk full");
        assert!(err.to_string().contains("saving model"));
        assert!(err.to_string().contains("disk full"));
    }
}
