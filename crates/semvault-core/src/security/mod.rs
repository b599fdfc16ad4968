//! Security validators for paths and entity names.
//!
//! Every persistence strategy and the repository call these before touching
//! the filesystem or deriving a cloud identifier. All functions are pure and
//! hold no state; failures identify the offending input so callers can fail
//! fast before any I/O.

mod name;
mod path;

pub use name::{sanitize_entity_name, validate_input_security, MAX_ENTITY_NAME_LEN};
pub use path::{
    is_path_within_directory, validate_and_sanitize_path, MAX_EXTENDED_PATH_LEN, MAX_PATH_LEN,
    MAX_SEGMENT_LEN,
};

use thiserror::Error;

/// Errors raised by the path and entity-name validators.
///
/// All of these are argument errors, raised synchronously before any I/O
/// happens.
#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("path must not be empty")]
    EmptyPath,

    #[error("path is not valid UTF-8")]
    InvalidEncoding,

    #[error("path length {length} exceeds the maximum of {max} characters")]
    PathTooLong { length: usize, max: usize },

    #[error("path segment '{segment}' exceeds {max} characters")]
    SegmentTooLong { segment: String, max: usize },

    #[error("path contains a traversal sequence ('..' or '~')")]
    PathTraversal,

    #[error("path contains forbidden character {ch:?}")]
    ForbiddenPathCharacter { ch: char },

    #[error("'{name}' is a reserved device name")]
    ReservedDeviceName { name: String },

    #[error("path must be absolute")]
    RelativePath,

    #[error("entity name must not be empty")]
    EmptyEntityName,

    #[error("entity name length {length} exceeds the maximum of {max} characters")]
    EntityNameTooLong { length: usize, max: usize },

    #[error("entity name '{name}' is empty after trimming spaces and dots")]
    EntityNameSanitizedEmpty { name: String },

    #[error("entity name '{name}' has a dangerous extension '{extension}'")]
    DangerousExtension { name: String, extension: String },

    #[error("{field} contains a potential injection pattern")]
    InjectionPattern { field: String },

    #[error("{field} contains more than {max} consecutive repetitions of {ch:?}")]
    ExcessiveRepetition { field: String, ch: char, max: usize },

    #[error("{field} contains binary or control characters")]
    BinaryContent { field: String },
}

/// Reserved Windows device names that must never appear as a file or
/// directory stem, regardless of extension.
pub(crate) fn is_reserved_device_name(stem: &str) -> bool {
    let upper = stem.to_ascii_uppercase();
    matches!(upper.as_str(), "CON" | "PRN" | "AUX" | "NUL")
        || matches!(upper.strip_prefix("COM"), Some(n) if is_device_digit(n))
        || matches!(upper.strip_prefix("LPT"), Some(n) if is_device_digit(n))
}

fn is_device_digit(s: &str) -> bool {
    s.len() == 1 && s.chars().all(|c| ('1'..='9').contains(&c))
}
