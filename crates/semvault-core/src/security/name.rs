//! Entity-name sanitization and free-text input validation.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{is_reserved_device_name, SecurityError};

/// Maximum length of a sanitized entity name in characters.
pub const MAX_ENTITY_NAME_LEN: usize = 128;

/// Characters that are invalid in file names on the supported filesystems.
const INVALID_FILENAME_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Extensions that must never be produced for an entity file.
const DANGEROUS_EXTENSIONS: [&str; 13] = [
    ".exe", ".bat", ".cmd", ".com", ".pif", ".scr", ".vbs", ".js", ".jar", ".ps1", ".sh", ".dll",
    ".msi",
];

/// Maximum number of consecutive repetitions of one character before an
/// input is treated as a DoS attempt.
const MAX_CHAR_REPETITIONS: usize = 100;

/// Script/template-injection shapes rejected by [`validate_input_security`].
static INJECTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)<\s*script",
        r"(?i)javascript\s*:",
        r"\$\{",
        r"\{\{",
        r"(?i)<\s*iframe",
        r"(?i)\bon[a-z]+\s*=",
        r"(?i)data:text/html",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("injection pattern must compile"))
    .collect()
});

/// Sanitize an entity name into a form that is safe to use as a file name
/// or cloud identifier.
///
/// Filesystem-invalid characters become `_`; in strict mode Unicode control
/// characters do too. Leading/trailing spaces and dots are trimmed, reserved
/// device names get an `_` prefix, and the result is truncated to
/// [`MAX_ENTITY_NAME_LEN`] if substitution pushed it over.
///
/// # Errors
///
/// Rejects empty input, input over the length limit, names that are empty
/// after trimming, and names carrying a dangerous executable extension.
pub fn sanitize_entity_name(name: &str, strict: bool) -> Result<String, SecurityError> {
    if name.trim().is_empty() {
        return Err(SecurityError::EmptyEntityName);
    }

    let length = name.chars().count();
    if length > MAX_ENTITY_NAME_LEN {
        return Err(SecurityError::EntityNameTooLong {
            length,
            max: MAX_ENTITY_NAME_LEN,
        });
    }

    let replaced: String = name
        .chars()
        .map(|ch| {
            if INVALID_FILENAME_CHARS.contains(&ch) || (strict && ch.is_control()) {
                '_'
            } else {
                ch
            }
        })
        .collect();

    let trimmed = replaced.trim_matches([' ', '.']);
    if trimmed.is_empty() {
        return Err(SecurityError::EntityNameSanitizedEmpty {
            name: name.to_string(),
        });
    }

    let mut safe = trimmed.to_string();

    let stem = safe.split('.').next().unwrap_or(&safe);
    if is_reserved_device_name(stem) {
        safe.insert(0, '_');
    }

    let lower = safe.to_ascii_lowercase();
    for ext in DANGEROUS_EXTENSIONS {
        if lower.ends_with(ext) {
            return Err(SecurityError::DangerousExtension {
                name: name.to_string(),
                extension: ext.to_string(),
            });
        }
    }

    if safe.chars().count() > MAX_ENTITY_NAME_LEN {
        safe = safe.chars().take(MAX_ENTITY_NAME_LEN).collect();
    }

    Ok(safe)
}

/// Validate free-text input (model names, descriptions) against injection
/// patterns, repetition floods and binary content.
///
/// `field` names the offending parameter in the resulting error.
pub fn validate_input_security(text: &str, field: &str) -> Result<(), SecurityError> {
    for ch in text.chars() {
        if ch.is_control() && !matches!(ch, '\t' | '\n' | '\r') {
            return Err(SecurityError::BinaryContent {
                field: field.to_string(),
            });
        }
    }

    let mut run_char = None;
    let mut run_len = 0usize;
    for ch in text.chars() {
        if Some(ch) == run_char {
            run_len += 1;
            if run_len > MAX_CHAR_REPETITIONS {
                return Err(SecurityError::ExcessiveRepetition {
                    field: field.to_string(),
                    ch,
                    max: MAX_CHAR_REPETITIONS,
                });
            }
        } else {
            run_char = Some(ch);
            run_len = 1;
        }
    }

    for pattern in INJECTION_PATTERNS.iter() {
        if pattern.is_match(text) {
            return Err(SecurityError::InjectionPattern {
                field: field.to_string(),
            });
        }
    }

    Ok(())
}
