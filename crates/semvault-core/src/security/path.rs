//! Path validation and sanitization.
//!
//! Rejects traversal sequences, forbidden characters, reserved device names
//! and over-long paths before any filesystem access, then returns the
//! lexically normalized absolute path.

use std::path::{Component, Path, PathBuf};

use unicode_normalization::UnicodeNormalization;

use super::{is_reserved_device_name, SecurityError};

/// Maximum path length in characters (classic Windows MAX_PATH).
pub const MAX_PATH_LEN: usize = 260;

/// Maximum path length when extended-length paths are allowed.
pub const MAX_EXTENDED_PATH_LEN: usize = 32767;

/// Maximum length of a single path segment.
pub const MAX_SEGMENT_LEN: usize = 255;

/// Characters that are never valid in a path on any supported filesystem.
const FORBIDDEN_PATH_CHARS: [char; 6] = ['<', '>', '"', '|', '?', '*'];

/// Validate a model path and return its normalized absolute form.
///
/// The input must already be absolute; relative paths fail. The returned
/// path is Unicode NFC-normalized and lexically resolved (no `.` segments).
///
/// # Errors
///
/// Returns a [`SecurityError`] when the path is empty, too long, contains a
/// traversal sequence (`..` or `~`, including percent-encoded forms), a
/// forbidden or control character, or a reserved device name as its final
/// segment.
pub fn validate_and_sanitize_path(
    path: &Path,
    allow_extended: bool,
) -> Result<PathBuf, SecurityError> {
    let raw = path.to_str().ok_or(SecurityError::InvalidEncoding)?;
    if raw.trim().is_empty() {
        return Err(SecurityError::EmptyPath);
    }

    // Canonical composed form so visually identical paths compare equal.
    let normalized: String = raw.nfc().collect();

    let max = if allow_extended {
        MAX_EXTENDED_PATH_LEN
    } else {
        MAX_PATH_LEN
    };
    let length = normalized.chars().count();
    if length > max {
        return Err(SecurityError::PathTooLong { length, max });
    }

    check_traversal(&normalized)?;
    check_traversal(&percent_decode(&normalized))?;

    for (index, ch) in normalized.chars().enumerate() {
        if ch.is_control() {
            return Err(SecurityError::ForbiddenPathCharacter { ch });
        }
        if FORBIDDEN_PATH_CHARS.contains(&ch) {
            return Err(SecurityError::ForbiddenPathCharacter { ch });
        }
        // Colon is only valid as a Windows drive separator.
        if ch == ':' && index != 1 {
            return Err(SecurityError::ForbiddenPathCharacter { ch });
        }
    }

    let segments: Vec<&str> = normalized
        .split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .collect();
    for segment in &segments {
        let seg_len = segment.chars().count();
        if seg_len > MAX_SEGMENT_LEN {
            return Err(SecurityError::SegmentTooLong {
                segment: segment.chars().take(32).collect(),
                max: MAX_SEGMENT_LEN,
            });
        }
    }

    if let Some(last) = segments.last() {
        let stem = last.split('.').next().unwrap_or(last);
        if is_reserved_device_name(stem) {
            return Err(SecurityError::ReservedDeviceName {
                name: (*last).to_string(),
            });
        }
    }

    let candidate = Path::new(&normalized);
    if !candidate.is_absolute() {
        return Err(SecurityError::RelativePath);
    }

    Ok(lexical_normalize(candidate))
}

/// Check whether `child` equals or descends from `parent` once both are
/// fully resolved.
///
/// Existing paths are canonicalized (symlinks resolved) so a link cannot be
/// used to escape the parent; non-existent paths fall back to lexical
/// resolution.
pub fn is_path_within_directory(parent: &Path, child: &Path) -> bool {
    let parent = resolve_for_comparison(parent);
    let child = resolve_for_comparison(child);
    child.starts_with(&parent)
}

fn resolve_for_comparison(path: &Path) -> PathBuf {
    match path.canonicalize() {
        Ok(resolved) => resolved,
        Err(_) => {
            let absolute = if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            };
            lexical_normalize(&absolute)
        }
    }
}

/// Reject `..` and `~` wherever they appear.
fn check_traversal(path: &str) -> Result<(), SecurityError> {
    if path.contains("..") || path.contains('~') {
        return Err(SecurityError::PathTraversal);
    }
    Ok(())
}

/// Decode `%XX` escapes so encoded traversal sequences are caught too.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(value) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(value);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Resolve `.` components without touching the filesystem.
///
/// `..` never survives validation, so only `CurDir` needs handling here; the
/// fallback `ParentDir` pop keeps [`is_path_within_directory`] honest for
/// unvalidated inputs.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_absolute_path() {
        let result = validate_and_sanitize_path(Path::new("/data/models/sales"), false).unwrap();
        assert_eq!(result, PathBuf::from("/data/models/sales"));
    }

    #[test]
    fn test_curdir_components_removed() {
        let result = validate_and_sanitize_path(Path::new("/data/./models"), false).unwrap();
        assert_eq!(result, PathBuf::from("/data/models"));
    }

    #[test]
    fn test_empty_path_rejected() {
        let result = validate_and_sanitize_path(Path::new(""), false);
        assert!(matches!(result, Err(SecurityError::EmptyPath)));
    }

    #[test]
    fn test_relative_path_rejected() {
        let result = validate_and_sanitize_path(Path::new("models/sales"), false);
        assert!(matches!(result, Err(SecurityError::RelativePath)));
    }

    #[test]
    fn test_traversal_rejected() {
        let result = validate_and_sanitize_path(Path::new("/data/../etc/passwd"), false);
        assert!(matches!(result, Err(SecurityError::PathTraversal)));

        let result = validate_and_sanitize_path(Path::new("/data/~root"), false);
        assert!(matches!(result, Err(SecurityError::PathTraversal)));
    }

    #[test]
    fn test_percent_encoded_traversal_rejected() {
        let result = validate_and_sanitize_path(Path::new("/data/%2e%2e/etc"), false);
        assert!(matches!(result, Err(SecurityError::PathTraversal)));

        let result = validate_and_sanitize_path(Path::new("/data/%7eroot"), false);
        assert!(matches!(result, Err(SecurityError::PathTraversal)));
    }

    #[test]
    fn test_forbidden_characters_rejected() {
        for ch in ['<', '>', '"', '|', '?', '*'] {
            let path = format!("/data/mod{}els", ch);
            let result = validate_and_sanitize_path(Path::new(&path), false);
            assert!(
                matches!(result, Err(SecurityError::ForbiddenPathCharacter { .. })),
                "expected rejection for {:?}",
                ch
            );
        }
    }

    #[test]
    fn test_control_characters_rejected() {
        let result = validate_and_sanitize_path(Path::new("/data/mo\u{0001}dels"), false);
        assert!(matches!(
            result,
            Err(SecurityError::ForbiddenPathCharacter { .. })
        ));
    }

    #[test]
    fn test_colon_outside_drive_position_rejected() {
        let result = validate_and_sanitize_path(Path::new("/data/a:b"), false);
        assert!(matches!(
            result,
            Err(SecurityError::ForbiddenPathCharacter { ch: ':' })
        ));
    }

    #[test]
    fn test_reserved_device_name_rejected() {
        let result = validate_and_sanitize_path(Path::new("/data/CON"), false);
        assert!(matches!(
            result,
            Err(SecurityError::ReservedDeviceName { .. })
        ));

        // Extension is ignored when checking the stem.
        let result = validate_and_sanitize_path(Path::new("/data/nul.json"), false);
        assert!(matches!(
            result,
            Err(SecurityError::ReservedDeviceName { .. })
        ));

        // Reserved names are only checked on the final segment's stem.
        let result = validate_and_sanitize_path(Path::new("/data/console/models"), false);
        assert!(result.is_ok());
    }

    #[test]
    fn test_path_length_limits() {
        let long = format!("/{}", "a/".repeat(200));
        let result = validate_and_sanitize_path(Path::new(&long), false);
        assert!(matches!(result, Err(SecurityError::PathTooLong { .. })));

        // The same path is fine with extended limits.
        let result = validate_and_sanitize_path(Path::new(&long), true);
        assert!(result.is_ok());
    }

    #[test]
    fn test_segment_length_limit() {
        let segment = "b".repeat(MAX_SEGMENT_LEN + 1);
        let path = format!("/data/{}", segment);
        let result = validate_and_sanitize_path(Path::new(&path), true);
        assert!(matches!(result, Err(SecurityError::SegmentTooLong { .. })));
    }

    #[test]
    fn test_is_path_within_directory() {
        assert!(is_path_within_directory(
            Path::new("/data/models"),
            Path::new("/data/models/sales")
        ));
        assert!(is_path_within_directory(
            Path::new("/data/models"),
            Path::new("/data/models")
        ));
        assert!(!is_path_within_directory(
            Path::new("/data/models"),
            Path::new("/data/other")
        ));
        // Lexical escape via `..` does not fool the check.
        assert!(!is_path_within_directory(
            Path::new("/data/models"),
            Path::new("/data/models/../other")
        ));
    }

    #[test]
    fn test_is_path_within_directory_resolves_symlinks() {
        let temp = tempfile::TempDir::new().unwrap();
        let outside = temp.path().join("outside");
        let parent = temp.path().join("parent");
        std::fs::create_dir_all(&outside).unwrap();
        std::fs::create_dir_all(&parent).unwrap();

        #[cfg(unix)]
        {
            std::fs::write(outside.join("file"), b"x").unwrap();
            let link = parent.join("escape");
            std::os::unix::fs::symlink(&outside, &link).unwrap();
            assert!(!is_path_within_directory(&parent, &link.join("file")));
        }
    }
}
