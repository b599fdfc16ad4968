//! Cache key derivation.
//!
//! A cache key must distinguish the same path served through different
//! strategies while staying a safe flat string. The location and strategy
//! are hashed; a readable prefix derived from the path's last component is
//! kept for debugging.

use std::path::Path;

use sha2::{Digest, Sha256};

/// Maximum length of the readable prefix.
const SLUG_LEN: usize = 48;

/// Build the cache key for a model path and strategy.
///
/// Key shape: `<slug>_<sha256(path|strategy)>`. Identical (path, strategy)
/// pairs always yield the identical key.
pub fn cache_key(path: &Path, strategy_name: &str) -> String {
    let slug: String = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string())
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(SLUG_LEN)
        .collect();

    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    hasher.update(b"|");
    hasher.update(strategy_name.as_bytes());
    let digest = format!("{:x}", hasher.finalize());

    format!("{}_{}", slug, digest)
}
