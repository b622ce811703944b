//! Small filesystem helpers shared across the cache tiers and the builder.
//!
//! The write path follows the teacher's atomic-write strategy throughout:
//! write to a sibling temp file, `sync_all`, then rename. Readers never
//! observe a partially-written tarball or sidecar (spec §5, "Shared-resource
//! policy").

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Creates a directory and all of its parents if they don't already exist.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Atomically writes bytes to `path` using a write-to-temp-then-rename
/// strategy, so concurrent readers never see a half-written file.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    use std::io::Write;

    let safe_path = crate::utils::platform::windows_long_path(path);
    if let Some(parent) = safe_path.parent() {
        ensure_dir(parent)?;
    }

    // Unique suffix: two concurrent writers for different keys must not
    // collide on the same temp path even if they share a parent directory.
    let temp_path = safe_path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4()));

    {
        let mut file = fs::File::create(&temp_path)
            .with_context(|| format!("failed to create temp file: {}", temp_path.display()))?;
        file.write_all(content)
            .with_context(|| format!("failed to write temp file: {}", temp_path.display()))?;
        file.sync_all().context("failed to sync temp file to disk")?;
    }

    fs::rename(&temp_path, &safe_path).with_context(|| {
        format!(
            "failed to rename {} to {}",
            temp_path.display(),
            safe_path.display()
        )
    })?;

    Ok(())
}

/// Serializes `value` as pretty JSON and writes it atomically.
pub fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).context("failed to serialize JSON")?;
    atomic_write(path, &bytes)
}

/// Reads and parses a JSON file.
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse JSON: {}", path.display()))
}

/// Computes `sha256:<hex>` over a file's bytes.
pub fn sha256_file(path: &Path) -> Result<String> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read: {}", path.display()))?;
    Ok(sha256_hex(&bytes))
}

/// Computes `sha256:<hex>` over an in-memory byte slice.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

/// Removes a directory tree if it exists; a no-op otherwise.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("failed to remove directory: {}", path.display()))?;
    }
    Ok(())
}
