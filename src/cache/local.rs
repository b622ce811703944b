//! The local filesystem cache tier: content-addressed storage over the
//! `{cacheRoot}/tarballs/{sha}-{platform}/` layout (spec §4.3).

use super::{ArtifactMetadata, CacheLayout, CacheTier, KeyedLocks, PackageId, TarballArtifact};
use crate::core::GitCacheError;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

/// The local, content-addressed tarball cache. Highest-priority tier in the
/// hierarchy: reads are free of network or subprocess cost.
#[derive(Clone)]
pub struct LocalCache {
    layout: Arc<CacheLayout>,
    platform: String,
    /// Recomputes sha256 on every read and fails with `IntegrityMismatch` if
    /// it doesn't match the sidecar. Off by default for speed (spec §4.3).
    verify_on_read: bool,
    /// Serializes concurrent writers for the same `PackageId` (spec §4.3).
    locks: Arc<KeyedLocks>,
}

impl LocalCache {
    /// Build a local cache tier rooted at `layout`, tagged for `platform`.
    #[must_use]
    pub fn new(layout: Arc<CacheLayout>, platform: String, locks: Arc<KeyedLocks>) -> Self {
        Self {
            layout,
            platform,
            verify_on_read: false,
            locks,
        }
    }

    /// Enable `verifyOnRead` integrity checking.
    #[must_use]
    pub fn with_verify_on_read(mut self, verify: bool) -> Self {
        self.verify_on_read = verify;
        self
    }

    fn artifact_dir(&self, id: &PackageId) -> std::path::PathBuf {
        self.layout.artifact_dir(id.commit_sha(), &self.platform)
    }

    fn tarball_path(&self, id: &PackageId) -> std::path::PathBuf {
        self.artifact_dir(id).join("package.tgz")
    }

    fn metadata_path(&self, id: &PackageId) -> std::path::PathBuf {
        self.artifact_dir(id).join("metadata.json")
    }

    /// Returns the tarball path and parsed sidecar metadata for `id`, if
    /// present and non-empty on disk.
    pub fn lookup(&self, id: &PackageId) -> Option<TarballArtifact> {
        let tarball = self.tarball_path(id);
        let meta_path = self.metadata_path(id);
        let size = std::fs::metadata(&tarball).ok()?.len();
        if size == 0 {
            return None;
        }
        let metadata: ArtifactMetadata = crate::utils::fs::read_json(&meta_path).ok()?;
        Some(TarballArtifact {
            dir: self.artifact_dir(id),
            metadata,
        })
    }

    /// Reads `package.tgz` bytes for `id`, optionally verifying integrity
    /// against the sidecar when `verifyOnRead` is enabled.
    pub fn read_bytes(&self, id: &PackageId) -> Result<Vec<u8>> {
        let artifact = self
            .lookup(id)
            .ok_or_else(|| GitCacheError::PackageNotFound {
                package_id: id.as_key(),
            })?;
        let bytes = std::fs::read(artifact.tarball_path())
            .with_context(|| format!("failed to read tarball for {id}"))?;

        if self.verify_on_read {
            let actual = crate::utils::fs::sha256_hex(&bytes);
            if actual != artifact.metadata.integrity {
                return Err(GitCacheError::IntegrityMismatch {
                    package_id: id.as_key(),
                    expected: artifact.metadata.integrity,
                    actual,
                }
                .into());
            }
        }

        Ok(bytes)
    }

    /// Writes `bytes` under `id`, atomically, along with a sidecar
    /// `metadata.json`. Concurrent writers for the same key are serialized.
    pub async fn write_bytes(&self, id: &PackageId, bytes: &[u8]) -> Result<()> {
        let _guard = self.locks.acquire(&id.as_key()).await;
        self.write_bytes_locked(id, bytes)
    }

    fn write_bytes_locked(&self, id: &PackageId, bytes: &[u8]) -> Result<()> {
        let dir = self.artifact_dir(id);
        crate::utils::fs::ensure_dir(&dir)?;

        let tarball_path = dir.join("package.tgz");
        crate::utils::fs::atomic_write(&tarball_path, bytes)?;

        let metadata = ArtifactMetadata {
            git_url: id.git_url().to_string(),
            commit_sha: id.commit_sha().to_string(),
            platform: self.platform.clone(),
            integrity: crate::utils::fs::sha256_hex(bytes),
            build_time: chrono::Utc::now(),
            size: bytes.len() as u64,
        };
        crate::utils::fs::write_json_atomic(&dir.join("metadata.json"), &metadata)?;

        Ok(())
    }

    /// Removes the entire `tarballs/` subtree.
    pub fn clear_sync(&self) -> Result<()> {
        crate::utils::fs::remove_dir_all_if_exists(&self.layout.tarballs_dir())
    }

    /// The cache root directory backing this tier.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.layout.root()
    }
}

#[async_trait::async_trait]
impl CacheTier for LocalCache {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn has(&self, id: &PackageId) -> bool {
        self.lookup(id).is_some()
    }

    async fn get(&self, id: &PackageId) -> Result<Vec<u8>> {
        self.read_bytes(id)
    }

    async fn store(&self, id: &PackageId, bytes: &[u8]) -> Result<()> {
        self.write_bytes(id, bytes).await
    }

    async fn clear(&self) -> Result<()> {
        self.clear_sync()
    }
}
