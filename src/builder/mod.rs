//! Builds deterministic, content-addressed tarballs directly from Git
//! (spec §4.6): the Git tier's "build-then-serve-locally" strategy.
//!
//! Each build clones into a disposable scratch directory (via a persistent
//! bare mirror to amortize repeated clones of the same repository), checks
//! out the target commit detached, then runs `npm pack --ignore-scripts`
//! against the checked-out tree so the tarball honors `package.json`'s
//! `files` field / `.npmignore` and carries the `package/`-prefixed layout
//! real npm tarballs have, with install hooks suppressed. Concurrency is
//! bounded by a semaphore (default 4, spec §4.6) and per-package builds are
//! single-flighted through [`crate::cache::KeyedLocks`] so two concurrent
//! requesters of the same `PackageId` share one build.

use crate::cache::{CacheLayout, CacheTier, KeyedLocks, LocalCache, PackageId};
use crate::core::{BuildPhase, GitCacheError};
use crate::git::GitRepo;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Depth of the initial shallow clone attempt (spec §4.6).
const SHALLOW_CLONE_DEPTH: u32 = 50;

/// Default bound on concurrent tarball builds (spec §4.6).
pub const DEFAULT_MAX_PARALLEL: usize = 4;

/// Builds `.tgz` artifacts from Git, on demand, for the Git cache tier.
pub struct TarballBuilder {
    layout: Arc<CacheLayout>,
    local: Arc<LocalCache>,
    platform: String,
    scratch_root: PathBuf,
    semaphore: Arc<Semaphore>,
    locks: Arc<KeyedLocks>,
}

impl TarballBuilder {
    #[must_use]
    pub fn new(
        layout: Arc<CacheLayout>,
        local: Arc<LocalCache>,
        platform: String,
        scratch_root: PathBuf,
        max_parallel: usize,
    ) -> Self {
        Self {
            layout,
            local,
            platform,
            scratch_root,
            semaphore: Arc::new(Semaphore::new(max_parallel.max(1))),
            locks: Arc::new(KeyedLocks::new()),
        }
    }

    /// Builds (or returns an already-built) tarball for `id`, storing the
    /// result in the local cache before returning it so a concurrent
    /// requester for the same key never triggers a second build.
    pub async fn build(&self, id: &PackageId) -> Result<Vec<u8>> {
        let _key_guard = self.locks.acquire(&id.as_key()).await;

        if let Ok(bytes) = self.local.get(id).await {
            debug!(package = %id, "build skipped, already present locally");
            return Ok(bytes);
        }

        let _permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("semaphore is never closed");

        let bytes = self.build_uncached(id).await?;
        if let Err(err) = self.local.store(id, &bytes).await {
            warn!(package = %id, error = %err, "built tarball but failed to cache it locally");
        }
        Ok(bytes)
    }

    async fn build_uncached(&self, id: &PackageId) -> Result<Vec<u8>> {
        let scratch_dir = self.scratch_root.join(format!("build-{}", uuid::Uuid::new_v4()));
        crate::utils::fs::ensure_dir(&scratch_dir)?;

        let result = self.clone_and_checkout(id, &scratch_dir).await;
        let bytes = match result {
            Ok(()) => pack_with_npm(&scratch_dir).await.map_err(|e| {
                GitCacheError::TarballBuildFailed {
                    git_url: id.git_url().to_string(),
                    commit_sha: id.commit_sha().to_string(),
                    phase: BuildPhase::Pack,
                    reason: e.to_string(),
                }
            }),
            Err(err) => Err(err),
        };

        let _ = crate::utils::fs::remove_dir_all_if_exists(&scratch_dir);
        Ok(bytes?)
    }

    async fn clone_and_checkout(&self, id: &PackageId, scratch_dir: &Path) -> Result<()> {
        let mirror_dir = self.layout.git_mirror_dir(id.git_url());
        self.ensure_mirror(id.git_url(), &mirror_dir).await?;

        let mirror_url = format!("file://{}", mirror_dir.display());
        let repo = GitRepo::clone_shallow(&mirror_url, scratch_dir, SHALLOW_CLONE_DEPTH)
            .await
            .map_err(|e| GitCacheError::TarballBuildFailed {
                git_url: id.git_url().to_string(),
                commit_sha: id.commit_sha().to_string(),
                phase: BuildPhase::Clone,
                reason: e.to_string(),
            })?;

        if repo.checkout_detached(id.commit_sha()).await.is_err() {
            // Shallow history didn't reach the commit; fetch it explicitly
            // before giving up and falling back to a full clone.
            if repo.fetch_commit(id.commit_sha()).await.is_err() {
                let full_repo =
                    GitRepo::clone_full(&mirror_url, scratch_dir).await.map_err(|e| {
                        GitCacheError::TarballBuildFailed {
                            git_url: id.git_url().to_string(),
                            commit_sha: id.commit_sha().to_string(),
                            phase: BuildPhase::Clone,
                            reason: e.to_string(),
                        }
                    })?;
                full_repo.checkout_detached(id.commit_sha()).await.map_err(|e| {
                    GitCacheError::TarballBuildFailed {
                        git_url: id.git_url().to_string(),
                        commit_sha: id.commit_sha().to_string(),
                        phase: BuildPhase::Checkout,
                        reason: e.to_string(),
                    }
                })?;
                return Ok(());
            }
            repo.checkout_detached(id.commit_sha()).await.map_err(|e| {
                GitCacheError::TarballBuildFailed {
                    git_url: id.git_url().to_string(),
                    commit_sha: id.commit_sha().to_string(),
                    phase: BuildPhase::Checkout,
                    reason: e.to_string(),
                }
            })?;
        }

        Ok(())
    }

    /// Clones a bare mirror of `git_url` on first use, or fetches updates
    /// into an existing one. The mirror is kept across builds to avoid
    /// re-cloning the full repository history for every commit requested
    /// from the same source.
    async fn ensure_mirror(&self, git_url: &str, mirror_dir: &Path) -> Result<()> {
        if mirror_dir.join("HEAD").exists() {
            crate::git::command_builder::GitCommand::new()
                .args(["fetch", "--all", "--tags", "--force"])
                .current_dir(mirror_dir)
                .execute_success()
                .await
                .context("failed to update git mirror")?;
            return Ok(());
        }

        crate::utils::fs::ensure_dir(mirror_dir.parent().unwrap_or(mirror_dir))?;
        crate::git::command_builder::GitCommand::new()
            .args(["clone", "--mirror", git_url])
            .args([mirror_dir.display().to_string()])
            .with_timeout(Some(std::time::Duration::from_secs(600)))
            .execute_success()
            .await
            .context("failed to create git mirror")
    }
}

/// Runs `npm pack --ignore-scripts` against the checked-out tree at `dir`,
/// producing the same `package/`-prefixed, `files`-filtered tarball npm
/// itself would publish, with lifecycle hooks suppressed (spec §4.6 step 3).
/// Packs into a disposable destination directory and reads the resulting
/// `.tgz` back into memory.
async fn pack_with_npm(dir: &Path) -> Result<Vec<u8>> {
    let dest_dir = dir.join(".gitcache-pack-dest");
    crate::utils::fs::ensure_dir(&dest_dir)?;

    let output = tokio::process::Command::new("npm")
        .args(["pack", "--ignore-scripts", "--json", "--pack-destination"])
        .arg(&dest_dir)
        .current_dir(dir)
        .env("npm_config_ignore_scripts", "true")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .context("failed to spawn npm pack")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("npm pack failed: {}", stderr.trim());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value =
        serde_json::from_str(&stdout).context("failed to parse npm pack --json output")?;
    let filename = parsed
        .get(0)
        .and_then(|entry| entry.get("filename"))
        .and_then(serde_json::Value::as_str)
        .context("npm pack --json output had no filename")?;

    let tarball_path = dest_dir.join(filename);
    std::fs::read(&tarball_path)
        .with_context(|| format!("failed to read packed tarball {}", tarball_path.display()))
}
