//! The three-tier cache hierarchy: layout, shared types, and tier composition.
//!
//! This module defines the on-disk layout (content-addressed by commit SHA and
//! platform), the `CacheTier` capability every tier implements, and the
//! `CacheHierarchy` that composes them with lookup-then-propagate semantics.
//! Individual tiers live in sibling modules: [`local`] (filesystem),
//! [`keylock`] (single-flight in-process locking shared by the local tier and
//! the builder), and [`git_tier`] (build-from-source as a uniform strategy).
//! The registry tier lives in [`crate::registry`] since it is primarily an
//! HTTP client rather than cache-layout logic.

pub mod git_tier;
pub mod hierarchy;
pub mod keylock;
pub mod local;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use hierarchy::{CacheHierarchy, CacheHit};
pub use keylock::KeyedLocks;
pub use local::LocalCache;

/// The cache key used throughout the hierarchy: `<normalized-git-url>#<sha>`.
///
/// Normalization strips any `git+` scheme prefix (spec §3). The platform
/// dimension is *not* part of the key — it only appears in the filesystem
/// layout, since a tarball's content identity is the commit, not the machine
/// that built it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId {
    normalized_git_url: String,
    commit_sha: String,
}

impl PackageId {
    /// Build a `PackageId` from a `git+<scheme>://...` URL and a resolved SHA.
    #[must_use]
    pub fn new(git_url: &str, commit_sha: &str) -> Self {
        Self {
            normalized_git_url: normalize_git_url(git_url),
            commit_sha: commit_sha.to_lowercase(),
        }
    }

    /// The normalized Git URL component (no `git+` prefix).
    #[must_use]
    pub fn git_url(&self) -> &str {
        &self.normalized_git_url
    }

    /// The 40-character commit SHA component.
    #[must_use]
    pub fn commit_sha(&self) -> &str {
        &self.commit_sha
    }

    /// Canonical string form: `<normalized-git-url>#<sha>`.
    #[must_use]
    pub fn as_key(&self) -> String {
        format!("{}#{}", self.normalized_git_url, self.commit_sha)
    }

    /// The form used as a URL path segment when talking to the registry:
    /// `<packageId>` URL-encoded (spec §6).
    #[must_use]
    pub fn url_encoded(&self) -> String {
        url::form_urlencoded::byte_serialize(self.as_key().as_bytes()).collect()
    }
}

impl std::fmt::Display for PackageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_key())
    }
}

/// Strips a leading `git+` scheme prefix, per spec §3's normalization rule.
#[must_use]
pub fn normalize_git_url(url: &str) -> String {
    url.strip_prefix("git+").unwrap_or(url).to_string()
}

/// Sidecar metadata written alongside every `package.tgz` (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// The (already-normalized) Git URL this artifact was built from.
    pub git_url: String,
    /// The commit SHA this artifact corresponds to.
    pub commit_sha: String,
    /// The platform identifier (`{os}-{arch}`) this artifact was built for.
    pub platform: String,
    /// `sha256:<hex>` over `package.tgz`'s bytes.
    pub integrity: String,
    /// When the tarball was produced.
    pub build_time: chrono::DateTime<chrono::Utc>,
    /// Size of `package.tgz` in bytes.
    pub size: u64,
}

/// A tarball artifact materialized on disk: the directory containing
/// `package.tgz` and its `metadata.json` sidecar.
#[derive(Debug, Clone)]
pub struct TarballArtifact {
    /// Directory containing `package.tgz` and `metadata.json`.
    pub dir: PathBuf,
    /// Parsed sidecar metadata.
    pub metadata: ArtifactMetadata,
}

impl TarballArtifact {
    /// Path to `package.tgz` within this artifact's directory.
    #[must_use]
    pub fn tarball_path(&self) -> PathBuf {
        self.dir.join("package.tgz")
    }

    /// Path to `metadata.json` within this artifact's directory.
    #[must_use]
    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join("metadata.json")
    }
}

/// Resolves the cache root and the content-addressed layout beneath it.
///
/// ```text
/// {cacheRoot}/
///   tarballs/{sha}-{platform}/package.tgz
///   tarballs/{sha}-{platform}/metadata.json
///   git/{urlhash}.git/...        (bare mirror, see crate::builder)
/// ```
#[derive(Debug, Clone)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    /// Build a layout rooted at `root`. Callers resolve `root` via
    /// [`crate::config::cache_root`] (honoring `GITCACHE_CACHE_DIR`/`HOME`).
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The cache root directory.
    #[must_use]
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// The `tarballs/` subtree root.
    #[must_use]
    pub fn tarballs_dir(&self) -> PathBuf {
        self.root.join("tarballs")
    }

    /// Directory for a specific `(sha, platform)` artifact:
    /// `{root}/tarballs/{sha}-{platform}/`.
    #[must_use]
    pub fn artifact_dir(&self, commit_sha: &str, platform: &str) -> PathBuf {
        self.tarballs_dir().join(format!("{commit_sha}-{platform}"))
    }

    /// The `git/` subtree root, holding bare mirror clones.
    #[must_use]
    pub fn git_mirrors_dir(&self) -> PathBuf {
        self.root.join("git")
    }

    /// Bare mirror clone path for a Git URL: `{root}/git/{urlhash}.git`,
    /// where `urlhash` is the first 16 hex characters of sha256(normalized
    /// URL) (spec §6).
    #[must_use]
    pub fn git_mirror_dir(&self, git_url: &str) -> PathBuf {
        let normalized = normalize_git_url(git_url);
        let digest = crate::utils::fs::sha256_hex(normalized.as_bytes());
        // sha256_hex returns "sha256:<hex>"; keep only the hex portion.
        let hex_digest = digest.trim_start_matches("sha256:");
        let short = &hex_digest[..16.min(hex_digest.len())];
        self.git_mirrors_dir().join(format!("{short}.git"))
    }
}

/// The uniform capability every cache tier implements.
///
/// Spec §9 calls this out as the hierarchy's only dynamic-dispatch point: a
/// flat, ordered list of strategies (local filesystem, registry HTTP, Git
/// build-from-source) behind `{has, get, store, clear?}`. `clear` is
/// provided with a default no-op since only the local tier actually supports
/// it in practice (spec §4.7).
#[async_trait::async_trait]
pub trait CacheTier: Send + Sync {
    /// Human-readable tier name for diagnostics (`"local"`, `"registry"`, `"git"`).
    fn name(&self) -> &'static str;

    /// Whether this tier believes it has the artifact for `id`. Must never
    /// propagate an error — a tier that can't answer reports `false` and the
    /// hierarchy moves on to the next tier (spec §4.7).
    async fn has(&self, id: &PackageId) -> bool;

    /// Fetch the tarball bytes for `id`. Only called after `has` returned
    /// `true` for this tier.
    async fn get(&self, id: &PackageId) -> anyhow::Result<Vec<u8>>;

    /// Store `bytes` under `id`.
    async fn store(&self, id: &PackageId, bytes: &[u8]) -> anyhow::Result<()>;

    /// Drop everything this tier holds, if it supports clearing. Tiers that
    /// don't (registry, git) accept the call as a no-op.
    async fn clear(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Whether this tier is enabled for the current invocation (e.g. the
    /// registry tier is disabled when unauthenticated). `None` for tiers
    /// without an auth concept.
    fn authenticated(&self) -> Option<bool> {
        None
    }
}

/// Per-tier diagnostic snapshot returned by [`CacheHierarchy::status`].
#[derive(Debug, Clone, Serialize)]
pub struct TierStatus {
    /// Human-readable tier name (`"local"`, `"registry"`, `"git"`).
    pub name: &'static str,
    /// Whether the tier is reachable/usable for this invocation.
    pub available: bool,
    /// Whether the tier required (and has) authentication. `None` for tiers
    /// that don't have an auth concept (local, git).
    pub authenticated: Option<bool>,
}
