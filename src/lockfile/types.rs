//! Shared data model for lockfile scanning (spec §3).

use std::path::PathBuf;

/// Which lockfile dialect a [`LockfileScanResult`] was produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockfileDialect {
    /// `package-lock.json` / `npm-shrinkwrap.json`, `lockfileVersion` 1, 2, or 3.
    Npm,
    /// `yarn.lock`, parsed best-effort (spec §9, Open Question (a)).
    Yarn,
}

/// One Git-sourced dependency discovered in the lockfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitDependency {
    /// The package name as recorded in the lockfile.
    pub name: String,
    /// The canonical `git+<scheme>://host/path.git` form of the dependency's
    /// URL, credentials stripped, no embedded ref fragment (spec §3).
    pub git_url: String,
    /// The symbolic reference (tag, branch, or commit) extracted from the
    /// lockfile entry. Empty string means "repository default branch".
    pub reference: String,
    /// The URL as declared in `package.json` (spec §3). Equal to
    /// [`Self::lockfile_url`] unless the npm SSH-to-HTTPS anomaly holds.
    pub package_json_url: String,
    /// The URL as recorded in the lockfile's own resolved entry (spec §3).
    pub lockfile_url: String,
    /// The commit SHA already baked into the lockfile entry, when the
    /// recorded reference is itself a full 40-character SHA rather than a
    /// branch or tag (spec §3). `None` when the reference still needs
    /// resolving against the remote.
    pub resolved_sha: Option<String>,
    /// Set when the npm scanner detected a `packageJsonUrl`/`lockfileUrl`
    /// mismatch where one uses `ssh://` and the other `https://` for the
    /// same host/path (spec §4.1). When set, this is the URL gitcache
    /// actually resolves and builds from — the `https://` variant.
    pub preferred_url: Option<String>,
}

impl GitDependency {
    /// The URL gitcache should actually use for resolution and building:
    /// [`Self::preferred_url`] if the anomaly detector set one, else
    /// [`Self::git_url`], with the `git+` scheme prefix stripped so it's
    /// directly usable by the system `git` binary.
    #[must_use]
    pub fn effective_url(&self) -> String {
        self.preferred_url
            .as_deref()
            .unwrap_or(&self.git_url)
            .trim_start_matches("git+")
            .to_string()
    }
}

/// The result of scanning one lockfile for Git dependencies.
#[derive(Debug, Clone)]
pub struct LockfileScanResult {
    /// Path to the lockfile that was scanned.
    pub lockfile_path: PathBuf,
    /// Which dialect produced this result.
    pub dialect: LockfileDialect,
    /// The lockfile's own `lockfileVersion` field for npm dialects; a fixed
    /// `1` marker for `yarn.lock`'s classic format (spec §3).
    pub lockfile_version: i64,
    /// Whether any Git-sourced dependency was found (spec §3; scenario 1
    /// exercises the `false` case explicitly).
    pub has_git_dependencies: bool,
    /// Every Git-sourced dependency found. Empty for an all-registry
    /// lockfile, or for a `yarn.lock` the best-effort parser gave up on.
    pub dependencies: Vec<GitDependency>,
}
