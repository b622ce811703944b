//! The install orchestrator: the entry point tying every other module
//! together (spec §4.8).
//!
//! `scan → resolve → classify → fetch-or-build → spawn` runs strictly in
//! that order; each phase is wrapped so that any failure in preparation
//! degrades to a warning rather than aborting the install (spec §7,
//! "cache-tier failures never escape the hierarchy" and "preparation is
//! wrapped in a catch-all").

use crate::cache::{CacheHierarchy, CacheLayout, CacheTier, KeyedLocks, LocalCache, PackageId};
use crate::builder::TarballBuilder;
use crate::cache::git_tier::GitTier;
use crate::config::{self, AuthState};
use crate::core::GitCacheError;
use crate::lockfile::{self, GitDependency};
use crate::registry::RegistryCache;
use crate::resolver::{self, ResolveRequest};
use anyhow::Result;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tracing::{info, warn};

/// Options threaded through from the CLI (spec §B, `--max-parallel`).
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Project directory to scan for a lockfile (defaults to the cwd).
    pub project_dir: std::path::PathBuf,
    /// Bound on concurrent reference resolutions (spec §4.2 default 8).
    pub resolver_max_parallel: usize,
    /// Bound on concurrent tarball builds (spec §4.6 default 4).
    pub builder_max_parallel: usize,
    /// Extra arguments passed through verbatim to `npm install`.
    pub passthrough_args: Vec<String>,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            project_dir: std::env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from(".")),
            resolver_max_parallel: resolver::DEFAULT_MAX_PARALLEL,
            builder_max_parallel: crate::builder::DEFAULT_MAX_PARALLEL,
            passthrough_args: Vec::new(),
        }
    }
}

/// Tally of what preparation accomplished, for reporting (spec §4.8 step 4e).
#[derive(Debug, Default, Clone, Copy)]
pub struct PreparationSummary {
    pub cached: usize,
    pub fetched_or_built: usize,
    pub unresolved: usize,
    pub failed: usize,
}

/// Runs the full accelerated install and returns the child process's exit
/// code.
pub async fn install(opts: InstallOptions) -> Result<i32> {
    let cache_root = config::cache_root()?;
    let layout = Arc::new(CacheLayout::new(cache_root.clone()));
    let auth = AuthState::from_env();

    if let Err(err) = run_preparation(&layout, &auth, &opts).await {
        warn!(error = %err, "preparation failed, proceeding without acceleration");
    }

    spawn_npm_install(&opts, &cache_root).await
}

/// Builds the cache hierarchy and runs scan → resolve → classify →
/// fetch-or-build over every lockfile Git dependency.
async fn run_preparation(
    layout: &Arc<CacheLayout>,
    auth: &AuthState,
    opts: &InstallOptions,
) -> Result<()> {
    let scan = lockfile::scan_project(&opts.project_dir)?;

    if scan.dependencies.is_empty() {
        info!("lockfile has no Git dependencies, nothing to accelerate");
        return Ok(());
    }

    let hierarchy = build_hierarchy(layout, auth, opts);

    let requests: Vec<ResolveRequest> = scan
        .dependencies
        .iter()
        .map(|dep| ResolveRequest {
            git_url: dep.effective_url(),
            reference: dep.reference.clone(),
        })
        .collect();

    let outcomes = resolver::resolve_batch(requests, opts.resolver_max_parallel).await;

    let mut summary = PreparationSummary::default();

    for (dep, outcome) in scan.dependencies.iter().zip(outcomes.iter()) {
        let sha = match &outcome.result {
            Ok(sha) => sha,
            Err(reason) => {
                warn!(package = %dep.name, reference = %dep.reference, reason, "reference unresolved, skipping acceleration for this dependency");
                summary.unresolved += 1;
                continue;
            }
        };

        let id = PackageId::new(&dep.effective_url(), sha);
        match hierarchy.get(&id).await {
            Ok(Some(hit)) if hit.tier == "local" => {
                summary.cached += 1;
            }
            Ok(Some(_hit)) => {
                summary.fetched_or_built += 1;
            }
            Ok(None) => {
                warn!(package = %dep.name, %id, "no cache tier could supply this dependency");
                summary.failed += 1;
            }
            Err(err) => {
                warn!(package = %dep.name, %id, error = %err, "cache lookup failed for this dependency");
                summary.failed += 1;
            }
        }
    }

    info!(
        cached = summary.cached,
        fetched_or_built = summary.fetched_or_built,
        unresolved = summary.unresolved,
        failed = summary.failed,
        "preparation complete"
    );

    Ok(())
}

/// Builds the three-tier hierarchy: local is always present; registry is
/// included whenever an API URL is configured, regardless of whether a
/// token is present — an unauthenticated registry tier reports `has() ==
/// false` and `get()` fails with `NotAuthenticated` rather than being absent
/// from the hierarchy entirely (spec §4.4); Git is always the last resort
/// (spec §4.7).
fn build_hierarchy(
    layout: &Arc<CacheLayout>,
    auth: &AuthState,
    opts: &InstallOptions,
) -> CacheHierarchy {
    let platform = crate::utils::platform::platform_id();
    let locks = Arc::new(KeyedLocks::new());
    let local = Arc::new(LocalCache::new(layout.clone(), platform.clone(), locks.clone()));

    let mut tiers: Vec<Arc<dyn CacheTier>> = vec![local.clone()];

    if let Some(api_url) = auth.api_url.clone() {
        let registry = Arc::new(RegistryCache::new(api_url, auth.token.clone().unwrap_or_default()));
        tiers.push(registry);
    }

    let scratch_root = layout.root().join("scratch");
    let builder = Arc::new(TarballBuilder::new(
        layout.clone(),
        local,
        platform,
        scratch_root,
        opts.builder_max_parallel,
    ));
    tiers.push(Arc::new(GitTier::new(builder)));

    CacheHierarchy::new(tiers)
}

/// Spawns `npm install` with the cache root injected via
/// `npm_config_cache`/`NPM_CONFIG_CACHE` (spec §4.8 step 6, §6).
async fn spawn_npm_install(opts: &InstallOptions, cache_root: &Path) -> Result<i32> {
    let mut command = tokio::process::Command::new("npm");
    command
        .arg("install")
        .args(&opts.passthrough_args)
        .current_dir(&opts.project_dir)
        .env("npm_config_cache", cache_root)
        .env("NPM_CONFIG_CACHE", cache_root)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    let status = command.status().await.map_err(|e| GitCacheError::Io {
        operation: "spawning npm install".to_string(),
        source: e,
    })?;

    // A concrete exit code (zero or not) is returned as-is: per spec §6 the
    // orchestrator's own exit code *is* the child's on install failure, it
    // does not collapse to a generic failure. Only the signal-killed case
    // (no exit code at all) is treated as the orchestrator's own error.
    match status.code() {
        Some(code) => Ok(code),
        None => Err(GitCacheError::ChildInstallFailed { exit_code: -1 }.into()),
    }
}

/// Scans the lockfile's Git dependencies for the packageJson/lockfile SSH-to-
/// HTTPS anomaly already recorded on each [`GitDependency`] (spec §4.2), for
/// reporting.
#[must_use]
pub fn anomalous_dependencies(deps: &[GitDependency]) -> Vec<&GitDependency> {
    deps.iter().filter(|d| d.preferred_url.is_some()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_use_spec_defaults() {
        let opts = InstallOptions::default();
        assert_eq!(opts.resolver_max_parallel, 8);
        assert_eq!(opts.builder_max_parallel, 4);
    }

    #[test]
    fn anomalous_dependencies_filters_on_preferred_url() {
        let plain = GitDependency {
            name: "a".into(),
            git_url: "git+https://host/a.git".into(),
            reference: "main".into(),
            package_json_url: "git+https://host/a.git".into(),
            lockfile_url: "git+https://host/a.git".into(),
            resolved_sha: None,
            preferred_url: None,
        };
        let anomalous = GitDependency {
            name: "b".into(),
            git_url: "git+ssh://host/b.git".into(),
            reference: "main".into(),
            package_json_url: "git+ssh://host/b.git".into(),
            lockfile_url: "git+ssh://host/b.git".into(),
            resolved_sha: None,
            preferred_url: Some("git+https://host/b.git".into()),
        };
        let found = anomalous_dependencies(&[plain, anomalous]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "b");
    }
}
