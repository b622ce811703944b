//! Git operations wrapper for gitcache.
//!
//! Trimmed from the teacher's `GitRepo` to the operations the tarball builder
//! and reference resolver need: shallow clone with full-clone fallback,
//! detached-HEAD checkout, and `ls-remote`-based reference resolution. Uses
//! the system `git` binary (not libgit2) for credential-helper and
//! platform compatibility, same as the teacher.

pub mod command_builder;

use crate::git::command_builder::GitCommand;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// A local Git working copy, created via [`GitRepo::clone_shallow`].
#[derive(Debug, Clone)]
pub struct GitRepo {
    path: PathBuf,
}

impl GitRepo {
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Shallow-clones `url` at `depth` into `target`. Per spec §4.6, callers
    /// fall back to [`Self::clone_full`] if the target commit isn't reachable
    /// from the shallow history.
    pub async fn clone_shallow(url: &str, target: impl AsRef<Path>, depth: u32) -> Result<Self> {
        GitCommand::clone_shallow(url, target.as_ref(), depth)
            .execute_success()
            .await
            .with_context(|| format!("shallow clone of {url} failed"))?;
        Ok(Self::new(target))
    }

    /// Full clone, used when the shallow history doesn't contain the commit.
    pub async fn clone_full(url: &str, target: impl AsRef<Path>) -> Result<Self> {
        GitCommand::clone_full(url, target.as_ref())
            .execute_success()
            .await
            .with_context(|| format!("full clone of {url} failed"))?;
        Ok(Self::new(target))
    }

    /// Attempts to fetch a specific commit into an already shallow-cloned
    /// repository, for repositories whose default shallow depth didn't reach
    /// the requested SHA but whose host supports fetching by commit.
    pub async fn fetch_commit(&self, sha: &str) -> Result<()> {
        GitCommand::fetch_commit(sha)
            .current_dir(&self.path)
            .execute_success()
            .await
            .with_context(|| format!("fetch of commit {sha} failed"))
    }

    /// Checks out `reference` (a commit SHA) into a detached HEAD.
    pub async fn checkout_detached(&self, reference: &str) -> Result<()> {
        GitCommand::checkout_detached(reference)
            .current_dir(&self.path)
            .execute_success()
            .await
            .with_context(|| format!("checkout of {reference} failed"))
    }
}

/// One `<sha>\t<ref>` line from `git ls-remote`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRef {
    pub sha: String,
    pub ref_name: String,
}

/// Runs `git ls-remote <url>` and parses every advertised ref. Used by the
/// reference resolver; never consults a local mirror clone (spec §9, Open
/// Question (b)).
pub async fn ls_remote(url: &str) -> Result<Vec<RemoteRef>> {
    let stdout = GitCommand::ls_remote(url)
        .execute_stdout()
        .await
        .with_context(|| format!("ls-remote failed for {url}"))?;

    Ok(stdout
        .lines()
        .filter_map(|line| {
            let mut parts = line.splitn(2, '\t');
            let sha = parts.next()?.trim();
            let ref_name = parts.next()?.trim();
            if sha.len() == 40 && sha.chars().all(|c| c.is_ascii_hexdigit()) {
                Some(RemoteRef {
                    sha: sha.to_lowercase(),
                    ref_name: ref_name.to_string(),
                })
            } else {
                None
            }
        })
        .collect())
}

/// Checks if Git is installed and accessible on the system.
#[must_use]
pub fn is_git_installed() -> bool {
    std::process::Command::new(crate::utils::platform::get_git_command())
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
