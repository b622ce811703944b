//! Type-safe Git command builder, adapted from the teacher's fluent
//! command-execution API but trimmed to the operations gitcache needs:
//! shallow clone with depth fallback, full fetch, detached-HEAD checkout,
//! and `ls-remote`. No worktree machinery — gitcache clones into disposable
//! scratch directories rather than juggling worktrees off a shared bare repo.

use crate::core::GitCacheError;
use anyhow::{Context, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Builder for a single Git invocation with consistent timeout and error handling.
pub struct GitCommand {
    args: Vec<String>,
    current_dir: Option<std::path::PathBuf>,
    timeout_duration: Option<Duration>,
    clone_url: Option<String>,
}

impl Default for GitCommand {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            current_dir: None,
            timeout_duration: Some(Duration::from_secs(120)),
            clone_url: None,
        }
    }
}

impl GitCommand {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// Shallow clone at `depth`, suppressing hooks and recursing into submodules off.
    #[must_use]
    pub fn clone_shallow(url: &str, target: impl AsRef<Path>, depth: u32) -> Self {
        let mut cmd = Self::new().args([
            "clone",
            "--depth",
            &depth.to_string(),
            "--no-tags",
            "--single-branch",
            "-c",
            "core.hooksPath=/dev/null",
        ]);
        cmd.args.push(url.to_string());
        cmd.args.push(target.as_ref().display().to_string());
        cmd.clone_url = Some(url.to_string());
        cmd.timeout_duration = Some(Duration::from_secs(180));
        cmd
    }

    /// Full (unshallowed) clone, used as the fallback when the shallow clone
    /// doesn't reach the requested commit (spec §4.6).
    #[must_use]
    pub fn clone_full(url: &str, target: impl AsRef<Path>) -> Self {
        let mut cmd = Self::new().args(["clone", "-c", "core.hooksPath=/dev/null"]);
        cmd.args.push(url.to_string());
        cmd.args.push(target.as_ref().display().to_string());
        cmd.clone_url = Some(url.to_string());
        cmd.timeout_duration = Some(Duration::from_secs(180));
        cmd
    }

    /// `git fetch origin <sha> --depth 1` into an already-cloned shallow repo,
    /// used when the initial shallow clone didn't contain the target commit.
    #[must_use]
    pub fn fetch_commit(sha: &str) -> Self {
        Self::new().args(["fetch", "--depth", "1", "origin", sha])
    }

    #[must_use]
    pub fn checkout_detached(reference: &str) -> Self {
        Self::new().args(["checkout", "--detach", reference])
    }

    /// `git ls-remote <url>`, returning raw `<sha>\t<ref>` lines.
    #[must_use]
    pub fn ls_remote(url: &str) -> Self {
        Self::new().args(["ls-remote", url]).with_timeout(Some(Duration::from_secs(30)))
    }

    pub async fn execute(self) -> Result<GitCommandOutput> {
        let git_command = crate::utils::platform::get_git_command();
        let mut cmd = Command::new(git_command);

        let mut full_args = Vec::new();
        if let Some(ref dir) = self.current_dir {
            full_args.push("-C".to_string());
            full_args.push(dir.display().to_string());
        }
        full_args.extend(self.args.clone());

        cmd.args(&full_args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!(target: "git", "running: {} {}", git_command, full_args.join(" "));

        let output_future = cmd.output();
        let output = if let Some(duration) = self.timeout_duration {
            match timeout(duration, output_future).await {
                Ok(result) => {
                    result.with_context(|| format!("failed to execute git {}", full_args.join(" ")))?
                }
                Err(_) => {
                    return Err(GitCacheError::Io {
                        operation: format!("git {} (timed out)", full_args.join(" ")),
                        source: std::io::Error::new(std::io::ErrorKind::TimedOut, "git command timed out"),
                    }
                    .into());
                }
            }
        } else {
            output_future
                .await
                .with_context(|| format!("failed to execute git {}", full_args.join(" ")))?
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(anyhow::anyhow!(
                "git {} failed: {}",
                full_args.join(" "),
                stderr.trim()
            ));
        }

        Ok(GitCommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    pub async fn execute_stdout(self) -> Result<String> {
        Ok(self.execute().await?.stdout.trim().to_string())
    }

    pub async fn execute_success(self) -> Result<()> {
        self.execute().await?;
        Ok(())
    }
}

pub struct GitCommandOutput {
    pub stdout: String,
    pub stderr: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_shallow_includes_depth_and_url() {
        let cmd = GitCommand::clone_shallow("https://example.com/r.git", "/tmp/r", 50);
        assert!(cmd.args.contains(&"--depth".to_string()));
        assert!(cmd.args.contains(&"50".to_string()));
        assert_eq!(cmd.clone_url.as_deref(), Some("https://example.com/r.git"));
    }

    #[test]
    fn checkout_detached_uses_detach_flag() {
        let cmd = GitCommand::checkout_detached("abc123");
        assert_eq!(cmd.args, vec!["checkout", "--detach", "abc123"]);
    }

    #[test]
    fn ls_remote_has_short_timeout() {
        let cmd = GitCommand::ls_remote("https://example.com/r.git");
        assert_eq!(cmd.timeout_duration, Some(Duration::from_secs(30)));
    }
}
