//! Resolves symbolic Git references (tags, branches, `HEAD`) to commit SHAs.
//!
//! Mirrors the teacher's `GitRepo::resolve_to_sha` priority order (tag over
//! branch over literal ref) but works entirely off `git ls-remote` output so
//! no clone is needed before resolution (spec §4.2). Resolution runs over a
//! bounded worker pool via `buffer_unordered`, the same pattern the teacher
//! uses in `installer::execute_parallel_installation`.

use crate::core::GitCacheError;
use crate::git::{self, RemoteRef};
use anyhow::Result;
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tokio::time::timeout;

/// Default bound on concurrent `ls-remote` calls (spec §4.2).
pub const DEFAULT_MAX_PARALLEL: usize = 8;

/// Per-item resolution timeout; a slow remote never blocks the whole batch.
const RESOLVE_TIMEOUT: Duration = Duration::from_secs(30);

/// One item to resolve: a repository URL and the symbolic reference recorded
/// in the lockfile (tag, branch, or already-a-SHA).
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub git_url: String,
    pub reference: String,
}

/// The outcome of resolving a single [`ResolveRequest`]. Always returned
/// (never an `Err` at the batch level) — per-item failures are recorded here
/// so the caller can proceed without the dependency's acceleration rather
/// than aborting the whole install (spec §4.2, "never fatal").
#[derive(Debug, Clone)]
pub struct ResolveOutcome {
    pub request: ResolveRequest,
    pub result: std::result::Result<String, String>,
}

/// Resolves `reference` against `git_url` to a 40-character lowercase commit
/// SHA.
///
/// - An already-40-hex-char reference passes through unchanged (no network
///   call).
/// - A 7–39 character hex string is rejected outright: short SHAs are
///   ambiguous without a local object database and gitcache never maintains
///   one solely to disambiguate them (spec §9, Open Question (b)).
/// - Otherwise, `git ls-remote` is consulted and candidates are preferred in
///   order: `refs/tags/<reference>`, `refs/heads/<reference>`, `HEAD`
///   (for the empty/`HEAD` reference), then any ref whose last path segment
///   equals `reference`.
pub async fn resolve_reference(git_url: &str, reference: &str) -> Result<String> {
    if is_full_sha(reference) {
        return Ok(reference.to_lowercase());
    }
    if is_short_sha(reference) {
        return Err(GitCacheError::ReferenceUnresolvable {
            git_url: git_url.to_string(),
            reference: reference.to_string(),
        }
        .into());
    }

    let refs = timeout(RESOLVE_TIMEOUT, git::ls_remote(git_url))
        .await
        .map_err(|_| GitCacheError::ReferenceUnresolvable {
            git_url: git_url.to_string(),
            reference: reference.to_string(),
        })??;

    pick_sha(&refs, reference).ok_or_else(|| {
        GitCacheError::ReferenceUnresolvable {
            git_url: git_url.to_string(),
            reference: reference.to_string(),
        }
        .into()
    })
}

fn is_full_sha(s: &str) -> bool {
    s.len() == 40 && s.chars().all(|c| c.is_ascii_hexdigit())
}

fn is_short_sha(s: &str) -> bool {
    (7..40).contains(&s.len()) && s.chars().all(|c| c.is_ascii_hexdigit())
}

fn pick_sha(refs: &[RemoteRef], reference: &str) -> Option<String> {
    let tag_ref = format!("refs/tags/{reference}");
    let head_ref = format!("refs/heads/{reference}");

    if let Some(r) = refs.iter().find(|r| r.ref_name == tag_ref) {
        return Some(r.sha.clone());
    }
    if let Some(r) = refs.iter().find(|r| r.ref_name == head_ref) {
        return Some(r.sha.clone());
    }
    if reference.is_empty() || reference.eq_ignore_ascii_case("head") {
        if let Some(r) = refs.iter().find(|r| r.ref_name == "HEAD") {
            return Some(r.sha.clone());
        }
    }
    refs.iter()
        .find(|r| r.ref_name.rsplit('/').next() == Some(reference))
        .map(|r| r.sha.clone())
}

/// Resolves a batch of requests concurrently, bounded by `max_parallel`.
/// Order of the returned `Vec` matches the order of `requests`.
pub async fn resolve_batch(
    requests: Vec<ResolveRequest>,
    max_parallel: usize,
) -> Vec<ResolveOutcome> {
    stream::iter(requests)
        .map(|req| async move {
            let result = resolve_reference(&req.git_url, &req.reference)
                .await
                .map_err(|e| e.to_string());
            ResolveOutcome {
                request: req,
                result,
            }
        })
        .buffer_unordered(max_parallel.max(1))
        .collect::<Vec<_>>()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rref(sha: &str, name: &str) -> RemoteRef {
        RemoteRef {
            sha: sha.to_string(),
            ref_name: name.to_string(),
        }
    }

    #[test]
    fn full_sha_is_recognized() {
        assert!(is_full_sha(&"a".repeat(40)));
        assert!(!is_full_sha(&"a".repeat(39)));
        assert!(!is_full_sha(&"z".repeat(40)));
    }

    #[test]
    fn short_sha_range_is_seven_to_thirty_nine() {
        assert!(is_short_sha(&"a".repeat(7)));
        assert!(is_short_sha(&"a".repeat(39)));
        assert!(!is_short_sha(&"a".repeat(6)));
        assert!(!is_short_sha(&"a".repeat(40)));
    }

    #[test]
    fn pick_sha_prefers_tag_over_branch() {
        let sha_tag = "a".repeat(40);
        let sha_branch = "b".repeat(40);
        let refs = vec![
            rref(&sha_branch, "refs/heads/v1"),
            rref(&sha_tag, "refs/tags/v1"),
        ];
        assert_eq!(pick_sha(&refs, "v1"), Some(sha_tag));
    }

    #[test]
    fn pick_sha_falls_back_to_suffix_match() {
        let sha = "c".repeat(40);
        let refs = vec![rref(&sha, "refs/heads/feature/foo")];
        assert_eq!(pick_sha(&refs, "foo"), Some(sha));
    }

    #[test]
    fn pick_sha_returns_none_when_nothing_matches() {
        let refs = vec![rref(&"a".repeat(40), "refs/heads/main")];
        assert_eq!(pick_sha(&refs, "missing"), None);
    }

    #[tokio::test]
    async fn resolve_reference_passes_through_full_sha_without_network() {
        let sha = "d".repeat(40);
        let resolved = resolve_reference("https://example.invalid/repo.git", &sha)
            .await
            .unwrap();
        assert_eq!(resolved, sha);
    }

    #[tokio::test]
    async fn resolve_reference_rejects_short_sha() {
        let err = resolve_reference("https://example.invalid/repo.git", "abc1234")
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<GitCacheError>().is_some());
    }
}
