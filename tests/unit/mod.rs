//! Unit-level tests against gitcache's public API, exercising individual
//! modules in isolation (lockfile scanning, cache layout, the reference
//! resolver's SHA-passthrough path) without touching the network.

#[path = "../common/mod.rs"]
mod common;

use gitcache_cli::cache::{CacheLayout, CacheTier, KeyedLocks, LocalCache, PackageId};
use gitcache_cli::lockfile;
use gitcache_cli::resolver;
use std::sync::Arc;

#[test]
fn scan_finds_git_dependency_in_v3_lockfile() {
    let fixture = common::FixtureProject::new();
    let sha = "a".repeat(40);
    fixture.write_lockfile(&common::lockfile_with_git_dependency("left-pad", &sha));

    let result = lockfile::scan_path(&fixture.lockfile_path()).unwrap();
    assert_eq!(result.dependencies.len(), 1);
    assert_eq!(result.dependencies[0].name, "left-pad");
    assert_eq!(result.dependencies[0].reference, sha);
}

#[test]
fn scan_project_finds_no_git_dependencies_in_registry_only_lockfile() {
    let fixture = common::FixtureProject::new();
    fixture.write_lockfile(&common::lockfile_without_git_dependencies());

    let result = lockfile::scan_project(fixture.project_path()).unwrap();
    assert!(result.dependencies.is_empty());
}

#[tokio::test]
async fn resolve_reference_accepts_full_sha_without_any_network_call() {
    let sha = "b".repeat(40);
    let resolved = resolver::resolve_reference("https://example.invalid/repo.git", &sha)
        .await
        .unwrap();
    assert_eq!(resolved, sha);
}

#[tokio::test]
async fn local_cache_round_trips_through_store_and_get() {
    let dir = tempfile::tempdir().unwrap();
    let layout = Arc::new(CacheLayout::new(dir.path().to_path_buf()));
    let local = LocalCache::new(layout, "linux-x64".to_string(), Arc::new(KeyedLocks::new()));

    let id = PackageId::new("https://github.com/a/b.git", &"c".repeat(40));
    local.store(&id, b"tarball-bytes").await.unwrap();

    assert!(local.has(&id).await);
    let bytes = local.get(&id).await.unwrap();
    assert_eq!(bytes, b"tarball-bytes");
}

#[test]
fn package_id_normalizes_git_plus_prefix_and_lowercases_sha() {
    let id = PackageId::new("git+https://github.com/a/b.git", &"ABCDEF0123".repeat(4));
    assert_eq!(id.git_url(), "https://github.com/a/b.git");
    assert_eq!(id.commit_sha(), "abcdef0123".repeat(4));
    assert_eq!(id.as_key(), format!("https://github.com/a/b.git#{}", "abcdef0123".repeat(4)));
}
