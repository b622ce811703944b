//! Slow, manually-run stress tests exercising the properties from spec §8:
//! build determinism and single-flight under real concurrency against a
//! real (local) Git repository. Ignored by default; run with
//! `cargo test --test stress -- --ignored`.

use gitcache_cli::builder::TarballBuilder;
use gitcache_cli::cache::{CacheLayout, KeyedLocks, LocalCache, PackageId};
use std::process::Command;
use std::sync::Arc;

fn init_repo_with_one_commit(dir: &std::path::Path) -> String {
    let run = |args: &[&str]| {
        let status = Command::new("git")
            .args(args)
            .current_dir(dir)
            .status()
            .expect("git should be installed");
        assert!(status.success(), "git {args:?} failed");
    };

    run(&["init", "-q"]);
    run(&["config", "user.email", "test@example.com"]);
    run(&["config", "user.name", "test"]);
    std::fs::write(dir.join("package.json"), br#"{"name":"fixture","version":"1.0.0"}"#).unwrap();
    run(&["add", "."]);
    run(&["commit", "-q", "-m", "initial"]);

    let output = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(dir)
        .output()
        .unwrap();
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

#[tokio::test]
#[ignore]
async fn concurrent_requesters_for_the_same_package_trigger_one_build() {
    let repo_dir = tempfile::tempdir().unwrap();
    let sha = init_repo_with_one_commit(repo_dir.path());
    let repo_url = format!("file://{}", repo_dir.path().display());

    let cache_dir = tempfile::tempdir().unwrap();
    let layout = Arc::new(CacheLayout::new(cache_dir.path().to_path_buf()));
    let local = Arc::new(LocalCache::new(
        layout.clone(),
        "linux-x64".to_string(),
        Arc::new(KeyedLocks::new()),
    ));
    let builder = Arc::new(TarballBuilder::new(
        layout,
        local,
        "linux-x64".to_string(),
        cache_dir.path().join("scratch"),
        4,
    ));

    let id = PackageId::new(&repo_url, &sha);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let builder = builder.clone();
        let id = id.clone();
        handles.push(tokio::spawn(async move { builder.build(&id).await.unwrap() }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    let first = &results[0];
    assert!(results.iter().all(|r| r == first), "every concurrent build must return identical bytes");
}

#[test]
#[ignore]
fn sequential_builds_of_the_same_commit_are_byte_identical() {
    let repo_dir = tempfile::tempdir().unwrap();
    let sha = init_repo_with_one_commit(repo_dir.path());
    let repo_url = format!("file://{}", repo_dir.path().display());

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let build_once = |cache_dir: &std::path::Path| {
        let layout = Arc::new(CacheLayout::new(cache_dir.to_path_buf()));
        let local = Arc::new(LocalCache::new(
            layout.clone(),
            "linux-x64".to_string(),
            Arc::new(KeyedLocks::new()),
        ));
        let builder = TarballBuilder::new(
            layout,
            local,
            "linux-x64".to_string(),
            cache_dir.join("scratch"),
            1,
        );
        let id = PackageId::new(&repo_url, &sha);
        runtime.block_on(builder.build(&id)).unwrap()
    };

    let cache_a = tempfile::tempdir().unwrap();
    let cache_b = tempfile::tempdir().unwrap();
    let bytes_a = build_once(cache_a.path());
    let bytes_b = build_once(cache_b.path());

    assert_eq!(bytes_a, bytes_b);
}
