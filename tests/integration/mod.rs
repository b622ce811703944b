//! CLI-level integration tests, invoking the built `gitcache` binary the way
//! a user would.

#[path = "../common/mod.rs"]
mod common;

use assert_cmd::Command;
use predicates::prelude::*;

fn gitcache() -> Command {
    Command::cargo_bin("gitcache").expect("gitcache binary should build")
}

#[test]
fn cache_path_reports_the_overridden_cache_dir() {
    let fixture = common::FixtureProject::new();

    gitcache()
        .arg("cache")
        .arg("path")
        .env("GITCACHE_CACHE_DIR", fixture.cache_path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            fixture.cache_path().display().to_string(),
        ));
}

#[test]
fn cache_clear_succeeds_on_an_empty_cache() {
    let fixture = common::FixtureProject::new();

    gitcache()
        .arg("cache")
        .arg("clear")
        .env("GITCACHE_CACHE_DIR", fixture.cache_path())
        .assert()
        .success();
}

#[test]
fn install_skips_preparation_and_still_runs_npm_when_no_lockfile_present() {
    if !gitcache_cli::utils::platform::command_exists("npm") {
        eprintln!("skipping: npm not available in this environment");
        return;
    }

    let fixture = common::FixtureProject::new();
    // No package.json at all: `npm install` itself will fail, but gitcache's
    // own preparation step must not be what fails it (spec §7: lockfile
    // absence only skips preparation, it is not an orchestrator-fatal error).
    gitcache()
        .arg("install")
        .arg("--dir")
        .arg(fixture.project_path())
        .env("GITCACHE_CACHE_DIR", fixture.cache_path())
        .assert()
        .failure();
}
