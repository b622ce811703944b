//! Shared test fixtures: temp project directories with a lockfile, and a
//! scratch cache root isolated from the real `$HOME/.gitcache`.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temp directory holding a `package-lock.json` with one or more Git
/// dependencies, plus an isolated cache root.
pub struct FixtureProject {
    pub project_dir: TempDir,
    pub cache_dir: TempDir,
}

impl FixtureProject {
    pub fn new() -> Self {
        Self {
            project_dir: tempfile::tempdir().expect("create project dir"),
            cache_dir: tempfile::tempdir().expect("create cache dir"),
        }
    }

    pub fn write_lockfile(&self, contents: &str) {
        std::fs::write(self.lockfile_path(), contents).expect("write lockfile");
    }

    pub fn lockfile_path(&self) -> PathBuf {
        self.project_dir.path().join("package-lock.json")
    }

    pub fn project_path(&self) -> &Path {
        self.project_dir.path()
    }

    pub fn cache_path(&self) -> &Path {
        self.cache_dir.path()
    }
}

/// A minimal v3 lockfile with a single Git dependency pinned to a full SHA,
/// so reference resolution never needs the network.
pub fn lockfile_with_git_dependency(name: &str, sha: &str) -> String {
    format!(
        r#"{{
  "name": "fixture",
  "lockfileVersion": 3,
  "packages": {{
    "": {{ "name": "fixture" }},
    "node_modules/{name}": {{
      "resolved": "git+https://github.com/example/{name}.git#{sha}"
    }}
  }}
}}"#
    )
}

/// A lockfile with no Git dependencies at all.
pub fn lockfile_without_git_dependencies() -> String {
    r#"{
  "name": "fixture",
  "lockfileVersion": 3,
  "packages": {
    "": { "name": "fixture" },
    "node_modules/left-pad": {
      "resolved": "https://registry.npmjs.org/left-pad/-/left-pad-1.3.0.tgz",
      "integrity": "sha512-fake"
    }
  }
}"#
    .to_string()
}
