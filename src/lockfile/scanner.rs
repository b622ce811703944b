//! Auto-detects which lockfile dialect is present and dispatches to the
//! matching parser (spec §4.1).

use super::npm;
use super::types::LockfileScanResult;
use super::yarn;
use crate::core::GitCacheError;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Detection order: `npm-shrinkwrap.json` takes precedence over
/// `package-lock.json` (npm's own precedence when both exist), and
/// `yarn.lock` is tried last.
const CANDIDATES: &[&str] = &["npm-shrinkwrap.json", "package-lock.json", "yarn.lock"];

/// Finds the lockfile in `project_dir` and scans it for Git dependencies.
pub fn scan_project(project_dir: &Path) -> Result<LockfileScanResult> {
    let path = find_lockfile(project_dir).ok_or_else(|| GitCacheError::LockfileNotFound {
        path: project_dir.display().to_string(),
    })?;
    scan_path(&path)
}

/// Scans a specific lockfile path, dispatching on its file name.
pub fn scan_path(path: &Path) -> Result<LockfileScanResult> {
    match path.file_name().and_then(|n| n.to_str()) {
        Some("yarn.lock") => yarn::scan(path),
        _ => npm::scan(path),
    }
}

fn find_lockfile(project_dir: &Path) -> Option<PathBuf> {
    CANDIDATES.iter().map(|name| project_dir.join(name)).find(|p| p.is_file())
}
