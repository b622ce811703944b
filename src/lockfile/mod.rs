//! Lockfile scanning: finds `package-lock.json` / `npm-shrinkwrap.json` /
//! `yarn.lock` and extracts every Git-sourced dependency (spec §4.1).

pub mod npm;
pub mod scanner;
pub mod types;
pub mod yarn;

pub use scanner::{scan_path, scan_project};
pub use types::{GitDependency, LockfileDialect, LockfileScanResult};
