//! Best-effort `yarn.lock` scanning (spec §4.1, §9 Open Question (a)).
//!
//! `yarn.lock`'s grammar isn't specified anywhere as precisely as npm's JSON
//! lockfiles, and gitcache deliberately does not guess at Yarn's exact
//! Git-vs-registry dependency rules. This scanner recognizes the common
//! shape — a comma-separated header of quoted specifiers followed by an
//! indented `resolved "..."` line — and degrades silently to "no Git
//! dependencies found" for anything else. It never returns an error: a
//! `yarn.lock` gitcache can't make sense of simply means no acceleration for
//! this install, not a failed one.

use super::npm::parse_git_spec;
use super::types::{GitDependency, LockfileDialect, LockfileScanResult};
use anyhow::Result;
use std::path::Path;

/// Scans a `yarn.lock` at `path`. Always succeeds; parsing ambiguity yields
/// an empty dependency list rather than an error.
pub fn scan(path: &Path) -> Result<LockfileScanResult> {
    let content = std::fs::read_to_string(path).unwrap_or_default();
    let dependencies = scan_str(&content);

    Ok(LockfileScanResult {
        lockfile_path: path.to_path_buf(),
        dialect: LockfileDialect::Yarn,
        // Yarn classic's lockfile format has no version field of its own;
        // `1` marks the classic (pre-Berry) format this scanner understands.
        lockfile_version: 1,
        has_git_dependencies: !dependencies.is_empty(),
        dependencies,
    })
}

fn scan_str(content: &str) -> Vec<GitDependency> {
    let mut dependencies = Vec::new();
    let mut lines = content.lines().peekable();

    while let Some(line) = lines.next() {
        if line.is_empty() || line.starts_with('#') || line.starts_with(char::is_whitespace) {
            continue;
        }
        let Some(header) = line.strip_suffix(':') else {
            continue;
        };
        let Some(name) = extract_name(header) else {
            continue;
        };

        // Scan the indented body of this entry for a `resolved "..."` line.
        while let Some(next) = lines.peek() {
            if !next.starts_with(char::is_whitespace) {
                break;
            }
            let body_line = lines.next().unwrap();
            let trimmed = body_line.trim();
            if let Some(rest) = trimmed.strip_prefix("resolved ") {
                let quoted = rest.trim_matches('"');
                if let Some((git_url, reference)) = parse_git_spec(quoted) {
                    let resolved_sha = (reference.len() == 40
                        && reference.chars().all(|c| c.is_ascii_hexdigit()))
                    .then(|| reference.clone());
                    dependencies.push(GitDependency {
                        name: name.clone(),
                        package_json_url: git_url.clone(),
                        lockfile_url: git_url.clone(),
                        git_url,
                        reference,
                        resolved_sha,
                        preferred_url: None,
                    });
                }
            }
        }
    }

    dependencies
}

/// Extracts a package name from a yarn.lock header like
/// `"left-pad@git+https://...#main", "left-pad@^1.0.0":` — takes the first
/// comma-separated specifier and splits it at the `@` that separates name
/// from version-spec, accounting for scoped package names starting with `@`.
fn extract_name(header: &str) -> Option<String> {
    let first_spec = header.split(',').next()?.trim().trim_matches('"');

    if let Some(scoped) = first_spec.strip_prefix('@') {
        let at_pos = scoped.find('@')?;
        Some(format!("@{}", &scoped[..at_pos]))
    } else {
        let at_pos = first_spec.find('@')?;
        Some(first_spec[..at_pos].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_name_handles_plain_package() {
        assert_eq!(
            extract_name("\"left-pad@git+https://x#main\""),
            Some("left-pad".to_string())
        );
    }

    #[test]
    fn extract_name_handles_scoped_package() {
        assert_eq!(
            extract_name("\"@scope/pkg@^1.0.0\""),
            Some("@scope/pkg".to_string())
        );
    }

    #[test]
    fn scan_str_finds_git_resolved_entry() {
        let content = "\"left-pad@git+https://github.com/a/left-pad.git#main\":\n  version \"1.0.0\"\n  resolved \"git+https://github.com/a/left-pad.git#abcdef0123456789abcdef0123456789abcdef01\"\n\n\"other@^2.0.0\":\n  version \"2.0.0\"\n  resolved \"https://registry.yarnpkg.com/other/-/other-2.0.0.tgz\"\n";
        let deps = scan_str(content);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "left-pad");
    }

    #[test]
    fn scan_str_returns_empty_for_garbage_input() {
        assert!(scan_str("not a yarn lockfile\nat all").is_empty());
    }
}
