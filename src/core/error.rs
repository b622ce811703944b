//! Error handling for gitcache.
//!
//! The error system is built around two principles, carried over from the
//! teacher's error design:
//! 1. **Strongly-typed errors** ([`GitCacheError`]) for precise handling in code.
//! 2. **User-friendly messages** ([`ErrorContext`]) with actionable suggestions
//!    for the small number of errors that are ever shown to a human.
//!
//! Per the propagation policy in the specification, only lockfile errors and a
//! failed child install are ever user-visible failures. Every other variant is
//! caught at its call site, logged as a warning, and the pipeline degrades to
//! the next tier or continues without acceleration.

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The error type for gitcache operations.
///
/// Each variant corresponds to exactly one entry in the specification's error
/// taxonomy (spec §7). Fields carry enough context (`phase`, `status`, URLs) to
/// let callers decide whether an error is fatal (lockfile/child-install) or
/// merely a signal to fall through to the next cache tier.
#[derive(Error, Debug)]
pub enum GitCacheError {
    /// The lockfile path does not exist.
    #[error("lockfile not found: {path}")]
    LockfileNotFound {
        /// The path that was searched for.
        path: String,
    },

    /// The lockfile exists but is not valid JSON (or, for `yarn.lock`, is
    /// malformed enough that even the best-effort parser gives up loudly —
    /// in practice this variant is only raised for the npm dialects, since
    /// yarn parse errors degrade to "no git deps found" instead).
    #[error("failed to parse lockfile {path}: {reason}")]
    LockfileParseError {
        /// Path to the lockfile that failed to parse.
        path: String,
        /// Underlying parse failure.
        reason: String,
    },

    /// The lockfile's top-level `lockfileVersion` is not 1, 2, or 3.
    #[error("unsupported lockfileVersion {version} in {path}")]
    UnsupportedLockfileVersion {
        /// Path to the offending lockfile.
        path: String,
        /// The unrecognized version number.
        version: i64,
    },

    /// A Git reference could not be resolved to a commit SHA. Per-dependency,
    /// never fatal: the dependency is simply recorded without a `resolvedSha`.
    #[error("could not resolve reference '{reference}' for {git_url}")]
    ReferenceUnresolvable {
        /// The repository URL that was queried.
        git_url: String,
        /// The symbolic reference that failed to resolve.
        reference: String,
    },

    /// The tarball builder failed at a specific phase. Per-dependency, logged
    /// as a warning; the install proceeds without an accelerated cache entry
    /// for this package.
    #[error("tarball build failed during {phase} for {git_url}#{commit_sha}: {reason}")]
    TarballBuildFailed {
        /// The repository URL being built.
        git_url: String,
        /// The commit being built.
        commit_sha: String,
        /// Which phase of the pipeline failed.
        phase: BuildPhase,
        /// Underlying failure reason.
        reason: String,
    },

    /// The registry's presigned-download flow failed at a specific hop.
    #[error("registry download failed ({phase}, status {status:?}) for {package_id}")]
    RegistryDownloadFailed {
        /// The `packageId` being downloaded.
        package_id: String,
        /// HTTP status code, if the failure was an HTTP response rather than
        /// a transport-level error.
        status: Option<u16>,
        /// Which hop of the three-phase protocol failed.
        phase: RegistryPhase,
    },

    /// The lookup record existed (carried an `s3Key`) but minting a download
    /// URL failed — the artifact exists but its URL minting is broken.
    #[error("registry artifact {package_id} exists but its download URL is unavailable")]
    DownloadEndpointUnavailable {
        /// The `packageId` whose download endpoint is broken.
        package_id: String,
    },

    /// The registry upload flow failed with a hard (non-2xx, non-413/429)
    /// error.
    #[error("registry upload failed ({phase}, status {status:?}) for {package_id}")]
    RegistryUploadFailed {
        /// The `packageId` being uploaded.
        package_id: String,
        /// HTTP status code, if available.
        status: Option<u16>,
        /// Which hop of the three-phase protocol failed.
        phase: RegistryPhase,
    },

    /// The registry tier is disabled for this invocation because the auth
    /// snapshot reported no valid credentials.
    #[error("not authenticated against the registry")]
    NotAuthenticated,

    /// A local cache entry failed integrity verification (`verifyOnRead`).
    /// Treated as if the entry were absent; the hierarchy falls through.
    #[error("integrity mismatch for {package_id}: expected {expected}, got {actual}")]
    IntegrityMismatch {
        /// The `packageId` whose tarball failed verification.
        package_id: String,
        /// The sidecar-recorded integrity digest.
        expected: String,
        /// The digest actually computed from disk.
        actual: String,
    },

    /// No tier in the hierarchy had the requested package.
    #[error("package not found in any cache tier: {package_id}")]
    PackageNotFound {
        /// The `packageId` that no tier could supply.
        package_id: String,
    },

    /// The spawned package-manager install exited with a non-zero or
    /// otherwise failed status. This propagates as the orchestrator's own
    /// exit code.
    #[error("child install failed with exit code {exit_code}")]
    ChildInstallFailed {
        /// The child process's exit code (or -1 if it was terminated by signal).
        exit_code: i32,
    },

    /// Wraps a plain I/O failure with a short description of what was being
    /// attempted.
    #[error("I/O error during {operation}: {source}")]
    Io {
        /// Short description of the operation that failed.
        operation: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Which phase of the tarball build pipeline failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    /// Shallow or full clone of the source repository.
    Clone,
    /// Checkout of the target commit into a detached HEAD.
    Checkout,
    /// Running the package manager's pack operation.
    Pack,
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Clone => "clone",
            Self::Checkout => "checkout",
            Self::Pack => "pack",
        };
        f.write_str(s)
    }
}

/// Which hop of the registry's three-phase protocol failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryPhase {
    /// `GET /artifacts/lookup/{packageId}`.
    Lookup,
    /// `POST /artifacts/{id}/download`.
    MintDownloadUrl,
    /// `GET <downloadUrl>`.
    Fetch,
    /// `POST /artifacts`.
    CreateUpload,
    /// `PUT <uploadUrl>`.
    Put,
    /// `POST /artifacts/{artifactId}/complete`.
    Complete,
}

impl fmt::Display for RegistryPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Lookup => "lookup",
            Self::MintDownloadUrl => "mint-download-url",
            Self::Fetch => "fetch",
            Self::CreateUpload => "create-upload",
            Self::Put => "put",
            Self::Complete => "complete",
        };
        f.write_str(s)
    }
}

impl From<std::io::Error> for GitCacheError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            operation: "filesystem operation".to_string(),
            source,
        }
    }
}

/// A user-facing wrapper around a [`GitCacheError`] with an optional
/// suggestion and extra detail line, rendered with color when displayed.
///
/// Only constructed for the handful of errors that actually abort the
/// process (see the propagation policy in spec §7); every other variant is
/// logged via `tracing::warn!` at its catch site instead.
#[derive(Debug)]
pub struct ErrorContext {
    error: anyhow::Error,
    suggestion: Option<String>,
    details: Option<String>,
}

impl ErrorContext {
    /// Wrap an error with no suggestion or details yet.
    pub fn new(error: impl Into<anyhow::Error>) -> Self {
        Self {
            error: error.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Attach an actionable suggestion shown on its own line.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach extra explanatory detail shown above the suggestion.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print this error to stderr with color, details, and suggestion.
    pub fn display(&self) {
        eprintln!("{} {}", "error:".red().bold(), self.error);
        if let Some(details) = &self.details {
            eprintln!("{}", details.dimmed());
        }
        if let Some(suggestion) = &self.suggestion {
            eprintln!("{} {}", "help:".cyan().bold(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        if let Some(details) = &self.details {
            write!(f, "\n{details}")?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nhelp: {suggestion}")?;
        }
        Ok(())
    }
}

/// Convert any error into a user-friendly [`ErrorContext`], attaching a
/// suggestion when the underlying error is a recognized [`GitCacheError`]
/// variant that is ever shown to the user.
#[must_use]
pub fn user_friendly_error(err: anyhow::Error) -> ErrorContext {
    if let Some(gce) = err.downcast_ref::<GitCacheError>() {
        let ctx = match gce {
            GitCacheError::LockfileNotFound { .. } => ErrorContext::new(err).with_suggestion(
                "Run this command from a directory containing package-lock.json, npm-shrinkwrap.json, or yarn.lock",
            ),
            GitCacheError::LockfileParseError { .. } => ErrorContext::new(err)
                .with_suggestion("Check the lockfile for syntax errors, or regenerate it with `npm install`"),
            GitCacheError::UnsupportedLockfileVersion { .. } => ErrorContext::new(err)
                .with_details("gitcache understands lockfileVersion 1, 2, and 3")
                .with_suggestion("Regenerate the lockfile with a supported version of npm"),
            GitCacheError::ChildInstallFailed { exit_code } => ErrorContext::new(err)
                .with_details(format!("npm install exited with status {exit_code}")),
            _ => ErrorContext::new(err),
        };
        return ctx;
    }
    ErrorContext::new(err)
}
