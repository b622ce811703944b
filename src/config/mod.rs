//! Configuration for gitcache, read entirely from the environment (spec §6).
//!
//! There is no config file: gitcache has no credentials to manage beyond a
//! single bearer token, and storing that in a file would add a surface the
//! specification explicitly puts out of scope (see `SPEC_FULL.md` §A.3).
//! Grounded on the teacher's `config::get_cache_dir` for the cache-root
//! resolution pattern (env override, then platform home directory, then
//! create-on-demand).

use anyhow::{Context, Result};
use std::path::PathBuf;

/// `GITCACHE_CACHE_DIR` overrides the cache root entirely.
pub const CACHE_DIR_ENV: &str = "GITCACHE_CACHE_DIR";
/// Base URL of the registry tier's HTTP API.
pub const API_URL_ENV: &str = "GITCACHE_API_URL";
/// Bearer token used to authenticate against the registry tier.
pub const TOKEN_ENV: &str = "GITCACHE_TOKEN";
/// Enables debug-level logging regardless of `RUST_LOG` (spec `SPEC_FULL.md` §A.2).
pub const VERBOSE_ENV: &str = "GITCACHE_VERBOSE";

/// Resolves the cache root directory: `$GITCACHE_CACHE_DIR`, or else
/// `$HOME/.gitcache`, creating it if it doesn't exist.
pub fn cache_root() -> Result<PathBuf> {
    let dir = if let Ok(dir) = std::env::var(CACHE_DIR_ENV) {
        PathBuf::from(dir)
    } else {
        crate::utils::platform::get_home_dir()
            .context("could not determine home directory; set GITCACHE_CACHE_DIR explicitly")?
            .join(".gitcache")
    };

    crate::utils::fs::ensure_dir(&dir)?;
    Ok(dir)
}

/// A read-once-per-invocation snapshot of the registry tier's credentials
/// (spec §3, `AuthState`). Read exactly once at startup: gitcache never
/// re-checks the environment mid-run.
#[derive(Debug, Clone)]
pub struct AuthState {
    /// Base URL for the registry API, if configured.
    pub api_url: Option<String>,
    /// Bearer token, if configured. Presence alone does not mean the token
    /// is valid — that's only known after the first request.
    pub token: Option<String>,
}

impl AuthState {
    /// Reads `GITCACHE_API_URL`/`GITCACHE_TOKEN` once.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            api_url: std::env::var(API_URL_ENV).ok().filter(|s| !s.is_empty()),
            token: std::env::var(TOKEN_ENV).ok().filter(|s| !s.is_empty()),
        }
    }

    /// The registry tier is only enabled when both a URL and a token are
    /// present; a URL with no token can't authenticate, and vice versa.
    #[must_use]
    pub fn registry_enabled(&self) -> bool {
        self.api_url.is_some() && self.token.is_some()
    }
}

/// Whether verbose logging was requested via `GITCACHE_VERBOSE`.
#[must_use]
pub fn verbose_requested() -> bool {
    std::env::var(VERBOSE_ENV).is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}
