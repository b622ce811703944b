//! The Git tier: the cache hierarchy's last resort, modeled as the same
//! uniform `{has, get, store, clear}` strategy as the other tiers (spec §4.5).
//!
//! Unlike the local and registry tiers, this one never actually *has*
//! anything on entry — `has` always answers `true` because building from
//! source is always possible given a resolvable commit. `get` performs the
//! build (delegating to [`crate::builder::TarballBuilder`]) and returns the
//! freshly produced bytes; the hierarchy is responsible for propagating the
//! result back into the faster tiers so the build never happens twice for
//! the same key.

use super::{CacheTier, PackageId};
use crate::builder::TarballBuilder;
use anyhow::Result;
use std::sync::Arc;

/// Treats "build the tarball from Git" as a cache tier.
pub struct GitTier {
    builder: Arc<TarballBuilder>,
}

impl GitTier {
    /// Wrap a [`TarballBuilder`] as a cache tier.
    #[must_use]
    pub fn new(builder: Arc<TarballBuilder>) -> Self {
        Self { builder }
    }
}

#[async_trait::async_trait]
impl CacheTier for GitTier {
    fn name(&self) -> &'static str {
        "git"
    }

    /// Always available: any resolvable commit can be built from source.
    async fn has(&self, _id: &PackageId) -> bool {
        true
    }

    async fn get(&self, id: &PackageId) -> Result<Vec<u8>> {
        self.builder.build(id).await
    }

    /// Git is the source of truth; there's nothing to "store" into it.
    async fn store(&self, _id: &PackageId, _bytes: &[u8]) -> Result<()> {
        Ok(())
    }
}
