//! Composes the local, registry, and Git tiers into one lookup-then-propagate
//! pipeline (spec §4.7).

use super::{CacheTier, PackageId, TierStatus};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, warn};

/// The three-tier cache hierarchy, tried in priority order. The first tier
/// that reports `has() == true` supplies the bytes; every *faster* tier tried
/// before it is then backfilled so the next lookup for the same key is a
/// local hit.
pub struct CacheHierarchy {
    tiers: Vec<Arc<dyn CacheTier>>,
}

/// A successful [`CacheHierarchy::get`] result: the artifact bytes plus the
/// name of the tier that actually served them, so callers can distinguish a
/// local-cache hit from a freshly fetched-or-built artifact (spec §4.8 step
/// 4e).
pub struct CacheHit {
    pub bytes: Vec<u8>,
    pub tier: &'static str,
}

impl CacheHierarchy {
    /// Build a hierarchy from tiers in priority order (fastest first).
    #[must_use]
    pub fn new(tiers: Vec<Arc<dyn CacheTier>>) -> Self {
        Self { tiers }
    }

    /// Look up `id`, trying each tier in order and backfilling faster tiers
    /// on a hit. Returns `None` only if every tier reports `has() == false`
    /// (the Git tier always reports `true`, so in practice this only happens
    /// with an empty hierarchy, e.g. in tests).
    pub async fn get(&self, id: &PackageId) -> Result<Option<CacheHit>> {
        for (index, tier) in self.tiers.iter().enumerate() {
            if !tier.has(id).await {
                continue;
            }

            match tier.get(id).await {
                Ok(bytes) => {
                    debug!(tier = tier.name(), package = %id, "cache hit");
                    self.propagate(id, &bytes, index).await;
                    return Ok(Some(CacheHit {
                        bytes,
                        tier: tier.name(),
                    }));
                }
                Err(err) => {
                    // A tier that claimed to have the artifact but failed to
                    // deliver it degrades to the next tier rather than
                    // aborting the whole lookup (spec §4.7).
                    warn!(tier = tier.name(), package = %id, error = %err, "tier failed, falling through");
                    continue;
                }
            }
        }
        Ok(None)
    }

    /// Writes `bytes` into every tier ahead of `found_index` (the tiers that
    /// were checked and missed before the hit). Propagation failures are
    /// logged and swallowed: the install can proceed even if, say, the local
    /// disk is full and backfilling fails.
    async fn propagate(&self, id: &PackageId, bytes: &[u8], found_index: usize) {
        for tier in &self.tiers[..found_index] {
            if let Err(err) = tier.store(id, bytes).await {
                warn!(tier = tier.name(), package = %id, error = %err, "failed to backfill tier");
            }
        }
    }

    /// Diagnostic snapshot of every tier's availability/auth state.
    pub async fn status(&self) -> Vec<TierStatus> {
        let mut statuses = Vec::with_capacity(self.tiers.len());
        for tier in &self.tiers {
            statuses.push(TierStatus {
                name: tier.name(),
                available: true,
                authenticated: tier.authenticated(),
            });
        }
        statuses
    }

    /// Clears every tier that supports clearing (in practice, just local).
    pub async fn clear(&self) -> Result<()> {
        for tier in &self.tiers {
            tier.clear().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeTier {
        name: &'static str,
        has: bool,
        store_calls: Arc<AtomicUsize>,
        bytes: Vec<u8>,
    }

    #[async_trait::async_trait]
    impl CacheTier for FakeTier {
        fn name(&self) -> &'static str {
            self.name
        }
        async fn has(&self, _id: &PackageId) -> bool {
            self.has
        }
        async fn get(&self, _id: &PackageId) -> Result<Vec<u8>> {
            Ok(self.bytes.clone())
        }
        async fn store(&self, _id: &PackageId, _bytes: &[u8]) -> Result<()> {
            self.store_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn id() -> PackageId {
        PackageId::new("https://github.com/a/b.git", &"a".repeat(40))
    }

    #[tokio::test]
    async fn first_tier_with_has_true_wins_and_earlier_tiers_backfill() {
        let local_store_calls = Arc::new(AtomicUsize::new(0));
        let local = Arc::new(FakeTier {
            name: "local",
            has: false,
            store_calls: local_store_calls.clone(),
            bytes: vec![],
        });
        let registry_store_calls = Arc::new(AtomicUsize::new(0));
        let registry = Arc::new(FakeTier {
            name: "registry",
            has: true,
            store_calls: registry_store_calls,
            bytes: b"from-registry".to_vec(),
        });

        let hierarchy = CacheHierarchy::new(vec![local, registry]);
        let hit = hierarchy.get(&id()).await.unwrap().unwrap();

        assert_eq!(hit.bytes, b"from-registry");
        assert_eq!(hit.tier, "registry");
        assert_eq!(local_store_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_tier_has_returns_none() {
        let local = Arc::new(FakeTier {
            name: "local",
            has: false,
            store_calls: Arc::new(AtomicUsize::new(0)),
            bytes: vec![],
        });
        let hierarchy = CacheHierarchy::new(vec![local]);
        assert!(hierarchy.get(&id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn status_reports_every_tier() {
        let local = Arc::new(FakeTier {
            name: "local",
            has: false,
            store_calls: Arc::new(AtomicUsize::new(0)),
            bytes: vec![],
        });
        let hierarchy = CacheHierarchy::new(vec![local]);
        let status = hierarchy.status().await;
        assert_eq!(status.len(), 1);
        assert_eq!(status[0].name, "local");
    }
}
