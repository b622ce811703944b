//! In-process per-key locking for single-flight cache operations.
//!
//! Grounded on the teacher's `cache::lock_manager` (a `DashMap` tracking
//! locks held per task), but simplified for gitcache's needs: spec §5 only
//! requires that, for any `packageId`, at most one build or registry upload
//! runs at a time *within one invocation* — there is no cross-process
//! ordering requirement, so a plain `DashMap<String, Arc<tokio::sync::Mutex<()>>>`
//! is sufficient and avoids the alphabetical-lock-ordering machinery the
//! teacher needs for its multi-repository worktree locking.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A registry of per-key async mutexes, used to guarantee single-flight
/// semantics: concurrent callers requesting the same key share one
/// in-progress computation instead of racing duplicate work.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyedLocks {
    /// Create an empty lock registry, scoped to one `install()` invocation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Acquire the lock for `key`, awaiting if another task currently holds
    /// it. The returned guard releases the lock on drop.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }
}
