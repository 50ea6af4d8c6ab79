//! Per-resource locks
//!
//! Booking and queue dispatch are contended-resource operations: the
//! read-availability-then-write sequence must be exclusive per resource
//! (team member) or two concurrent requests can both pass the overlap check
//! before either commits. Cross-resource operations never block each other.
//!
//! Acquisition is bounded: a timeout surfaces as `ResourceBusy` and the
//! caller retries with a fresh slot query.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::error::{EngineError, EngineResult};

/// Default bound on lock acquisition
pub const DEFAULT_LOCK_WAIT_MS: u64 = 5_000;

/// Lock table keyed by (account_id, team_member_id)
///
/// Queue-lane operations use team_member_id 0 as the account-wide lane key.
#[derive(Debug)]
pub struct ResourceLocks {
    locks: DashMap<(i64, i64), Arc<Mutex<()>>>,
    wait: Duration,
}

impl ResourceLocks {
    pub fn new(wait: Duration) -> Self {
        Self {
            locks: DashMap::new(),
            wait,
        }
    }

    fn lock_for(&self, key: (i64, i64)) -> Arc<Mutex<()>> {
        self.locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Acquire the lock for a resource, waiting at most the configured bound
    pub async fn acquire(
        &self,
        account_id: i64,
        team_member_id: i64,
    ) -> EngineResult<OwnedMutexGuard<()>> {
        let lock = self.lock_for((account_id, team_member_id));
        tokio::time::timeout(self.wait, lock.lock_owned())
            .await
            .map_err(|_| {
                EngineError::ResourceBusy(format!(
                    "resource {}/{} lock timeout after {:?}",
                    account_id, team_member_id, self.wait
                ))
            })
    }
}

impl Default for ResourceLocks {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_LOCK_WAIT_MS))
    }
}
