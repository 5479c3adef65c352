use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::lots::PositionKey;

type LockTable = DashMap<PositionKey, Arc<Mutex<()>>>;

/// One async mutex per position identity.
///
/// Holders of the same key run one at a time; different keys never contend.
/// An entry lives only while some caller holds or waits on it, so the table
/// stays bounded by the number of positions in flight.
#[derive(Debug, Default)]
pub struct PositionLocks {
    locks: LockTable,
}

/// Releases the position lock when dropped and clears its table entry if no
/// other caller is waiting on it.
#[derive(Debug)]
pub struct PositionLockGuard<'a> {
    locks: &'a LockTable,
    key: PositionKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl PositionLocks {
    pub fn new() -> Self {
        PositionLocks::default()
    }

    pub async fn acquire(&self, key: &PositionKey) -> PositionLockGuard<'_> {
        // Clone out of the map before awaiting so no shard lock is held across the await.
        let lock = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        PositionLockGuard {
            locks: &self.locks,
            key: key.clone(),
            guard: Some(lock.lock_owned().await),
        }
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Drop for PositionLockGuard<'_> {
    fn drop(&mut self) {
        // The owned guard keeps its own reference to the mutex; release it first.
        drop(self.guard.take());
        // Waiters clone the Arc under the shard lock, so a count of one means nobody is queued.
        self.locks.remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}
