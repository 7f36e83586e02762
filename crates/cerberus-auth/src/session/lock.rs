//! Per-user mutual exclusion for the mutating session operations.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use cerberus_core::types::UserId;

type LockMap = DashMap<UserId, Arc<Mutex<()>>>;

/// Hands out one async mutex per user id.
///
/// Entries are dropped again once no task holds or waits on them, so the
/// map only ever contains users with an operation in flight.
#[derive(Debug, Clone, Default)]
pub struct UserLocks {
    locks: Arc<LockMap>,
}

impl UserLocks {
    /// Creates an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `user_id`.
    pub async fn lock(&self, user_id: &UserId) -> UserLockGuard {
        let mutex = self
            .locks
            .entry(user_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        // Cleans up the entry if this wait is cancelled. Declared before the
        // wait so the waiting future (and its Arc) is dropped first.
        let mut cancelled = WaitCleanup {
            locks: &self.locks,
            user_id,
            armed: true,
        };
        let guard = mutex.lock_owned().await;
        cancelled.armed = false;

        UserLockGuard {
            locks: Arc::clone(&self.locks),
            user_id: user_id.clone(),
            guard: Some(guard),
        }
    }

    /// Number of users with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no user has a live lock entry.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Exclusive access to one user's session; released on drop.
#[derive(Debug)]
pub struct UserLockGuard {
    locks: Arc<LockMap>,
    user_id: UserId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for UserLockGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        remove_idle(&self.locks, &self.user_id);
    }
}

/// Removes the entry of a waiter whose `lock` future was dropped early.
struct WaitCleanup<'a> {
    locks: &'a LockMap,
    user_id: &'a UserId,
    armed: bool,
}

impl Drop for WaitCleanup<'_> {
    fn drop(&mut self) {
        if self.armed {
            remove_idle(self.locks, self.user_id);
        }
    }
}

/// Drops the entry when only the map's own reference is left: nobody holds
/// or awaits it.
fn remove_idle(locks: &LockMap, user_id: &UserId) {
    locks.remove_if(user_id, |_, mutex| Arc::strong_count(mutex) == 1);
}
