//! Keyed lock arena: one async mutex per key, dropped when unused.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap<K> = Arc<DashMap<K, Arc<Mutex<()>>>>;

/// Serialises work per key (a tenant's licence, a user's login).
///
/// Work for different keys proceeds in parallel; work for the same key
/// queues behind the holder of the guard. An entry is removed when the last
/// guard or waiter for its key goes away, so the arena only holds keys
/// that are in use.
#[derive(Debug)]
pub struct KeyedLocks<K: Eq + Hash> {
    locks: LockMap<K>,
}

impl<K: Eq + Hash> Clone for KeyedLocks<K> {
    fn clone(&self) -> Self {
        Self {
            locks: Arc::clone(&self.locks),
        }
    }
}

impl<K: Eq + Hash> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    pub async fn acquire(&self, key: K) -> KeyedGuard<K> {
        let lock = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock_owned().await;
        KeyedGuard {
            guard: Some(guard),
            key,
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of keys with a lock allocated.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Exclusive access to one key; released on drop.
#[derive(Debug)]
pub struct KeyedGuard<K: Eq + Hash> {
    guard: Option<OwnedMutexGuard<()>>,
    key: K,
    locks: LockMap<K>,
}

impl<K: Eq + Hash> Drop for KeyedGuard<K> {
    fn drop(&mut self) {
        // The owned guard holds a reference to the mutex; release it first so
        // only the map's reference remains when nobody else is waiting.
        self.guard.take();
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}
