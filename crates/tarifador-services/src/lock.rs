//! Keyed async locks
//!
//! Both services serialize work on one logical entity at a time: the
//! reconciler on a call, the billing service on a bill. The registry
//! hands out one async mutex per key, created on first use and reclaimed
//! once the releasing task holds the last handle, so the map stays
//! proportional to in-flight work rather than to traffic history.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// One async mutex per key, with automatic reclamation
pub struct LockRegistry<K> {
    locks: Mutex<HashMap<K, Arc<tokio::sync::Mutex<()>>>>,
}

impl<K> Default for LockRegistry<K> {
    fn default() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }
}

impl<K> LockRegistry<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently tracked
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }
}

impl<K: Eq + Hash + Clone> LockRegistry<K> {
    /// The lock guarding `key`, created on first use
    ///
    /// Callers must call [`release`](Self::release) with the same key once
    /// done, while the returned handle is still alive.
    pub fn lock_for(&self, key: &K) -> Arc<tokio::sync::Mutex<()>> {
        self.locks.lock().entry(key.clone()).or_default().clone()
    }

    /// Drop the entry for `key` unless another task still holds a handle
    ///
    /// The count check and any concurrent `lock_for` are serialized by the
    /// registry mutex, so an entry is only removed when nobody can be
    /// inside or waiting on its critical section.
    pub fn release(&self, key: &K) {
        let mut locks = self.locks.lock();
        if let Some(lock) = locks.get(key) {
            // One handle in the map, one held by the releasing caller
            if Arc::strong_count(lock) <= 2 {
                locks.remove(key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_key_shares_one_lock() {
        let registry = LockRegistry::new();

        let a = registry.lock_for(&7);
        let b = registry.lock_for(&7);
        assert!(Arc::ptr_eq(&a, &b));

        let other = registry.lock_for(&8);
        assert!(!Arc::ptr_eq(&a, &other));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_release_keeps_contended_entries() {
        let registry = LockRegistry::new();

        let a = registry.lock_for(&7);
        let b = registry.lock_for(&7);

        // First task done, second still holds its handle
        registry.release(&7);
        drop(a);
        assert_eq!(registry.len(), 1);

        // Second task done, nobody else is interested
        registry.release(&7);
        drop(b);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_guard_blocks_a_second_locker() {
        let registry = LockRegistry::new();

        let lock = registry.lock_for(&"bill");
        let guard = lock.lock().await;

        let contender = registry.lock_for(&"bill");
        assert!(contender.try_lock().is_err());

        drop(guard);
        assert!(contender.try_lock().is_ok());
    }
}
