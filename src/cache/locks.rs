//! Key Lock Module
//!
//! Per-key mutual exclusion for cache operations.
//!
//! Operations on different keys interleave freely; overlapping set/get/
//! delete on the same key are serialized through this table so a reader
//! can never observe a half-updated entry or a blob mid-overwrite.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::cache::CacheKey;

// == Key Locks ==
/// Table of per-key async mutexes.
#[derive(Debug, Default)]
pub struct KeyLocks {
    table: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    // == Constructor ==
    /// Creates an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    // == Acquire ==
    /// Acquires the lock for a key, waiting if another operation on the
    /// same key is in flight. The guard releases the key on drop.
    pub async fn acquire(&self, key: &CacheKey) -> OwnedMutexGuard<()> {
        let slot = {
            let mut table = self.table.lock().await;
            table
                .entry(key.as_str().to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        slot.lock_owned().await
    }

    // == Prune ==
    /// Drops the key's slot if no operation currently holds or awaits it.
    /// Call after releasing the guard to keep the table bounded by the
    /// number of in-flight keys.
    pub async fn prune(&self, key: &CacheKey) {
        let mut table = self.table.lock().await;
        if let Some(slot) = table.get(key.as_str()) {
            // Only the table itself holds the Arc: nobody is waiting.
            if Arc::strong_count(slot) == 1 {
                table.remove(key.as_str());
            }
        }
    }

    // == Clear ==
    /// Empties the table. Held guards stay valid; their slots are simply
    /// no longer reachable for new waiters.
    pub async fn clear(&self) {
        self.table.lock().await.clear();
    }

    /// Number of tracked slots.
    #[allow(dead_code)]
    pub async fn len(&self) -> usize {
        self.table.lock().await.len()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_acquire_serializes_same_key() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let locks = Arc::new(KeyLocks::new());
        let key = CacheKey::derive("contended");
        let in_section = Arc::new(AtomicBool::new(false));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = Arc::clone(&locks);
            let key = key.clone();
            let in_section = Arc::clone(&in_section);

            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire(&key).await;
                assert!(
                    !in_section.swap(true, Ordering::SeqCst),
                    "two tasks inside the same-key critical section"
                );
                tokio::time::sleep(Duration::from_millis(1)).await;
                in_section.store(false, Ordering::SeqCst);
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = KeyLocks::new();
        let guard_a = locks.acquire(&CacheKey::derive("a")).await;

        // A second key acquires immediately even while `a` is held.
        let guard_b = locks.acquire(&CacheKey::derive("b")).await;

        drop(guard_a);
        drop(guard_b);
        assert_eq!(locks.len().await, 2);
    }

    #[tokio::test]
    async fn test_prune_removes_idle_slots() {
        let locks = KeyLocks::new();
        let key = CacheKey::derive("pruned");

        let guard = locks.acquire(&key).await;
        // Held: prune is a no-op.
        locks.prune(&key).await;
        assert_eq!(locks.len().await, 1);

        drop(guard);
        locks.prune(&key).await;
        assert_eq!(locks.len().await, 0);
    }

    #[tokio::test]
    async fn test_clear() {
        let locks = KeyLocks::new();
        let _ = locks.acquire(&CacheKey::derive("x")).await;
        let _ = locks.acquire(&CacheKey::derive("y")).await;

        locks.clear().await;
        assert_eq!(locks.len().await, 0);
    }
}
