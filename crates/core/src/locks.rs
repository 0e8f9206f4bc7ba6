//! Per-message async locks.

use std::sync::Arc;

use {
    chatbridge_common::HandleKey,
    dashmap::DashMap,
    tokio::sync::{Mutex, OwnedMutexGuard},
};

type LockTable = DashMap<HandleKey, Arc<Mutex<()>>>;

/// One async mutex per source message, created on first use and dropped once
/// nobody holds or waits for it.
#[derive(Clone, Default)]
pub struct HandleLocks {
    inner: Arc<LockTable>,
}

/// Held for the whole handling of one event.
pub struct HandleGuard {
    key: HandleKey,
    table: Arc<LockTable>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl HandleLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: HandleKey) -> HandleGuard {
        let mutex = Arc::clone(&self.inner.entry(key.clone()).or_default());
        let guard = mutex.lock_owned().await;
        HandleGuard {
            key,
            table: Arc::clone(&self.inner),
            guard: Some(guard),
        }
    }

    /// Number of messages with a live lock entry.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Drop for HandleGuard {
    fn drop(&mut self) {
        // Release first so the table holds the only reference when idle.
        drop(self.guard.take());
        self.table
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        chatbridge_common::{NativeId, Platform},
        std::time::Duration,
    };

    fn key(id: u64) -> HandleKey {
        HandleKey {
            platform: Platform::B,
            id: NativeId::Int(id),
        }
    }

    #[tokio::test]
    async fn entry_removed_after_release() {
        let locks = HandleLocks::new();
        {
            let _g = locks.lock(key(1)).await;
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn same_key_is_exclusive() {
        let locks = HandleLocks::new();
        let first = locks.lock(key(1)).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.lock(key(1)).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(first);
        waiter.await.unwrap();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let locks = HandleLocks::new();
        let _a = locks.lock(key(1)).await;
        let _b = tokio::time::timeout(Duration::from_millis(100), locks.lock(key(2)))
            .await
            .unwrap();
        assert_eq!(locks.len(), 2);
    }
}
