//! Per-resource lock table
//!
//! Hands out one async mutex per key, created on first use and kept for the
//! lifetime of the process. Holding the returned guard serializes every
//! transition on that key within this process; dropping it releases the lock
//! on every exit path.

use std::{collections::HashMap, fmt::Debug, hash::Hash, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::error::{AppError, AppResult};

/// Proof that the caller holds the lock for a key
pub type LockGuard = OwnedMutexGuard<()>;

pub struct LockTable<K> {
    locks: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K> LockTable<K>
where
    K: Eq + Hash + Clone + Debug,
{
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Get-or-create the lock for `key`; atomic under concurrent first access
    fn lock_for(&self, key: &K) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(key.clone()).or_default())
    }

    /// Wait until the lock for `key` is free and take it
    pub async fn acquire(&self, key: &K) -> LockGuard {
        self.lock_for(key).lock_owned().await
    }

    /// Like [`acquire`](Self::acquire) but gives up after `timeout` when one is set
    pub async fn acquire_within(&self, key: &K, timeout: Option<Duration>) -> AppResult<LockGuard> {
        let Some(timeout) = timeout else {
            return Ok(self.acquire(key).await);
        };

        tokio::time::timeout(timeout, self.acquire(key))
            .await
            .map_err(|_| {
                AppError::LockTimeout(format!(
                    "Timed out after {:?} waiting for lock on {:?}",
                    timeout, key
                ))
            })
    }

    /// Number of distinct keys ever locked
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K> Default for LockTable<K>
where
    K: Eq + Hash + Clone + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}
