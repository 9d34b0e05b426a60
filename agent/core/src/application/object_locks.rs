// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Per-object-id async locks.
//!
//! Two entries naming the same object id never touch the backend at the same
//! time, even when they come from different communication managers sharing
//! one registry. Entries for different ids proceed independently.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Default)]
pub struct ObjectLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl ObjectLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`; released when the guard drops.
    pub async fn acquire(&self, id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        lock.lock_owned().await
    }

    /// Drop the lock entry for `id` once nobody holds or waits on it.
    pub fn release_idle(&self, id: &str) {
        self.locks.remove_if(id, |_, lock| Arc::strong_count(lock) == 1);
    }

    pub fn tracked(&self) -> usize {
        self.locks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_id_is_exclusive() {
        let locks = ObjectLocks::new();
        let guard = locks.acquire("v1").await;

        let contender = locks.clone();
        let blocked = tokio::time::timeout(Duration::from_millis(50), async move {
            let _guard = contender.acquire("v1").await;
        })
        .await;
        assert!(blocked.is_err());

        drop(guard);
        let _again = locks.acquire("v1").await;
    }

    #[tokio::test]
    async fn test_distinct_ids_do_not_block() {
        let locks = ObjectLocks::new();
        let _a = locks.acquire("v1").await;
        let b = tokio::time::timeout(Duration::from_millis(50), locks.acquire("v2")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_idle_entries_are_released() {
        let locks = ObjectLocks::new();
        {
            let _guard = locks.acquire("v1").await;
            locks.release_idle("v1");
            assert_eq!(locks.tracked(), 1);
        }
        locks.release_idle("v1");
        assert_eq!(locks.tracked(), 0);
    }
}
