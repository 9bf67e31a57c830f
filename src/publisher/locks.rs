//! Per-destination mutual exclusion.
//!
//! Serializes the existence check and the copy for one destination path so
//! concurrent publishes through the same publisher copy at most once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::models::Identifier;

/// Lock map keyed by destination identifier.
#[derive(Debug, Default)]
pub struct DestinationLocks {
    locks: Mutex<HashMap<Identifier, Weak<AsyncMutex<()>>>>,
}

impl DestinationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `destination`.
    pub async fn acquire(&self, destination: &Identifier) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            // Entries nobody holds or waits on any more.
            locks.retain(|_, weak| weak.strong_count() > 0);

            match locks.get(destination).and_then(Weak::upgrade) {
                Some(lock) => lock,
                None => {
                    let lock = Arc::new(AsyncMutex::new(()));
                    locks.insert(destination.clone(), Arc::downgrade(&lock));
                    lock
                }
            }
        };
        lock.lock_owned().await
    }

    /// Number of destinations currently held or awaited.
    #[cfg(test)]
    fn active(&self) -> usize {
        let locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.values().filter(|weak| weak.strong_count() > 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lock_released_on_drop() {
        let locks = DestinationLocks::new();
        let dest = Identifier::parse("/a/b.jpg").unwrap();

        let guard = locks.acquire(&dest).await;
        assert_eq!(locks.active(), 1);
        drop(guard);
        assert_eq!(locks.active(), 0);

        // Re-acquiring after release does not deadlock
        let _again = locks.acquire(&dest).await;
    }

    #[tokio::test]
    async fn test_distinct_destinations_do_not_block() {
        let locks = DestinationLocks::new();
        let a = locks.acquire(&Identifier::parse("/a").unwrap()).await;
        let b = locks.acquire(&Identifier::parse("/b").unwrap()).await;
        assert_eq!(locks.active(), 2);
        drop((a, b));
    }
}
