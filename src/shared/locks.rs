//! Keyed single-writer locks for schedule and booking mutations
//!
//! Every check-then-act sequence in the managers (overlap search before
//! scheduling, seat count before booking, "no active reservations" before
//! cancelling a trip) runs while holding the locks for the keys it reads.
//! Keys are always taken in ascending order, so two operations can never
//! wait on each other in a cycle.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lock key. The derived ordering puts every vehicle before every trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LockKey {
    Vehicle(i32),
    Trip(i32),
}

/// Slots exist only while some task holds or waits on the key.
#[derive(Default)]
pub struct ScheduleLocks {
    slots: Arc<DashMap<LockKey, Arc<Mutex<()>>>>,
}

/// Holds a set of keys until dropped.
pub struct ScheduleGuard {
    held: Vec<OwnedMutexGuard<()>>,
    keys: Vec<LockKey>,
    slots: Arc<DashMap<LockKey, Arc<Mutex<()>>>>,
}

impl ScheduleGuard {
    pub fn keys(&self) -> &[LockKey] {
        &self.keys
    }
}

impl Drop for ScheduleGuard {
    fn drop(&mut self) {
        self.held.clear();
        // A slot cloned by a waiter has a strong count above one and stays.
        for key in &self.keys {
            self.slots.remove_if(key, |_, slot| Arc::strong_count(slot) == 1);
        }
    }
}

impl ScheduleLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently tracked, held or awaited.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub async fn acquire<I>(&self, keys: I) -> ScheduleGuard
    where
        I: IntoIterator<Item = LockKey>,
    {
        let mut keys: Vec<LockKey> = keys.into_iter().collect();
        keys.sort();
        keys.dedup();

        let mut guard = ScheduleGuard {
            held: Vec::with_capacity(keys.len()),
            keys,
            slots: self.slots.clone(),
        };
        for key in guard.keys.clone() {
            let slot = self
                .slots
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone();
            guard.held.push(slot.lock_owned().await);
        }
        guard
    }

    pub async fn vehicle(&self, id: i32) -> ScheduleGuard {
        self.acquire([LockKey::Vehicle(id)]).await
    }

    pub async fn trip(&self, id: i32) -> ScheduleGuard {
        self.acquire([LockKey::Trip(id)]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn vehicles_sort_before_trips() {
        let mut keys = vec![LockKey::Trip(1), LockKey::Vehicle(9), LockKey::Vehicle(2)];
        keys.sort();
        assert_eq!(
            keys,
            vec![LockKey::Vehicle(2), LockKey::Vehicle(9), LockKey::Trip(1)]
        );
    }

    #[tokio::test]
    async fn acquire_dedups_and_orders_keys() {
        let locks = ScheduleLocks::new();
        let guard = locks
            .acquire([LockKey::Trip(4), LockKey::Vehicle(1), LockKey::Trip(4)])
            .await;
        assert_eq!(guard.keys(), &[LockKey::Vehicle(1), LockKey::Trip(4)]);
    }

    #[tokio::test]
    async fn same_key_is_mutually_exclusive() {
        let locks = Arc::new(ScheduleLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let inside = inside.clone();
            let max_seen = max_seen.clone();
            tasks.push(tokio::spawn(async move {
                let _guard = locks.trip(1).await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn released_keys_leave_no_slot_behind() {
        let locks = Arc::new(ScheduleLocks::new());
        for id in 0..50 {
            let _guard = locks.acquire([LockKey::Vehicle(id), LockKey::Trip(id)]).await;
        }
        assert_eq!(locks.slot_count(), 0);

        let held = locks.trip(7).await;
        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.trip(7).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(held);
        assert_eq!(locks.slot_count(), 1);

        waiter.await.unwrap();
        assert_eq!(locks.slot_count(), 0);
    }

    #[tokio::test]
    async fn distinct_keys_do_not_block() {
        let locks = ScheduleLocks::new();
        let _a = locks.vehicle(1).await;
        let b = tokio::time::timeout(Duration::from_millis(50), locks.vehicle(2)).await;
        assert!(b.is_ok());
    }
}
