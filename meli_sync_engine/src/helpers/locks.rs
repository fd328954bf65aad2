use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use log::*;

/// How long a processing lock is honoured before a duplicate notification may retry
/// the order.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(300);

/// Time source for the lock table, injectable so expiry can be tested without
/// sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// In-memory, per-key processing locks.
///
/// A lock marks an order as "currently being ingested" so that a burst of duplicate
/// webhook notifications does not trigger concurrent ingestions. Locks are
/// best-effort: they expire after [`DEFAULT_LOCK_TIMEOUT`] and the store's unique
/// order-id constraint remains the durable deduplication guarantee. Clones share the
/// same table.
#[derive(Clone)]
pub struct ProcessingLocks {
    inner: Arc<Mutex<HashMap<String, Instant>>>,
    timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl ProcessingLocks {
    pub fn new(timeout: Duration) -> Self {
        Self::with_clock(timeout, Arc::new(SystemClock))
    }

    pub fn with_clock(timeout: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { inner: Arc::new(Mutex::new(HashMap::new())), timeout, clock }
    }

    /// Tries to take the lock for `key`. Returns false when a live lock is already
    /// held; an expired lock is replaced and counts as acquired.
    pub fn try_acquire(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut table = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        match table.get(key) {
            Some(acquired_at) if now.duration_since(*acquired_at) < self.timeout => false,
            _ => {
                table.insert(key.to_string(), now);
                true
            },
        }
    }

    pub fn release(&self, key: &str) {
        let mut table = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        table.remove(key);
    }

    /// Drops every expired lock and returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut table = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let before = table.len();
        table.retain(|_, acquired_at| now.duration_since(*acquired_at) < self.timeout);
        let removed = before - table.len();
        if removed > 0 {
            debug!("⏳️ Swept {removed} expired processing lock(s)");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct ManualClock {
        base: Instant,
        offset: Mutex<Duration>,
    }

    impl ManualClock {
        fn new() -> Arc<Self> {
            Arc::new(Self { base: Instant::now(), offset: Mutex::new(Duration::ZERO) })
        }

        fn advance(&self, by: Duration) {
            *self.offset.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.base + *self.offset.lock().unwrap()
        }
    }

    #[test]
    fn second_acquire_is_rejected_until_release() {
        let locks = ProcessingLocks::new(DEFAULT_LOCK_TIMEOUT);
        assert!(locks.try_acquire("1001"));
        assert!(!locks.try_acquire("1001"));
        assert!(locks.try_acquire("1002"));
        locks.release("1001");
        assert!(locks.try_acquire("1001"));
    }

    #[test]
    fn expired_locks_can_be_reacquired() {
        let clock = ManualClock::new();
        let locks = ProcessingLocks::with_clock(Duration::from_secs(300), clock.clone());
        assert!(locks.try_acquire("1001"));
        clock.advance(Duration::from_secs(299));
        assert!(!locks.try_acquire("1001"));
        clock.advance(Duration::from_secs(2));
        assert!(locks.try_acquire("1001"));
    }

    #[test]
    fn sweep_removes_only_expired_entries() {
        let clock = ManualClock::new();
        let locks = ProcessingLocks::with_clock(Duration::from_secs(300), clock.clone());
        locks.try_acquire("old");
        clock.advance(Duration::from_secs(200));
        locks.try_acquire("fresh");
        clock.advance(Duration::from_secs(150));
        assert_eq!(locks.sweep(), 1);
        assert_eq!(locks.len(), 1);
        assert!(!locks.try_acquire("fresh"));
        assert!(locks.try_acquire("old"));
    }

    #[test]
    fn clones_share_the_lock_table() {
        let locks = ProcessingLocks::new(DEFAULT_LOCK_TIMEOUT);
        let other = locks.clone();
        assert!(locks.try_acquire("1001"));
        assert!(!other.try_acquire("1001"));
        other.release("1001");
        assert!(locks.try_acquire("1001"));
    }
}
