use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use rand::Rng;

use crate::common::{DbError, PageId, Result, TransactionId};

use super::lock::{Lock, LockMode};

/// Lower bound of the randomized lock-wait deadline, in milliseconds.
const MIN_WAIT_MS: u64 = 500;
/// Upper bound (exclusive) of the randomized lock-wait deadline.
const MAX_WAIT_MS: u64 = 1000;

/// The two lock tables, kept in lockstep under one mutex: per-page
/// contention state, and the reverse index from transaction to the pages it
/// holds locks on.
#[derive(Default)]
struct LockTables {
    page_locks: HashMap<PageId, Lock>,
    txn_locks: HashMap<TransactionId, HashSet<PageId>>,
}

impl LockTables {
    fn record_holder(&mut self, txn: TransactionId, pid: PageId) {
        self.txn_locks.entry(txn).or_default().insert(pid);
    }

    fn forget_holder(&mut self, txn: TransactionId, pid: PageId) {
        if let Some(pids) = self.txn_locks.get_mut(&txn) {
            pids.remove(&pid);
            if pids.is_empty() {
                self.txn_locks.remove(&txn);
            }
        }
    }
}

/// Grants and revokes per-page shared/exclusive locks under strict
/// two-phase locking: a transaction accumulates locks as it touches pages
/// and releases them all at commit or abort.
///
/// Deadlocks are avoided rather than detected: an `acquire` that cannot be
/// satisfied waits on a condition variable up to a randomized deadline
/// (500-1000 ms, fixed once per call) and fails with `TransactionAborted`
/// when it expires. The randomization breaks symmetric two-way waits.
///
/// The manager's mutex is independent of the buffer pool's guard, so a
/// transaction blocked on a lock never stalls unrelated page lookups.
pub struct LockManager {
    tables: Mutex<LockTables>,
    released: Condvar,
}

impl LockManager {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(LockTables::default()),
            released: Condvar::new(),
        }
    }

    /// Acquires a lock of the given mode on `pid` for `txn`, blocking while
    /// other transactions hold conflicting locks.
    ///
    /// Grants that never block:
    /// - `Shared` on an unlocked or share-locked page (re-entrant);
    /// - `Shared` while `txn` itself holds the page exclusively;
    /// - `Exclusive` on an unlocked page;
    /// - `Exclusive` while `txn` is the page's sole holder: the lock is
    ///   upgraded in place (a no-op if it was already exclusive).
    pub fn acquire(&self, txn: TransactionId, pid: PageId, mode: LockMode) -> Result<()> {
        let wait_ms = rand::thread_rng().gen_range(MIN_WAIT_MS..MAX_WAIT_MS);
        let deadline = Instant::now() + Duration::from_millis(wait_ms);

        let mut guard = self.tables.lock();
        loop {
            let tables = &mut *guard;
            match tables.page_locks.get_mut(&pid) {
                None => {
                    tables.page_locks.insert(pid, Lock::new(mode, txn));
                    tables.record_holder(txn, pid);
                    return Ok(());
                }
                Some(lock) => match mode {
                    LockMode::Shared => {
                        if lock.mode() == LockMode::Shared {
                            lock.add_holder(txn);
                            tables.record_holder(txn, pid);
                            return Ok(());
                        }
                        if lock.sole_holder(txn) {
                            // Reading under one's own exclusive lock.
                            return Ok(());
                        }
                    }
                    LockMode::Exclusive => {
                        if lock.sole_holder(txn) {
                            lock.upgrade();
                            debug_assert!(
                                lock.holder_count() == 1 && lock.holds(txn),
                                "upgraded lock must be held solely by the upgrading transaction"
                            );
                            return Ok(());
                        }
                    }
                },
            }

            if self.released.wait_until(&mut guard, deadline).timed_out() {
                return Err(DbError::TransactionAborted);
            }
        }
    }

    /// Releases `txn`'s lock on `pid`, if any, and wakes blocked waiters.
    /// The lock record disappears with its last holder.
    pub fn release(&self, txn: TransactionId, pid: PageId) {
        let mut guard = self.tables.lock();
        Self::release_locked(&mut guard, txn, pid);
        drop(guard);
        self.released.notify_all();
    }

    /// Releases every lock currently attributed to `txn`.
    pub fn release_all(&self, txn: TransactionId) {
        let mut guard = self.tables.lock();
        if let Some(pids) = guard.txn_locks.get(&txn) {
            let pids: Vec<PageId> = pids.iter().copied().collect();
            for pid in pids {
                Self::release_locked(&mut guard, txn, pid);
            }
        }
        drop(guard);
        self.released.notify_all();
    }

    fn release_locked(tables: &mut LockTables, txn: TransactionId, pid: PageId) {
        if let Some(lock) = tables.page_locks.get_mut(&pid) {
            lock.remove_holder(txn);
            if lock.is_empty() {
                tables.page_locks.remove(&pid);
            }
        }
        tables.forget_holder(txn, pid);
    }

    /// True iff `txn` holds a lock (of either mode) on `pid`.
    pub fn holds(&self, txn: TransactionId, pid: PageId) -> bool {
        self.tables
            .lock()
            .page_locks
            .get(&pid)
            .is_some_and(|lock| lock.holds(txn))
    }

    /// True iff `txn` holds any lock at all.
    pub fn holds_any(&self, txn: TransactionId) -> bool {
        self.tables.lock().txn_locks.contains_key(&txn)
    }

    /// Every page `txn` holds exclusively. These are the pages the buffer
    /// pool must flush on commit or discard on abort.
    pub fn exclusive_pages(&self, txn: TransactionId) -> Vec<PageId> {
        let tables = self.tables.lock();
        let Some(pids) = tables.txn_locks.get(&txn) else {
            return Vec::new();
        };
        pids.iter()
            .copied()
            .filter(|pid| {
                tables
                    .page_locks
                    .get(pid)
                    .is_some_and(|lock| lock.mode() == LockMode::Exclusive)
            })
            .collect()
    }
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new()
    }
}
