use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::catalog::Catalog;
use crate::common::{DbError, PageId, Permissions, Result, TableId, TransactionId};
use crate::storage::page::HeapPage;
use crate::tuple::Tuple;
use crate::txn::{LockManager, LockMode};

/// Pool-internal bookkeeping, every mutation under one mutex. The slot
/// array, the page table, the free-slot stack and the admission queue are
/// kept mutually consistent: every mapped page id has an occupied slot, and
/// every unmapped slot is on the free stack.
struct PoolState {
    /// Fixed array of page slots
    frames: Vec<Option<Arc<RwLock<HeapPage>>>>,
    /// Maps resident page ids to their slot index
    page_table: HashMap<PageId, usize>,
    /// Slots not currently holding a page
    free_slots: Vec<usize>,
    /// Residency order, oldest first; eviction scans from the front
    admission: VecDeque<PageId>,
}

impl PoolState {
    fn resident(&self, pid: PageId) -> Option<Arc<RwLock<HeapPage>>> {
        let slot = *self.page_table.get(&pid)?;
        self.frames[slot].clone()
    }

    /// Drops `pid` from the cache without flushing, returning its slot to
    /// the free stack.
    fn remove(&mut self, pid: PageId) {
        if let Some(slot) = self.page_table.remove(&pid) {
            self.frames[slot] = None;
            self.free_slots.push(slot);
            self.admission.retain(|p| *p != pid);
        }
    }
}

/// BufferPool caches up to a fixed number of pages and is the sole path by
/// which anything reads or writes them. Before serving a page it obtains
/// the matching lock from the lock manager; lock waits happen before the
/// pool's own guard is taken, so a blocked transaction never stalls
/// unrelated lookups.
///
/// Eviction is no-steal: a dirty page belongs to an uncommitted transaction
/// and is never evicted. When every resident page is dirty, the triggering
/// operation fails with `BufferPoolFull` instead.
pub struct BufferPool {
    capacity: usize,
    catalog: Arc<Catalog>,
    lock_manager: LockManager,
    state: Mutex<PoolState>,
}

impl BufferPool {
    /// Creates a pool caching up to `capacity` pages, resolving tables
    /// through the given catalog.
    pub fn new(capacity: usize, catalog: Arc<Catalog>) -> Self {
        assert!(capacity > 0, "pool capacity must be non-zero");
        let state = PoolState {
            frames: (0..capacity).map(|_| None).collect(),
            page_table: HashMap::new(),
            free_slots: (0..capacity).rev().collect(),
            admission: VecDeque::new(),
        };
        Self {
            capacity,
            catalog,
            lock_manager: LockManager::new(),
            state: Mutex::new(state),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn lock_manager(&self) -> &LockManager {
        &self.lock_manager
    }

    /// Number of pages currently resident.
    pub fn resident_pages(&self) -> usize {
        self.state.lock().page_table.len()
    }

    /// Retrieves the page `pid` on behalf of `txn` with the given access
    /// mode, taking the matching lock first (which may block, and may fail
    /// with `TransactionAborted` on timeout). Serves the resident copy if
    /// cached, otherwise loads it from the table's heap file, evicting a
    /// clean page when the pool is full.
    pub fn get_page(
        &self,
        txn: TransactionId,
        pid: PageId,
        perm: Permissions,
    ) -> Result<Arc<RwLock<HeapPage>>> {
        let mode = match perm {
            Permissions::ReadOnly => LockMode::Shared,
            Permissions::ReadWrite => LockMode::Exclusive,
        };
        self.lock_manager.acquire(txn, pid, mode)?;

        let mut state = self.state.lock();
        if let Some(page) = state.resident(pid) {
            return Ok(page);
        }

        let file = self.catalog.table_file(pid.table_id)?;
        let page = Arc::new(RwLock::new(file.read_page(pid)?));

        let slot = self.grab_slot(&mut state)?;
        state.frames[slot] = Some(Arc::clone(&page));
        state.page_table.insert(pid, slot);
        state.admission.push_back(pid);
        Ok(page)
    }

    /// Adds `tuple` to `table_id` on behalf of `txn`. Acquires write locks
    /// on every page the heap file touches, marks each dirtied page
    /// dirty-for-`txn`, and installs them in the cache so later requests
    /// see the modification.
    pub fn insert_tuple(&self, txn: TransactionId, table_id: TableId, tuple: Tuple) -> Result<()> {
        let file = self.catalog.table_file(table_id)?;
        let dirtied = file.insert_tuple(self, txn, tuple)?;
        self.install_dirtied(txn, dirtied)
    }

    /// Removes `tuple` from its table on behalf of `txn`, routed by the
    /// tuple's record id.
    pub fn delete_tuple(&self, txn: TransactionId, tuple: &Tuple) -> Result<()> {
        let rid = tuple.rid().ok_or(DbError::MissingRecordId)?;
        let file = self.catalog.table_file(rid.page_id.table_id)?;
        let dirtied = file.delete_tuple(self, txn, tuple)?;
        self.install_dirtied(txn, dirtied)
    }

    fn install_dirtied(
        &self,
        txn: TransactionId,
        dirtied: Vec<Arc<RwLock<HeapPage>>>,
    ) -> Result<()> {
        let mut state = self.state.lock();
        for page in dirtied {
            let pid = {
                let mut guard = page.write();
                guard.mark_dirty(Some(txn));
                guard.pid()
            };
            match state.page_table.get(&pid) {
                Some(&slot) => {
                    // replace any stale copy at the same identifier
                    state.frames[slot] = Some(page);
                }
                None => {
                    let slot = self.grab_slot(&mut state)?;
                    state.frames[slot] = Some(page);
                    state.page_table.insert(pid, slot);
                    state.admission.push_back(pid);
                }
            }
        }
        Ok(())
    }

    /// Releases `txn`'s lock on one page without completing the
    /// transaction. Breaking two-phase locking this way forfeits isolation;
    /// the default transaction lifecycle never calls it.
    pub fn release_page(&self, txn: TransactionId, pid: PageId) {
        self.lock_manager.release(txn, pid);
    }

    /// True iff `txn` holds a lock on `pid`.
    pub fn holds_lock(&self, txn: TransactionId, pid: PageId) -> bool {
        self.lock_manager.holds(txn, pid)
    }

    /// Commits (`commit = true`) or aborts the transaction. Commit flushes
    /// exactly the pages `txn` holds exclusively - its durability point.
    /// Abort discards those pages from the cache unflushed, so rolled-back
    /// modifications can never be observed. Both paths then release every
    /// lock the transaction holds.
    pub fn transaction_complete(&self, txn: TransactionId, commit: bool) -> Result<()> {
        let pids = self.lock_manager.exclusive_pages(txn);
        let outcome = {
            let mut state = self.state.lock();
            if commit {
                pids.iter()
                    .try_for_each(|pid| self.flush_resident(&mut state, *pid))
            } else {
                for pid in &pids {
                    state.remove(*pid);
                }
                Ok(())
            }
        };
        // Locks go away even if a flush failed; the error still reaches the
        // caller so it knows durability was not established.
        self.lock_manager.release_all(txn);
        outcome
    }

    /// Unconditionally drops `pid` from the cache without flushing,
    /// regardless of dirtiness. For pages known to be invalid, such as
    /// after a rollback.
    pub fn discard_page(&self, pid: PageId) {
        self.state.lock().remove(pid);
    }

    /// Writes every resident page to its heap file. Administrative, not
    /// transaction-scoped; under no-steal this publishes uncommitted work,
    /// so it is for shutdown/test use only.
    pub fn flush_all_pages(&self) -> Result<()> {
        let mut state = self.state.lock();
        let pids: Vec<PageId> = state.page_table.keys().copied().collect();
        for pid in pids {
            self.flush_resident(&mut state, pid)?;
        }
        Ok(())
    }

    /// Writes the resident copy of `pid` to its heap file and clears its
    /// dirty mark. No-op if the page is not cached.
    fn flush_resident(&self, state: &mut PoolState, pid: PageId) -> Result<()> {
        let Some(page) = state.resident(pid) else {
            return Ok(());
        };
        let file = self.catalog.table_file(pid.table_id)?;
        let mut guard = page.write();
        file.write_page(&guard)?;
        guard.mark_dirty(None);
        Ok(())
    }

    /// Produces a free slot, evicting if the free stack is empty.
    fn grab_slot(&self, state: &mut PoolState) -> Result<usize> {
        if let Some(slot) = state.free_slots.pop() {
            return Ok(slot);
        }
        self.evict_page(state)
    }

    /// Evicts the oldest-admitted clean page and returns its slot. Dirty
    /// pages encountered during the scan are re-appended to the back of the
    /// admission order. Fails with `BufferPoolFull` when no resident page
    /// is clean (no-steal), and with the underlying I/O error - bookkeeping
    /// intact - when the victim's write-back fails.
    fn evict_page(&self, state: &mut PoolState) -> Result<usize> {
        let mut skipped_dirty = Vec::new();
        let mut victim = None;

        while let Some(pid) = state.admission.pop_front() {
            let Some(&slot) = state.page_table.get(&pid) else {
                continue;
            };
            let dirty = state.frames[slot]
                .as_ref()
                .is_some_and(|page| page.read().is_dirty());
            if dirty {
                skipped_dirty.push(pid);
            } else {
                victim = Some((pid, slot));
                break;
            }
        }
        for pid in skipped_dirty {
            state.admission.push_back(pid);
        }

        let Some((pid, slot)) = victim else {
            return Err(DbError::BufferPoolFull);
        };

        if let Err(err) = self.flush_resident(state, pid) {
            // keep the victim cached and its bookkeeping consistent
            state.admission.push_front(pid);
            return Err(err);
        }

        state.page_table.remove(&pid);
        state.frames[slot] = None;
        Ok(slot)
    }
}
