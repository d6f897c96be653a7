use std::collections::HashSet;

use crate::common::TransactionId;

/// Lock mode for one page. A shared lock may have any number of holders; an
/// exclusive lock has exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    Shared,
    Exclusive,
}

/// Contention state for one page: the current mode and the set of
/// transactions holding it. A lock with no holders must not exist; the
/// manager removes it instead.
#[derive(Debug)]
pub(crate) struct Lock {
    mode: LockMode,
    holders: HashSet<TransactionId>,
}

impl Lock {
    pub fn new(mode: LockMode, txn: TransactionId) -> Self {
        let mut holders = HashSet::new();
        holders.insert(txn);
        Self { mode, holders }
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }

    pub fn holds(&self, txn: TransactionId) -> bool {
        self.holders.contains(&txn)
    }

    /// True iff `txn` is the one and only holder.
    pub fn sole_holder(&self, txn: TransactionId) -> bool {
        self.holders.len() == 1 && self.holders.contains(&txn)
    }

    pub fn holder_count(&self) -> usize {
        self.holders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }

    pub fn add_holder(&mut self, txn: TransactionId) {
        self.holders.insert(txn);
    }

    pub fn remove_holder(&mut self, txn: TransactionId) {
        self.holders.remove(&txn);
    }

    /// Promotes a shared lock to exclusive in place. Only valid when the
    /// caller is the sole holder; the holder set is unchanged.
    pub fn upgrade(&mut self) {
        self.mode = LockMode::Exclusive;
    }
}
