use std::collections::VecDeque;

use crate::buffer::BufferPool;
use crate::common::{DbError, PageId, Permissions, Result, TransactionId};
use crate::tuple::Tuple;

use super::HeapFile;

/// Iteration protocol consumed by query operators. Lazy, forward-only and
/// restartable: `rewind` is equivalent to `close` followed by `open`.
pub trait TupleIterator {
    fn open(&mut self) -> Result<()>;
    fn has_next(&mut self) -> Result<bool>;
    /// Fails with `NoSuchElement` when the iterator is closed or exhausted.
    fn next(&mut self) -> Result<Tuple>;
    fn rewind(&mut self) -> Result<()>;
    fn close(&mut self);
}

/// Iterates a heap file's live tuples in page-number order, pulling one page
/// at a time through the buffer pool under `ReadOnly` permission so that
/// concurrent readers see a lock-protected view.
pub struct HeapFileIterator<'a> {
    file: &'a HeapFile,
    pool: &'a BufferPool,
    txn: TransactionId,
    /// Next page number to fetch; pages before it are consumed.
    next_page: usize,
    /// Tuples remaining on the current page, None while closed.
    buffered: Option<VecDeque<Tuple>>,
}

impl<'a> HeapFileIterator<'a> {
    pub(super) fn new(file: &'a HeapFile, pool: &'a BufferPool, txn: TransactionId) -> Self {
        Self {
            file,
            pool,
            txn,
            next_page: 0,
            buffered: None,
        }
    }

    /// Copies the live tuples of page `page_no` out of the cache.
    fn load_page(&self, page_no: usize) -> Result<VecDeque<Tuple>> {
        let pid = PageId::new(self.file.table_id(), page_no);
        let page = self.pool.get_page(self.txn, pid, Permissions::ReadOnly)?;
        let guard = page.read();
        Ok(guard.iter().cloned().collect())
    }

    /// Advances past empty pages until the buffer holds a tuple or the file
    /// is exhausted.
    fn fill_buffer(&mut self) -> Result<()> {
        if self.buffered.is_none() {
            return Ok(());
        }
        loop {
            if self.buffered.as_ref().is_some_and(|b| !b.is_empty()) {
                return Ok(());
            }
            if self.next_page >= self.file.num_pages()? {
                return Ok(());
            }
            let tuples = self.load_page(self.next_page)?;
            self.next_page += 1;
            self.buffered = Some(tuples);
        }
    }
}

impl TupleIterator for HeapFileIterator<'_> {
    fn open(&mut self) -> Result<()> {
        self.next_page = 0;
        self.buffered = Some(VecDeque::new());
        self.fill_buffer()
    }

    fn has_next(&mut self) -> Result<bool> {
        if self.buffered.is_none() {
            return Ok(false);
        }
        self.fill_buffer()?;
        Ok(self
            .buffered
            .as_ref()
            .is_some_and(|tuples| !tuples.is_empty()))
    }

    fn next(&mut self) -> Result<Tuple> {
        if !self.has_next()? {
            return Err(DbError::NoSuchElement);
        }
        let buffered = self.buffered.as_mut().ok_or(DbError::NoSuchElement)?;
        buffered.pop_front().ok_or(DbError::NoSuchElement)
    }

    fn rewind(&mut self) -> Result<()> {
        self.close();
        self.open()
    }

    fn close(&mut self) {
        self.next_page = 0;
        self.buffered = None;
    }
}
