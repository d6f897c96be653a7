use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::buffer::BufferPool;
use crate::common::{config, DbError, PageId, Permissions, Result, TableId, TransactionId};
use crate::storage::disk::DiskManager;
use crate::storage::page::HeapPage;
use crate::tuple::{Schema, Tuple};

use super::HeapFileIterator;

/// HeapFile stores one table's tuples in no particular order, as an
/// append-only sequence of fixed-size pages in a single backing file.
///
/// Raw storage content changes only through `insert_tuple`/`delete_tuple`,
/// and those fetch every page they touch through the buffer pool so that the
/// lock manager mediates all access. Only the pool itself calls `read_page`
/// and `write_page` directly (on load, flush, and eviction).
pub struct HeapFile {
    table_id: TableId,
    schema: Arc<Schema>,
    disk: DiskManager,
}

impl HeapFile {
    pub fn new<P: AsRef<Path>>(table_id: TableId, path: P, schema: Arc<Schema>) -> Result<Self> {
        Ok(Self {
            table_id,
            schema,
            disk: DiskManager::new(path)?,
        })
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Number of pages in the backing file, reflecting storage state live.
    pub fn num_pages(&self) -> Result<usize> {
        self.disk.num_pages()
    }

    /// Reads the page at `pid` from stable storage. Fails if the file does
    /// not extend to the requested page.
    pub fn read_page(&self, pid: PageId) -> Result<HeapPage> {
        debug_assert_eq!(pid.table_id, self.table_id);
        let mut data = vec![0u8; config::page_size()];
        self.disk.read_page(pid.page_no, &mut data)?;
        HeapPage::from_bytes(pid, Arc::clone(&self.schema), &data)
    }

    /// Writes a page back to stable storage at its fixed offset.
    pub fn write_page(&self, page: &HeapPage) -> Result<()> {
        debug_assert_eq!(page.pid().table_id, self.table_id);
        self.disk.write_page(page.pid().page_no, &page.to_bytes())
    }

    /// Inserts `tuple` into the first page with a free slot, growing the
    /// file by one empty page when every existing page is full. All page
    /// access goes through the buffer pool under `ReadWrite` permission.
    /// Returns the pages the operation modified; the pool marks them dirty
    /// and installs them.
    pub fn insert_tuple(
        &self,
        pool: &BufferPool,
        txn: TransactionId,
        tuple: Tuple,
    ) -> Result<Vec<Arc<RwLock<HeapPage>>>> {
        if *tuple.schema().as_ref() != *self.schema {
            return Err(DbError::SchemaMismatch);
        }

        for page_no in 0..self.num_pages()? {
            let pid = PageId::new(self.table_id, page_no);
            let page = pool.get_page(txn, pid, Permissions::ReadWrite)?;
            let mut guard = page.write();
            if guard.empty_slots() > 0 {
                guard.insert_tuple(tuple)?;
                drop(guard);
                return Ok(vec![page]);
            }
        }

        // Every page is full: extend the file with a blank page, then insert
        // through the pool like any other page.
        let page_no = self.disk.append_page(&vec![0u8; config::page_size()])?;
        let pid = PageId::new(self.table_id, page_no);
        let page = pool.get_page(txn, pid, Permissions::ReadWrite)?;
        page.write().insert_tuple(tuple)?;
        Ok(vec![page])
    }

    /// Removes `tuple` from the page its record id names. Returns the pages
    /// the operation modified.
    pub fn delete_tuple(
        &self,
        pool: &BufferPool,
        txn: TransactionId,
        tuple: &Tuple,
    ) -> Result<Vec<Arc<RwLock<HeapPage>>>> {
        let rid = tuple.rid().ok_or(DbError::MissingRecordId)?;
        if rid.page_id.table_id != self.table_id {
            return Err(DbError::WrongTable(self.table_id));
        }

        let page = pool.get_page(txn, rid.page_id, Permissions::ReadWrite)?;
        page.write().delete_tuple(&rid)?;
        Ok(vec![page])
    }

    /// Returns an iterator over every live tuple in the file, in page-number
    /// order, fetching pages through the buffer pool on behalf of `txn`.
    /// The iterator starts closed; call `open` before consuming it.
    pub fn iter<'a>(&'a self, pool: &'a BufferPool, txn: TransactionId) -> HeapFileIterator<'a> {
        HeapFileIterator::new(self, pool, txn)
    }

    #[cfg(test)]
    pub(crate) fn fail_writes(&self, fail: bool) {
        self.disk.fail_writes(fail);
    }
}
