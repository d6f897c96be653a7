use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::common::{config, Result};

/// DiskManager is responsible for reading and writing one table's pages
/// to/from its backing file. Pages live at fixed offsets: page `n` occupies
/// bytes `[n * page_size, (n + 1) * page_size)`.
pub struct DiskManager {
    /// The table's backing file
    file: Mutex<File>,
    #[cfg(test)]
    fail_writes: AtomicBool,
}

impl DiskManager {
    /// Opens (creating if necessary) the backing file at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        Ok(Self {
            file: Mutex::new(file),
            #[cfg(test)]
            fail_writes: AtomicBool::new(false),
        })
    }

    /// Reads page `page_no` from disk into the provided buffer.
    /// The buffer must be exactly `page_size` bytes. Fails with an I/O error
    /// (unexpected EOF) if the file does not extend to the requested page;
    /// callers treat that as fatal since the page does not exist.
    pub fn read_page(&self, page_no: usize, data: &mut [u8]) -> Result<()> {
        let page_size = config::page_size();
        assert_eq!(data.len(), page_size, "buffer must be page_size bytes");

        let offset = (page_no * page_size) as u64;

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(data)?;
        Ok(())
    }

    /// Writes page `page_no` to disk from the provided buffer.
    /// The buffer must be exactly `page_size` bytes. Positional write, so a
    /// failure cannot corrupt neighboring pages.
    pub fn write_page(&self, page_no: usize, data: &[u8]) -> Result<()> {
        let page_size = config::page_size();
        assert_eq!(data.len(), page_size, "buffer must be page_size bytes");

        #[cfg(test)]
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, "write failure").into());
        }

        let offset = (page_no * page_size) as u64;

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;
        file.flush()?;
        Ok(())
    }

    /// Number of pages in the file, `ceil(file_len / page_size)`.
    /// Computed from live file metadata on every call: the file grows as
    /// tuples are inserted, so a cached count would go stale.
    pub fn num_pages(&self) -> Result<usize> {
        let page_size = config::page_size() as u64;
        let len = self.file.lock().metadata()?.len();
        Ok(len.div_ceil(page_size) as usize)
    }

    /// Appends one page to the end of the file and returns its page number.
    /// The length check and the write happen under the same file lock, so
    /// concurrent appends get distinct page numbers.
    pub fn append_page(&self, data: &[u8]) -> Result<usize> {
        let page_size = config::page_size();
        assert_eq!(data.len(), page_size, "buffer must be page_size bytes");

        let mut file = self.file.lock();
        let len = file.metadata()?.len();
        let page_no = (len as usize).div_ceil(page_size);

        file.seek(SeekFrom::Start((page_no * page_size) as u64))?;
        file.write_all(data)?;
        file.flush()?;
        Ok(page_no)
    }

    /// Makes every subsequent `write_page` fail with an I/O error, for
    /// exercising write-back error paths.
    #[cfg(test)]
    pub(crate) fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }
}

impl Drop for DiskManager {
    fn drop(&mut self) {
        let file = self.file.get_mut();
        let _ = file.sync_all();
    }
}
