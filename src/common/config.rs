use std::sync::atomic::{AtomicUsize, Ordering};

/// Default size of a page in bytes (4 KB)
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Default number of pages the buffer pool caches
pub const DEFAULT_POOL_SIZE: usize = 50;

static PAGE_SIZE: AtomicUsize = AtomicUsize::new(DEFAULT_PAGE_SIZE);

/// Returns the process-wide page size. Every component that touches page
/// bytes reads this live rather than caching it.
pub fn page_size() -> usize {
    PAGE_SIZE.load(Ordering::Relaxed)
}

/// Overrides the process-wide page size. Intended for tests that want small
/// pages; production code runs with the committed default.
pub fn set_page_size(bytes: usize) {
    assert!(bytes > 0, "page size must be non-zero");
    PAGE_SIZE.store(bytes, Ordering::Relaxed);
}

/// Restores the default page size after a test override.
pub fn reset_page_size() {
    PAGE_SIZE.store(DEFAULT_PAGE_SIZE, Ordering::Relaxed);
}
