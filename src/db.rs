use std::sync::Arc;

use crate::buffer::BufferPool;
use crate::catalog::Catalog;
use crate::common::config::DEFAULT_POOL_SIZE;

/// Bundles the catalog and the buffer pool into one explicitly-owned
/// database instance. Embedders register tables on the catalog and run all
/// page access through the pool.
pub struct Database {
    catalog: Arc<Catalog>,
    buffer_pool: Arc<BufferPool>,
}

impl Database {
    /// Creates a database whose pool caches up to `pool_capacity` pages.
    pub fn new(pool_capacity: usize) -> Self {
        let catalog = Arc::new(Catalog::new());
        let buffer_pool = Arc::new(BufferPool::new(pool_capacity, Arc::clone(&catalog)));
        Self {
            catalog,
            buffer_pool,
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn buffer_pool(&self) -> &Arc<BufferPool> {
        &self.buffer_pool
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}
