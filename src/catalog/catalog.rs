use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::common::{DbError, Result, TableId};
use crate::storage::table::HeapFile;
use crate::tuple::Schema;

/// Registry mapping table ids to their heap files and schemas. The buffer
/// pool consults it to resolve which file services a page identifier's
/// table component.
pub struct Catalog {
    tables: RwLock<HashMap<TableId, Arc<HeapFile>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a table, replacing any previous file under the same id.
    pub fn add_table(&self, file: Arc<HeapFile>) {
        self.tables.write().insert(file.table_id(), file);
    }

    pub fn table_file(&self, table_id: TableId) -> Result<Arc<HeapFile>> {
        self.tables
            .read()
            .get(&table_id)
            .cloned()
            .ok_or(DbError::TableNotFound(table_id))
    }

    pub fn schema(&self, table_id: TableId) -> Result<Arc<Schema>> {
        Ok(Arc::clone(self.table_file(table_id)?.schema()))
    }

    pub fn table_ids(&self) -> Vec<TableId> {
        self.tables.read().keys().copied().collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
