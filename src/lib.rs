//! Granite - storage and concurrency core for a disk-oriented RDBMS
//!
//! This crate provides the lower half of a relational database engine: a
//! bounded shared page cache, a strict two-phase lock manager, and heap
//! files that persist fixed-size pages to disk.
//!
//! # Architecture
//!
//! - **Storage Layer** (`storage`): page-granular disk I/O and on-page
//!   tuple organization
//!   - `DiskManager`: reads and writes one table's pages at fixed offsets
//!   - `HeapPage`: presence bitmap plus fixed-width tuple slots
//!   - `HeapFile`: a table as an append-only sequence of heap pages
//!
//! - **Buffer Pool** (`buffer`): the only access path to pages
//!   - `BufferPool`: capacity-bounded cache with no-steal eviction; every
//!     page request first acquires the matching page lock
//!
//! - **Transactions** (`txn`): shared/exclusive page locking
//!   - `LockManager`: strict two-phase locking with in-place upgrade and
//!     timeout-based deadlock avoidance
//!
//! - **Catalog** (`catalog`): table id to heap file/schema registry
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use granite::{Database, HeapFile, TableId, TransactionId};
//! use granite::tuple::{Column, DataType, Schema, Tuple, Value};
//!
//! let db = Database::new(50);
//!
//! let schema = Arc::new(Schema::new(vec![Column::new("id", DataType::Int)]));
//! let table_id = TableId::new(1);
//! let file = Arc::new(HeapFile::new(table_id, "users.tbl", schema.clone()).unwrap());
//! db.catalog().add_table(file);
//!
//! let txn = TransactionId::new();
//! let tuple = Tuple::new(schema, vec![Value::Int(42)]);
//! db.buffer_pool().insert_tuple(txn, table_id, tuple).unwrap();
//! db.buffer_pool().transaction_complete(txn, true).unwrap();
//! ```

pub mod buffer;
pub mod catalog;
pub mod common;
mod db;
pub mod storage;
pub mod tuple;
pub mod txn;

// Re-export commonly used types at the crate root
pub use buffer::BufferPool;
pub use catalog::Catalog;
pub use common::{DbError, PageId, Permissions, RecordId, Result, TableId, TransactionId};
pub use db::Database;
pub use storage::page::HeapPage;
pub use storage::table::{HeapFile, HeapFileIterator, TupleIterator};
pub use txn::{LockManager, LockMode};
