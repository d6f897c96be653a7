use thiserror::Error;

use super::types::{PageId, SlotId, TableId};

/// Database error types
#[derive(Error, Debug)]
pub enum DbError {
    /// Lock wait deadline expired, or a lock/iterator operation ran outside
    /// a valid transaction. The caller is expected to roll the whole
    /// transaction back and may retry it from the start.
    #[error("transaction aborted")]
    TransactionAborted,

    /// An access mode outside ReadOnly/ReadWrite was requested.
    #[error("invalid permission requested")]
    InvalidPermission,

    /// Eviction scanned the whole pool without finding a clean victim.
    /// Under the no-steal policy dirty pages stay resident until their
    /// transaction completes, so the triggering operation fails instead.
    #[error("buffer pool is full, every resident page is dirty")]
    BufferPoolFull,

    /// Iterator exhausted; expected control-flow signal, not a failure.
    #[error("iterator exhausted")]
    NoSuchElement,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("table {0} not found in catalog")]
    TableNotFound(TableId),

    #[error("page {0} has no free slot")]
    PageFull(PageId),

    #[error("slot {0:?} on page {1} is empty")]
    EmptySlot(SlotId, PageId),

    #[error("slot {0:?} is out of range for page {1}")]
    InvalidSlot(SlotId, PageId),

    #[error("tuple has no record id")]
    MissingRecordId,

    #[error("tuple does not belong to table {0}")]
    WrongTable(TableId),

    #[error("tuple does not match the table schema")]
    SchemaMismatch,

    #[error("malformed page image for {0}")]
    CorruptPage(PageId),
}

pub type Result<T> = std::result::Result<T, DbError>;
