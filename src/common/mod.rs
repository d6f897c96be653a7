pub mod config;
mod error;
mod types;

pub use error::{DbError, Result};
pub use types::{PageId, Permissions, RecordId, SlotId, TableId, TransactionId};
