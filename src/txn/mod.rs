mod lock;
mod lock_manager;

pub use lock::LockMode;
pub use lock_manager::LockManager;
