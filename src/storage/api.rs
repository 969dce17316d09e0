//! Public API for the storage component

pub use crate::storage::error::{StorageError, StorageResult};
pub use crate::storage::json_dir::JsonDirStore;
pub use crate::storage::memory::MemoryStore;
pub use crate::storage::traits::ScanStore;
