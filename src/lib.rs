pub mod storage;

pub use storage::{PAGE_SIZE, PageFile, PageId, StorageError, StorageResult};
