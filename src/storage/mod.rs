mod error;
mod page_file;


pub use error::{StorageError, StorageResult};
pub use page_file::PageFile;

/// Page size in bytes (4KB)
pub const PAGE_SIZE: usize = 4096;

/// Page ID type
pub type PageId = usize;

/// One-time process-wide initialization.
///
/// Currently a no-op; kept so callers have a single setup entry point if
/// global state is ever needed.
pub fn init() {}
