use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("File handle not initialized: {0}")]
    HandleNotInit(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Non-existing page: {0}")]
    NonExistingPage(String),
}

pub type StorageResult<T> = Result<T, StorageError>;
