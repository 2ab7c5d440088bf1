/// Errors that can occur in the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading the backing file failed.
    #[error("read failed: {0}")]
    ReadFailed(#[source] std::io::Error),

    /// Writing the backing file failed.
    #[error("write failed: {0}")]
    WriteFailed(#[source] std::io::Error),

    /// The backing file exists but does not hold a string-to-string map.
    #[error("corrupt store: {0}")]
    Corrupt(String),

    /// A previous writer panicked while holding the store lock.
    #[error("store lock poisoned")]
    Poisoned,
}
