use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Problems with a stored cache entry. These never abort a read; the entry
/// is reported and treated as absent.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cached comparison data is not valid: {0}")]
    MalformedPayload(String),

    #[error("Cache timestamp is not a millisecond count: {0}")]
    MalformedTimestamp(String),
}
