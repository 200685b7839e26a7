use thiserror::Error;

pub type Result<T> = std::result::Result<T, PageStoreError>;

#[derive(Error, Debug)]
pub enum PageStoreError {
    #[error("Page not found: {0}")]
    NotFound(String),

    #[error("Fetching '{name}' failed: {source}")]
    Source {
        name: String,
        #[source]
        source: SourceError,
    },

    #[error("Fetching '{name}' timed out after {secs}s")]
    Timeout { name: String, secs: u64 },

    #[error("Cache entry '{key}' is invalid: {reason}")]
    InvalidEntry { key: String, reason: String },

    #[error("Cache snapshot is invalid: {0}")]
    InvalidSnapshot(String),

    #[error("Page name cannot be used as a storage key: {0:?}")]
    UnstorableKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl PageStoreError {
    /// True when the source reported that the page does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Failure reported by a [`crate::PageSource`] implementation.
///
/// Distinct from a missing page: the page may exist, it just could not be
/// retrieved this time.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Protocol(String),
}
