use std::path::PathBuf;

use thiserror::Error;

/// A failed generation attempt against the external provider. Recovered by
/// retrying and, ultimately, by the hardcoded fallback list; never fatal to
/// the process.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The provider could not be reached or answered with a failure.
    #[error("theme provider request failed: {0}")]
    Provider(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// The provider answered, but nothing survived cleaning and exclusion
    /// filtering.
    #[error("theme provider returned no usable titles")]
    NoUsableTitles,
}

/// Failure to durably write queue state. Fatal to the pop in progress: a
/// theme is never handed out without its consumed record on disk.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create data directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode queue state for {path}: {source}")]
    Encode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Errors surfaced when popping the next theme from the queue.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Generator and fallback both produced nothing new. Unreachable while
    /// the fallback list still has unconsumed entries; once it is fully
    /// burned through with the provider down, there is nothing left to do.
    #[error("theme queue exhausted: generator and fallback produced no usable themes")]
    Exhausted,
    #[error(transparent)]
    Store(#[from] StoreError),
}
