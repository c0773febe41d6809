use senbetsu_core::SenbetsuError;
use thiserror::Error;

/// Errors that abort a search invocation.
///
/// A search that accepts nothing is not an error, and neither is a single
/// failing indexer.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Missing profile, indexer, regex template or path.
    #[error(transparent)]
    Config(#[from] SenbetsuError),

    #[error("indexer {indexer} failed: {message}")]
    Indexer { indexer: String, message: String },

    #[error("metadata resolver failed: {0}")]
    Resolver(String),
}

/// Failure of one indexer request. Isolated to that indexer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexerError {
    #[error("indexer unreachable: {0}")]
    Unreachable(String),

    #[error("rate limited")]
    RateLimited,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SearchError>;
