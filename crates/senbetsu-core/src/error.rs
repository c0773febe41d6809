use thiserror::Error;

use crate::types::QualityCategory;

/// Errors that can occur during senbetsu core operations.
///
/// Candidate rejection is not represented here: a denied release is a normal
/// outcome, not a failure.
#[derive(Debug, Error)]
pub enum SenbetsuError {
    /// The input string is empty or contains only whitespace.
    #[error("input is empty or whitespace-only")]
    EmptyInput,

    /// A built-in regex pattern failed to compile.
    #[error("regex compilation error: {0}")]
    RegexError(#[from] regex::Error),

    /// A configured quality item carries a pattern that does not compile.
    #[error("invalid pattern for {category} item {name:?}: {source}")]
    InvalidPattern {
        /// Category the item belongs to.
        category: QualityCategory,
        /// Item name as configured.
        name: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// A search referenced a quality profile that is not configured.
    #[error("unknown quality profile: {0}")]
    UnknownProfile(String),

    /// An indexer binding referenced a regex template that is not configured.
    #[error("unknown regex template: {0}")]
    UnknownRegexTemplate(String),

    /// A quality profile referenced an indexer that is not configured.
    #[error("unknown indexer: {0}")]
    UnknownIndexer(String),

    /// A quality profile referenced a download path that is not configured.
    #[error("unknown path: {0}")]
    UnknownPath(String),

    /// Two quality profiles share the same (case-insensitive) name.
    #[error("duplicate quality profile: {0}")]
    DuplicateProfile(String),

    /// Any other inconsistency in the configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for the settings model.
    #[error("failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type alias for senbetsu core operations.
pub type Result<T> = std::result::Result<T, SenbetsuError>;
