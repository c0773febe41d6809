//! # Senbetsu Search
//!
//! Turns raw indexer results into a ranked list of acceptable releases.
//!
//! - [`Pipeline`]: checks candidates one at a time and records why each
//!   denied one was denied.
//! - [`Searcher`]: queries every indexer of a profile concurrently and feeds
//!   the merged results through the pipeline.
//!
//! Storage, indexer access and metadata lookups are the caller's, behind the
//! [`MediaStore`], [`IndexerClient`] and [`MetadataResolver`] traits.

pub mod candidate;
mod checks;
pub mod error;
pub mod pipeline;
pub mod search;
pub mod store;
pub mod title;

pub use candidate::{
    Candidate, EpisodeTarget, HeldFile, RawRelease, RejectReason, Rejection, SearchResultSet,
    WantedMedia,
};
pub use checks::identifier_matches;
pub use error::{IndexerError, Result, SearchError};
pub use pipeline::Pipeline;
pub use search::{SearchOutcome, SearchRequest, SearchScope, Searcher};
pub use store::{IndexerClient, IndexerRequest, MediaLookup, MediaStore, MetadataResolver, QueryKind};
pub use title::{slug, title_matches};
