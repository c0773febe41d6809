//! # Senbetsu
//!
//! Release selection for media acquisition: parse release names, rank them
//! by quality profile and filter indexer search results.
//!
//! This crate re-exports [`senbetsu_core`] (parser, taxonomy, priorities,
//! configuration) and [`senbetsu_search`] (candidate pipeline and search
//! orchestrator).
//!
//! ```
//! use std::sync::Arc;
//! use senbetsu::{MediaKind, QualityCategory, QualityTaxonomy, ReleaseParser};
//!
//! let parser = ReleaseParser::new(Arc::new(QualityTaxonomy::builtin()?))?;
//! let release = parser.parse("Show.Name.S02E05.720p.WEB.DDP5.1", MediaKind::Series)?;
//! assert_eq!(release.identifier.as_deref(), Some("S02E05"));
//! assert_eq!(release.quality_name(QualityCategory::Resolution), "720p");
//! # Ok::<(), senbetsu::SenbetsuError>(())
//! ```

pub use senbetsu_core::*;
pub use senbetsu_search::{
    Candidate, EpisodeTarget, HeldFile, IndexerClient, IndexerError, IndexerRequest, MediaLookup,
    MediaStore, MetadataResolver, Pipeline, QueryKind, RawRelease, RejectReason, Rejection,
    SearchError, SearchOutcome, SearchRequest, SearchResultSet, SearchScope, Searcher,
    WantedMedia, identifier_matches, slug, title_matches,
};
