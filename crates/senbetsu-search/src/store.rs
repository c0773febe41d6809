//! Collaborators the search depends on but does not implement.

use async_trait::async_trait;
use senbetsu_core::MediaKind;
use serde::{Deserialize, Serialize};

use crate::candidate::{EpisodeTarget, HeldFile, RawRelease, WantedMedia};
use crate::error::{IndexerError, SearchError};

/// What an indexer is asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryKind {
    /// By external id: imdb for movies, tvdb for series.
    ExternalId {
        imdb: Option<String>,
        tvdb: Option<u32>,
    },
    /// Free-text title query.
    Title(String),
    /// Everything published since the indexer was last polled.
    Latest,
}

/// One request to one indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexerRequest {
    pub indexer: String,
    pub kind: MediaKind,
    pub query: QueryKind,
    pub episode: Option<EpisodeTarget>,
    pub categories: Vec<u32>,
}

/// Facts used to map an RSS release onto a local media record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaLookup {
    pub imdb: Option<String>,
    pub tvdb: Option<u32>,
    pub title: String,
    pub year: Option<u16>,
    /// Episode identifier parsed from the release, series only.
    pub identifier: Option<String>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

/// Read access to local media records and download history.
///
/// Implementations are expected to answer from memory or a local database;
/// calls are made from the synchronous pipeline.
pub trait MediaStore: Send + Sync {
    /// Quality of the files already held for `media`.
    fn held_files(&self, media: &WantedMedia) -> Vec<HeldFile>;

    /// `true` if `url` was already downloaded for this media kind.
    fn is_downloaded_url(&self, kind: MediaKind, url: &str) -> bool;

    /// `true` if a release with this title was already downloaded.
    fn is_downloaded_title(&self, kind: MediaKind, title: &str) -> bool;

    /// Local record matching `lookup`, used to map RSS releases.
    fn find_media(&self, kind: MediaKind, lookup: &MediaLookup) -> Option<WantedMedia>;
}

/// Queries one named indexer. Rate limiting and retries are the client's concern.
#[async_trait]
pub trait IndexerClient: Send + Sync {
    async fn search(&self, request: &IndexerRequest) -> Result<Vec<RawRelease>, IndexerError>;
}

/// Looks up or creates a local media record from external metadata.
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    async fn resolve(
        &self,
        kind: MediaKind,
        lookup: &MediaLookup,
    ) -> Result<Option<WantedMedia>, SearchError>;
}
