use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use senbetsu_core::{MediaKind, ParsedRelease, QualitySet};
use serde::{Deserialize, Serialize};

/// One release as returned by an indexer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRelease {
    pub title: String,
    pub download_url: String,
    /// Size in bytes, 0 when the indexer did not report it.
    pub size: u64,
    pub indexer: String,
    pub imdb: Option<String>,
    pub tvdb: Option<u32>,
}

impl RawRelease {
    pub fn new(title: impl Into<String>, download_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            download_url: download_url.into(),
            ..Self::default()
        }
    }
}

/// The episode a series search is looking for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeTarget {
    /// `S01E02` for numbered episodes, the air date for daily shows.
    pub identifier: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl EpisodeTarget {
    #[must_use]
    pub fn numbered(season: u32, episode: u32) -> Self {
        Self {
            identifier: format!("S{season:02}E{episode:02}"),
            season: Some(season),
            episode: Some(episode),
        }
    }

    pub fn dated(date: impl Into<String>) -> Self {
        Self {
            identifier: date.into(),
            season: None,
            episode: None,
        }
    }
}

/// A movie or episode the caller wants, as known to the media store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WantedMedia {
    pub id: u64,
    pub kind: MediaKind,
    pub title: String,
    pub alternate_titles: Vec<String>,
    pub year: Option<u16>,
    pub imdb: Option<String>,
    pub tvdb: Option<u32>,
    pub episode: Option<EpisodeTarget>,
}

impl WantedMedia {
    /// `true` if an indexer can be queried by external id.
    #[must_use]
    pub fn has_external_id(&self) -> bool {
        match self.kind {
            MediaKind::Movie => self.imdb.as_deref().is_some_and(|id| !id.is_empty()),
            MediaKind::Series => self.tvdb.is_some_and(|id| id != 0),
        }
    }
}

/// Quality of a file already downloaded for a wanted media.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldFile {
    pub qualities: QualitySet,
    pub proper: bool,
    pub extended: bool,
    pub repack: bool,
}

impl HeldFile {
    /// A parse record carrying only what the resolver looks at.
    #[must_use]
    pub fn to_parsed(&self) -> ParsedRelease {
        let mut parsed = ParsedRelease::default();
        parsed.qualities = self.qualities.clone();
        parsed.proper = self.proper;
        parsed.extended = self.extended;
        parsed.repack = self.repack;
        parsed
    }
}

/// Why a candidate was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    EmptyUrl,
    EmptyTitle,
    TitleTooShort,
    DuplicateUrl,
    TooSmall,
    TooBig,
    AlreadyDownloaded,
    ImdbMismatch,
    TvdbMismatch,
    NoMatchingMedia,
    NoIdentifier,
    IdentifierMismatch,
    RequiredRegexMissing,
    RejectedRegex,
    UnwantedResolution,
    UnwantedQuality,
    UnwantedCodec,
    UnwantedAudio,
    UnknownPriority,
    PrioritySame,
    PriorityLower,
    NoYear,
    UnwantedYear,
    UnwantedTitle,
}

impl RejectReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmptyUrl => "Empty URL",
            Self::EmptyTitle => "Empty Title",
            Self::TitleTooShort => "Title too short",
            Self::DuplicateUrl => "Already added",
            Self::TooSmall => "Too small",
            Self::TooBig => "Too big",
            Self::AlreadyDownloaded => "Already downloaded",
            Self::ImdbMismatch => "Imdb not match",
            Self::TvdbMismatch => "Tvdb not match",
            Self::NoMatchingMedia => "No matching media",
            Self::NoIdentifier => "No identifier",
            Self::IdentifierMismatch => "Identifier not match",
            Self::RequiredRegexMissing => "Required regex not matched",
            Self::RejectedRegex => "Denied by regex",
            Self::UnwantedResolution => "Unwanted Resolution",
            Self::UnwantedQuality => "Unwanted Quality",
            Self::UnwantedCodec => "Unwanted Codec",
            Self::UnwantedAudio => "Unwanted Audio",
            Self::UnknownPriority => "Prio unknown",
            Self::PrioritySame => "Prio same",
            Self::PriorityLower => "Prio lower",
            Self::NoYear => "No Year",
            Self::UnwantedYear => "Unwanted Year",
            Self::UnwantedTitle => "Unwanted Title",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reject reason with optional free-text detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub reason: RejectReason,
    pub detail: Option<String>,
}

impl Rejection {
    #[must_use]
    pub fn new(reason: RejectReason) -> Self {
        Self {
            reason,
            detail: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl From<RejectReason> for Rejection {
    fn from(reason: RejectReason) -> Self {
        Self::new(reason)
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.detail {
            Some(ref detail) => write!(f, "{}: {detail}", self.reason),
            None => write!(f, "{}", self.reason),
        }
    }
}

/// One raw release on its way through the pipeline.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub raw: RawRelease,
    /// Set once the candidate reaches the parse stage.
    pub parsed: Option<ParsedRelease>,
    pub profile: String,
    /// Highest priority among files already held for the target.
    pub minimum_priority: i32,
    pub target: Option<Arc<WantedMedia>>,
    pub rejection: Option<Rejection>,
}

impl Candidate {
    pub fn new(
        raw: RawRelease,
        profile: impl Into<String>,
        target: Option<Arc<WantedMedia>>,
        minimum_priority: i32,
    ) -> Self {
        Self {
            raw,
            parsed: None,
            profile: profile.into(),
            minimum_priority,
            target,
            rejection: None,
        }
    }

    #[must_use]
    pub fn indexer(&self) -> &str {
        &self.raw.indexer
    }

    #[must_use]
    pub fn target_id(&self) -> Option<u64> {
        self.target.as_ref().map(|t| t.id)
    }

    /// Canonical title of the target, empty without one.
    #[must_use]
    pub fn wanted_title(&self) -> &str {
        self.target.as_deref().map_or("", |t| t.title.as_str())
    }

    #[must_use]
    pub fn wanted_alternate_titles(&self) -> &[String] {
        self.target
            .as_deref()
            .map(|t| t.alternate_titles.as_slice())
            .unwrap_or_default()
    }

    /// Resolved priority, 0 before the parse stage.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.parsed.as_ref().map_or(0, |p| p.priority)
    }

    #[must_use]
    pub fn is_denied(&self) -> bool {
        self.rejection.is_some()
    }

    #[must_use]
    pub fn reason(&self) -> Option<RejectReason> {
        self.rejection.as_ref().map(|r| r.reason)
    }
}

/// Outcome of one search: every raw release, and the candidates split into
/// denied and accepted.
#[derive(Debug, Clone, Default)]
pub struct SearchResultSet {
    pub raw: Vec<RawRelease>,
    pub denied: Vec<Candidate>,
    /// Sorted by priority, descending; ties keep encounter order.
    pub accepted: Vec<Candidate>,
    /// Download URLs of every evaluated candidate.
    seen: HashSet<String>,
}

impl SearchResultSet {
    /// `true` if a candidate with `url` was already seen in this run.
    #[must_use]
    pub fn contains_url(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    pub(crate) fn push_accepted(&mut self, candidate: Candidate) {
        self.seen.insert(candidate.raw.download_url.clone());
        self.accepted.push(candidate);
    }

    pub(crate) fn push_denied(&mut self, candidate: Candidate) {
        self.seen.insert(candidate.raw.download_url.clone());
        self.denied.push(candidate);
    }

    #[must_use]
    pub fn has_accepted(&self) -> bool {
        !self.accepted.is_empty()
    }

    /// Highest ranked accepted candidate.
    #[must_use]
    pub fn best(&self) -> Option<&Candidate> {
        self.accepted.first()
    }

    pub(crate) fn sort_accepted(&mut self) {
        self.accepted
            .sort_by(|a, b| b.priority().cmp(&a.priority()));
    }
}
