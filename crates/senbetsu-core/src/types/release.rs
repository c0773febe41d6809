use std::fmt;

use serde::{Deserialize, Serialize};

use super::category::{QualityCategory, QualitySet};

/// Whether a release is looked at as a movie or as a series episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Feature film, matched by title, year and IMDB id.
    #[default]
    Movie,
    /// Series episode, matched by title, identifier and TVDB id.
    Series,
}

impl MediaKind {
    /// Returns `true` for [`MediaKind::Series`].
    #[must_use]
    pub fn is_series(self) -> bool {
        matches!(self, Self::Series)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movie => write!(f, "movie"),
            Self::Series => write!(f, "series"),
        }
    }
}

/// Structured metadata extracted from one release name.
///
/// Created by the release parser, enriched by an optional media probe and
/// by the priority resolver, then consumed by the candidate pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedRelease {
    /// Input exactly as given.
    pub raw: String,

    /// Final path component with a known video extension removed.
    pub file_title: String,

    /// Normalized string the patterns ran against.
    pub working: String,

    /// Extracted release title, possibly empty.
    pub title: String,

    /// Resolution, quality, codec and audio names and ids.
    pub qualities: QualitySet,

    /// Season number without leading zeros, e.g. `"2"`.
    pub season: Option<String>,

    /// Episode number without leading zeros, e.g. `"5"`.
    pub episode: Option<String>,

    /// Numeric form of [`Self::season`].
    pub season_number: Option<u32>,

    /// Numeric form of [`Self::episode`].
    pub episode_number: Option<u32>,

    /// Air date for date-based series, as written in the name.
    pub date: Option<String>,

    /// Episode identifier such as `S02E05`, `2x05` or an air date.
    pub identifier: Option<String>,

    /// Release year.
    pub year: Option<u16>,

    /// IMDB id including the `tt` prefix.
    pub imdb: Option<String>,

    /// TVDB series id.
    pub tvdb: Option<u32>,

    /// ISO 639-1 language codes in order of appearance.
    pub languages: Vec<String>,

    /// `PROPER` tag present.
    pub proper: bool,

    /// `EXTENDED` tag present.
    pub extended: bool,

    /// `REPACK` tag present.
    pub repack: bool,

    /// Video height in pixels from a media probe, 0 when unknown.
    pub height: u32,

    /// Video width in pixels from a media probe, 0 when unknown.
    pub width: u32,

    /// Runtime in seconds from a media probe, 0 when unknown.
    pub runtime: u32,

    /// Resolved priority, 0 until the resolver ran or when no table entry matched.
    pub priority: i32,

    /// Start offset of the earliest boundary token found in `working`.
    #[serde(skip)]
    pub(crate) first_match: Option<usize>,
}

impl ParsedRelease {
    /// Creates an empty record for `raw`.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            ..Self::default()
        }
    }

    /// Resolved name of `category`, empty when unknown.
    #[must_use]
    pub fn quality_name(&self, category: QualityCategory) -> &str {
        self.qualities.get(category).name_str()
    }

    /// Returns `true` if the parser isolated a non-empty title.
    #[must_use]
    pub fn has_title(&self) -> bool {
        !self.title.is_empty()
    }

    /// Returns `true` if any episode addressing was extracted.
    #[must_use]
    pub fn has_episode_info(&self) -> bool {
        self.identifier.is_some() || self.season.is_some() || self.episode.is_some()
    }

    /// Start offset of the first metadata token found in the working string.
    #[must_use]
    pub fn first_match(&self) -> Option<usize> {
        self.first_match
    }
}

impl fmt::Display for ParsedRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParsedRelease(title={:?}", self.title)?;
        if let Some(year) = self.year {
            write!(f, ", year={year}")?;
        }
        if let Some(ref identifier) = self.identifier {
            write!(f, ", id={identifier}")?;
        }
        for (category, slot) in self.qualities.iter() {
            if let Some(ref name) = slot.name {
                write!(f, ", {category}={name}")?;
            }
        }
        write!(f, ", prio={})", self.priority)
    }
}

/// Stream facts from a media probe, used for the second enrichment pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeInfo {
    /// Video width in pixels.
    pub width: u32,
    /// Video height in pixels.
    pub height: u32,
    /// Duration in seconds.
    pub runtime: u32,
    /// Video codec as reported by the prober, e.g. `"hevc"`.
    pub video_codec: Option<String>,
    /// Primary audio codec as reported by the prober, e.g. `"eac3"`.
    pub audio_codec: Option<String>,
    /// Audio track languages.
    pub languages: Vec<String>,
}
