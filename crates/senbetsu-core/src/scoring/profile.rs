use serde::{Deserialize, Serialize};

use crate::types::QualityCategory;

/// Bonus added to a matched priority for a `PROPER` release.
pub const BONUS_PROPER: i32 = 5;
/// Bonus added to a matched priority for an `EXTENDED` release.
pub const BONUS_EXTENDED: i32 = 2;
/// Bonus added to a matched priority for a `REPACK` release.
pub const BONUS_REPACK: i32 = 1;

/// How a reorder rule changes the weight of a combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReorderKind {
    /// `name` is `"<resolution>,<quality>"`; the pair contributes `new_priority`
    /// in place of both weights.
    Combined,
    /// Replaces the weight of the named resolution.
    Resolution,
    /// Replaces the weight of the named quality.
    Quality,
    /// Replaces the weight of the named codec.
    Codec,
    /// Replaces the weight of the named audio format.
    Audio,
    /// Multiplies the weight of the named resolution.
    Position,
}

/// A per-profile override of catalog weights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderRule {
    pub kind: ReorderKind,
    pub name: String,
    pub new_priority: i32,
}

impl ReorderRule {
    /// Convenience constructor for a `combined` rule.
    #[must_use]
    pub fn combined(resolution: &str, quality: &str, new_priority: i32) -> Self {
        Self {
            kind: ReorderKind::Combined,
            name: format!("{resolution},{quality}"),
            new_priority,
        }
    }

    /// Splits a `combined` rule name into its resolution and quality parts.
    #[must_use]
    pub fn combined_parts(&self) -> Option<(&str, &str)> {
        let (res, qual) = self.name.split_once(',')?;
        let (res, qual) = (res.trim(), qual.trim());
        (!res.is_empty() && !qual.is_empty()).then_some((res, qual))
    }
}

/// Which categories contribute to the priority lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityCategories {
    pub resolution: bool,
    pub quality: bool,
    pub codec: bool,
    pub audio: bool,
}

impl Default for PriorityCategories {
    fn default() -> Self {
        Self::ALL
    }
}

impl PriorityCategories {
    /// Every category is priority-relevant.
    pub const ALL: Self = Self {
        resolution: true,
        quality: true,
        codec: true,
        audio: true,
    };

    /// Returns the flag for `category`.
    #[must_use]
    pub fn uses(&self, category: QualityCategory) -> bool {
        match category {
            QualityCategory::Resolution => self.resolution,
            QualityCategory::Quality => self.quality,
            QualityCategory::Codec => self.codec,
            QualityCategory::Audio => self.audio,
        }
    }
}

/// Links a profile to an indexer and the regex template used for its results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexerBinding {
    /// Name of a configured indexer.
    pub name: String,
    /// Name of a configured regex template.
    pub regex_template: String,
    /// Indexer category ids passed through to the indexer client.
    #[serde(default)]
    pub categories: Vec<u32>,
}

/// Named policy describing which releases are wanted and how they rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityProfile {
    pub name: String,

    /// Wanted names per category; an empty list allows anything.
    pub wanted_resolution: Vec<String>,
    pub wanted_quality: Vec<String>,
    pub wanted_codec: Vec<String>,
    pub wanted_audio: Vec<String>,

    pub priority_categories: PriorityCategories,

    /// Adds the proper/extended/repack bonus to matched priorities.
    pub use_other_bonus: bool,

    pub reorder: Vec<ReorderRule>,

    /// Held media at or above this resolution+quality is not upgraded.
    pub cutoff_resolution: Option<String>,
    pub cutoff_quality: Option<String>,

    pub indexers: Vec<IndexerBinding>,

    /// Names of configured download paths whose size limits apply.
    pub paths: Vec<String>,

    pub check_title: bool,
    pub check_year: bool,
    /// Accept the year before and after the wanted one as well.
    pub check_year_lenient: bool,
    /// Retry with title queries when an id query accepted nothing.
    pub search_title_if_empty: bool,
    /// Also query alternate titles on a title search.
    pub search_alternate_titles: bool,
    pub stop_at_first_accepted: bool,
    /// Also consult the title history, not only download URLs.
    pub history_check_title: bool,
    /// Allow the metadata resolver to create unknown media in RSS mode.
    pub add_missing: bool,
    /// A new release must beat the held priority by more than this.
    pub priority_min_difference: i32,
}

impl Default for QualityProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            wanted_resolution: Vec::new(),
            wanted_quality: Vec::new(),
            wanted_codec: Vec::new(),
            wanted_audio: Vec::new(),
            priority_categories: PriorityCategories::default(),
            use_other_bonus: true,
            reorder: Vec::new(),
            cutoff_resolution: None,
            cutoff_quality: None,
            indexers: Vec::new(),
            paths: Vec::new(),
            check_title: true,
            check_year: true,
            check_year_lenient: false,
            search_title_if_empty: false,
            search_alternate_titles: false,
            stop_at_first_accepted: false,
            history_check_title: false,
            add_missing: false,
            priority_min_difference: 0,
        }
    }
}

impl QualityProfile {
    /// Creates a profile with default behavior and the given name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Wanted-list of `category`.
    #[must_use]
    pub fn wanted(&self, category: QualityCategory) -> &[String] {
        match category {
            QualityCategory::Resolution => &self.wanted_resolution,
            QualityCategory::Quality => &self.wanted_quality,
            QualityCategory::Codec => &self.wanted_codec,
            QualityCategory::Audio => &self.wanted_audio,
        }
    }

    /// Returns `true` if `name` passes the wanted-list of `category`.
    ///
    /// An empty list accepts every value, including the unknown one.
    #[must_use]
    pub fn wants(&self, category: QualityCategory, name: &str) -> bool {
        let list = self.wanted(category);
        list.is_empty() || list.iter().any(|w| w.eq_ignore_ascii_case(name))
    }

    /// The binding for indexer `name`, if the profile uses it.
    #[must_use]
    pub fn binding(&self, name: &str) -> Option<&IndexerBinding> {
        self.indexers.iter().find(|b| b.name.eq_ignore_ascii_case(name))
    }
}
