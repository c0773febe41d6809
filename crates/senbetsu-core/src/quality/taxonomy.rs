use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Result, SenbetsuError};
use crate::types::QualityCategory;

const DEFAULT_CATALOG: &str = include_str!("default_catalog.toml");

/// One configured catalog entry, as written in the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityItemConfig {
    /// Unique name within its category.
    pub name: String,
    /// Regex matched against release names. Items without a pattern only take
    /// part in priority compilation.
    #[serde(default)]
    pub pattern: Option<String>,
    /// Base weight added to the priority of every combination using this item.
    #[serde(default)]
    pub weight: i32,
}

/// The configurable quality catalog: one item list per category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityCatalog {
    #[serde(default)]
    pub resolution: Vec<QualityItemConfig>,
    #[serde(default)]
    pub quality: Vec<QualityItemConfig>,
    #[serde(default)]
    pub codec: Vec<QualityItemConfig>,
    #[serde(default)]
    pub audio: Vec<QualityItemConfig>,
}

impl QualityCatalog {
    /// The catalog shipped with the crate.
    ///
    /// # Errors
    ///
    /// Returns `SenbetsuError::Toml` if the embedded catalog is malformed.
    pub fn builtin() -> Result<Self> {
        Ok(toml::from_str(DEFAULT_CATALOG)?)
    }

    /// Item list of `category`.
    #[must_use]
    pub fn items(&self, category: QualityCategory) -> &[QualityItemConfig] {
        match category {
            QualityCategory::Resolution => &self.resolution,
            QualityCategory::Quality => &self.quality,
            QualityCategory::Codec => &self.codec,
            QualityCategory::Audio => &self.audio,
        }
    }
}

/// An immutable, loaded catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityItem {
    /// Category this item belongs to.
    pub category: QualityCategory,
    /// Configured name, empty for the sentinel.
    pub name: String,
    /// Source of the compiled matcher, if any.
    pub pattern: Option<String>,
    /// Base weight; also decides matching order within the category.
    pub weight: i32,
    /// Identifier within the category; 0 is reserved for the sentinel.
    pub id: u32,
}

impl QualityItem {
    fn sentinel(category: QualityCategory) -> Self {
        Self {
            category,
            name: String::new(),
            pattern: None,
            weight: 0,
            id: 0,
        }
    }

    /// Returns `true` for the per-category "unknown" entry.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.id == 0
    }
}

/// Where a category pattern matched inside a release name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMatch {
    /// Id of the matched item.
    pub id: u32,
    /// Name of the matched item.
    pub name: String,
    /// Byte offset where the match starts.
    pub start: usize,
    /// Byte offset one past the match.
    pub end: usize,
}

#[derive(Debug, Clone)]
struct Matcher {
    id: u32,
    regex: Regex,
}

/// Compiled quality catalog.
///
/// Every category holds its sentinel at index 0 followed by the configured
/// items in catalog order, so `items(category)[id]` is the item with `id`.
#[derive(Debug, Clone)]
pub struct QualityTaxonomy {
    items: [Vec<QualityItem>; 4],
    matchers: [Vec<Matcher>; 4],
}

impl QualityTaxonomy {
    /// Compiles `catalog`, assigning ids `1..` in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `SenbetsuError::InvalidPattern` for a pattern that does not
    /// compile and `SenbetsuError::Config` for a duplicate or empty item name.
    pub fn from_catalog(catalog: &QualityCatalog) -> Result<Self> {
        let mut items: [Vec<QualityItem>; 4] = Default::default();
        let mut matchers: [Vec<Matcher>; 4] = Default::default();

        for category in QualityCategory::ALL {
            let list = &mut items[category.index()];
            list.push(QualityItem::sentinel(category));

            let mut seen = HashSet::new();
            let mut weighted = Vec::new();

            for (position, config) in catalog.items(category).iter().enumerate() {
                let name = config.name.trim();
                if name.is_empty() {
                    return Err(SenbetsuError::Config(format!(
                        "{category} item #{} has an empty name",
                        position + 1
                    )));
                }
                if !seen.insert(name.to_lowercase()) {
                    return Err(SenbetsuError::Config(format!(
                        "duplicate {category} item {name:?}"
                    )));
                }

                let id = (position + 1) as u32;
                if let Some(pattern) = config.pattern.as_deref().filter(|p| !p.is_empty()) {
                    let regex =
                        Regex::new(pattern).map_err(|source| SenbetsuError::InvalidPattern {
                            category,
                            name: name.to_string(),
                            source,
                        })?;
                    weighted.push((config.weight, Matcher { id, regex }));
                }

                list.push(QualityItem {
                    category,
                    name: name.to_string(),
                    pattern: config.pattern.clone(),
                    weight: config.weight,
                    id,
                });
            }

            // Stable sort keeps catalog order among equal weights.
            weighted.sort_by(|a, b| b.0.cmp(&a.0));
            matchers[category.index()] = weighted.into_iter().map(|(_, m)| m).collect();
        }

        Ok(Self { items, matchers })
    }

    /// Compiles the built-in catalog.
    ///
    /// # Errors
    ///
    /// Fails only if the embedded catalog is broken.
    pub fn builtin() -> Result<Self> {
        Self::from_catalog(&QualityCatalog::builtin()?)
    }

    /// All items of `category`, sentinel first.
    #[must_use]
    pub fn items(&self, category: QualityCategory) -> &[QualityItem] {
        &self.items[category.index()]
    }

    /// The "unknown" entry of `category`.
    #[must_use]
    pub fn sentinel(&self, category: QualityCategory) -> &QualityItem {
        &self.items[category.index()][0]
    }

    /// Looks up an item by id. Id 0 yields the sentinel.
    #[must_use]
    pub fn by_id(&self, category: QualityCategory, id: u32) -> Option<&QualityItem> {
        self.items[category.index()].get(id as usize)
    }

    /// Looks up a non-sentinel item by name, ignoring case.
    #[must_use]
    pub fn by_name(&self, category: QualityCategory, name: &str) -> Option<&QualityItem> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        self.items[category.index()]
            .iter()
            .skip(1)
            .find(|item| item.name.eq_ignore_ascii_case(name))
    }

    /// Runs the patterns of `category` against `text` in descending weight
    /// order and returns the first item that matches.
    #[must_use]
    pub fn find_in(&self, category: QualityCategory, text: &str) -> Option<CategoryMatch> {
        for matcher in &self.matchers[category.index()] {
            if let Some(m) = matcher.regex.find(text) {
                let item = &self.items[category.index()][matcher.id as usize];
                trace!(%category, item = %item.name, start = m.start(), "category pattern matched");
                return Some(CategoryMatch {
                    id: item.id,
                    name: item.name.clone(),
                    start: m.start(),
                    end: m.end(),
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taxonomy() -> QualityTaxonomy {
        QualityTaxonomy::builtin().unwrap()
    }

    fn item(name: &str, pattern: Option<&str>, weight: i32) -> QualityItemConfig {
        QualityItemConfig {
            name: name.into(),
            pattern: pattern.map(str::to_string),
            weight,
        }
    }

    #[test]
    fn builtin_catalog_compiles() {
        let t = taxonomy();
        for category in QualityCategory::ALL {
            assert!(t.items(category).len() > 1, "{category} is empty");
            assert!(t.sentinel(category).is_sentinel());
            assert_eq!(t.sentinel(category).weight, 0);
        }
    }

    #[test]
    fn ids_follow_catalog_order() {
        let t = taxonomy();
        for category in QualityCategory::ALL {
            for (idx, item) in t.items(category).iter().enumerate() {
                assert_eq!(item.id as usize, idx);
                assert_eq!(t.by_id(category, item.id), Some(item));
            }
        }
    }

    #[test]
    fn lookup_by_name_ignores_case() {
        let t = taxonomy();
        let item = t.by_name(QualityCategory::Resolution, "1080P").unwrap();
        assert_eq!(item.name, "1080p");
        assert!(t.by_name(QualityCategory::Resolution, "").is_none());
        assert!(t.by_name(QualityCategory::Resolution, "9000p").is_none());
    }

    #[test]
    fn resolution_variants() {
        let t = taxonomy();
        for (input, expected) in [
            ("Movie.2019.2160p.UHD", "2160p"),
            ("Movie 4K HDR", "2160p"),
            ("Movie.1080i.HDTV", "1080p"),
            ("Movie.720p.WEB", "720p"),
            ("Movie.480p.DVD", "480p"),
        ] {
            let m = t.find_in(QualityCategory::Resolution, input).unwrap();
            assert_eq!(m.name, expected, "failed for input: {input}");
        }
    }

    #[test]
    fn codec_variants() {
        let t = taxonomy();
        for (input, expected) in [
            ("x264-GROUP", "h264"),
            ("H.264", "h264"),
            ("x265", "h265"),
            ("HEVC", "h265"),
            ("AV1", "av1"),
            ("XviD", "xvid"),
        ] {
            let m = t.find_in(QualityCategory::Codec, input).unwrap();
            assert_eq!(m.name, expected, "failed for input: {input}");
        }
    }

    #[test]
    fn higher_weight_audio_wins() {
        let t = taxonomy();
        let m = t
            .find_in(QualityCategory::Audio, "Show.S02E05.720p.WEB.DDP5.1")
            .unwrap();
        assert_eq!(m.name, "dd+");

        let m = t.find_in(QualityCategory::Audio, "Movie.DTS-HD.MA.5.1").unwrap();
        assert_eq!(m.name, "dts-hd");

        let m = t.find_in(QualityCategory::Audio, "Movie.DD5.1.x264").unwrap();
        assert_eq!(m.name, "dd");
    }

    #[test]
    fn webdl_does_not_swallow_webrip() {
        let t = taxonomy();
        for input in ["Show.720p.WEBRip.x264", "Show.720p.WEB-Rip.x264", "Show.720p.WEB.Rip.x264"] {
            let m = t.find_in(QualityCategory::Quality, input).unwrap();
            assert_eq!(m.name, "webrip", "failed for input: {input}");
        }
        for input in ["Show.720p.WEB-DL", "Show.720p.WEB.DL", "Show.720p.WEB.x264"] {
            let m = t.find_in(QualityCategory::Quality, input).unwrap();
            assert_eq!(m.name, "webdl", "failed for input: {input}");
        }
    }

    #[test]
    fn match_reports_offsets() {
        let t = taxonomy();
        let m = t.find_in(QualityCategory::Resolution, "Movie.1080p").unwrap();
        assert_eq!((m.start, m.end), (6, 11));
    }

    #[test]
    fn items_without_pattern_never_match() {
        let catalog = QualityCatalog {
            resolution: vec![item("1080p", None, 10)],
            ..QualityCatalog::default()
        };
        let t = QualityTaxonomy::from_catalog(&catalog).unwrap();
        assert_eq!(t.items(QualityCategory::Resolution).len(), 2);
        assert!(t.find_in(QualityCategory::Resolution, "1080p").is_none());
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let catalog = QualityCatalog {
            codec: vec![item("broken", Some("(x264"), 1)],
            ..QualityCatalog::default()
        };
        let err = QualityTaxonomy::from_catalog(&catalog).unwrap_err();
        assert!(matches!(
            err,
            SenbetsuError::InvalidPattern {
                category: QualityCategory::Codec,
                ..
            }
        ));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let catalog = QualityCatalog {
            quality: vec![item("bluray", None, 1), item("BluRay", None, 2)],
            ..QualityCatalog::default()
        };
        assert!(matches!(
            QualityTaxonomy::from_catalog(&catalog),
            Err(SenbetsuError::Config(_))
        ));
    }

    #[test]
    fn empty_catalog_has_only_sentinels() {
        let t = QualityTaxonomy::from_catalog(&QualityCatalog::default()).unwrap();
        for category in QualityCategory::ALL {
            assert_eq!(t.items(category).len(), 1);
        }
    }
}
