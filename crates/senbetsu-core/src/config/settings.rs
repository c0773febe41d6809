use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SenbetsuError};
use crate::quality::QualityCatalog;
use crate::scoring::QualityProfile;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Root of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    /// Replaces the built-in quality catalog when present.
    pub catalog: Option<QualityCatalog>,
    pub profiles: Vec<QualityProfile>,
    pub regex_templates: Vec<RegexTemplateConfig>,
    pub paths: Vec<PathLimits>,
    pub indexers: Vec<IndexerSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Indexer requests allowed in flight at once.
    pub worker_count: usize,
    /// Sleep before reporting "no results" when every indexer failed.
    pub failure_cooldown_secs: u64,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            worker_count: 4,
            failure_cooldown_secs: 30,
        }
    }
}

/// Required and rejected title patterns, bound to a profile per indexer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegexTemplateConfig {
    pub name: String,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub rejected: Vec<String>,
}

/// Size limits of a download path, in megabytes. 0 disables a limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathLimits {
    pub name: String,
    #[serde(default)]
    pub min_size_mb: u64,
    #[serde(default)]
    pub max_size_mb: u64,
}

impl PathLimits {
    #[must_use]
    pub fn min_bytes(&self) -> u64 {
        self.min_size_mb.saturating_mul(BYTES_PER_MB)
    }

    #[must_use]
    pub fn max_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(BYTES_PER_MB)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerSettings {
    pub name: String,
    pub enabled: bool,
    /// The indexer accepts imdb/tvdb id queries; otherwise it is queried by title.
    pub id_search: bool,
}

impl Default for IndexerSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            enabled: true,
            id_search: true,
        }
    }
}

impl Settings {
    /// Parses and validates settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `SenbetsuError::Toml` for malformed input and any error of
    /// [`Settings::validate`].
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads, parses and validates the settings file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `SenbetsuError::Io` if the file cannot be read, otherwise as
    /// [`Settings::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading settings");
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// The configured catalog, or the built-in one.
    ///
    /// # Errors
    ///
    /// Fails only if the embedded catalog is broken.
    pub fn catalog(&self) -> Result<QualityCatalog> {
        match self.catalog {
            Some(ref catalog) => Ok(catalog.clone()),
            None => QualityCatalog::builtin(),
        }
    }

    /// Checks every cross reference of the settings.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: a duplicate or empty profile name, or
    /// a binding or path naming something that is not configured.
    pub fn validate(&self) -> Result<()> {
        if self.general.worker_count == 0 {
            return Err(SenbetsuError::Config(
                "general.worker_count must be at least 1".into(),
            ));
        }

        let mut names = HashSet::new();
        for profile in &self.profiles {
            if profile.name.trim().is_empty() {
                return Err(SenbetsuError::Config("quality profile without a name".into()));
            }
            if !names.insert(profile.name.to_lowercase()) {
                return Err(SenbetsuError::DuplicateProfile(profile.name.clone()));
            }

            for binding in &profile.indexers {
                if self.indexer(&binding.name).is_none() {
                    return Err(SenbetsuError::UnknownIndexer(binding.name.clone()));
                }
                if self.regex_template(&binding.regex_template).is_none() {
                    return Err(SenbetsuError::UnknownRegexTemplate(
                        binding.regex_template.clone(),
                    ));
                }
            }

            for path in &profile.paths {
                if self.path(path).is_none() {
                    return Err(SenbetsuError::UnknownPath(path.clone()));
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn profile(&self, name: &str) -> Option<&QualityProfile> {
        self.profiles
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn indexer(&self, name: &str) -> Option<&IndexerSettings> {
        self.indexers
            .iter()
            .find(|i| i.name.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn regex_template(&self, name: &str) -> Option<&RegexTemplateConfig> {
        self.regex_templates
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn path(&self, name: &str) -> Option<&PathLimits> {
        self.paths.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }
}
