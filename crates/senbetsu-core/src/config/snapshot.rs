use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use regex::{Regex, RegexBuilder};
use tracing::info;

use crate::error::{Result, SenbetsuError};
use crate::parser::ReleaseParser;
use crate::quality::QualityTaxonomy;
use crate::scoring::{PriorityResolver, PriorityTables, QualityProfile};

use super::settings::{IndexerSettings, PathLimits, RegexTemplateConfig, Settings};

/// A compiled regex template. Patterns match case-insensitively.
#[derive(Debug, Clone)]
pub struct RegexTemplate {
    pub name: String,
    pub required: Vec<Regex>,
    pub rejected: Vec<Regex>,
}

impl RegexTemplate {
    fn compile(config: &RegexTemplateConfig) -> Result<Self> {
        let build = |pattern: &String| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    SenbetsuError::Config(format!(
                        "regex template {:?}: pattern {pattern:?}: {e}",
                        config.name
                    ))
                })
        };
        Ok(Self {
            name: config.name.clone(),
            required: config.required.iter().map(build).collect::<Result<_>>()?,
            rejected: config.rejected.iter().map(build).collect::<Result<_>>()?,
        })
    }

    /// `true` if no required pattern is configured or one of them matches.
    #[must_use]
    pub fn required_matches(&self, text: &str) -> bool {
        self.required.is_empty() || self.required.iter().any(|re| re.is_match(text))
    }

    /// Rejected patterns matching `text`, in configuration order.
    pub fn rejecting<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a Regex> + 'a {
        self.rejected.iter().filter(move |re| re.is_match(text))
    }
}

/// Everything a search needs from the configuration, compiled once.
///
/// Never modified after construction; a reload builds a new snapshot.
#[derive(Debug)]
pub struct ConfigSnapshot {
    settings: Settings,
    taxonomy: Arc<QualityTaxonomy>,
    tables: PriorityTables,
    parser: ReleaseParser,
    templates: HashMap<String, RegexTemplate>,
    generation: u64,
}

impl ConfigSnapshot {
    /// Validates `settings` and compiles the taxonomy, priority tables and
    /// regex templates.
    ///
    /// # Errors
    ///
    /// Returns any validation or pattern compilation error.
    pub fn build(settings: Settings) -> Result<Self> {
        Self::build_generation(settings, 0)
    }

    fn build_generation(settings: Settings, generation: u64) -> Result<Self> {
        settings.validate()?;

        let taxonomy = Arc::new(QualityTaxonomy::from_catalog(&settings.catalog()?)?);
        let tables = PriorityTables::compile(&taxonomy, &settings.profiles);
        let parser = ReleaseParser::new(Arc::clone(&taxonomy))?;

        let mut templates = HashMap::with_capacity(settings.regex_templates.len());
        for config in &settings.regex_templates {
            templates.insert(config.name.to_lowercase(), RegexTemplate::compile(config)?);
        }

        Ok(Self {
            settings,
            taxonomy,
            tables,
            parser,
            templates,
            generation,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn taxonomy(&self) -> &QualityTaxonomy {
        &self.taxonomy
    }

    #[must_use]
    pub fn tables(&self) -> &PriorityTables {
        &self.tables
    }

    #[must_use]
    pub fn parser(&self) -> &ReleaseParser {
        &self.parser
    }

    #[must_use]
    pub fn resolver(&self) -> PriorityResolver<'_> {
        PriorityResolver::new(&self.taxonomy, &self.tables)
    }

    /// Number of reloads that preceded this snapshot.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// # Errors
    ///
    /// Returns `SenbetsuError::UnknownProfile` if no profile has that name.
    pub fn profile(&self, name: &str) -> Result<&QualityProfile> {
        self.settings
            .profile(name)
            .ok_or_else(|| SenbetsuError::UnknownProfile(name.to_string()))
    }

    /// # Errors
    ///
    /// Returns `SenbetsuError::UnknownRegexTemplate` if no template has that name.
    pub fn regex_template(&self, name: &str) -> Result<&RegexTemplate> {
        self.templates
            .get(&name.to_lowercase())
            .ok_or_else(|| SenbetsuError::UnknownRegexTemplate(name.to_string()))
    }

    /// # Errors
    ///
    /// Returns `SenbetsuError::UnknownIndexer` if no indexer has that name.
    pub fn indexer(&self, name: &str) -> Result<&IndexerSettings> {
        self.settings
            .indexer(name)
            .ok_or_else(|| SenbetsuError::UnknownIndexer(name.to_string()))
    }

    /// Size limits of every path used by `profile`.
    ///
    /// # Errors
    ///
    /// Returns `SenbetsuError::UnknownPath` for a path that is not configured.
    pub fn paths_of(&self, profile: &QualityProfile) -> Result<Vec<&PathLimits>> {
        profile
            .paths
            .iter()
            .map(|name| {
                self.settings
                    .path(name)
                    .ok_or_else(|| SenbetsuError::UnknownPath(name.clone()))
            })
            .collect()
    }
}

/// Shared, atomically replaceable pointer to the current [`ConfigSnapshot`].
///
/// Searches hold the `Arc` they started with; a reload never affects them.
#[derive(Debug)]
pub struct ConfigHandle {
    current: RwLock<Arc<ConfigSnapshot>>,
}

impl ConfigHandle {
    #[must_use]
    pub fn new(snapshot: ConfigSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Builds the first snapshot from `settings`.
    ///
    /// # Errors
    ///
    /// As [`ConfigSnapshot::build`].
    pub fn from_settings(settings: Settings) -> Result<Self> {
        Ok(Self::new(ConfigSnapshot::build(settings)?))
    }

    /// The snapshot searches should use right now.
    #[must_use]
    pub fn current(&self) -> Arc<ConfigSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Builds a complete snapshot from `settings` and swaps it in.
    ///
    /// On error the current snapshot stays in place.
    ///
    /// # Errors
    ///
    /// As [`ConfigSnapshot::build`].
    pub fn reload(&self, settings: Settings) -> Result<Arc<ConfigSnapshot>> {
        let generation = self.current.read().generation + 1;
        let snapshot = Arc::new(ConfigSnapshot::build_generation(settings, generation)?);

        *self.current.write() = Arc::clone(&snapshot);
        info!(
            generation,
            profiles = snapshot.tables.len(),
            "configuration reloaded"
        );
        Ok(snapshot)
    }
}
