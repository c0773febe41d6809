//! # Candidate Filter Pipeline
//!
//! Runs every raw release through a fixed sequence of checks. The first
//! failing check denies the candidate and records the reason; a candidate
//! passing all of them is accepted.

use std::collections::HashMap;
use std::sync::Arc;

use senbetsu_core::{
    ConfigSnapshot, MediaKind, PathLimits, QualityProfile, RegexTemplate, ResolveOptions,
};
use tracing::debug;

use crate::candidate::{Candidate, RawRelease, Rejection, SearchResultSet, WantedMedia};
use crate::error::Result;
use crate::store::MediaStore;

/// Profile-bound view of a configuration snapshot for one search.
pub struct Pipeline<'a> {
    pub(crate) snapshot: &'a ConfigSnapshot,
    pub(crate) profile: &'a QualityProfile,
    pub(crate) kind: MediaKind,
    pub(crate) rss: bool,
    pub(crate) paths: Vec<&'a PathLimits>,
    /// Regex template per lower-cased indexer name.
    pub(crate) templates: HashMap<String, &'a RegexTemplate>,
    pub(crate) store: &'a dyn MediaStore,
}

impl<'a> Pipeline<'a> {
    /// Resolves the profile, its paths and the regex template of every
    /// indexer binding.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Config` if any of them is not configured.
    pub fn new(
        snapshot: &'a ConfigSnapshot,
        profile: &str,
        kind: MediaKind,
        store: &'a dyn MediaStore,
    ) -> Result<Self> {
        let profile = snapshot.profile(profile)?;
        let paths = snapshot.paths_of(profile)?;

        let mut templates = HashMap::with_capacity(profile.indexers.len());
        for binding in &profile.indexers {
            snapshot.indexer(&binding.name)?;
            let template = snapshot.regex_template(&binding.regex_template)?;
            templates.insert(binding.name.to_lowercase(), template);
        }

        Ok(Self {
            snapshot,
            profile,
            kind,
            rss: false,
            paths,
            templates,
            store,
        })
    }

    /// Marks the run as an RSS poll: no year check, candidates mapped per release.
    #[must_use]
    pub fn rss(mut self, rss: bool) -> Self {
        self.rss = rss;
        self
    }

    #[must_use]
    pub fn profile(&self) -> &QualityProfile {
        self.profile
    }

    /// Highest priority among the files already held for `media`, 0 if none.
    #[must_use]
    pub fn minimum_priority(&self, media: &WantedMedia) -> i32 {
        let resolver = self.snapshot.resolver();
        self.store
            .held_files(media)
            .iter()
            .map(|held| {
                let mut parsed = held.to_parsed();
                resolver
                    .resolve(&mut parsed, self.profile, ResolveOptions::search())
                    .priority
            })
            .max()
            .unwrap_or(0)
    }

    /// Evaluates every release against `target`.
    pub fn evaluate_for(&self, releases: Vec<RawRelease>, target: &Arc<WantedMedia>) -> SearchResultSet {
        let mut set = SearchResultSet::default();
        self.evaluate_into(
            &mut set,
            releases.into_iter().map(|raw| (raw, Some(Arc::clone(target)))),
        );
        set
    }

    /// Evaluates `releases` in order and appends them to `set`.
    ///
    /// Candidates already in `set` take part in duplicate detection. Accepted
    /// candidates are re-sorted by priority, descending, ties in encounter order.
    pub fn evaluate_into<I>(&self, set: &mut SearchResultSet, releases: I)
    where
        I: IntoIterator<Item = (RawRelease, Option<Arc<WantedMedia>>)>,
    {
        let mut minimums: HashMap<u64, i32> = HashMap::new();
        let mut releases = releases.into_iter();

        for (raw, target) in releases.by_ref() {
            set.raw.push(raw.clone());

            let minimum = target.as_deref().map_or(0, |media| {
                *minimums
                    .entry(media.id)
                    .or_insert_with(|| self.minimum_priority(media))
            });
            let mut candidate = Candidate::new(raw, &self.profile.name, target, minimum);

            match self.check(&mut candidate, set) {
                Ok(()) => {
                    debug!(
                        title = %candidate.raw.title,
                        indexer = %candidate.raw.indexer,
                        priority = candidate.priority(),
                        "candidate accepted"
                    );
                    set.push_accepted(candidate);
                    if self.profile.stop_at_first_accepted {
                        break;
                    }
                }
                Err(rejection) => {
                    debug!(
                        title = %candidate.raw.title,
                        indexer = %candidate.raw.indexer,
                        reason = %rejection,
                        "candidate denied"
                    );
                    candidate.rejection = Some(rejection);
                    set.push_denied(candidate);
                }
            }
        }

        // Releases after a stop-at-first acceptance are kept as raw only.
        set.raw.extend(releases.map(|(raw, _)| raw));
        set.sort_accepted();
    }

    /// Runs every stage in order, stopping at the first rejection.
    fn check(&self, candidate: &mut Candidate, set: &SearchResultSet) -> std::result::Result<(), Rejection> {
        self.check_dedup(candidate, set)?;
        self.check_size(candidate)?;
        self.check_history(candidate)?;
        self.check_identity(candidate)?;
        self.parse_and_resolve(candidate)?;
        self.check_identifier(candidate)?;
        self.check_regex(candidate)?;
        self.check_wanted(candidate)?;
        self.check_priority(candidate)?;
        self.check_year(candidate)?;
        self.check_title(candidate)?;
        Ok(())
    }
}
