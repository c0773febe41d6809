use senbetsu_core::{MediaKind, QualityCategory, RegexTemplate, ResolveOptions};
use tracing::trace;

use crate::candidate::{Candidate, EpisodeTarget, RejectReason, Rejection, SearchResultSet};
use crate::pipeline::Pipeline;
use crate::title::title_matches;

type Stage = Result<(), Rejection>;

const MIN_TITLE_CHARS: usize = 4;

/// Wanted-list checks in evaluation order.
const WANTED_CHECKS: [(QualityCategory, RejectReason); 4] = [
    (QualityCategory::Resolution, RejectReason::UnwantedResolution),
    (QualityCategory::Quality, RejectReason::UnwantedQuality),
    (QualityCategory::Audio, RejectReason::UnwantedAudio),
    (QualityCategory::Codec, RejectReason::UnwantedCodec),
];

impl Pipeline<'_> {
    pub(crate) fn check_dedup(&self, candidate: &Candidate, set: &SearchResultSet) -> Stage {
        let raw = &candidate.raw;
        if raw.download_url.trim().is_empty() {
            return Err(RejectReason::EmptyUrl.into());
        }
        let title = raw.title.trim();
        if title.is_empty() {
            return Err(RejectReason::EmptyTitle.into());
        }
        if set.contains_url(&raw.download_url) {
            return Err(RejectReason::DuplicateUrl.into());
        }
        if title.chars().count() < MIN_TITLE_CHARS {
            return Err(RejectReason::TitleTooShort.into());
        }
        Ok(())
    }

    /// A size of 0 means the indexer did not report one and is not checked.
    pub(crate) fn check_size(&self, candidate: &Candidate) -> Stage {
        let size = candidate.raw.size;
        if size == 0 {
            return Ok(());
        }
        for path in &self.paths {
            let min = path.min_bytes();
            if min > 0 && size < min {
                return Err(Rejection::new(RejectReason::TooSmall)
                    .with_detail(format!("{size} < {min} ({})", path.name)));
            }
            let max = path.max_bytes();
            if max > 0 && size > max {
                return Err(Rejection::new(RejectReason::TooBig)
                    .with_detail(format!("{size} > {max} ({})", path.name)));
            }
        }
        Ok(())
    }

    pub(crate) fn check_history(&self, candidate: &Candidate) -> Stage {
        let raw = &candidate.raw;
        if self.store.is_downloaded_url(self.kind, &raw.download_url) {
            return Err(Rejection::new(RejectReason::AlreadyDownloaded).with_detail("url"));
        }
        if self.profile.history_check_title && self.store.is_downloaded_title(self.kind, &raw.title)
        {
            return Err(Rejection::new(RejectReason::AlreadyDownloaded).with_detail("title"));
        }
        Ok(())
    }

    pub(crate) fn check_identity(&self, candidate: &Candidate) -> Stage {
        let Some(target) = candidate.target.as_deref() else {
            return Err(RejectReason::NoMatchingMedia.into());
        };
        let raw = &candidate.raw;

        match self.kind {
            MediaKind::Movie => {
                if let (Some(found), Some(wanted)) = (raw.imdb.as_deref(), target.imdb.as_deref()) {
                    if !found.is_empty()
                        && !wanted.is_empty()
                        && normalize_imdb(found) != normalize_imdb(wanted)
                    {
                        return Err(Rejection::new(RejectReason::ImdbMismatch)
                            .with_detail(format!("{found} != {wanted}")));
                    }
                }
            }
            MediaKind::Series => {
                if let (Some(found), Some(wanted)) = (raw.tvdb, target.tvdb) {
                    if found != 0 && wanted != 0 && found != wanted {
                        return Err(Rejection::new(RejectReason::TvdbMismatch)
                            .with_detail(format!("{found} != {wanted}")));
                    }
                }
            }
        }
        Ok(())
    }

    pub(crate) fn parse_and_resolve(&self, candidate: &mut Candidate) -> Stage {
        let mut parsed = self
            .snapshot
            .parser()
            .parse(&candidate.raw.title, self.kind)
            .map_err(|_| Rejection::new(RejectReason::EmptyTitle))?;

        self.snapshot
            .resolver()
            .resolve(&mut parsed, self.profile, ResolveOptions::search());
        candidate.parsed = Some(parsed);
        Ok(())
    }

    pub(crate) fn check_identifier(&self, candidate: &Candidate) -> Stage {
        if !self.kind.is_series() {
            return Ok(());
        }
        let Some(wanted) = candidate
            .target
            .as_deref()
            .and_then(|t| t.episode.as_ref())
            .filter(|e| !e.identifier.trim().is_empty())
        else {
            return Err(RejectReason::NoIdentifier.into());
        };

        let parsed_identifier = candidate.parsed.as_ref().and_then(|p| p.identifier.as_deref());
        if identifier_matches(&candidate.raw.title, wanted, parsed_identifier) {
            Ok(())
        } else {
            Err(Rejection::new(RejectReason::IdentifierMismatch).with_detail(wanted.identifier.clone()))
        }
    }

    pub(crate) fn check_regex(&self, candidate: &Candidate) -> Stage {
        let indexer = &candidate.raw.indexer;
        let Some(template) = self.template_for(indexer) else {
            trace!(%indexer, "no regex template bound");
            return Err(Rejection::new(RejectReason::RequiredRegexMissing)
                .with_detail(format!("no template for indexer {indexer:?}")));
        };
        let title = &candidate.raw.title;

        if !template.required_matches(title) {
            return Err(Rejection::new(RejectReason::RequiredRegexMissing)
                .with_detail(template.name.clone()));
        }

        let wanted = candidate.wanted_title();
        let alternates = candidate.wanted_alternate_titles();
        for pattern in template.rejecting(title) {
            // A rejected word that is part of the wanted title is intentional.
            let exempt = (!wanted.is_empty() && pattern.is_match(wanted))
                || alternates.iter().any(|alt| pattern.is_match(alt));
            if !exempt {
                return Err(Rejection::new(RejectReason::RejectedRegex)
                    .with_detail(pattern.as_str().to_string()));
            }
        }
        Ok(())
    }

    /// Template bound to `indexer`. Releases from an unbound indexer fall
    /// back to the profile's template when all bindings share one.
    fn template_for(&self, indexer: &str) -> Option<&RegexTemplate> {
        if let Some(template) = self.templates.get(&indexer.to_lowercase()).copied() {
            return Some(template);
        }
        let mut bound = self.templates.values();
        let first = bound.next()?;
        bound.all(|t| t.name == first.name).then_some(*first)
    }

    pub(crate) fn check_wanted(&self, candidate: &Candidate) -> Stage {
        let Some(parsed) = candidate.parsed.as_ref() else {
            return Ok(());
        };
        for (category, reason) in WANTED_CHECKS {
            let name = parsed.quality_name(category);
            if !self.profile.wanted(category).is_empty()
                && !name.is_empty()
                && !self.profile.wants(category, name)
            {
                return Err(Rejection::new(reason).with_detail(name.to_string()));
            }
        }
        Ok(())
    }

    /// Equality with the held priority is checked before anything else.
    pub(crate) fn check_priority(&self, candidate: &Candidate) -> Stage {
        let priority = candidate.priority();
        let minimum = candidate.minimum_priority;

        if priority == minimum {
            return Err(RejectReason::PrioritySame.into());
        }
        if priority <= 0 {
            return Err(RejectReason::UnknownPriority.into());
        }
        if minimum > 0 && priority <= minimum.saturating_add(self.profile.priority_min_difference) {
            return Err(Rejection::new(RejectReason::PriorityLower)
                .with_detail(format!("{priority} <= {minimum}")));
        }
        Ok(())
    }

    pub(crate) fn check_year(&self, candidate: &Candidate) -> Stage {
        if self.kind.is_series() || self.rss || !self.profile.check_year {
            return Ok(());
        }
        let Some(wanted) = candidate.target.as_deref().and_then(|t| t.year) else {
            return Err(RejectReason::NoYear.into());
        };

        let title = &candidate.raw.title;
        let mut accepted = vec![wanted];
        if self.profile.check_year_lenient {
            accepted.extend([wanted.saturating_sub(1), wanted.saturating_add(1)]);
        }
        if accepted.iter().any(|year| title.contains(&year.to_string())) {
            Ok(())
        } else {
            Err(Rejection::new(RejectReason::UnwantedYear).with_detail(wanted.to_string()))
        }
    }

    pub(crate) fn check_title(&self, candidate: &Candidate) -> Stage {
        if !self.profile.check_title {
            return Ok(());
        }
        let parsed_title = candidate.parsed.as_ref().map_or("", |p| p.title.as_str());
        let year = candidate.target.as_deref().and_then(|t| t.year);

        if title_matches(
            parsed_title,
            candidate.wanted_title(),
            candidate.wanted_alternate_titles(),
            year,
        ) {
            Ok(())
        } else {
            Err(Rejection::new(RejectReason::UnwantedTitle).with_detail(parsed_title.to_string()))
        }
    }
}

/// Strips the `tt` prefix and leading zeros so `tt0133093` equals `133093`.
fn normalize_imdb(id: &str) -> &str {
    let id = id.trim();
    let id = id
        .strip_prefix("tt")
        .or_else(|| id.strip_prefix("TT"))
        .unwrap_or(id);
    id.trim_start_matches('0')
}

/// `true` if `title` addresses the episode `wanted`.
pub fn identifier_matches(title: &str, wanted: &EpisodeTarget, parsed: Option<&str>) -> bool {
    let identifier = wanted.identifier.trim().to_lowercase();
    if parsed.is_some_and(|p| p.trim().eq_ignore_ascii_case(&identifier)) {
        return true;
    }

    let title = title.to_lowercase();
    let x_variant = identifier.replace('e', "x");
    for base in [identifier.as_str(), x_variant.as_str()] {
        if contains_token(&title, base)
            || contains_token(&title, &base.replace('-', "."))
            || contains_token(&title, &base.replace('-', " "))
        {
            return true;
        }
    }

    let (Some(season), Some(episode)) = (wanted.season, wanted.episode) else {
        return false;
    };

    // `S01E02` style identifiers use s/e markers, anything else `1x02`.
    let (season_prefixes, episode_marker) = if identifier.starts_with('s') {
        (vec![format!("s{season:02}"), format!("s{season}")], 'e')
    } else {
        (vec![format!("{season}x"), format!("{season:02}x")], 'x')
    };

    season_prefixes.iter().any(|prefix| {
        season_ends(&title, prefix, episode_marker)
            .any(|end| episode_chain_has(&title[end..], episode_marker, episode))
    })
}

/// `needle` not glued to a preceding word and not followed by a digit.
fn contains_token(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(pos, _)| {
        let before_ok = haystack[..pos]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_ascii_alphanumeric());
        let after_ok = haystack[pos + needle.len()..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_ascii_digit());
        before_ok && after_ok
    })
}

/// Offsets right after each season prefix that does not continue a number.
/// For `1x` prefixes the offset points at the `x`.
fn season_ends<'t>(
    title: &'t str,
    prefix: &'t str,
    marker: char,
) -> impl Iterator<Item = usize> + 't {
    title.match_indices(prefix).filter_map(move |(pos, _)| {
        let before_ok = title[..pos]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_ascii_alphanumeric());
        let end = pos + prefix.len();
        if marker == 'x' {
            return before_ok.then_some(end - 1);
        }
        let after_ok = title[end..].chars().next().is_none_or(|c| !c.is_ascii_digit());
        (before_ok && after_ok).then_some(end)
    })
}

/// Reads the episode groups that directly follow a season prefix
/// (`e04e05`, ` e05`, `e04-e05`, `x05`) and looks for `episode` among them.
fn episode_chain_has(mut rest: &str, marker: char, episode: u32) -> bool {
    loop {
        rest = rest.strip_prefix([' ', '.', '-']).unwrap_or(rest);
        let Some(after) = rest.strip_prefix(marker) else {
            return false;
        };
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return false;
        }
        if after[..digits].parse::<u32>().is_ok_and(|n| n == episode) {
            return true;
        }
        rest = &after[digits..];
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use senbetsu_core::{
        ConfigSnapshot, IndexerBinding, IndexerSettings, ParsedRelease, PathLimits,
        QualityProfile, RegexTemplateConfig, Settings,
    };

    use super::*;
    use crate::candidate::{HeldFile, RawRelease, WantedMedia};
    use crate::store::{MediaLookup, MediaStore};

    const MB: u64 = 1024 * 1024;

    #[derive(Default)]
    struct FakeStore {
        held: Vec<HeldFile>,
        urls: Vec<String>,
        titles: Vec<String>,
    }

    impl MediaStore for FakeStore {
        fn held_files(&self, _media: &WantedMedia) -> Vec<HeldFile> {
            self.held.clone()
        }

        fn is_downloaded_url(&self, _kind: MediaKind, url: &str) -> bool {
            self.urls.iter().any(|u| u == url)
        }

        fn is_downloaded_title(&self, _kind: MediaKind, title: &str) -> bool {
            self.titles.iter().any(|t| t == title)
        }

        fn find_media(&self, _kind: MediaKind, _lookup: &MediaLookup) -> Option<WantedMedia> {
            None
        }
    }

    fn profile() -> QualityProfile {
        let mut profile = QualityProfile::named("hd");
        profile.paths = vec!["movies".into()];
        profile.indexers = vec![IndexerBinding {
            name: "alpha".into(),
            regex_template: "default".into(),
            categories: vec![],
        }];
        profile
    }

    fn template(name: &str, required: &[&str], rejected: &[&str]) -> RegexTemplateConfig {
        RegexTemplateConfig {
            name: name.into(),
            required: required.iter().map(|p| p.to_string()).collect(),
            rejected: rejected.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn snapshot(profile: QualityProfile) -> ConfigSnapshot {
        snapshot_with(profile, vec![template("default", &[], &[r"\bcam\b"])])
    }

    /// Registers every indexer the profile binds.
    fn snapshot_with(
        profile: QualityProfile,
        templates: Vec<RegexTemplateConfig>,
    ) -> ConfigSnapshot {
        let indexers = profile
            .indexers
            .iter()
            .map(|binding| IndexerSettings {
                name: binding.name.clone(),
                ..IndexerSettings::default()
            })
            .collect();
        let settings = Settings {
            profiles: vec![profile],
            regex_templates: templates,
            paths: vec![PathLimits {
                name: "movies".into(),
                min_size_mb: 100,
                max_size_mb: 10_000,
            }],
            indexers,
            ..Settings::default()
        };
        ConfigSnapshot::build(settings).unwrap()
    }

    fn movie() -> Arc<WantedMedia> {
        Arc::new(WantedMedia {
            id: 1,
            kind: MediaKind::Movie,
            title: "Movie Name".into(),
            year: Some(2020),
            imdb: Some("tt0133093".into()),
            ..WantedMedia::default()
        })
    }

    fn release(title: &str, url: &str) -> RawRelease {
        let mut raw = RawRelease::new(title, url);
        raw.indexer = "alpha".into();
        raw
    }

    fn run(
        snapshot: &ConfigSnapshot,
        store: &FakeStore,
        kind: MediaKind,
        target: &Arc<WantedMedia>,
        releases: Vec<RawRelease>,
    ) -> SearchResultSet {
        Pipeline::new(snapshot, "hd", kind, store)
            .unwrap()
            .evaluate_for(releases, target)
    }

    fn single_reason(set: &SearchResultSet) -> Option<RejectReason> {
        assert_eq!(set.accepted.len() + set.denied.len(), 1);
        set.denied.first().and_then(Candidate::reason)
    }

    #[test]
    fn clean_release_is_accepted() {
        let snapshot = snapshot(profile());
        let store = FakeStore::default();
        let set = run(
            &snapshot,
            &store,
            MediaKind::Movie,
            &movie(),
            vec![release("Movie.Name.2020.1080p.BluRay.x264-GROUP", "u1")],
        );

        assert_eq!(single_reason(&set), None);
        let best = set.best().unwrap();
        assert!(best.priority() > 0);
        assert_eq!(best.parsed.as_ref().unwrap().title, "Movie Name");
    }

    #[test]
    fn same_priority_as_held_is_denied() {
        let snapshot = snapshot(profile());
        let title = "Movie.Name.2020.1080p.BluRay.x264-GROUP";
        let parsed = snapshot.parser().parse(title, MediaKind::Movie).unwrap();
        let store = FakeStore {
            held: vec![HeldFile {
                qualities: parsed.qualities,
                ..HeldFile::default()
            }],
            ..FakeStore::default()
        };

        let set = run(&snapshot, &store, MediaKind::Movie, &movie(), vec![release(title, "u1")]);
        assert_eq!(single_reason(&set), Some(RejectReason::PrioritySame));
        assert_eq!(set.denied[0].rejection.as_ref().unwrap().to_string(), "Prio same");
    }

    #[test]
    fn upgrade_must_beat_tolerance() {
        let held = snapshot(profile())
            .parser()
            .parse("Movie.Name.2020.720p.WEB-DL", MediaKind::Movie)
            .unwrap();
        let store = FakeStore {
            held: vec![HeldFile {
                qualities: held.qualities,
                ..HeldFile::default()
            }],
            ..FakeStore::default()
        };
        let releases = vec![release("Movie.Name.2020.1080p.BluRay.x264", "u1")];

        let set = run(&snapshot(profile()), &store, MediaKind::Movie, &movie(), releases.clone());
        assert!(set.has_accepted());

        let mut strict = profile();
        strict.priority_min_difference = 100_000;
        let set = run(&snapshot(strict), &store, MediaKind::Movie, &movie(), releases);
        assert_eq!(single_reason(&set), Some(RejectReason::PriorityLower));
    }

    #[test]
    fn missing_year_is_unwanted() {
        let snapshot = snapshot(profile());
        let store = FakeStore::default();
        let set = run(
            &snapshot,
            &store,
            MediaKind::Movie,
            &movie(),
            vec![release("Movie.Name.1080p.BluRay.x264-GROUP", "u1")],
        );
        assert_eq!(single_reason(&set), Some(RejectReason::UnwantedYear));
    }

    #[test]
    fn lenient_year_accepts_neighbours() {
        let releases = vec![release("Movie.Name.2021.1080p.BluRay.x264", "u1")];
        let store = FakeStore::default();

        let set = run(&snapshot(profile()), &store, MediaKind::Movie, &movie(), releases.clone());
        assert_eq!(single_reason(&set), Some(RejectReason::UnwantedYear));

        let mut lenient = profile();
        lenient.check_year_lenient = true;
        let set = run(&snapshot(lenient), &store, MediaKind::Movie, &movie(), releases);
        assert_eq!(single_reason(&set), None);
    }

    #[test]
    fn duplicate_url_never_reaches_resolver() {
        let snapshot = snapshot(profile());
        let store = FakeStore::default();
        let set = run(
            &snapshot,
            &store,
            MediaKind::Movie,
            &movie(),
            vec![
                release("Movie.Name.2020.1080p.BluRay.x264-GROUP", "same"),
                release("Movie.Name.2020.720p.WEB-DL-OTHER", "same"),
            ],
        );

        assert_eq!(set.raw.len(), 2);
        assert_eq!(set.accepted.len(), 1);
        assert_eq!(set.denied[0].reason(), Some(RejectReason::DuplicateUrl));
        assert!(set.denied[0].parsed.is_none());
    }

    #[test]
    fn basic_field_checks() {
        let snapshot = snapshot(profile());
        let store = FakeStore::default();
        let cases = [
            (RawRelease::new("Movie.Name.2020.1080p", ""), RejectReason::EmptyUrl),
            (RawRelease::new("   ", "u"), RejectReason::EmptyTitle),
            (RawRelease::new("abc", "u"), RejectReason::TitleTooShort),
        ];
        for (raw, expected) in cases {
            let set = run(&snapshot, &store, MediaKind::Movie, &movie(), vec![raw]);
            assert_eq!(single_reason(&set), Some(expected));
        }
    }

    #[test]
    fn size_limits_of_profile_paths() {
        let snapshot = snapshot(profile());
        let store = FakeStore::default();
        let title = "Movie.Name.2020.1080p.BluRay.x264";

        for (size, expected) in [
            (50 * MB, Some(RejectReason::TooSmall)),
            (20_000 * MB, Some(RejectReason::TooBig)),
            (4_000 * MB, None),
            (0, None),
        ] {
            let mut raw = release(title, "u1");
            raw.size = size;
            let set = run(&snapshot, &store, MediaKind::Movie, &movie(), vec![raw]);
            assert_eq!(single_reason(&set), expected, "size {size}");
        }
    }

    #[test]
    fn history_by_url_and_title() {
        let title = "Movie.Name.2020.1080p.BluRay.x264";
        let store = FakeStore {
            urls: vec!["seen".into()],
            titles: vec![title.into()],
            ..FakeStore::default()
        };

        let set = run(&snapshot(profile()), &store, MediaKind::Movie, &movie(), vec![release(title, "seen")]);
        assert_eq!(single_reason(&set), Some(RejectReason::AlreadyDownloaded));

        let set = run(&snapshot(profile()), &store, MediaKind::Movie, &movie(), vec![release(title, "new")]);
        assert_eq!(single_reason(&set), None);

        let mut by_title = profile();
        by_title.history_check_title = true;
        let set = run(&snapshot(by_title), &store, MediaKind::Movie, &movie(), vec![release(title, "new")]);
        assert_eq!(single_reason(&set), Some(RejectReason::AlreadyDownloaded));
    }

    #[test]
    fn external_id_mismatch() {
        let snapshot = snapshot(profile());
        let store = FakeStore::default();
        let title = "Movie.Name.2020.1080p.BluRay.x264";

        let mut raw = release(title, "u1");
        raw.imdb = Some("0133093".into());
        let set = run(&snapshot, &store, MediaKind::Movie, &movie(), vec![raw]);
        assert_eq!(single_reason(&set), None);

        let mut raw = release(title, "u2");
        raw.imdb = Some("tt9999999".into());
        let set = run(&snapshot, &store, MediaKind::Movie, &movie(), vec![raw]);
        assert_eq!(single_reason(&set), Some(RejectReason::ImdbMismatch));
    }

    #[test]
    fn release_without_target_is_unmapped() {
        let snapshot = snapshot(profile());
        let store = FakeStore::default();
        let pipeline = Pipeline::new(&snapshot, "hd", MediaKind::Movie, &store).unwrap();

        let mut set = SearchResultSet::default();
        pipeline.evaluate_into(
            &mut set,
            [(release("Movie.Name.2020.1080p.BluRay.x264", "u1"), None)],
        );
        assert_eq!(single_reason(&set), Some(RejectReason::NoMatchingMedia));
    }

    #[test]
    fn rejected_word_in_wanted_title_is_exempt() {
        let snapshot = snapshot(profile());
        let store = FakeStore::default();

        let set = run(
            &snapshot,
            &store,
            MediaKind::Movie,
            &movie(),
            vec![release("Movie.Name.2020.CAM.x264", "u1")],
        );
        assert_eq!(single_reason(&set), Some(RejectReason::RejectedRegex));

        let cam_girl = Arc::new(WantedMedia {
            title: "Cam Girl".into(),
            imdb: None,
            ..(*movie()).clone()
        });
        let set = run(
            &snapshot,
            &store,
            MediaKind::Movie,
            &cam_girl,
            vec![release("Cam.Girl.2020.1080p.BluRay.x264", "u2")],
        );
        assert_eq!(single_reason(&set), None);
    }

    #[test]
    fn unwanted_resolution_names_the_value() {
        let mut only_1080 = profile();
        only_1080.wanted_resolution = vec!["1080p".into()];
        let snapshot = snapshot(only_1080);
        let store = FakeStore::default();

        let set = run(
            &snapshot,
            &store,
            MediaKind::Movie,
            &movie(),
            vec![release("Movie.Name.2020.720p.BluRay.x264", "u1")],
        );
        let rejection = set.denied[0].rejection.as_ref().unwrap();
        assert_eq!(rejection.reason, RejectReason::UnwantedResolution);
        assert_eq!(rejection.detail.as_deref(), Some("720p"));
    }

    #[test]
    fn other_title_is_unwanted() {
        let snapshot = snapshot(profile());
        let store = FakeStore::default();
        let set = run(
            &snapshot,
            &store,
            MediaKind::Movie,
            &movie(),
            vec![release("Other.Movie.2020.1080p.BluRay.x264", "u1")],
        );
        assert_eq!(single_reason(&set), Some(RejectReason::UnwantedTitle));
    }

    #[test]
    fn series_identifier_must_match() {
        let snapshot = snapshot(profile());
        let store = FakeStore::default();
        let episode = Arc::new(WantedMedia {
            id: 7,
            kind: MediaKind::Series,
            title: "Show Name".into(),
            tvdb: Some(81189),
            episode: Some(EpisodeTarget::numbered(2, 5)),
            ..WantedMedia::default()
        });

        let set = run(
            &snapshot,
            &store,
            MediaKind::Series,
            &episode,
            vec![
                release("Show.Name.S02E05.720p.WEB.DDP5.1", "u1"),
                release("Show.Name.S02E06.720p.WEB.DDP5.1", "u2"),
            ],
        );
        assert_eq!(set.accepted.len(), 1);
        assert_eq!(set.denied[0].reason(), Some(RejectReason::IdentifierMismatch));

        let no_episode = Arc::new(WantedMedia {
            episode: None,
            ..(*episode).clone()
        });
        let set = run(
            &snapshot,
            &store,
            MediaKind::Series,
            &no_episode,
            vec![release("Show.Name.S02E05.720p.WEB.DDP5.1", "u3")],
        );
        assert_eq!(single_reason(&set), Some(RejectReason::NoIdentifier));
    }

    #[test]
    fn stop_at_first_accepted_keeps_rest_raw() {
        let mut first = profile();
        first.stop_at_first_accepted = true;
        let snapshot = snapshot(first);
        let store = FakeStore::default();

        let set = run(
            &snapshot,
            &store,
            MediaKind::Movie,
            &movie(),
            vec![
                release("Movie.Name.2020.720p.WEB-DL", "u1"),
                release("Movie.Name.2020.1080p.BluRay.x264", "u2"),
                release("Movie.Name.2020.2160p.BluRay.x265", "u3"),
            ],
        );
        assert_eq!(set.accepted.len(), 1);
        assert!(set.denied.is_empty());
        assert_eq!(set.raw.len(), 3);
    }

    #[test]
    fn accepted_sorted_by_priority() {
        let snapshot = snapshot(profile());
        let store = FakeStore::default();
        let set = run(
            &snapshot,
            &store,
            MediaKind::Movie,
            &movie(),
            vec![
                release("Movie.Name.2020.720p.WEB-DL", "u1"),
                release("Movie.Name.2020.2160p.BluRay.x265", "u2"),
                release("Movie.Name.2020.1080p.BluRay.x264", "u3"),
            ],
        );
        let urls: Vec<_> = set.accepted.iter().map(|c| c.raw.download_url.as_str()).collect();
        assert_eq!(urls, ["u2", "u3", "u1"]);
    }

    #[test]
    fn required_pattern_must_match() {
        let required = template("default", &[r"\bbluray\b"], &[]);
        let snapshot = snapshot_with(profile(), vec![required]);
        let store = FakeStore::default();

        let set = run(
            &snapshot,
            &store,
            MediaKind::Movie,
            &movie(),
            vec![release("Movie.Name.2020.720p.WEB-DL", "u1")],
        );
        let rejection = set.denied[0].rejection.as_ref().unwrap();
        assert_eq!(rejection.reason, RejectReason::RequiredRegexMissing);
        assert_eq!(rejection.detail.as_deref(), Some("default"));

        let set = run(
            &snapshot,
            &store,
            MediaKind::Movie,
            &movie(),
            vec![release("Movie.Name.2020.1080p.BluRay.x264", "u2")],
        );
        assert_eq!(single_reason(&set), None);
    }

    #[test]
    fn unbound_indexer_uses_the_only_template() {
        let snapshot = snapshot(profile());
        let store = FakeStore::default();

        let set = run(
            &snapshot,
            &store,
            MediaKind::Movie,
            &movie(),
            vec![RawRelease::new("Movie.Name.2020.CAM.x264", "u1")],
        );
        assert_eq!(single_reason(&set), Some(RejectReason::RejectedRegex));

        let set = run(
            &snapshot,
            &store,
            MediaKind::Movie,
            &movie(),
            vec![RawRelease::new("Movie.Name.2020.1080p.BluRay.x264", "u2")],
        );
        assert_eq!(single_reason(&set), None);
    }

    #[test]
    fn unbound_indexer_with_several_templates_is_denied() {
        let mut two = profile();
        two.indexers.push(IndexerBinding {
            name: "beta".into(),
            regex_template: "strict".into(),
            categories: vec![],
        });
        let snapshot = snapshot_with(
            two,
            vec![
                template("default", &[], &[r"\bcam\b"]),
                template("strict", &[], &[r"\bx265\b"]),
            ],
        );
        let store = FakeStore::default();
        let title = "Movie.Name.2020.1080p.BluRay.x264";

        let set = run(&snapshot, &store, MediaKind::Movie, &movie(), vec![RawRelease::new(title, "u1")]);
        let rejection = set.denied[0].rejection.as_ref().unwrap();
        assert_eq!(rejection.reason, RejectReason::RequiredRegexMissing);
        assert!(rejection.detail.as_deref().is_some_and(|d| d.contains("indexer")));

        let mut from_beta = RawRelease::new(title, "u2");
        from_beta.indexer = "Beta".into();
        let set = run(&snapshot, &store, MediaKind::Movie, &movie(), vec![from_beta]);
        assert_eq!(single_reason(&set), None);
    }

    #[test]
    fn rejected_word_in_alternate_title_is_exempt() {
        let snapshot = snapshot(profile());
        let store = FakeStore::default();
        let target = Arc::new(WantedMedia {
            alternate_titles: vec!["Cam Girl".into()],
            imdb: None,
            ..(*movie()).clone()
        });

        let set = run(
            &snapshot,
            &store,
            MediaKind::Movie,
            &target,
            vec![release("Cam.Girl.2020.1080p.BluRay.x264", "u1")],
        );
        assert_eq!(single_reason(&set), None);
    }

    #[test]
    fn tvdb_mismatch() {
        let snapshot = snapshot(profile());
        let store = FakeStore::default();
        let episode = Arc::new(WantedMedia {
            id: 7,
            kind: MediaKind::Series,
            title: "Show Name".into(),
            tvdb: Some(81189),
            episode: Some(EpisodeTarget::numbered(2, 5)),
            ..WantedMedia::default()
        });
        let title = "Show.Name.S02E05.720p.WEB.DDP5.1";

        let mut raw = release(title, "u1");
        raw.tvdb = Some(12345);
        let set = run(&snapshot, &store, MediaKind::Series, &episode, vec![raw]);
        let rejection = set.denied[0].rejection.as_ref().unwrap();
        assert_eq!(rejection.reason, RejectReason::TvdbMismatch);
        assert_eq!(rejection.detail.as_deref(), Some("12345 != 81189"));

        let mut raw = release(title, "u2");
        raw.tvdb = Some(81189);
        let set = run(&snapshot, &store, MediaKind::Series, &episode, vec![raw]);
        assert_eq!(single_reason(&set), None);
    }

    #[test]
    fn unwanted_audio_before_codec() {
        let mut picky = profile();
        picky.wanted_audio = vec!["truehd".into()];
        picky.wanted_codec = vec!["h265".into()];
        let snapshot = snapshot(picky);
        let store = FakeStore::default();

        let set = run(
            &snapshot,
            &store,
            MediaKind::Movie,
            &movie(),
            vec![release("Movie.Name.2020.1080p.BluRay.DTS.x264", "u1")],
        );
        let rejection = set.denied[0].rejection.as_ref().unwrap();
        assert_eq!(rejection.reason, RejectReason::UnwantedAudio);
        assert_eq!(rejection.detail.as_deref(), Some("dts"));

        let set = run(
            &snapshot,
            &store,
            MediaKind::Movie,
            &movie(),
            vec![release("Movie.Name.2020.1080p.BluRay.TrueHD.x264", "u2")],
        );
        let rejection = set.denied[0].rejection.as_ref().unwrap();
        assert_eq!(rejection.reason, RejectReason::UnwantedCodec);
        assert_eq!(rejection.detail.as_deref(), Some("h264"));
    }

    #[test]
    fn unranked_release_is_unknown_priority() {
        let snapshot = snapshot(profile());
        let held = snapshot
            .parser()
            .parse("Movie.Name.2020.720p.WEB-DL", MediaKind::Movie)
            .unwrap();
        let store = FakeStore {
            held: vec![HeldFile {
                qualities: held.qualities,
                ..HeldFile::default()
            }],
            ..FakeStore::default()
        };

        let set = run(
            &snapshot,
            &store,
            MediaKind::Movie,
            &movie(),
            vec![release("Movie.Name.2020.GROUP", "u1")],
        );
        assert_eq!(single_reason(&set), Some(RejectReason::UnknownPriority));
    }

    #[test]
    fn negative_priority_is_unknown() {
        let snapshot = snapshot(profile());
        let store = FakeStore::default();
        let pipeline = Pipeline::new(&snapshot, "hd", MediaKind::Movie, &store).unwrap();

        let mut candidate = Candidate::new(release("Movie.Name.2020", "u1"), "hd", Some(movie()), 0);
        let mut parsed = ParsedRelease::default();
        parsed.priority = -5;
        candidate.parsed = Some(parsed);

        let rejection = pipeline.check_priority(&candidate).unwrap_err();
        assert_eq!(rejection.reason, RejectReason::UnknownPriority);
    }

    #[test]
    fn target_without_year_has_no_year() {
        let snapshot = snapshot(profile());
        let store = FakeStore::default();
        let undated = Arc::new(WantedMedia {
            year: None,
            ..(*movie()).clone()
        });

        let set = run(
            &snapshot,
            &store,
            MediaKind::Movie,
            &undated,
            vec![release("Movie.Name.2020.1080p.BluRay.x264", "u1")],
        );
        assert_eq!(single_reason(&set), Some(RejectReason::NoYear));
    }

    #[test]
    fn imdb_normalization() {
        assert_eq!(normalize_imdb("tt0133093"), "133093");
        assert_eq!(normalize_imdb("133093"), "133093");
        assert_eq!(normalize_imdb("0133093"), "133093");
    }

    #[test]
    fn generated_identifier_matches_itself() {
        for (season, episode) in [(1, 1), (2, 5), (10, 12), (1, 100)] {
            let wanted = EpisodeTarget::numbered(season, episode);
            let title = format!("Show.Name.{}.720p", wanted.identifier);
            assert!(
                identifier_matches(&title, &wanted, Some(&wanted.identifier)),
                "{title}"
            );
            assert!(identifier_matches(&title, &wanted, None), "{title}");
        }
    }

    #[test]
    fn identifier_variants() {
        let wanted = EpisodeTarget::numbered(2, 5);
        assert!(identifier_matches("Show.S02x05.HDTV", &wanted, None));
        assert!(identifier_matches("Show.S2E5.HDTV", &wanted, None));
        assert!(identifier_matches("Show.S02E04E05.HDTV", &wanted, None));
        assert!(identifier_matches("Show S02 E05 HDTV", &wanted, None));
        assert!(!identifier_matches("Show.S02E50.HDTV", &wanted, None));
        assert!(!identifier_matches("Show.S12E05.HDTV", &wanted, None));
        assert!(!identifier_matches("Show.S03E05.HDTV", &wanted, None));
        assert!(!identifier_matches("Show.720p.HDTV", &wanted, None));
    }

    #[test]
    fn cross_style_identifiers() {
        let wanted = EpisodeTarget {
            identifier: "2x05".into(),
            season: Some(2),
            episode: Some(5),
        };
        assert!(identifier_matches("Show.2x05.HDTV", &wanted, None));
        assert!(identifier_matches("Show.02x05.HDTV", &wanted, None));
        assert!(!identifier_matches("Show.12x05.HDTV", &wanted, None));
        assert!(!identifier_matches("Show.2x50.HDTV", &wanted, None));
        assert!(identifier_matches("Show.2x04-x05.HDTV", &wanted, None));
    }

    #[test]
    fn episode_must_follow_the_season() {
        let wanted = EpisodeTarget::numbered(1, 2);
        assert!(!identifier_matches("Show.Name.S01E01.Stage2.720p.WEB", &wanted, None));
        assert!(!identifier_matches("Show.Name.S01E01.Part.E2.720p", &wanted, None));
        assert!(identifier_matches("Show.Name.S01E01-E02.720p", &wanted, None));
        assert!(identifier_matches("Show.Name.S01.E02.720p", &wanted, None));

        let wanted = EpisodeTarget {
            identifier: "1x02".into(),
            season: Some(1),
            episode: Some(2),
        };
        assert!(!identifier_matches("Show.1x01.Take.x2.720p", &wanted, None));
        assert!(!identifier_matches("Show.1x01.Stage2.720p", &wanted, None));
    }

    #[test]
    fn dated_identifier() {
        let wanted = EpisodeTarget::dated("2019-05-12");
        assert!(identifier_matches("Late.Show.2019.05.12.720p", &wanted, None));
        assert!(identifier_matches("Late Show 2019 05 12", &wanted, None));
        assert!(!identifier_matches("Late.Show.2019.05.13.720p", &wanted, None));
    }
}
