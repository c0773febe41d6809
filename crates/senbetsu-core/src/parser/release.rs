use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::{Result, SenbetsuError};
use crate::quality::{CategoryMatch, QualityTaxonomy};
use crate::types::{MediaKind, ParsedRelease, ProbeInfo, QualityCategory};

use super::patterns::{
    MetadataPatterns, Token, VIDEO_EXTENSIONS, first_capture, language_code, last_capture,
};

const SEPARATORS: &[char] = &[' ', '.', '-', '_', '(', ')', '[', ']'];

/// Which category slots [`ReleaseParser::fill_categories`] may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFill {
    /// Run every category and overwrite on a match.
    #[default]
    All,
    /// Leave categories that already carry a name or id untouched.
    EmptyOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
}

impl From<&Token> for Span {
    fn from(token: &Token) -> Self {
        Self {
            start: token.start,
            end: token.end,
        }
    }
}

impl From<&CategoryMatch> for Span {
    fn from(m: &CategoryMatch) -> Self {
        Self {
            start: m.start,
            end: m.end,
        }
    }
}

/// Turns release names into [`ParsedRelease`] records.
///
/// Category patterns come from the configured [`QualityTaxonomy`]; the
/// metadata patterns (season, episode, identifier, date, year, external ids)
/// are built in.
#[derive(Debug, Clone)]
pub struct ReleaseParser {
    taxonomy: Arc<QualityTaxonomy>,
    patterns: MetadataPatterns,
}

impl ReleaseParser {
    /// Creates a parser over `taxonomy`.
    ///
    /// # Errors
    ///
    /// Returns `SenbetsuError::RegexError` if a built-in pattern fails to compile.
    pub fn new(taxonomy: Arc<QualityTaxonomy>) -> Result<Self> {
        Ok(Self {
            taxonomy,
            patterns: MetadataPatterns::new()?,
        })
    }

    /// The taxonomy this parser matches categories against.
    #[must_use]
    pub fn taxonomy(&self) -> &QualityTaxonomy {
        &self.taxonomy
    }

    /// Parses a release name or file path.
    ///
    /// # Errors
    ///
    /// Returns `SenbetsuError::EmptyInput` if `name` is empty or whitespace-only.
    pub fn parse(&self, name: &str, kind: MediaKind) -> Result<ParsedRelease> {
        if name.trim().is_empty() {
            return Err(SenbetsuError::EmptyInput);
        }

        let mut parsed = ParsedRelease::new(name);
        parsed.file_title = file_title(name);
        parsed.working = normalize(&parsed.file_title);
        let working = parsed.working.clone();

        let mut spans: Vec<Span> = self
            .fill_categories(&mut parsed, &working, CategoryFill::All)
            .iter()
            .map(Span::from)
            .collect();

        self.extract_metadata(&mut parsed, &working, kind, &mut spans);

        let (title, rest) = title_boundary(&working, &spans);
        parsed.title = clean_title(title);
        parsed.first_match = spans.iter().map(|s| s.start).min();
        self.collect_languages(&mut parsed, rest);

        if kind.is_series() {
            synthesize_identifier(&mut parsed);
        }

        debug!(release = %name, %kind, title = %parsed.title, "parsed release");
        Ok(parsed)
    }

    /// Runs the category patterns of the taxonomy against `text` and stores
    /// the first match of each category in `parsed`.
    ///
    /// Returns the matches that were written.
    pub fn fill_categories(
        &self,
        parsed: &mut ParsedRelease,
        text: &str,
        mode: CategoryFill,
    ) -> Vec<CategoryMatch> {
        let mut written = Vec::new();
        for category in QualityCategory::ALL {
            if mode == CategoryFill::EmptyOnly && !parsed.qualities.get(category).is_empty() {
                continue;
            }
            if let Some(m) = self.taxonomy.find_in(category, text) {
                parsed.qualities.set(category, m.name.clone(), m.id);
                written.push(m);
            }
        }
        written
    }

    /// Second enrichment pass with facts from a media probe.
    ///
    /// Copies dimensions and runtime, derives a missing resolution from the
    /// frame size and fills empty codec and audio slots from the probed codec
    /// names.
    pub fn apply_probe(&self, parsed: &mut ParsedRelease, probe: &ProbeInfo) {
        parsed.width = probe.width;
        parsed.height = probe.height;
        parsed.runtime = probe.runtime;

        if parsed.qualities.get(QualityCategory::Resolution).is_empty() {
            if let Some(item) = resolution_for(probe.width, probe.height)
                .and_then(|name| self.taxonomy.by_name(QualityCategory::Resolution, name))
            {
                parsed
                    .qualities
                    .set(QualityCategory::Resolution, item.name.clone(), item.id);
            }
        }

        for (category, codec) in [
            (QualityCategory::Codec, probe.video_codec.as_deref()),
            (QualityCategory::Audio, probe.audio_codec.as_deref()),
        ] {
            let Some(codec) = codec else { continue };
            if !parsed.qualities.get(category).is_empty() {
                continue;
            }
            if let Some(m) = self.taxonomy.find_in(category, codec) {
                parsed.qualities.set(category, m.name, m.id);
            }
        }

        for language in &probe.languages {
            let language = language.trim().to_lowercase();
            if !language.is_empty() && !parsed.languages.contains(&language) {
                parsed.languages.push(language);
            }
        }

        trace!(release = %parsed.raw, width = probe.width, height = probe.height, "applied probe");
    }

    fn extract_metadata(
        &self,
        parsed: &mut ParsedRelease,
        text: &str,
        kind: MediaKind,
        spans: &mut Vec<Span>,
    ) {
        let p = &self.patterns;

        if let Some(token) = first_capture(&p.season, text) {
            spans.push(Span::from(&token));
            let (value, number) = strip_zeros(&token.value);
            parsed.season = Some(value);
            parsed.season_number = number;
        }

        if let Some(token) = first_capture(&p.episode, text) {
            spans.push(Span::from(&token));
            let (value, number) = strip_zeros(&token.value);
            parsed.episode = Some(value);
            parsed.episode_number = number;
        }

        if let Some(token) = first_capture(&p.identifier, text) {
            spans.push(Span::from(&token));
            parsed.identifier = Some(token.value.trim_matches(SEPARATORS).to_string());
        }

        if let Some(token) = first_capture(std::slice::from_ref(&p.date), text) {
            spans.push(Span::from(&token));
            parsed.date = Some(token.value);
        }

        if let Some(token) = last_capture(&p.year, text) {
            spans.push(Span::from(&token));
            parsed.year = token.value.parse().ok();
        }

        if let Some(token) = first_capture(std::slice::from_ref(&p.audio_hint), text) {
            spans.push(Span::from(&token));
        }

        if !kind.is_series() && contains_ignore_case(text, "tt") {
            if let Some(token) = first_capture(std::slice::from_ref(&p.imdb), text) {
                spans.push(Span::from(&token));
                parsed.imdb = Some(token.value.to_lowercase());
            }
        }

        if kind.is_series() && contains_ignore_case(text, "tvdb") {
            if let Some(token) = first_capture(std::slice::from_ref(&p.tvdb), text) {
                spans.push(Span::from(&token));
                parsed.tvdb = token.value.parse().ok();
            }
        }

        for (pattern, flag) in [
            (&p.proper, &mut parsed.proper),
            (&p.repack, &mut parsed.repack),
            (&p.extended, &mut parsed.extended),
        ] {
            if let Some(token) = first_capture(std::slice::from_ref(pattern), text) {
                spans.push(Span::from(&token));
                *flag = true;
            }
        }
    }

    fn collect_languages(&self, parsed: &mut ParsedRelease, text: &str) {
        for word in text.split(|c: char| !c.is_alphanumeric()) {
            if let Some(code) = language_code(word) {
                if !parsed.languages.iter().any(|l| l == code) {
                    parsed.languages.push(code.to_string());
                }
            }
        }
    }
}

/// Final path component with a known video extension removed.
fn file_title(name: &str) -> String {
    let base = name
        .trim()
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    if let Some((stem, ext)) = base.rsplit_once('.') {
        if !stem.is_empty()
            && VIDEO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        {
            return stem.to_string();
        }
    }
    base.to_string()
}

/// Underscores become spaces; one pair of enclosing brackets is removed.
fn normalize(title: &str) -> String {
    let working = title.replace('_', " ");
    let trimmed = working.trim();
    for (open, close) in [('[', ']'), ('(', ')')] {
        if let Some(inner) = trimmed
            .strip_prefix(open)
            .and_then(|s| s.strip_suffix(close))
        {
            if !inner.contains(open) && !inner.contains(close) {
                return inner.trim().to_string();
            }
        }
    }
    trimmed.to_string()
}

/// Splits `working` into the title slice and the text after it.
///
/// Tokens starting at the title's start boundary (after separators) are a
/// prefix: the boundary moves past them. The title then ends before the
/// earliest remaining token.
fn title_boundary<'a>(working: &'a str, spans: &[Span]) -> (&'a str, &'a str) {
    let mut start = 0usize;
    loop {
        let at = skip_separators(working, start);
        let prefix_end = spans
            .iter()
            .filter(|s| s.start == at && s.end > start)
            .map(|s| s.end)
            .max();
        match prefix_end {
            Some(end) => start = end,
            None => break,
        }
    }

    let end = spans
        .iter()
        .filter(|s| s.end > start)
        .map(|s| s.start)
        .min()
        .unwrap_or(working.len());

    if end >= start {
        return (&working[start..end], &working[end..]);
    }

    trace!(start, end, "title boundary ends before it starts");
    match working.find('(') {
        Some(paren) if paren > start => (&working[start..paren], &working[paren..]),
        _ => (&working[start..], ""),
    }
}

fn skip_separators(text: &str, from: usize) -> usize {
    text[from..]
        .find(|c: char| !SEPARATORS.contains(&c))
        .map_or(text.len(), |offset| from + offset)
}

fn clean_title(title: &str) -> String {
    let title = title.trim_matches(SEPARATORS);
    if title.contains(' ') {
        title.to_string()
    } else {
        title.replace('.', " ")
    }
}

fn synthesize_identifier(parsed: &mut ParsedRelease) {
    if parsed.identifier.is_none() {
        if let (Some(season), Some(episode)) = (parsed.season_number, parsed.episode_number) {
            parsed.identifier = Some(format!("S{season:02}E{episode:02}"));
        }
    }
    if parsed.identifier.is_none() {
        if let Some(ref date) = parsed.date {
            parsed.identifier = Some(date.trim_matches(SEPARATORS).to_string());
        }
    }
}

fn strip_zeros(value: &str) -> (String, Option<u32>) {
    let stripped = value.trim_start_matches('0');
    let value = if stripped.is_empty() { "0" } else { stripped };
    (value.to_string(), value.parse().ok())
}

fn contains_ignore_case(text: &str, needle: &str) -> bool {
    text.to_ascii_lowercase().contains(needle)
}

/// Resolution name for a probed frame size. Width covers cropped widescreen.
fn resolution_for(width: u32, height: u32) -> Option<&'static str> {
    let by_height = match height {
        0 => 0,
        h if h >= 1600 => 2160,
        h if h >= 900 => 1080,
        h if h >= 650 => 720,
        h if h >= 540 => 576,
        _ => 480,
    };
    let by_width = match width {
        w if w >= 3200 => 2160,
        w if w >= 1800 => 1080,
        w if w >= 1200 => 720,
        _ => 0,
    };
    match by_height.max(by_width) {
        2160 => Some("2160p"),
        1080 => Some("1080p"),
        720 => Some("720p"),
        576 => Some("576p"),
        480 => Some("480p"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> ReleaseParser {
        ReleaseParser::new(Arc::new(QualityTaxonomy::builtin().unwrap())).unwrap()
    }

    #[test]
    fn empty_input_errors() {
        let p = parser();
        assert!(matches!(p.parse("", MediaKind::Movie), Err(SenbetsuError::EmptyInput)));
        assert!(matches!(p.parse("  ", MediaKind::Series), Err(SenbetsuError::EmptyInput)));
    }

    #[test]
    fn scene_movie() {
        let r = parser()
            .parse("Movie.Name.2020.1080p.BluRay.x264-GROUP", MediaKind::Movie)
            .unwrap();

        assert_eq!(r.title, "Movie Name");
        assert_eq!(r.year, Some(2020));
        assert_eq!(r.quality_name(QualityCategory::Resolution), "1080p");
        assert_eq!(r.quality_name(QualityCategory::Quality), "bluray");
        assert_eq!(r.quality_name(QualityCategory::Codec), "h264");
        assert_eq!(r.first_match(), Some(11));
        assert!(r.identifier.is_none());
    }

    #[test]
    fn scene_episode() {
        let r = parser()
            .parse("Show.Name.S02E05.720p.WEB.DDP5.1", MediaKind::Series)
            .unwrap();

        assert_eq!(r.title, "Show Name");
        assert_eq!(r.season.as_deref(), Some("2"));
        assert_eq!(r.episode.as_deref(), Some("5"));
        assert_eq!(r.season_number, Some(2));
        assert_eq!(r.episode_number, Some(5));
        assert_eq!(r.identifier.as_deref(), Some("S02E05"));
        assert_eq!(r.quality_name(QualityCategory::Resolution), "720p");
        assert_eq!(r.quality_name(QualityCategory::Audio), "dd+");
    }

    #[test]
    fn series_synthesizes_identifier() {
        let r = parser()
            .parse("Show Name Season 1 Episode 3 HDTV", MediaKind::Series)
            .unwrap();
        assert_eq!(r.identifier.as_deref(), Some("S01E03"));
        assert_eq!(r.title, "Show Name");

        let movie = parser()
            .parse("Show Name Season 1 Episode 3 HDTV", MediaKind::Movie)
            .unwrap();
        assert!(movie.identifier.is_none());
    }

    #[test]
    fn daily_show_uses_date() {
        let r = parser()
            .parse("Late.Show.2019.05.12.720p.HDTV", MediaKind::Series)
            .unwrap();
        assert_eq!(r.identifier.as_deref(), Some("2019.05.12"));
        assert_eq!(r.title, "Late Show");
    }

    #[test]
    fn spaced_title_keeps_dots() {
        let r = parser()
            .parse("Mr. Robot (2015) 1080p WEB-DL", MediaKind::Movie)
            .unwrap();
        assert_eq!(r.title, "Mr. Robot");
        assert_eq!(r.year, Some(2015));
        assert_eq!(r.quality_name(QualityCategory::Quality), "webdl");
    }

    #[test]
    fn year_in_title_uses_last_year() {
        let r = parser()
            .parse("Blade.Runner.2049.2017.2160p.UHD.BluRay.x265", MediaKind::Movie)
            .unwrap();
        assert_eq!(r.title, "Blade Runner 2049");
        assert_eq!(r.year, Some(2017));
        assert_eq!(r.quality_name(QualityCategory::Resolution), "2160p");
    }

    #[test]
    fn leading_token_moves_start() {
        let r = parser()
            .parse("1080p.Movie.Name.2020.WEB", MediaKind::Movie)
            .unwrap();
        assert_eq!(r.title, "Movie Name");
        assert_eq!(r.first_match(), Some(0));
    }

    #[test]
    fn lone_token_yields_empty_title() {
        let r = parser().parse("1080p", MediaKind::Movie).unwrap();
        assert_eq!(r.title, "");
        assert_eq!(r.quality_name(QualityCategory::Resolution), "1080p");
    }

    #[test]
    fn overlapping_tokens_fall_back() {
        let spans = [Span { start: 0, end: 6 }, Span { start: 4, end: 10 }];
        assert_eq!(
            title_boundary("abcdefghij Title (x)", &spans),
            ("ghij Title ", "(x)")
        );

        let spans = [Span { start: 0, end: 3 }, Span { start: 2, end: 6 }];
        assert_eq!(title_boundary("abcd rest", &spans), ("d rest", ""));
    }

    #[test]
    fn plain_title_has_no_tokens() {
        let r = parser().parse("Some Movie", MediaKind::Movie).unwrap();
        assert_eq!(r.title, "Some Movie");
        assert_eq!(r.first_match(), None);
    }

    #[test]
    fn path_and_extension_are_removed() {
        let r = parser()
            .parse("/downloads/Movie_Name_2020_720p.mkv", MediaKind::Movie)
            .unwrap();
        assert_eq!(r.file_title, "Movie_Name_2020_720p");
        assert_eq!(r.working, "Movie Name 2020 720p");
        assert_eq!(r.title, "Movie Name");
    }

    #[test]
    fn enclosing_brackets_are_stripped() {
        assert_eq!(normalize("[Movie.Name.2020]"), "Movie.Name.2020");
        assert_eq!(normalize("[Group] Movie [1080p]"), "[Group] Movie [1080p]");
    }

    #[test]
    fn flags_and_languages() {
        let r = parser()
            .parse(
                "Movie.Name.2010.EXTENDED.German.DL.1080p.BluRay.x264.PROPER",
                MediaKind::Movie,
            )
            .unwrap();
        assert!(r.extended);
        assert!(r.proper);
        assert!(!r.repack);
        assert_eq!(r.title, "Movie Name");
        assert_eq!(r.languages, vec!["de".to_string()]);
    }

    #[test]
    fn language_words_in_title_are_ignored() {
        let r = parser()
            .parse("The.English.Patient.1996.1080p", MediaKind::Movie)
            .unwrap();
        assert_eq!(r.title, "The English Patient");
        assert!(r.languages.is_empty());
    }

    #[test]
    fn external_ids_follow_media_kind() {
        let p = parser();
        let movie = p.parse("Movie.2020.tt1234567.1080p", MediaKind::Movie).unwrap();
        assert_eq!(movie.imdb.as_deref(), Some("tt1234567"));

        let series = p.parse("Movie.2020.tt1234567.1080p", MediaKind::Series).unwrap();
        assert!(series.imdb.is_none());

        let show = p.parse("Show.S01E01.tvdb-81189", MediaKind::Series).unwrap();
        assert_eq!(show.tvdb, Some(81189));
    }

    #[test]
    fn reparsed_title_has_no_leading_token() {
        let p = parser();
        for name in [
            "Movie.Name.2020.1080p.BluRay.x264-GROUP",
            "Show.Name.S02E05.720p.WEB.DDP5.1",
            "1080p.Movie.Name.2020.WEB",
            "Blade.Runner.2049.2017.2160p.UHD.BluRay.x265",
            "REPACK.Some.Show.S01E01.HDTV",
        ] {
            let first = p.parse(name, MediaKind::Series).unwrap();
            if first.title.is_empty() {
                continue;
            }
            let again = p.parse(&first.title, MediaKind::Series).unwrap();
            assert_ne!(again.first_match(), Some(0), "{name}");
        }
    }

    #[test]
    fn fill_empty_only_keeps_existing() {
        let p = parser();
        let mut r = p.parse("Movie.2020.720p", MediaKind::Movie).unwrap();
        let written = p.fill_categories(&mut r, "Movie 1080p BluRay", CategoryFill::EmptyOnly);

        assert_eq!(r.quality_name(QualityCategory::Resolution), "720p");
        assert_eq!(r.quality_name(QualityCategory::Quality), "bluray");
        assert_eq!(written.len(), 1);

        p.fill_categories(&mut r, "Movie 1080p", CategoryFill::All);
        assert_eq!(r.quality_name(QualityCategory::Resolution), "1080p");
    }

    #[test]
    fn probe_fills_missing_values() {
        let p = parser();
        let mut r = p.parse("Movie.Name.2020.WEB", MediaKind::Movie).unwrap();
        let probe = ProbeInfo {
            width: 1920,
            height: 800,
            runtime: 6120,
            video_codec: Some("hevc".into()),
            audio_codec: Some("eac3".into()),
            languages: vec!["EN".into()],
        };
        p.apply_probe(&mut r, &probe);

        assert_eq!(r.quality_name(QualityCategory::Resolution), "1080p");
        assert_eq!(r.quality_name(QualityCategory::Codec), "h265");
        assert_eq!(r.quality_name(QualityCategory::Audio), "dd+");
        assert_ne!(r.qualities.get(QualityCategory::Codec).id, 0);
        assert_eq!((r.width, r.height, r.runtime), (1920, 800, 6120));
        assert_eq!(r.languages, vec!["en".to_string()]);
    }

    #[test]
    fn probe_keeps_parsed_values() {
        let p = parser();
        let mut r = p.parse("Movie.2020.720p.x264", MediaKind::Movie).unwrap();
        let probe = ProbeInfo {
            height: 2160,
            video_codec: Some("hevc".into()),
            ..ProbeInfo::default()
        };
        p.apply_probe(&mut r, &probe);
        assert_eq!(r.quality_name(QualityCategory::Resolution), "720p");
        assert_eq!(r.quality_name(QualityCategory::Codec), "h264");
    }
}
