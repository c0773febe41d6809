use regex::Regex;

use crate::error::Result;

/// Video container extensions removed from a file title.
pub const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "m4v", "ts", "wmv", "mov"];

/// Language words recognized after the title, mapped to ISO 639-1 codes.
/// `mul` is the ISO 639-2 code for "multiple languages".
pub const LANGUAGE_WORDS: &[(&str, &str)] = &[
    ("german", "de"),
    ("deutsch", "de"),
    ("french", "fr"),
    ("truefrench", "fr"),
    ("vff", "fr"),
    ("spanish", "es"),
    ("castellano", "es"),
    ("italian", "it"),
    ("japanese", "ja"),
    ("english", "en"),
    ("dutch", "nl"),
    ("flemish", "nl"),
    ("russian", "ru"),
    ("korean", "ko"),
    ("chinese", "zh"),
    ("mandarin", "zh"),
    ("portuguese", "pt"),
    ("swedish", "sv"),
    ("danish", "da"),
    ("norwegian", "no"),
    ("finnish", "fi"),
    ("polish", "pl"),
    ("hindi", "hi"),
    ("multi", "mul"),
];

/// A captured metadata value and the span of its whole match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub start: usize,
    pub end: usize,
}

/// Fixed, ordered metadata patterns. Every pattern has exactly one capture group.
#[derive(Debug, Clone)]
pub struct MetadataPatterns {
    pub season: Vec<Regex>,
    pub episode: Vec<Regex>,
    pub identifier: Vec<Regex>,
    pub date: Regex,
    pub year: Regex,
    pub audio_hint: Regex,
    pub imdb: Regex,
    pub tvdb: Regex,
    pub proper: Regex,
    pub repack: Regex,
    pub extended: Regex,
}

impl MetadataPatterns {
    /// Compiles the built-in patterns.
    ///
    /// # Errors
    ///
    /// Returns `SenbetsuError::RegexError` if a pattern fails to compile.
    pub fn new() -> Result<Self> {
        Ok(Self {
            season: vec![
                Regex::new(r"(?i)\bs(\d{1,3})[ .]?e\d{1,4}")?,
                Regex::new(r"(?i)\b(\d{1,2})x\d{2,3}\b")?,
                Regex::new(r"(?i)\bseason[ .]?(\d{1,3})\b")?,
            ],
            episode: vec![
                Regex::new(r"(?i)\bs\d{1,3}[ .]?e(\d{1,4})")?,
                Regex::new(r"(?i)\b\d{1,2}x(\d{2,3})\b")?,
                Regex::new(r"(?i)\bepisode[ .]?(\d{1,4})\b")?,
            ],
            identifier: vec![
                Regex::new(r"(?i)\b(s\d{1,3}[ .]?e\d{1,4}(?:[ .\-]?e\d{1,4})*)")?,
                Regex::new(r"(?i)\b(\d{1,2}x\d{2,3}(?:-\d{2,3})?)\b")?,
            ],
            date: Regex::new(
                r"\b((?:19|20)\d{2}[ .\-](?:0[1-9]|1[0-2])[ .\-](?:0[1-9]|[12]\d|3[01]))\b",
            )?,
            year: Regex::new(r"\b((?:19|20)\d{2})\b")?,
            audio_hint: Regex::new(r"(?i)\b(dual[ .\-]?audio|multi[ .\-]?audio|atmos)\b")?,
            imdb: Regex::new(r"(?i)\b(tt\d{7,8})\b")?,
            tvdb: Regex::new(r"(?i)\btvdb(?:id)?[ =\-:]?(\d+)\b")?,
            proper: Regex::new(r"(?i)\b(proper)\b")?,
            repack: Regex::new(r"(?i)\b(repack|rerip)\b")?,
            extended: Regex::new(r"(?i)\b(extended(?:[ .\-](?:cut|edition))?)\b")?,
        })
    }
}

/// First match across `patterns` whose capture group participated and is non-empty.
pub fn first_capture(patterns: &[Regex], text: &str) -> Option<Token> {
    patterns.iter().find_map(|re| captures(re, text).next())
}

/// Last such match of a single pattern.
pub fn last_capture(pattern: &Regex, text: &str) -> Option<Token> {
    captures(pattern, text).last()
}

fn captures<'t>(pattern: &'t Regex, text: &'t str) -> impl Iterator<Item = Token> + 't {
    pattern.captures_iter(text).filter_map(|caps| {
        let whole = caps.get(0)?;
        let group = caps.get(1).filter(|g| !g.as_str().is_empty())?;
        Some(Token {
            value: group.as_str().to_string(),
            start: whole.start(),
            end: whole.end(),
        })
    })
}

/// ISO code for a language word, ignoring case.
pub fn language_code(word: &str) -> Option<&'static str> {
    LANGUAGE_WORDS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(word))
        .map(|(_, code)| *code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> MetadataPatterns {
        MetadataPatterns::new().unwrap()
    }

    #[test]
    fn season_episode_forms() {
        let p = patterns();
        for (input, season, episode) in [
            ("Show.S02E05.720p", "02", "05"),
            ("Show s1e12 HDTV", "1", "12"),
            ("Show.3x07.HDTV", "3", "07"),
            ("Show Season 4 Episode 9", "4", "9"),
        ] {
            assert_eq!(first_capture(&p.season, input).unwrap().value, season, "{input}");
            assert_eq!(first_capture(&p.episode, input).unwrap().value, episode, "{input}");
        }
    }

    #[test]
    fn resolution_is_not_an_episode() {
        let p = patterns();
        assert!(first_capture(&p.season, "Movie.1920x1080.mkv").is_none());
        assert!(first_capture(&p.identifier, "Movie.x264-GRP").is_none());
    }

    #[test]
    fn multi_episode_identifier() {
        let p = patterns();
        let id = first_capture(&p.identifier, "Show.S01E01E02.720p").unwrap();
        assert_eq!(id.value, "S01E01E02");
        assert_eq!((id.start, id.end), (5, 14));
    }

    #[test]
    fn year_takes_last_match() {
        let p = patterns();
        let year = last_capture(&p.year, "Blade.Runner.2049.2017.1080p").unwrap();
        assert_eq!(year.value, "2017");
        assert_eq!(year.start, 18);
    }

    #[test]
    fn date_identifier() {
        let p = patterns();
        let date = p.date.captures("Show.2019.05.12.720p").unwrap();
        assert_eq!(&date[1], "2019.05.12");
        assert!(p.date.captures("Show.2019.13.12").is_none());
    }

    #[test]
    fn external_ids() {
        let p = patterns();
        assert_eq!(&p.imdb.captures("Movie tt0133093 1080p").unwrap()[1], "tt0133093");
        assert_eq!(&p.tvdb.captures("Show [tvdbid=81189]").unwrap()[1], "81189");
        assert_eq!(&p.tvdb.captures("Show tvdb-81189").unwrap()[1], "81189");
    }

    #[test]
    fn language_lookup() {
        assert_eq!(language_code("GERMAN"), Some("de"));
        assert_eq!(language_code("Multi"), Some("mul"));
        assert_eq!(language_code("name"), None);
    }
}
