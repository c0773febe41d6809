use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Comparable form of a title: accents dropped, lower-case, `&` spelled out,
/// every run of other characters collapsed to a single `-`.
#[must_use]
pub fn slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.nfkd().filter(|c| !is_combining_mark(*c)) {
        if c == '&' {
            push_word(&mut out, "and", &mut pending_dash);
        } else if c.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}

fn push_word(out: &mut String, word: &str, pending_dash: &mut bool) {
    if !out.is_empty() {
        out.push('-');
    }
    out.push_str(word);
    *pending_dash = true;
}

/// Removes a trailing `(...)` or `[...]` group, e.g. `"The Office (US)"` → `"The Office"`.
#[must_use]
pub fn strip_trailing_brackets(title: &str) -> &str {
    let trimmed = title.trim_end();
    for (open, close) in [('(', ')'), ('[', ']')] {
        if trimmed.ends_with(close) {
            if let Some(pos) = trimmed.rfind(open) {
                let head = trimmed[..pos].trim_end();
                if !head.is_empty() {
                    return head;
                }
            }
        }
    }
    trimmed
}

/// Accepted spellings of one wanted title.
fn variants(title: &str, year: Option<u16>) -> Vec<String> {
    let mut out = vec![title.to_string()];
    let stripped = strip_trailing_brackets(title);
    if stripped != title {
        out.push(stripped.to_string());
    }
    if let Some(year) = year {
        let base: Vec<String> = out.clone();
        out.extend(base.iter().map(|t| format!("{t} {year}")));
    }
    out
}

/// `true` if `candidate` names the wanted title or one of its alternates.
#[must_use]
pub fn title_matches(candidate: &str, wanted: &str, alternates: &[String], year: Option<u16>) -> bool {
    if candidate.trim().is_empty() {
        return false;
    }
    let candidate_slug = slug(candidate);

    std::iter::once(wanted)
        .chain(alternates.iter().map(String::as_str))
        .filter(|t| !t.trim().is_empty())
        .flat_map(|t| variants(t, year))
        .any(|v| v.eq_ignore_ascii_case(candidate) || slug(&v) == candidate_slug)
}
