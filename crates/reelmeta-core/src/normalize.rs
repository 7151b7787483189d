//! Title normalization transforms for movie catalog titles.
//!
//! Every function here is total: any input yields a string (or `None` for
//! [`extract_short_alternate`]), never an error. Each transform is a single
//! cleanup step; [`crate::candidates`] composes them into query candidates
//! and [`canonical_title`] composes them into the stored display title.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::char::canonical_combining_class;
use unicode_normalization::UnicodeNormalization;

// ── Regex patterns ──────────────────────────────────────────────

static RE_TRAILING_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(\d{4}\)\s*$").unwrap());

static RE_RELEASE_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d{4})\)\s*$").unwrap());

static RE_TRAILING_ARTICLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.*),\s*(the|a|an)$").unwrap());

/// Parenthetical groups carrying an "also known as" / "original title" marker.
static RE_MARKED_ALTERNATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\s*\([^)]*?(?:a\.k\.a\.|aka|original title|original|la|le|der|el|cite|cité|versión|version)[^)]*\)\s*",
    )
    .unwrap()
});

static RE_ANY_PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^)]*\)\s*").unwrap());

static RE_FIRST_PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]+)\)").unwrap());

/// Longest parenthetical text still treated as a title rather than a note.
const MAX_ALTERNATE_CHARS: usize = 30;

/// Collapse whitespace runs to a single space and trim both ends.
pub fn tidy_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove a trailing `(YYYY)` block and enclosing quotes, then tidy whitespace.
///
/// `"\"Heat (1995)\""` is left with its quotes on the outside of the year, so
/// quotes are trimmed after the year has been removed.
pub fn strip_year_and_quotes(title: &str) -> String {
    let without_year = RE_TRAILING_YEAR.replace(title, "");
    let unquoted = without_year
        .trim()
        .trim_matches(|c: char| c == ' ' || c == '"' || c == '\'');
    tidy_whitespace(unquoted)
}

/// Rewrite `"Name, The"` as `"The Name"` (also `A` and `An`, any case).
///
/// The article keeps the case it was written with.
pub fn invert_trailing_article(title: &str) -> String {
    match RE_TRAILING_ARTICLE.captures(title) {
        Some(caps) => format!("{} {}", &caps[2], &caps[1]).trim().to_string(),
        None => title.to_string(),
    }
}

/// Remove alternate-title annotations in parentheses.
///
/// Marked groups (`aka`, `Original title`, ...) go first, then every other
/// parenthetical group is dropped too.
pub fn strip_parenthetical_alternates(title: &str) -> String {
    let marked = RE_MARKED_ALTERNATE.replace_all(title, " ");
    let stripped = RE_ANY_PARENTHETICAL.replace_all(&marked, " ");
    tidy_whitespace(&stripped)
}

/// Return the text of the first parenthetical group if it looks like a short
/// alternate title: at most 30 characters and no comma.
pub fn extract_short_alternate(title: &str) -> Option<String> {
    let caps = RE_FIRST_PARENTHETICAL.captures(title)?;
    let inside = caps[1].trim();
    if inside.is_empty() || inside.chars().count() > MAX_ALTERNATE_CHARS || inside.contains(',') {
        return None;
    }
    Some(inside.to_string())
}

/// Decompose (NFKD) and drop combining marks: `"Amélie"` → `"Amelie"`.
///
/// Only characters with a non-zero canonical combining class are dropped;
/// spacing vowel signs in scripts such as Devanagari or Thai are kept.
pub fn strip_diacritics(text: &str) -> String {
    text.nfkd()
        .filter(|c| canonical_combining_class(*c) == 0)
        .collect()
}

/// Release year from a trailing `(YYYY)` annotation, if any.
pub fn release_year(raw_title: &str) -> Option<i32> {
    RE_RELEASE_YEAR
        .captures(raw_title)
        .and_then(|caps| caps[1].parse().ok())
}

/// Fully cleaned title used for storage and display.
///
/// Base clean → article inversion → parenthetical strip → diacritic strip.
pub fn canonical_title(raw_title: &str) -> String {
    let t = strip_year_and_quotes(raw_title);
    let t = invert_trailing_article(&t);
    let t = strip_parenthetical_alternates(&t);
    let t = strip_diacritics(&t);
    tidy_whitespace(&t)
}
