//! Query candidate generation for one raw catalog title.
//!
//! Candidates are ordered from most to least likely to match the lookup
//! service's canonical form:
//!
//! 1. article-inverted title (`"Matrix, The"` → `"The Matrix"`)
//! 2. title with parenthetical alternates removed
//! 3. short alternate title taken from the first parenthetical group
//! 4. the base-cleaned title itself
//! 5. diacritic-stripped copies of the above, for ASCII-only indexes

use crate::normalize::{
    extract_short_alternate, invert_trailing_article, strip_diacritics,
    strip_parenthetical_alternates, strip_year_and_quotes, tidy_whitespace,
};

/// Build the deduplicated, priority-ordered candidate list for `raw_title`.
///
/// Returns an empty list only when nothing is left after stripping the year
/// and quotes.
pub fn generate_candidates(raw_title: &str) -> Vec<String> {
    let base = strip_year_and_quotes(raw_title);
    if base.is_empty() {
        return Vec::new();
    }

    let moved = invert_trailing_article(&base);
    let without_parens = strip_parenthetical_alternates(&base);
    let alternate = extract_short_alternate(&base);

    let mut candidates = CandidateList::default();
    candidates.push(moved);
    candidates.push(without_parens);
    if let Some(alt) = alternate {
        candidates.push(alt);
    }
    candidates.push(base);

    let transliterated: Vec<String> = candidates
        .iter()
        .map(|c| strip_diacritics(c))
        .filter(|t| !candidates.contains(t))
        .collect();
    for t in transliterated {
        candidates.push(t);
    }

    candidates.finish()
}

/// Insertion-ordered list that ignores empty and already-present values.
#[derive(Default)]
struct CandidateList {
    items: Vec<String>,
}

impl CandidateList {
    fn push(&mut self, value: String) {
        if !value.is_empty() && !self.contains(&value) {
            self.items.push(value);
        }
    }

    fn contains(&self, value: &str) -> bool {
        self.items.iter().any(|c| c == value)
    }

    fn iter(&self) -> impl Iterator<Item = &String> {
        self.items.iter()
    }

    /// Whitespace-normalize every entry; tidying can make two entries equal,
    /// so dedupe once more.
    fn finish(self) -> Vec<String> {
        let mut out = CandidateList::default();
        for item in self.items {
            out.push(tidy_whitespace(&item));
        }
        out.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_unique_non_empty(candidates: &[String]) {
        for (i, c) in candidates.iter().enumerate() {
            assert!(!c.is_empty(), "empty candidate at {i}");
            assert!(
                !candidates[..i].contains(c),
                "duplicate candidate {c:?} in {candidates:?}"
            );
        }
    }

    #[test]
    fn test_trailing_article() {
        let candidates = generate_candidates("Matrix, The (1999)");
        assert_eq!(candidates, vec!["The Matrix", "Matrix, The"]);
    }

    #[test]
    fn test_plain_title() {
        assert_eq!(generate_candidates("Heat (1995)"), vec!["Heat"]);
    }

    #[test]
    fn test_short_alternate() {
        let candidates = generate_candidates("Seven (a.k.a. Se7en) (1995)");
        assert_eq!(
            candidates,
            vec!["Seven (a.k.a. Se7en)", "Seven", "a.k.a. Se7en"]
        );
    }

    #[test]
    fn test_original_title_ordering() {
        let candidates = generate_candidates(
            "Cité des Enfants Perdus, La (Original title: La Cité des Enfants Perdus) (1995)",
        );
        assert_eq!(
            candidates,
            vec![
                "Cité des Enfants Perdus, La (Original title: La Cité des Enfants Perdus)",
                "Cité des Enfants Perdus, La",
                "Cite des Enfants Perdus, La (Original title: La Cite des Enfants Perdus)",
                "Cite des Enfants Perdus, La",
            ]
        );
        assert_unique_non_empty(&candidates);
    }

    #[test]
    fn test_diacritics_appended_last() {
        let candidates = generate_candidates("Amélie (Fabuleux destin d'Amélie Poulain, Le) (2001)");
        assert_eq!(
            candidates,
            vec![
                "Amélie (Fabuleux destin d'Amélie Poulain, Le)",
                "Amélie",
                "Amelie (Fabuleux destin d'Amelie Poulain, Le)",
                "Amelie",
            ]
        );
    }

    #[test]
    fn test_article_with_alternate() {
        let candidates = generate_candidates("Bug's Life, A (1998)");
        assert_eq!(candidates, vec!["A Bug's Life", "Bug's Life, A"]);
    }

    #[test]
    fn test_empty_and_blank_titles() {
        assert!(generate_candidates("").is_empty());
        assert!(generate_candidates("   ").is_empty());
        assert!(generate_candidates("(1999)").is_empty());
        assert!(generate_candidates("\"\"").is_empty());
    }

    #[test]
    fn test_no_duplicates_for_messy_input() {
        for raw in [
            "  \"Shawshank   Redemption, The\"  (1994)",
            "Léon: The Professional (a.k.a. The Professional) (Léon) (1994)",
            "Yojimbo (1961)",
            "((()))",
            "Crouching Tiger, Hidden Dragon (Wo hu cang long) (2000)",
        ] {
            assert_unique_non_empty(&generate_candidates(raw));
        }
    }
}
