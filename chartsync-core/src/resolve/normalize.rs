//! Title normalization and year extraction for local candidate filtering.

use once_cell::sync::Lazy;
use regex::Regex;

static YEAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(19|20)\d{2}\b").expect("year regex should compile"));

/// Leading articles stripped before title comparison. English plus the
/// Portuguese forms seen on the source site.
const LEADING_ARTICLES: [&str; 6] = ["the ", "a ", "an ", "o ", "os ", "as "];

/// Normalize a title for comparison: lowercase, strip one leading article,
/// collapse whitespace.
pub fn normalize_title(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    let mut stripped = lowered.as_str();
    for article in LEADING_ARTICLES {
        if let Some(rest) = stripped.strip_prefix(article) {
            stripped = rest;
            break;
        }
    }
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract a plausible 4-digit year (19xx/20xx) from free text.
pub fn extract_year(text: &str) -> Option<&str> {
    YEAR_PATTERN.find(text).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_one_leading_article() {
        assert_eq!(normalize_title("The Matrix"), "matrix");
        assert_eq!(normalize_title("A Quiet Place"), "quiet place");
        assert_eq!(normalize_title("O Pátio das Cantigas"), "pátio das cantigas");
        assert_eq!(normalize_title("As Bestas"), "bestas");
        // Only the first article goes; "an" inside "The An..." stays.
        assert_eq!(normalize_title("The A Team"), "a team");
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_title("  The   Dark  Knight "), "dark knight");
    }

    #[test]
    fn test_normalize_leaves_plain_titles_alone() {
        assert_eq!(normalize_title("Oppenheimer"), "oppenheimer");
        assert_eq!(normalize_title("Matrix Reloaded"), "matrix reloaded");
    }

    #[test]
    fn test_extract_year_accepts_only_19xx_20xx() {
        assert_eq!(extract_year("Nov 28, 2023"), Some("2023"));
        assert_eq!(extract_year("1999"), Some("1999"));
        assert_eq!(extract_year("premiered 1894"), None);
        assert_eq!(extract_year("episode 2150"), None);
        assert_eq!(extract_year("no digits here"), None);
    }

    #[test]
    fn test_extract_year_ignores_embedded_digits() {
        // Word boundary keeps "12023" from matching.
        assert_eq!(extract_year("id 12023x"), None);
    }
}
