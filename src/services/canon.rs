//! Port-name canonicalization.
//!
//! Produces the join key used everywhere a free-text port name has to be
//! compared against another source: congestion tables, alias maps, fuzzy
//! matching. Two names that differ only by casing, accents, punctuation,
//! parentheticals, or generic words ("Port of", "Terminal", …) canonicalize
//! to the same key.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::canonical_combining_class;
use unicode_normalization::UnicodeNormalization;

/// Generic tokens dropped from port names. Includes a few language variants
/// ("pelabuhan" Indonesian/Malay, "portos" Portuguese).
const STOPWORDS: &[&str] = &[
    "port", "pelabuhan", "pel", "harbour", "harbor", "terminal", "marine", "maritime", "of",
    "the", "pt", "portos",
];

static PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(.*?\)").expect("parenthetical regex"));

/// Strip diacritics: NFKD-decompose and drop combining marks.
fn strip_accents(s: &str) -> String {
    s.nfkd().filter(|&c| canonical_combining_class(c) == 0).collect()
}

/// Canonicalize a free-text port name into a comparable key.
///
/// Deterministic and idempotent. Empty input yields an empty key.
pub fn canonicalize(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    let lowered = strip_accents(name).to_lowercase();
    let no_parens = PARENTHETICAL.replace_all(&lowered, " ");
    let spaced: String = no_parens
        .chars()
        .map(|c| if c.is_ascii_punctuation() { ' ' } else { c })
        .collect();
    spaced
        .split_whitespace()
        .filter(|t| !STOPWORDS.contains(t))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(canonicalize(""), "");
    }

    #[test]
    fn test_stopwords_dropped() {
        assert_eq!(canonicalize("Port of Rotterdam"), "rotterdam");
        assert_eq!(canonicalize("Pelabuhan Tanjung Priok"), "tanjung priok");
    }

    #[test]
    fn test_parenthetical_and_case() {
        assert_eq!(
            canonicalize("Port of Rotterdam"),
            canonicalize("ROTTERDAM (Port)")
        );
    }

    #[test]
    fn test_punctuation_to_spaces() {
        assert_eq!(canonicalize("St. Petersburg"), "st petersburg");
        assert_eq!(canonicalize("Dar-es-Salaam"), "dar es salaam");
    }

    #[test]
    fn test_accents_stripped() {
        assert_eq!(canonicalize("São Sebastião"), "sao sebastiao");
        assert_eq!(canonicalize("Le Havre"), canonicalize("LE HÀVRE"));
    }

    #[test]
    fn test_idempotent() {
        for name in [
            "Port of Rotterdam",
            "ROTTERDAM (Port)",
            "São Sebastião",
            "Dar-es-Salaam Harbour",
            "",
        ] {
            let once = canonicalize(name);
            assert_eq!(canonicalize(&once), once, "not idempotent for '{}'", name);
        }
    }

    #[test]
    fn test_only_stopwords_yields_empty() {
        assert_eq!(canonicalize("Port Terminal"), "");
    }
}
