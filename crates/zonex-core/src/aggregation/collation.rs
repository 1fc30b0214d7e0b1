//! Name ordering for agent lists.

use std::cmp::Ordering;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Lower-case `s` and strip diacritics, so `Élodie` sorts as `elodie`.
pub fn fold(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Compare display names: base letters first, then case-insensitive text.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    fold(a)
        .cmp(&fold(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fold() {
        assert_eq!(fold("Élodie"), "elodie");
        assert_eq!(fold("ZOÉ Hélène"), "zoe helene");
    }

    #[test]
    fn test_compare_names() {
        assert_eq!(compare_names("Dupont Abel", "Martin Zoé"), Ordering::Less);
        assert_eq!(compare_names("Émile", "Eric"), Ordering::Less);
        assert_eq!(compare_names("dupont", "DUPONT"), Ordering::Equal);
        assert_eq!(compare_names("Eve", "Ève"), Ordering::Less);
    }
}
