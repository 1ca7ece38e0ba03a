//! Query normalization and cache key derivation

use sha2::{Digest, Sha256};

/// Lower-case, trim and collapse internal whitespace to single spaces.
/// Typographic apostrophes are folded to ASCII so phrase lists only need one spelling.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(|word| word.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether normalized text carries anything worth analysing
pub fn is_answerable(normalized: &str) -> bool {
    normalized.chars().any(char::is_alphanumeric)
}

/// Cache key for a query: hex SHA-256 of its normalized form
pub fn cache_key(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize(text).as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Help   ME\t\nplease "), "help me please");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("I can\u{2019}t cope"), "i can't cope");
    }

    #[test]
    fn test_is_answerable() {
        assert!(is_answerable("help"));
        assert!(!is_answerable(""));
        assert!(!is_answerable("?! ..."));
    }

    #[test]
    fn test_cache_key_case_and_spacing() {
        assert_eq!(cache_key("Help ME"), cache_key("help me"));
        assert_eq!(cache_key(" help   me "), cache_key("help me"));
        assert_ne!(cache_key("help me"), cache_key("help us"));
        assert_eq!(cache_key("help me").len(), 64);
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(s in "[a-zA-Z0-9 \\t\\n.,?]{0,64}") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn cache_key_ignores_ascii_case(s in "[a-zA-Z ]{0,40}") {
            prop_assert_eq!(cache_key(&s.to_uppercase()), cache_key(&s.to_lowercase()));
        }
    }
}
