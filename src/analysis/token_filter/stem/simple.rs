//! Light suffix-stripping stemmer for mixed English/Indonesian text.

use crate::analysis::token_filter::stem::Stemmer;

const DEFAULT_SUFFIXES: &[&str] = &[
    // English
    "ing", "ed", "er", "est", "ly", "s", "es", "ies", "tion", "sion", "ment", "ness", "ful",
    // Indonesian
    "nya", "kan", "lah",
];

/// Stemmer that strips the longest matching suffix from a fixed list.
///
/// A suffix is only removed when at least three characters remain.
#[derive(Debug, Clone)]
pub struct SimpleStemmer {
    /// Sorted longest first.
    suffixes: Vec<String>,
}

impl SimpleStemmer {
    /// Create a new simple stemmer with the default suffix list.
    pub fn new() -> Self {
        Self::with_suffixes(DEFAULT_SUFFIXES.iter().map(|s| s.to_string()).collect())
    }

    /// Create a simple stemmer with custom suffixes.
    pub fn with_suffixes(mut suffixes: Vec<String>) -> Self {
        suffixes.sort_by_key(|s| std::cmp::Reverse(s.chars().count()));
        SimpleStemmer { suffixes }
    }
}

impl Default for SimpleStemmer {
    fn default() -> Self {
        Self::new()
    }
}

impl Stemmer for SimpleStemmer {
    fn stem(&self, word: &str) -> String {
        let word = word.to_lowercase();

        for suffix in &self.suffixes {
            if let Some(stem) = word.strip_suffix(suffix.as_str()) {
                if stem.chars().count() >= 3 {
                    return stem.to_string();
                }
            }
        }

        word
    }

    fn name(&self) -> &'static str {
        "simple"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_stemmer() {
        let stemmer = SimpleStemmer::new();

        assert_eq!(stemmer.stem("bearings"), "bearing");
        assert_eq!(stemmer.stem("analyzed"), "analyz");
        assert_eq!(stemmer.stem("perawatannya"), "perawatan");
        assert_eq!(stemmer.stem("jelaskan"), "jelas");
        // Too short to strip.
        assert_eq!(stemmer.stem("gas"), "gas");
        assert_eq!(stemmer.stem("oils"), "oil");
    }

    #[test]
    fn test_custom_suffixes_longest_first() {
        let stemmer = SimpleStemmer::with_suffixes(vec!["s".to_string(), "ss".to_string()]);
        assert_eq!(stemmer.stem("process"), "proce");
    }
}
