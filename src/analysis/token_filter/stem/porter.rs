//! Porter stemming algorithm.
//!
//! Implements the five rewrite phases of Porter (1980) over ASCII words.
//! Words containing anything other than ASCII letters (Indonesian loanwords
//! with digits, unit codes like `h2`, non-Latin scripts) are returned
//! lowercased but otherwise unchanged.
//!
//! # Examples
//!
//! ```
//! use rizbot::analysis::token_filter::stem::{PorterStemmer, Stemmer};
//!
//! let stemmer = PorterStemmer::new();
//! assert_eq!(stemmer.stem("vibrations"), "vibrat");
//! assert_eq!(stemmer.stem("maintenance"), "mainten");
//! ```

use crate::analysis::token_filter::stem::Stemmer;

/// Porter stemming algorithm implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PorterStemmer;

const STEP2_RULES: &[(&str, &str)] = &[
    ("ational", "ate"),
    ("tional", "tion"),
    ("enci", "ence"),
    ("anci", "ance"),
    ("izer", "ize"),
    ("abli", "able"),
    ("alli", "al"),
    ("entli", "ent"),
    ("eli", "e"),
    ("ousli", "ous"),
    ("ization", "ize"),
    ("ation", "ate"),
    ("ator", "ate"),
    ("alism", "al"),
    ("iveness", "ive"),
    ("fulness", "ful"),
    ("ousness", "ous"),
    ("aliti", "al"),
    ("iviti", "ive"),
    ("biliti", "ble"),
];

const STEP3_RULES: &[(&str, &str)] = &[
    ("icate", "ic"),
    ("ative", ""),
    ("alize", "al"),
    ("iciti", "ic"),
    ("ical", "ic"),
    ("ful", ""),
    ("ness", ""),
];

// Longer suffixes first where one is a suffix of another.
const STEP4_SUFFIXES: &[&str] = &[
    "ement", "ance", "ence", "able", "ible", "ment", "ant", "ent", "ion", "ism", "ate", "iti",
    "ous", "ive", "ize", "al", "er", "ic", "ou",
];

impl PorterStemmer {
    /// Create a new Porter stemmer.
    pub fn new() -> Self {
        PorterStemmer
    }

    fn is_consonant(w: &[u8], i: usize) -> bool {
        match w[i] {
            b'a' | b'e' | b'i' | b'o' | b'u' => false,
            b'y' => i == 0 || !Self::is_consonant(w, i - 1),
            _ => true,
        }
    }

    /// Number of vowel-consonant sequences, the `m` in `[C](VC)^m[V]`.
    fn measure(w: &[u8]) -> usize {
        let n = w.len();
        let mut i = 0;
        while i < n && Self::is_consonant(w, i) {
            i += 1;
        }

        let mut m = 0;
        loop {
            while i < n && !Self::is_consonant(w, i) {
                i += 1;
            }
            if i >= n {
                break;
            }
            while i < n && Self::is_consonant(w, i) {
                i += 1;
            }
            m += 1;
        }
        m
    }

    fn has_vowel(w: &[u8]) -> bool {
        (0..w.len()).any(|i| !Self::is_consonant(w, i))
    }

    fn ends_double_consonant(w: &[u8]) -> bool {
        let n = w.len();
        n >= 2 && w[n - 1] == w[n - 2] && Self::is_consonant(w, n - 1)
    }

    /// `*o`: ends consonant-vowel-consonant, the last not `w`, `x` or `y`.
    fn ends_cvc(w: &[u8]) -> bool {
        let n = w.len();
        n >= 3
            && Self::is_consonant(w, n - 3)
            && !Self::is_consonant(w, n - 2)
            && Self::is_consonant(w, n - 1)
            && !matches!(w[n - 1], b'w' | b'x' | b'y')
    }

    /// Replace `suffix` with `replacement` when `condition` holds on the stem.
    ///
    /// Returns `None` if the word does not end with `suffix`, otherwise whether
    /// the rewrite happened.
    fn rewrite(
        w: &mut Vec<u8>,
        suffix: &str,
        replacement: &str,
        condition: impl Fn(&[u8]) -> bool,
    ) -> Option<bool> {
        if !w.ends_with(suffix.as_bytes()) {
            return None;
        }
        let stem_len = w.len() - suffix.len();
        if condition(&w[..stem_len]) {
            w.truncate(stem_len);
            w.extend_from_slice(replacement.as_bytes());
            Some(true)
        } else {
            Some(false)
        }
    }

    fn apply_rules(w: &mut Vec<u8>, rules: &[(&str, &str)]) {
        for (suffix, replacement) in rules {
            if Self::rewrite(w, suffix, replacement, |stem| Self::measure(stem) > 0).is_some() {
                return;
            }
        }
    }

    fn step1a(w: &mut Vec<u8>) {
        if w.ends_with(b"sses") || w.ends_with(b"ies") {
            w.truncate(w.len() - 2);
        } else if !w.ends_with(b"ss") && w.ends_with(b"s") {
            w.truncate(w.len() - 1);
        }
    }

    fn step1b(w: &mut Vec<u8>) {
        if Self::rewrite(w, "eed", "ee", |stem| Self::measure(stem) > 0).is_some() {
            return;
        }

        let stripped = Self::rewrite(w, "ed", "", Self::has_vowel) == Some(true)
            || Self::rewrite(w, "ing", "", Self::has_vowel) == Some(true);
        if !stripped {
            return;
        }

        if w.ends_with(b"at") || w.ends_with(b"bl") || w.ends_with(b"iz") {
            w.push(b'e');
        } else if Self::ends_double_consonant(w) && !matches!(w[w.len() - 1], b'l' | b's' | b'z')
        {
            w.pop();
        } else if Self::measure(w) == 1 && Self::ends_cvc(w) {
            w.push(b'e');
        }
    }

    fn step1c(w: &mut Vec<u8>) {
        let n = w.len();
        if n > 1 && w[n - 1] == b'y' && Self::has_vowel(&w[..n - 1]) {
            w[n - 1] = b'i';
        }
    }

    fn step4(w: &mut Vec<u8>) {
        for suffix in STEP4_SUFFIXES {
            let matched = if *suffix == "ion" {
                Self::rewrite(w, suffix, "", |stem| {
                    Self::measure(stem) > 1 && matches!(stem.last(), Some(b's') | Some(b't'))
                })
            } else {
                Self::rewrite(w, suffix, "", |stem| Self::measure(stem) > 1)
            };
            if matched.is_some() {
                return;
            }
        }
    }

    fn step5(w: &mut Vec<u8>) {
        if w.ends_with(b"e") {
            let stem = &w[..w.len() - 1];
            let m = Self::measure(stem);
            if m > 1 || (m == 1 && !Self::ends_cvc(stem)) {
                w.pop();
            }
        }

        if w.ends_with(b"ll") && Self::measure(w) > 1 {
            w.pop();
        }
    }
}

impl Stemmer for PorterStemmer {
    fn stem(&self, word: &str) -> String {
        let word = word.to_lowercase();
        if word.len() <= 2 || !word.bytes().all(|b| b.is_ascii_lowercase()) {
            return word;
        }

        let mut w = word.into_bytes();
        Self::step1a(&mut w);
        Self::step1b(&mut w);
        Self::step1c(&mut w);
        Self::apply_rules(&mut w, STEP2_RULES);
        Self::apply_rules(&mut w, STEP3_RULES);
        Self::step4(&mut w);
        Self::step5(&mut w);

        // Only ASCII letters were ever pushed.
        String::from_utf8(w).unwrap_or_default()
    }

    fn name(&self) -> &'static str {
        "porter"
    }
}
