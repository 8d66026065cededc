//! Fixed term vocabularies and the bag-of-words encoding built on them.

use std::collections::{BTreeSet, HashMap};

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Ordered set of distinct terms defining feature dimensions.
///
/// [`Vocabulary::build`] sorts terms lexicographically, so the same patterns
/// always produce the same indices regardless of corpus order. A deserialized
/// vocabulary keeps the order it was stored in; use
/// [`Vocabulary::is_canonical`] to verify it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    terms: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Collect, deduplicate and sort terms.
    pub fn build<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = terms
            .into_iter()
            .map(|term| term.as_ref().to_string())
            .filter(|term| !term.is_empty())
            .collect();
        Self::from(distinct.into_iter().collect::<Vec<_>>())
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    pub fn term(&self, index: usize) -> Option<&str> {
        self.terms.get(index).map(String::as_str)
    }

    pub fn contains(&self, term: &str) -> bool {
        self.index.contains_key(term)
    }

    /// True when terms are strictly increasing, i.e. sorted and distinct.
    pub fn is_canonical(&self) -> bool {
        self.terms.windows(2).all(|pair| pair[0] < pair[1])
    }

    /// Binary presence vector: `1.0` at the index of every known term.
    ///
    /// Unknown terms are ignored, so an input made only of unknown words maps
    /// to the zero vector.
    pub fn bag_of_words<S: AsRef<str>>(&self, terms: &[S]) -> Array1<f32> {
        let mut bag = Array1::zeros(self.len());
        for term in terms {
            if let Some(index) = self.index_of(term.as_ref()) {
                bag[index] = 1.0;
            }
        }
        bag
    }
}

impl From<Vec<String>> for Vocabulary {
    fn from(terms: Vec<String>) -> Self {
        let index = terms
            .iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i))
            .collect();
        Vocabulary { terms, index }
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocabulary: Vocabulary) -> Self {
        vocabulary.terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_sorts_and_dedupes() {
        let vocabulary = Vocabulary::build(["oil", "gas", "oil", "", "bearing"]);
        assert_eq!(vocabulary.terms(), ["bearing", "gas", "oil"]);
        assert_eq!(vocabulary.index_of("gas"), Some(1));
        assert_eq!(vocabulary.term(2), Some("oil"));
        assert!(vocabulary.is_canonical());
    }

    #[test]
    fn test_build_is_order_independent() {
        let a = Vocabulary::build(["motor", "arus", "rotor"]);
        let b = Vocabulary::build(["rotor", "motor", "arus"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_bag_of_words() {
        let vocabulary = Vocabulary::build(["bearing", "gas", "oil"]);
        let bag = vocabulary.bag_of_words(&["oil", "oil", "unknown"]);
        assert_eq!(bag.to_vec(), vec![0.0, 0.0, 1.0]);

        let empty: [&str; 0] = [];
        assert_eq!(vocabulary.bag_of_words(&empty).sum(), 0.0);
    }

    #[test]
    fn test_serde_preserves_order() {
        let vocabulary = Vocabulary::from(vec!["zeta".to_string(), "alpha".to_string()]);
        let json = serde_json::to_string(&vocabulary).unwrap();
        assert_eq!(json, r#"["zeta","alpha"]"#);

        let restored: Vocabulary = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.index_of("zeta"), Some(0));
        assert!(!restored.is_canonical());
    }
}
