//! TF-IDF vectorizer for text feature extraction.

use std::collections::HashSet;

use crate::features::Vocabulary;

/// TF-IDF vectorizer over a fixed, sorted vocabulary.
#[derive(Debug, Clone, Default)]
pub struct TfIdfVectorizer {
    /// Vocabulary: sorted distinct terms of the fitted documents.
    vocabulary: Vocabulary,
    /// Inverse document frequency for each term.
    idf: Vec<f64>,
    /// Total number of documents seen during fitting.
    n_documents: usize,
}

impl TfIdfVectorizer {
    /// Fit the vectorizer on term sequences.
    pub fn fit<D, S>(documents: &[D]) -> Self
    where
        D: AsRef<[S]>,
        S: AsRef<str>,
    {
        let n_documents = documents.len();
        let vocabulary = Vocabulary::build(
            documents
                .iter()
                .flat_map(|doc| doc.as_ref().iter().map(|term| term.as_ref())),
        );

        // Count document frequencies
        let mut document_frequency = vec![0usize; vocabulary.len()];
        for doc in documents {
            let unique: HashSet<usize> = doc
                .as_ref()
                .iter()
                .filter_map(|term| vocabulary.index_of(term.as_ref()))
                .collect();
            for idx in unique {
                document_frequency[idx] += 1;
            }
        }

        // IDF = ln((N + 1) / (df + 1)) + 1
        let idf = document_frequency
            .iter()
            .map(|&df| ((n_documents as f64 + 1.0) / (df as f64 + 1.0)).ln() + 1.0)
            .collect();

        TfIdfVectorizer {
            vocabulary,
            idf,
            n_documents,
        }
    }

    /// Transform a term sequence into a TF-IDF feature vector.
    ///
    /// Term frequency is normalized by the full sequence length, unknown terms
    /// included; unknown terms contribute no component.
    pub fn transform<S: AsRef<str>>(&self, terms: &[S]) -> Vec<f64> {
        let mut tf = vec![0.0; self.vocabulary.len()];

        for term in terms {
            if let Some(idx) = self.vocabulary.index_of(term.as_ref()) {
                tf[idx] += 1.0;
            }
        }

        let doc_length = terms.len() as f64;
        if doc_length > 0.0 {
            for count in &mut tf {
                *count /= doc_length;
            }
        }

        for (count, idf) in tf.iter_mut().zip(&self.idf) {
            *count *= idf;
        }

        tf
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Get the size of the vocabulary.
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn n_documents(&self) -> usize {
        self.n_documents
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }
}

/// Cosine similarity of two equal-length vectors, clamped to `[0, 1]`.
///
/// Zero vectors and mismatched lengths score 0.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let magnitude_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        0.0
    } else {
        (dot_product / (magnitude_a * magnitude_b)).clamp(0.0, 1.0)
    }
}
