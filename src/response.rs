//! Picks one of a matched intent's canned replies.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use tracing::error;

use crate::corpus::Intent;
use crate::error::{IntentError, Result};

/// Uniform random choice over an intent's responses.
#[derive(Debug, Clone)]
pub struct ResponseSelector {
    rng: StdRng,
}

impl ResponseSelector {
    /// Seeded when `seed` is given, otherwise drawn from OS entropy.
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_rng(StdRng::from_os_rng()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    pub fn from_rng(rng: StdRng) -> Self {
        ResponseSelector { rng }
    }

    /// Choose a response.
    ///
    /// An intent with no responses is a corpus defect and is reported as
    /// [`IntentError::EmptyResponseList`], never papered over with a fallback.
    pub fn select<'a>(&mut self, intent: &'a Intent) -> Result<&'a str> {
        match intent.responses.choose(&mut self.rng) {
            Some(response) => Ok(response.as_str()),
            None => {
                error!(tag = %intent.tag, "matched intent has no responses");
                Err(IntentError::EmptyResponseList {
                    tag: intent.tag.clone(),
                })
            }
        }
    }
}

impl Default for ResponseSelector {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_response() {
        let intent = Intent::new("greeting", &["hello"], &["Hi there!"]);
        let mut selector = ResponseSelector::default();
        assert_eq!(selector.select(&intent).unwrap(), "Hi there!");
    }

    #[test]
    fn test_seeded_selection_is_reproducible() {
        let intent = Intent::new("dga", &["dga"], &["a", "b", "c", "d", "e"]);
        let mut first = ResponseSelector::seeded(17);
        let mut second = ResponseSelector::seeded(17);
        for _ in 0..20 {
            assert_eq!(first.select(&intent).unwrap(), second.select(&intent).unwrap());
        }
    }

    #[test]
    fn test_covers_all_responses() {
        let intent = Intent::new("dga", &["dga"], &["a", "b", "c"]);
        let mut selector = ResponseSelector::seeded(1);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(selector.select(&intent).unwrap());
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_empty_responses_is_error() {
        let intent = Intent::new("mute", &["shh"], &[]);
        let mut selector = ResponseSelector::seeded(0);
        assert!(matches!(
            selector.select(&intent),
            Err(IntentError::EmptyResponseList { tag }) if tag == "mute"
        ));
    }
}
