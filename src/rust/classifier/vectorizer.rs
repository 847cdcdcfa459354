use std::collections::{BTreeMap, BTreeSet};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// Two or more word characters between word boundaries.
    static ref TOKEN_RE: Regex = Regex::new(r"\b\w\w+\b").expect("token pattern is a valid regex");
}

/// Splits text into lowercase word tokens.
///
/// Whitespace and punctuation act as delimiters and single-character
/// tokens are dropped, so `"Win £1000 NOW!"` yields `["win", "1000", "now"]`.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// A sparse vector of token counts, sorted by feature index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountVector {
    entries: Vec<(usize, u32)>,
}

impl CountVector {
    /// Builds a vector from `(index, count)` pairs. Duplicate indices are summed.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (usize, u32)>) -> Self {
        let mut counts: BTreeMap<usize, u32> = BTreeMap::new();
        for (index, count) in pairs {
            if count > 0 {
                *counts.entry(index).or_insert(0) += count;
            }
        }
        Self {
            entries: counts.into_iter().collect(),
        }
    }

    /// Iterates over the non-zero `(index, count)` entries in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.entries.iter().copied()
    }

    /// Returns true when no vocabulary token was present.
    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct vocabulary tokens present.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Total token count.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|&(_, c)| c as u64).sum()
    }

    /// Returns the count for a feature index, zero when absent.
    pub fn get(&self, index: usize) -> u32 {
        self.entries
            .binary_search_by_key(&index, |&(i, _)| i)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0)
    }
}

/// Bag-of-words vectorizer with a vocabulary frozen at fit time.
///
/// Vocabulary indices follow lexicographic token order, so the same
/// training texts always produce the same feature layout regardless of
/// the order they were seen in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountVectorizer {
    vocabulary: BTreeMap<String, usize>,
}

impl CountVectorizer {
    /// Builds the vocabulary from training texts.
    pub fn fit<S: AsRef<str>>(texts: &[S]) -> Self {
        let tokens: BTreeSet<String> = texts
            .iter()
            .flat_map(|text| tokenize(text.as_ref()))
            .collect();

        let vocabulary = tokens
            .into_iter()
            .enumerate()
            .map(|(index, token)| (token, index))
            .collect();

        Self { vocabulary }
    }

    /// Counts vocabulary tokens in `text`. Unknown tokens contribute nothing.
    pub fn transform(&self, text: &str) -> CountVector {
        CountVector::from_pairs(
            tokenize(text)
                .iter()
                .filter_map(|token| self.vocabulary.get(token).map(|&index| (index, 1))),
        )
    }

    /// Transforms several texts, preserving input order.
    pub fn transform_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<CountVector> {
        texts.iter().map(|text| self.transform(text.as_ref())).collect()
    }

    /// Number of features in the vocabulary.
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Looks up the feature index of a token.
    pub fn index_of(&self, token: &str) -> Option<usize> {
        self.vocabulary.get(token).copied()
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_punctuation_and_short_tokens() {
        assert_eq!(tokenize("Win £1000 NOW! a b"), vec!["win", "1000", "now"]);
        assert!(tokenize("").is_empty());
        assert!(tokenize("!! ? .").is_empty());
    }

    #[test]
    fn test_vocabulary_is_lexicographic() {
        let vectorizer = CountVectorizer::fit(&["zebra apple", "mango apple"]);
        assert_eq!(vectorizer.vocabulary_size(), 3);
        assert_eq!(vectorizer.index_of("apple"), Some(0));
        assert_eq!(vectorizer.index_of("mango"), Some(1));
        assert_eq!(vectorizer.index_of("zebra"), Some(2));
    }

    #[test]
    fn test_fit_is_order_independent() {
        let a = CountVectorizer::fit(&["free cash now", "hello friend"]);
        let b = CountVectorizer::fit(&["hello friend", "free cash now"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_transform_counts_known_tokens() {
        let vectorizer = CountVectorizer::fit(&["free cash", "hello friend"]);
        let vector = vectorizer.transform("FREE free cash, unknown words");
        let free = vectorizer.index_of("free").unwrap();
        let cash = vectorizer.index_of("cash").unwrap();
        assert_eq!(vector.get(free), 2);
        assert_eq!(vector.get(cash), 1);
        assert_eq!(vector.nnz(), 2);
        assert_eq!(vector.total(), 3);
    }

    #[test]
    fn test_unknown_tokens_give_zero_vector() {
        let vectorizer = CountVectorizer::fit(&["hello friend"]);
        assert!(vectorizer.transform("completely unseen words").is_zero());
        assert!(vectorizer.transform("").is_zero());
    }

    #[test]
    fn test_transform_batch_preserves_order() {
        let vectorizer = CountVectorizer::fit(&["alpha beta gamma"]);
        let vectors = vectorizer.transform_batch(&["gamma", "alpha alpha", ""]);
        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors[0].get(vectorizer.index_of("gamma").unwrap()), 1);
        assert_eq!(vectors[1].get(vectorizer.index_of("alpha").unwrap()), 2);
        assert!(vectors[2].is_zero());
    }
}
