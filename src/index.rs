//! TF-IDF vector space over a loaded corpus.
//!
//! [`TfidfIndex::fit`] builds the vocabulary and smoothed inverse document
//! frequencies once, then stores one unit-length weight vector per
//! document. Nothing is mutable after fitting, so a fitted index can be
//! shared across threads and queried concurrently without locking.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{info, warn};

use crate::{
    corpus::{Corpus, Document},
    tokenizer::tokenize,
};

/// A sparse vector of `(term position, weight)` pairs sorted by position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    /// Build from per-term weights. Zero weights are dropped.
    fn from_weights(weights: HashMap<usize, f64>) -> Self {
        let mut entries: Vec<(usize, f64)> =
            weights.into_iter().filter(|&(_, w)| w != 0.0).collect();
        entries.sort_unstable_by_key(|&(pos, _)| pos);
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Euclidean length.
    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt()
    }

    /// Scale to unit length. A zero vector stays zero.
    fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for (_, w) in &mut self.entries {
                *w /= norm;
            }
        }
    }

    /// Dot product, merging the two sorted entry lists.
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (a_pos, a_w) = self.entries[i];
            let (b_pos, b_w) = other.entries[j];
            match a_pos.cmp(&b_pos) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a_w * b_w;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// Fitted vocabulary, idf weights, and document vectors.
///
/// `document_vectors()[i]` always describes `documents()[i]`.
#[derive(Debug, Clone)]
pub struct TfidfIndex {
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
    documents: Vec<Document>,
    vectors: Vec<SparseVector>,
}

impl TfidfIndex {
    /// Fit the index to a corpus, taking ownership of its documents.
    ///
    /// Returns `None` for an empty corpus. Vocabulary positions follow the
    /// alphabetical order of terms. Term weights are raw counts scaled by
    /// `ln((1 + n) / (1 + df)) + 1`, then each document vector is
    /// normalized to unit length.
    pub fn fit(corpus: Corpus) -> Option<Self> {
        if corpus.is_empty() {
            warn!("no markdown content to index; searches will return nothing");
            return None;
        }

        let documents = corpus.into_documents();
        let tokenized: Vec<Vec<String>> =
            documents.iter().map(|d| tokenize(&d.text)).collect();

        let terms: BTreeSet<&str> = tokenized
            .iter()
            .flat_map(|tokens| tokens.iter().map(String::as_str))
            .collect();
        let vocabulary: BTreeMap<String, usize> = terms
            .into_iter()
            .enumerate()
            .map(|(pos, term)| (term.to_string(), pos))
            .collect();

        let mut doc_freq = vec![0usize; vocabulary.len()];
        for tokens in &tokenized {
            let unique: BTreeSet<usize> =
                tokens.iter().map(|t| vocabulary[t.as_str()]).collect();
            for pos in unique {
                doc_freq[pos] += 1;
            }
        }

        let n = documents.len() as f64;
        let idf: Vec<f64> = doc_freq
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let mut index = Self {
            vocabulary,
            idf,
            documents,
            vectors: Vec::new(),
        };
        let vectors: Vec<SparseVector> = tokenized
            .iter()
            .map(|tokens| index.weigh(tokens.iter().map(String::as_str)))
            .collect();
        index.vectors = vectors;

        if index.vocabulary.is_empty() {
            warn!("corpus contains no indexable terms");
        }
        info!(
            documents = index.documents.len(),
            terms = index.vocabulary.len(),
            "fitted tf-idf index"
        );
        Some(index)
    }

    /// Project free text into the fitted space.
    ///
    /// Terms outside the vocabulary contribute nothing. The result has unit
    /// length, or is empty when no term is known.
    pub fn transform(&self, text: &str) -> SparseVector {
        let tokens = tokenize(text);
        self.weigh(tokens.iter().map(String::as_str))
    }

    /// Cosine similarity of `query` against every document, in corpus
    /// order.
    pub fn similarities(&self, query: &SparseVector) -> Vec<f64> {
        self.vectors.iter().map(|v| v.dot(query)).collect()
    }

    fn weigh<'a>(&self, tokens: impl Iterator<Item = &'a str>) -> SparseVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in tokens {
            if let Some(&pos) = self.vocabulary.get(token) {
                *counts.entry(pos).or_default() += 1.0;
            }
        }
        for (pos, weight) in counts.iter_mut() {
            *weight *= self.idf[*pos];
        }

        let mut vector = SparseVector::from_weights(counts);
        vector.normalize();
        vector
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    /// Idf weight per vocabulary position.
    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document_vectors(&self) -> &[SparseVector] {
        &self.vectors
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
