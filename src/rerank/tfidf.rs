//! Query-local TF-IDF similarity.
//!
//! The vocabulary is fit from the query plus the current candidate set
//! only, never from a corpus-wide model, so scoring needs no persistent
//! state beyond the candidate list in hand.

use super::features::tokenize;
use crate::vector_store::cosine_similarity;
use std::collections::{HashMap, HashSet};

/// TF-IDF model over a small, per-query document set.
pub struct TfidfModel {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
}

impl TfidfModel {
    /// Fit vocabulary and inverse document frequencies over `texts`.
    ///
    /// Returns `None` when no tokens survive, leaving the caller to fall
    /// back to a neutral similarity.
    pub fn fit(texts: &[&str]) -> Option<Self> {
        let n = texts.len();
        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut document_frequency: Vec<u32> = Vec::new();

        for text in texts {
            let mut seen: HashSet<usize> = HashSet::new();

            for token in tokenize(text) {
                let next_index = vocabulary.len();
                let index = *vocabulary.entry(token).or_insert(next_index);

                if index == document_frequency.len() {
                    document_frequency.push(0);
                }
                if seen.insert(index) {
                    document_frequency[index] += 1;
                }
            }
        }

        if vocabulary.is_empty() {
            return None;
        }

        // Smooth idf: ln((1 + n) / (1 + df)) + 1
        let idf: Vec<f32> = document_frequency
            .iter()
            .map(|&df| ((1.0 + n as f32) / (1.0 + df as f32)).ln() + 1.0)
            .collect();

        Some(Self { vocabulary, idf })
    }

    /// Map a text onto an L2-normalized tf-idf vector over the fitted
    /// vocabulary. Out-of-vocabulary tokens are ignored.
    pub fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.idf.len()];

        for token in tokenize(text) {
            if let Some(&index) = self.vocabulary.get(&token) {
                vector[index] += 1.0;
            }
        }

        for (value, idf) in vector.iter_mut().zip(&self.idf) {
            *value *= idf;
        }

        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in vector.iter_mut() {
                *value /= norm;
            }
        }

        vector
    }

    /// Cosine similarity of two texts in the fitted tf-idf space.
    pub fn similarity(&self, a: &str, b: &str) -> f32 {
        cosine_similarity(&self.vectorize(a), &self.vectorize(b))
    }
}
