//! Feature extraction for the learned reranker.
//!
//! Each candidate is described by a fixed six-dimensional vector; the
//! trained model depends on this exact order:
//!
//! 1. embedding cosine similarity to the query
//! 2. lexical overlap with the query's non-stopword tokens
//! 3. candidate stopword ratio
//! 4. query/candidate length-difference ratio
//! 5. normalized rank position in the candidate list
//! 6. query-local tf-idf cosine similarity

use super::stopwords::StopwordSet;
use super::tfidf::TfidfModel;
use crate::vector_store::cosine_similarity;
use std::collections::HashSet;

/// Number of features per candidate.
pub const FEATURE_COUNT: usize = 6;

/// Case-folded whitespace tokenization shared by the lexical features.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Fraction of unique non-stopword query tokens present in the candidate.
fn lexical_overlap(query_tokens: &[String], candidate_tokens: &[String], stopwords: &StopwordSet) -> f32 {
    let query_set: HashSet<&str> = query_tokens
        .iter()
        .map(String::as_str)
        .filter(|t| !stopwords.contains(t))
        .collect();

    if query_set.is_empty() {
        return 0.0;
    }

    let candidate_set: HashSet<&str> = candidate_tokens.iter().map(String::as_str).collect();
    let shared = query_set.iter().filter(|t| candidate_set.contains(**t)).count();

    shared as f32 / query_set.len() as f32
}

/// Fraction of candidate tokens that are stopwords.
fn stopword_ratio(tokens: &[String], stopwords: &StopwordSet) -> f32 {
    if tokens.is_empty() {
        return 0.0;
    }

    let stopword_count = tokens.iter().filter(|t| stopwords.contains(t)).count();
    stopword_count as f32 / tokens.len() as f32
}

/// Relative character-length difference between query and candidate.
fn length_diff_ratio(query_text: &str, candidate_text: &str) -> f32 {
    let len_q = query_text.chars().count();
    let len_c = candidate_text.chars().count();

    if len_q + len_c == 0 {
        return 0.0;
    }

    (len_c as f32 - len_q as f32).abs() / (len_q + len_c) as f32
}

/// Normalized rank position of a candidate in the list.
fn position_feature(index: usize, total: usize) -> f32 {
    if total <= 1 {
        return 0.0;
    }

    index as f32 / (total - 1) as f32
}

/// Builds feature vectors for all candidates of one query.
pub struct FeatureExtractor {
    stopwords: StopwordSet,
}

impl FeatureExtractor {
    pub fn new(language: &str) -> Self {
        Self {
            stopwords: StopwordSet::for_language(language),
        }
    }

    /// Compute feature vectors for every candidate, in candidate order.
    ///
    /// `candidate_embeddings` must parallel `candidate_texts`. The tf-idf
    /// vocabulary is fit from the query plus this candidate set; a
    /// degenerate fit leaves feature 6 at 0.0.
    pub fn build(
        &self,
        query_text: &str,
        query_embedding: &[f32],
        candidate_texts: &[String],
        candidate_embeddings: &[Vec<f32>],
    ) -> Vec<[f32; FEATURE_COUNT]> {
        let query_tokens = tokenize(query_text);
        let normalized_query = query_tokens.join(" ");

        let mut fit_texts: Vec<&str> = Vec::with_capacity(candidate_texts.len() + 1);
        fit_texts.push(normalized_query.as_str());
        fit_texts.extend(candidate_texts.iter().map(String::as_str));
        let tfidf = TfidfModel::fit(&fit_texts);

        let total = candidate_texts.len();
        candidate_texts
            .iter()
            .zip(candidate_embeddings)
            .enumerate()
            .map(|(index, (text, embedding))| {
                let tokens = tokenize(text);
                let tfidf_similarity = tfidf
                    .as_ref()
                    .map(|model| model.similarity(&normalized_query, text))
                    .unwrap_or(0.0);

                [
                    cosine_similarity(query_embedding, embedding),
                    lexical_overlap(&query_tokens, &tokens, &self.stopwords),
                    stopword_ratio(&tokens, &self.stopwords),
                    length_diff_ratio(&normalized_query, text),
                    position_feature(index, total),
                    tfidf_similarity,
                ]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stopwords() -> StopwordSet {
        StopwordSet::for_language("en")
    }

    fn tokens(text: &str) -> Vec<String> {
        tokenize(text)
    }

    #[test]
    fn test_lexical_overlap_half_shared() {
        // Query tokens {alpha, beta}, candidate tokens {alpha, gamma}.
        let overlap = lexical_overlap(&tokens("alpha beta"), &tokens("alpha gamma"), &stopwords());
        assert!((overlap - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_lexical_overlap_ignores_stopwords() {
        // "the" matches but carries no signal.
        let overlap = lexical_overlap(&tokens("the rocket"), &tokens("the bread"), &stopwords());
        assert_eq!(overlap, 0.0);

        let all_stop = lexical_overlap(&tokens("the of and"), &tokens("anything"), &stopwords());
        assert_eq!(all_stop, 0.0);
    }

    #[test]
    fn test_stopword_ratio() {
        assert!((stopword_ratio(&tokens("the rocket"), &stopwords()) - 0.5).abs() < 0.001);
        assert_eq!(stopword_ratio(&[], &stopwords()), 0.0);
    }

    #[test]
    fn test_length_diff_ratio() {
        // |2 - 4| / (4 + 2)
        assert!((length_diff_ratio("abcd", "ab") - 2.0 / 6.0).abs() < 0.001);
        assert_eq!(length_diff_ratio("", ""), 0.0);
        assert_eq!(length_diff_ratio("same", "same"), 0.0);
    }

    #[test]
    fn test_position_feature() {
        assert_eq!(position_feature(0, 1), 0.0);
        assert_eq!(position_feature(0, 3), 0.0);
        assert!((position_feature(1, 3) - 0.5).abs() < 0.001);
        assert!((position_feature(2, 3) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_build_feature_vectors() {
        let extractor = FeatureExtractor::new("en");

        let candidates = vec!["alpha gamma".to_string(), "delta epsilon".to_string()];
        let embeddings = vec![vec![1.0, 0.0], vec![0.0, 1.0]];

        let rows = extractor.build("alpha beta", &[1.0, 0.0], &candidates, &embeddings);
        assert_eq!(rows.len(), 2);

        let first = rows[0];
        assert!((first[0] - 1.0).abs() < 0.001); // embedding similarity
        assert!((first[1] - 0.5).abs() < 0.001); // lexical overlap
        assert_eq!(first[2], 0.0); // no stopwords
        assert!((first[3] - 1.0 / 21.0).abs() < 0.001); // length difference
        assert_eq!(first[4], 0.0); // first position
        assert!((first[5] - 0.3664).abs() < 0.001); // tf-idf similarity

        let second = rows[1];
        assert!(second[0].abs() < 0.001);
        assert_eq!(second[1], 0.0);
        assert!((second[4] - 1.0).abs() < 0.001);
        assert_eq!(second[5], 0.0); // no shared vocabulary with the query
    }

    #[test]
    fn test_build_with_single_candidate() {
        let extractor = FeatureExtractor::new("en");

        let rows = extractor.build(
            "alpha",
            &[1.0],
            &["alpha beta".to_string()],
            &[vec![1.0]],
        );

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][4], 0.0);
    }

    #[test]
    fn test_build_with_degenerate_texts() {
        let extractor = FeatureExtractor::new("en");

        let rows = extractor.build("", &[0.0], &["   ".to_string()], &[vec![0.0]]);
        assert_eq!(rows.len(), 1);
        // Degenerate tf-idf fit takes the neutral default.
        assert_eq!(rows[0][5], 0.0);
    }
}
