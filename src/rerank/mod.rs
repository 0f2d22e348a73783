//! Learned reranking of retrieved transcript passages.
//!
//! Retrieval alone orders candidates by embedding similarity; the reranker
//! rescores them with a logistic regression over six lexical and semantic
//! features, trained offline on hand-labeled examples.

mod features;
mod model;
mod stopwords;
mod tfidf;
mod trainer;

pub use features::{FeatureExtractor, FEATURE_COUNT};
pub use model::{LogisticModel, DEFAULT_EPOCHS, DEFAULT_LEARNING_RATE};
pub use trainer::{LabeledFragment, RerankTrainer, TrainingRecord};

use crate::embedding::Embedder;
use crate::error::Result;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// A candidate text with its predicted relevance.
#[derive(Debug, Clone)]
pub struct RankedResult {
    pub text: String,
    /// Predicted probability of relevance, in [0, 1].
    pub score: f32,
}

/// Scores retrieved candidates against the query and reorders them.
pub struct Reranker {
    model: LogisticModel,
    extractor: FeatureExtractor,
    embedder: Arc<dyn Embedder>,
    min_candidate_chars: usize,
}

impl Reranker {
    /// Load the trained model and assemble the scorer. A missing or
    /// unreadable model file fails construction; there is no degraded mode.
    pub fn new(
        model_path: &Path,
        language: &str,
        min_candidate_chars: usize,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let model = LogisticModel::load(model_path)?;

        Ok(Self {
            model,
            extractor: FeatureExtractor::new(language),
            embedder,
            min_candidate_chars,
        })
    }

    /// Score the candidates and return them sorted by descending relevance.
    /// Exact score ties keep the candidates' original order.
    #[instrument(skip(self, candidates), fields(candidates = candidates.len()))]
    pub async fn rerank(&self, query: &str, candidates: &[String]) -> Result<Vec<RankedResult>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let filtered = self.filter_candidates(candidates);
        let texts: Vec<String> = if filtered.is_empty() {
            warn!("Every candidate was filtered out; scoring the unfiltered list");
            candidates.to_vec()
        } else {
            filtered
        };

        let (query_embedding, candidate_embeddings) = futures::try_join!(
            self.embedder.embed(query),
            self.embedder.embed_batch(&texts)
        )?;

        let rows = self
            .extractor
            .build(query, &query_embedding, &texts, &candidate_embeddings);
        let scores = self.model.predict(&rows);

        let mut ranked: Vec<RankedResult> = texts
            .into_iter()
            .zip(scores)
            .map(|(text, score)| RankedResult { text, score })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        debug!("Reranked {} candidates", ranked.len());
        Ok(ranked)
    }

    /// Drop candidates too short to answer from, and exact duplicates
    /// (keeping the first occurrence).
    fn filter_candidates(&self, candidates: &[String]) -> Vec<String> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut kept = Vec::new();

        for candidate in candidates {
            let text = candidate.trim();
            if text.chars().count() < self.min_candidate_chars {
                continue;
            }
            if seen.insert(text.to_string()) {
                kept.push(text.to_string());
            }
        }

        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::PathBuf;

    struct KeyedEmbedder;

    #[async_trait]
    impl Embedder for KeyedEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(if text.contains("rocket") {
                vec![1.0, 0.0]
            } else {
                vec![0.0, 1.0]
            })
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    /// Persist a model whose score depends only on embedding similarity.
    fn save_similarity_model(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("reranker.json");
        let model = LogisticModel {
            weights: vec![5.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            bias: 0.0,
        };
        model.save(&path).unwrap();
        path
    }

    fn save_flat_model(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("flat.json");
        LogisticModel::new().save(&path).unwrap();
        path
    }

    fn reranker(model_path: &Path) -> Reranker {
        Reranker::new(model_path, "en", 30, Arc::new(KeyedEmbedder)).unwrap()
    }

    const ROCKET: &str = "the rocket cleared the tower at four seconds";
    const BREAD: &str = "folding the dough keeps the crumb airy and light";

    #[tokio::test]
    async fn test_relevant_candidate_wins_regardless_of_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let reranker = reranker(&save_similarity_model(&dir));

        for candidates in [
            vec![BREAD.to_string(), ROCKET.to_string()],
            vec![ROCKET.to_string(), BREAD.to_string()],
        ] {
            let ranked = reranker.rerank("rocket launch", &candidates).await.unwrap();
            assert_eq!(ranked.len(), 2);
            assert_eq!(ranked[0].text, ROCKET);
            assert!(ranked[0].score > ranked[1].score);
        }
    }

    #[tokio::test]
    async fn test_output_is_permutation_of_input() {
        let dir = tempfile::tempdir().unwrap();
        let reranker = reranker(&save_similarity_model(&dir));

        let candidates = vec![ROCKET.to_string(), BREAD.to_string()];
        let ranked = reranker.rerank("rocket launch", &candidates).await.unwrap();

        let mut output: Vec<&str> = ranked.iter().map(|r| r.text.as_str()).collect();
        output.sort_unstable();
        let mut input: Vec<&str> = candidates.iter().map(String::as_str).collect();
        input.sort_unstable();
        assert_eq!(output, input);
    }

    #[tokio::test]
    async fn test_empty_candidate_list() {
        let dir = tempfile::tempdir().unwrap();
        let reranker = reranker(&save_similarity_model(&dir));

        let ranked = reranker.rerank("anything", &[]).await.unwrap();
        assert!(ranked.is_empty());
    }

    #[tokio::test]
    async fn test_ties_keep_original_order() {
        let dir = tempfile::tempdir().unwrap();
        // Zero weights score every candidate exactly 0.5.
        let reranker = reranker(&save_flat_model(&dir));

        let candidates = vec![BREAD.to_string(), ROCKET.to_string()];
        let ranked = reranker.rerank("rocket launch", &candidates).await.unwrap();

        assert_eq!(ranked[0].text, BREAD);
        assert_eq!(ranked[1].text, ROCKET);
        assert!((ranked[0].score - 0.5).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_short_and_duplicate_candidates_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let reranker = reranker(&save_similarity_model(&dir));

        let candidates = vec![
            "too short".to_string(),
            ROCKET.to_string(),
            ROCKET.to_string(),
            BREAD.to_string(),
        ];
        let ranked = reranker.rerank("rocket launch", &candidates).await.unwrap();

        let texts: Vec<&str> = ranked.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts.len(), 2);
        assert!(texts.contains(&ROCKET));
        assert!(texts.contains(&BREAD));
    }

    #[tokio::test]
    async fn test_filtering_everything_falls_back_to_unfiltered() {
        let dir = tempfile::tempdir().unwrap();
        let reranker = reranker(&save_similarity_model(&dir));

        let candidates = vec!["tiny".to_string(), "also tiny".to_string()];
        let ranked = reranker.rerank("rocket launch", &candidates).await.unwrap();
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn test_missing_model_fails_construction() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");

        let result = Reranker::new(&missing, "en", 30, Arc::new(KeyedEmbedder));
        assert!(result.is_err());
    }
}
