//! Offline training for the rerank model.
//!
//! Datasets are JSON: a list of records, each holding one query and the
//! labeled candidate fragments retrieved for it. Features are built per
//! record over that record's own fragment set, so the per-query tf-idf
//! fit matches what the serving path computes.

use super::features::{FeatureExtractor, FEATURE_COUNT};
use super::model::LogisticModel;
use crate::embedding::Embedder;
use crate::error::{HearsayError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// One labeled query with its candidate fragments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingRecord {
    pub query: String,
    #[serde(default)]
    pub source_id: String,
    #[serde(default)]
    pub fragments: Vec<LabeledFragment>,
}

/// A candidate fragment with its relevance label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledFragment {
    pub text: String,
    pub label: u8,
}

/// Builds training features and fits the rerank model.
pub struct RerankTrainer {
    embedder: Arc<dyn Embedder>,
    extractor: FeatureExtractor,
}

impl RerankTrainer {
    pub fn new(embedder: Arc<dyn Embedder>, language: &str) -> Self {
        Self {
            embedder,
            extractor: FeatureExtractor::new(language),
        }
    }

    /// Load a labeled dataset from a JSON file.
    pub fn load_dataset(path: &Path) -> Result<Vec<TrainingRecord>> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            HearsayError::Training(format!("cannot read dataset {:?}: {}", path, e))
        })?;

        let records: Vec<TrainingRecord> = serde_json::from_str(&json).map_err(|e| {
            HearsayError::Training(format!("cannot parse dataset {:?}: {}", path, e))
        })?;

        Ok(records)
    }

    /// Embed every record's query and fragments, and assemble the feature
    /// matrix with its parallel label vector.
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub async fn build_training_set(
        &self,
        records: &[TrainingRecord],
    ) -> Result<(Vec<[f32; FEATURE_COUNT]>, Vec<f32>)> {
        let mut features = Vec::new();
        let mut labels = Vec::new();

        for record in records {
            if record.fragments.is_empty() {
                continue;
            }

            let texts: Vec<String> = record.fragments.iter().map(|f| f.text.clone()).collect();
            let query_embedding = self.embedder.embed(&record.query).await?;
            let fragment_embeddings = self.embedder.embed_batch(&texts).await?;

            let rows = self.extractor.build(
                &record.query,
                &query_embedding,
                &texts,
                &fragment_embeddings,
            );

            for (row, fragment) in rows.into_iter().zip(&record.fragments) {
                if fragment.label > 1 {
                    return Err(HearsayError::Training(format!(
                        "label {} out of range for fragment \"{}\" (expected 0 or 1)",
                        fragment.label,
                        truncate(&fragment.text)
                    )));
                }

                features.push(row);
                labels.push(f32::from(fragment.label));
            }

            debug!(
                "Built {} feature rows for query \"{}\"",
                record.fragments.len(),
                record.query
            );
        }

        Ok((features, labels))
    }

    /// Train a fresh model on the dataset.
    pub async fn train(
        &self,
        records: &[TrainingRecord],
        epochs: usize,
        learning_rate: f32,
    ) -> Result<LogisticModel> {
        let (features, labels) = self.build_training_set(records).await?;

        if features.is_empty() {
            return Err(HearsayError::Training(
                "dataset contains no labeled fragments".to_string(),
            ));
        }

        let positives = labels.iter().filter(|&&l| l > 0.5).count();
        info!(
            "Training on {} fragments ({} relevant)",
            features.len(),
            positives
        );

        let mut model = LogisticModel::new();
        model.train(&features, &labels, epochs, learning_rate)?;
        Ok(model)
    }
}

fn truncate(text: &str) -> String {
    text.chars().take(60).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

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

    fn dataset_json() -> &'static str {
        r#"[
            {
                "query": "what about the rocket",
                "source_id": "video1",
                "fragments": [
                    {"text": "the rocket launch was delayed by weather", "label": 1},
                    {"text": "a segment about sourdough farming methods", "label": 0}
                ]
            },
            {
                "query": "rocket engines explained",
                "fragments": [
                    {"text": "rocket engines burn fuel and oxidizer together", "label": 1},
                    {"text": "the host thanks this week's channel sponsors", "label": 0}
                ]
            }
        ]"#
    }

    #[test]
    fn test_load_dataset_tolerates_missing_source_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.json");
        std::fs::write(&path, dataset_json()).unwrap();

        let records = RerankTrainer::load_dataset(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].source_id, "video1");
        assert_eq!(records[1].source_id, "");
        assert_eq!(records[0].fragments[0].label, 1);
    }

    #[tokio::test]
    async fn test_build_training_set_shape() {
        let records: Vec<TrainingRecord> = serde_json::from_str(dataset_json()).unwrap();
        let trainer = RerankTrainer::new(Arc::new(KeyedEmbedder), "en");

        let (features, labels) = trainer.build_training_set(&records).await.unwrap();
        assert_eq!(features.len(), 4);
        assert_eq!(labels, vec![1.0, 0.0, 1.0, 0.0]);

        // Relevant fragments carry the embedding-similarity signal.
        assert!((features[0][0] - 1.0).abs() < 0.001);
        assert!(features[1][0].abs() < 0.001);
    }

    #[tokio::test]
    async fn test_trained_model_prefers_relevant_fragments() {
        let records: Vec<TrainingRecord> = serde_json::from_str(dataset_json()).unwrap();
        let trainer = RerankTrainer::new(Arc::new(KeyedEmbedder), "en");

        let model = trainer.train(&records, 1000, 0.1).await.unwrap();

        let (features, labels) = trainer.build_training_set(&records).await.unwrap();
        let scores = model.predict(&features);

        for (score, label) in scores.iter().zip(&labels) {
            if *label > 0.5 {
                assert!(*score > 0.5, "relevant fragment scored {}", score);
            } else {
                assert!(*score < 0.5, "irrelevant fragment scored {}", score);
            }
        }
    }

    #[tokio::test]
    async fn test_out_of_range_label_is_rejected() {
        let records = vec![TrainingRecord {
            query: "anything".to_string(),
            source_id: String::new(),
            fragments: vec![LabeledFragment {
                text: "some fragment".to_string(),
                label: 3,
            }],
        }];

        let trainer = RerankTrainer::new(Arc::new(KeyedEmbedder), "en");
        let result = trainer.build_training_set(&records).await;
        assert!(matches!(result, Err(HearsayError::Training(_))));
    }

    #[tokio::test]
    async fn test_records_without_fragments_are_skipped() {
        let records = vec![TrainingRecord {
            query: "lonely query".to_string(),
            source_id: String::new(),
            fragments: Vec::new(),
        }];

        let trainer = RerankTrainer::new(Arc::new(KeyedEmbedder), "en");
        let result = trainer.train(&records, 10, 0.1).await;
        assert!(matches!(result, Err(HearsayError::Training(_))));
    }
}
