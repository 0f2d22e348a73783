//! Logistic regression scoring model.
//!
//! Small enough to train with plain full-batch gradient descent; the
//! fitted parameters persist as JSON so a model trained on one machine
//! can be shipped to another.

use super::features::FEATURE_COUNT;
use crate::error::{HearsayError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

pub const DEFAULT_EPOCHS: usize = 1000;
pub const DEFAULT_LEARNING_RATE: f32 = 0.1;

/// Binary logistic regression over the fixed feature vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    pub weights: Vec<f32>,
    pub bias: f32,
}

impl LogisticModel {
    /// Create an untrained model with zeroed parameters.
    pub fn new() -> Self {
        Self {
            weights: vec![0.0; FEATURE_COUNT],
            bias: 0.0,
        }
    }

    /// Fit on a feature matrix and binary labels with full-batch gradient
    /// descent on log-loss.
    pub fn train(
        &mut self,
        features: &[[f32; FEATURE_COUNT]],
        labels: &[f32],
        epochs: usize,
        learning_rate: f32,
    ) -> Result<()> {
        if features.is_empty() {
            return Err(HearsayError::Training(
                "training set contains no examples".to_string(),
            ));
        }
        if features.len() != labels.len() {
            return Err(HearsayError::Training(format!(
                "feature rows ({}) and labels ({}) differ in length",
                features.len(),
                labels.len()
            )));
        }

        let m = features.len() as f32;

        for epoch in 0..epochs {
            let mut weight_gradients = [0.0f32; FEATURE_COUNT];
            let mut bias_gradient = 0.0f32;

            for (row, &label) in features.iter().zip(labels) {
                let error = self.predict_one(row) - label;
                for (gradient, &value) in weight_gradients.iter_mut().zip(row) {
                    *gradient += error * value;
                }
                bias_gradient += error;
            }

            for (weight, gradient) in self.weights.iter_mut().zip(&weight_gradients) {
                *weight -= learning_rate * gradient / m;
            }
            self.bias -= learning_rate * bias_gradient / m;

            if epoch % 200 == 0 {
                debug!("Epoch {}: loss = {:.4}", epoch, self.log_loss(features, labels));
            }
        }

        info!(
            "Trained on {} examples: final loss = {:.4}",
            features.len(),
            self.log_loss(features, labels)
        );
        Ok(())
    }

    /// Predicted probability of relevance for one feature row.
    pub fn predict_one(&self, row: &[f32; FEATURE_COUNT]) -> f32 {
        let z: f32 = self
            .weights
            .iter()
            .zip(row)
            .map(|(w, x)| w * x)
            .sum::<f32>()
            + self.bias;
        sigmoid(z)
    }

    /// Predicted probabilities for a feature matrix, row order preserved.
    pub fn predict(&self, rows: &[[f32; FEATURE_COUNT]]) -> Vec<f32> {
        rows.iter().map(|row| self.predict_one(row)).collect()
    }

    fn log_loss(&self, features: &[[f32; FEATURE_COUNT]], labels: &[f32]) -> f32 {
        let epsilon = 1e-7f32;
        let total: f32 = features
            .iter()
            .zip(labels)
            .map(|(row, &label)| {
                let p = self.predict_one(row).clamp(epsilon, 1.0 - epsilon);
                -(label * p.ln() + (1.0 - label) * (1.0 - p).ln())
            })
            .sum();
        total / features.len() as f32
    }

    /// Persist fitted parameters as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;

        info!("Saved rerank model to {:?}", path);
        Ok(())
    }

    /// Restore fitted parameters from JSON. A missing or malformed file is
    /// a configuration error, not a runtime condition to recover from.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            HearsayError::RerankerModel(format!("cannot read model file {:?}: {}", path, e))
        })?;

        let model: Self = serde_json::from_str(&json).map_err(|e| {
            HearsayError::RerankerModel(format!("cannot parse model file {:?}: {}", path, e))
        })?;

        if model.weights.len() != FEATURE_COUNT {
            return Err(HearsayError::RerankerModel(format!(
                "model file {:?} has {} weights, expected {}",
                path,
                model.weights.len(),
                FEATURE_COUNT
            )));
        }

        Ok(model)
    }
}

impl Default for LogisticModel {
    fn default() -> Self {
        Self::new()
    }
}

fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid_bounds() {
        assert!((sigmoid(0.0) - 0.5).abs() < 0.001);
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
    }

    #[test]
    fn test_training_separates_classes() {
        let features: Vec<[f32; FEATURE_COUNT]> = vec![
            [1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ];
        let labels = vec![1.0, 1.0, 0.0, 0.0];

        let mut model = LogisticModel::new();
        model
            .train(&features, &labels, DEFAULT_EPOCHS, DEFAULT_LEARNING_RATE)
            .unwrap();

        let positive = model.predict_one(&[1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let negative = model.predict_one(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);

        assert!(positive > 0.8, "positive class scored {}", positive);
        assert!(negative < 0.2, "negative class scored {}", negative);
    }

    #[test]
    fn test_train_rejects_empty_and_mismatched_input() {
        let mut model = LogisticModel::new();
        assert!(model.train(&[], &[], 10, 0.1).is_err());

        let rows = [[0.0; FEATURE_COUNT]];
        assert!(model.train(&rows, &[1.0, 0.0], 10, 0.1).is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("reranker.json");

        let model = LogisticModel {
            weights: vec![0.5, -0.25, 0.0, 1.5, 0.0, 2.0],
            bias: -0.75,
        };
        model.save(&path).unwrap();

        let restored = LogisticModel::load(&path).unwrap();
        assert_eq!(restored.weights, model.weights);
        assert_eq!(restored.bias, model.bias);
    }

    #[test]
    fn test_load_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");

        let result = LogisticModel::load(&missing);
        assert!(matches!(result, Err(HearsayError::RerankerModel(_))));
    }

    #[test]
    fn test_load_rejects_wrong_feature_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, r#"{"weights": [1.0, 2.0], "bias": 0.0}"#).unwrap();

        assert!(LogisticModel::load(&path).is_err());
    }
}
