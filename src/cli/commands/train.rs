//! Train command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::create_embedder;
use crate::rerank::{RerankTrainer, DEFAULT_EPOCHS, DEFAULT_LEARNING_RATE};
use anyhow::Result;
use std::path::Path;

/// Run the train command.
pub async fn run_train(
    data: &str,
    out: &str,
    epochs: Option<usize>,
    learning_rate: Option<f32>,
    settings: Settings,
) -> Result<()> {
    let records = RerankTrainer::load_dataset(Path::new(data))?;
    let fragments: usize = records.iter().map(|r| r.fragments.len()).sum();
    Output::info(&format!(
        "Loaded {} queries with {} labeled fragments.",
        records.len(),
        fragments
    ));

    let embedder = create_embedder(&settings.embedding);
    let trainer = RerankTrainer::new(embedder, &settings.language);

    let spinner = Output::spinner("Embedding fragments and fitting the model...");
    let result = trainer
        .train(
            &records,
            epochs.unwrap_or(DEFAULT_EPOCHS),
            learning_rate.unwrap_or(DEFAULT_LEARNING_RATE),
        )
        .await;
    spinner.finish_and_clear();

    let model = match result {
        Ok(model) => model,
        Err(e) => {
            Output::error(&format!("Training failed: {}", e));
            return Err(e.into());
        }
    };

    model.save(Path::new(out))?;
    Output::success(&format!("Model saved to {}.", out));
    Output::info("Enable it with reranker.use_reranker = true in the config.");

    Ok(())
}
