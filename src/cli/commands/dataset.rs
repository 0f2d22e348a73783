//! Dataset command implementation.
//!
//! Retrieves candidate fragments for each query in a list and writes them
//! out as an unlabeled training dataset. Every fragment gets label 0; mark
//! the relevant ones with 1 before running `hearsay train`.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rerank::{LabeledFragment, TrainingRecord};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// One entry in the query list file.
#[derive(Debug, Deserialize)]
struct QueryPair {
    query: String,
    video: String,
}

/// Run the dataset command.
pub async fn run_dataset(
    queries: &str,
    out: &str,
    top_k: Option<usize>,
    settings: Settings,
) -> Result<()> {
    let raw = std::fs::read_to_string(queries)
        .with_context(|| format!("failed to read query list {}", queries))?;
    let pairs: Vec<QueryPair> =
        serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", queries))?;
    if pairs.is_empty() {
        Output::warning("Query list is empty; nothing to do.");
        return Ok(());
    }

    let limit = top_k.unwrap_or(settings.retriever.top_k as usize);
    let orchestrator = Orchestrator::new(settings)?;

    let pb = Output::progress_bar(pairs.len() as u64, "Retrieving candidates");
    let mut records = Vec::with_capacity(pairs.len());

    for pair in &pairs {
        let report = match orchestrator.ingest(&pair.video).await {
            Ok(report) => report,
            Err(e) => {
                pb.println(format!("Skipping {}: {}", pair.video, e));
                pb.inc(1);
                continue;
            }
        };

        let hits = match orchestrator.search(&pair.query, limit).await {
            Ok(hits) => hits,
            Err(e) => {
                pb.println(format!("Skipping query '{}': {}", pair.query, e));
                pb.inc(1);
                continue;
            }
        };

        records.push(TrainingRecord {
            query: pair.query.clone(),
            source_id: report.source_id,
            fragments: hits
                .into_iter()
                .map(|hit| LabeledFragment {
                    text: hit.record.text,
                    label: 0,
                })
                .collect(),
        });
        pb.inc(1);
    }

    pb.finish_and_clear();

    if let Some(parent) = Path::new(out).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(out, serde_json::to_string_pretty(&records)?)?;

    Output::success(&format!(
        "Wrote {} of {} queries to {}.",
        records.len(),
        pairs.len(),
        out
    ));
    Output::info("Set label to 1 on the relevant fragments, then run 'hearsay train'.");

    Ok(())
}
