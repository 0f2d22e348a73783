//! Search command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, top_k: Option<usize>, settings: Settings) -> Result<()> {
    let limit = top_k.unwrap_or(settings.retriever.top_k as usize);
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Searching...");
    let results = orchestrator.search(query, limit).await;
    spinner.finish_and_clear();

    match results {
        Ok(hits) => {
            if hits.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", hits.len()));

                for hit in &hits {
                    let record = &hit.record;
                    let url = format!(
                        "https://youtu.be/{}?t={}",
                        record.source_id, record.start as u32
                    );
                    Output::search_result(
                        &record.source_id,
                        &record.format_timestamp(),
                        hit.similarity,
                        &record.text,
                        Some(&url),
                    );
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
