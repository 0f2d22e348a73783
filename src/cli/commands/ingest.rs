//! Ingest command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ingest command.
pub async fn run_ingest(video: &str, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Fetching and indexing captions...");
    let result = orchestrator.ingest(video).await;
    spinner.finish_and_clear();

    match result {
        Ok(report) if report.skipped => {
            Output::info(&format!("{} is already indexed.", report.source_id));
        }
        Ok(report) => {
            Output::success(&format!(
                "Indexed {} passages from {}.",
                report.chunks_ingested, report.source_id
            ));
        }
        Err(e) => {
            Output::error(&format!("Ingestion failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
