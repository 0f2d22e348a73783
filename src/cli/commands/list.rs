//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    match orchestrator.list_sources().await {
        Ok(sources) => {
            if sources.is_empty() {
                Output::info("No videos indexed yet. Use 'hearsay ingest <video>' to add one.");
            } else {
                Output::header(&format!("Indexed Videos ({})", sources.len()));
                println!();

                for source in &sources {
                    Output::source_info(
                        &source.source_id,
                        source.record_count,
                        source.duration_seconds,
                    );
                }

                let total_records: u32 = sources.iter().map(|s| s.record_count).sum();
                println!();
                Output::kv("Total videos", &sources.len().to_string());
                Output::kv("Total passages", &total_records.to_string());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list videos: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
