//! Ask command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::qa::QueryOutcome;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(video: &str, question: &str, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Fetching transcript and thinking...");
    let outcome = orchestrator.answer(video, question).await;
    spinner.finish_and_clear();

    match outcome {
        QueryOutcome::Answer(answer) => {
            println!("\n{}\n", answer);
        }
        QueryOutcome::NothingFound | QueryOutcome::NoTranscript => {
            Output::warning(outcome.user_message());
        }
        QueryOutcome::InvalidReference => {
            Output::error(outcome.user_message());
            anyhow::bail!("could not resolve video reference: {}", video);
        }
        QueryOutcome::Failed => {
            Output::error(outcome.user_message());
            anyhow::bail!("query failed");
        }
    }

    Ok(())
}
