//! Hearsay CLI entry point.

use anyhow::Result;
use clap::Parser;
use hearsay::cli::{commands, Cli, Commands};
use hearsay::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("hearsay={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Ensure the data directory exists
    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match &cli.command {
        Commands::Ask { video, question } => {
            commands::run_ask(video, question, settings).await?;
        }

        Commands::Ingest { video } => {
            commands::run_ingest(video, settings).await?;
        }

        Commands::Search { query, top_k } => {
            commands::run_search(query, *top_k, settings).await?;
        }

        Commands::List => {
            commands::run_list(settings).await?;
        }

        Commands::Train {
            data,
            out,
            epochs,
            learning_rate,
        } => {
            commands::run_train(data, out, *epochs, *learning_rate, settings).await?;
        }

        Commands::Dataset {
            queries,
            out,
            top_k,
        } => {
            commands::run_dataset(queries, out, *top_k, settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host, *port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}
