//! CLI module for Hearsay.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Hearsay - Video Q&A from spoken content
///
/// Ask questions about what is said in a video. Transcripts are fetched,
/// indexed, and searched locally; answers come from a configurable LLM.
#[derive(Parser, Debug)]
#[command(name = "hearsay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask a question about a video
    Ask {
        /// Video URL or 11-character id
        video: String,

        /// The question to ask
        question: String,
    },

    /// Fetch and index a video's transcript without asking anything
    Ingest {
        /// Video URL or 11-character id
        video: String,
    },

    /// Search indexed transcripts
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// List indexed videos
    List,

    /// Train the reranking model from a labeled dataset
    Train {
        /// Path to the labeled dataset (JSON)
        #[arg(long)]
        data: String,

        /// Where to write the trained model
        #[arg(long)]
        out: String,

        /// Training epochs
        #[arg(long)]
        epochs: Option<usize>,

        /// Gradient descent step size
        #[arg(long)]
        learning_rate: Option<f32>,
    },

    /// Build an unlabeled training dataset from a list of queries
    Dataset {
        /// Path to the query list (JSON, objects with "query" and "video")
        #[arg(long)]
        queries: String,

        /// Where to write the dataset
        #[arg(long)]
        out: String,

        /// Candidates to retrieve per query
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Start the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
