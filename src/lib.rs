//! Hearsay - Video Q&A from spoken content
//!
//! Ask questions about what is said in a video. Hearsay fetches the
//! video's captions, indexes them in a local vector store, and answers
//! questions with an LLM grounded in the retrieved passages.
//!
//! # Overview
//!
//! Hearsay allows you to:
//! - Fetch and index transcripts for videos by URL or id
//! - Ask questions answered from what was actually said
//! - Search indexed transcripts semantically
//! - Train an optional reranking model to sharpen retrieval
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `captions` - Caption fetching and reference parsing
//! - `chunking` - Transcript windowing policies
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector index abstraction and retrieval
//! - `rerank` - Learned candidate reranking
//! - `generation` - LLM answer generation
//! - `qa` - Answer pipeline and query outcomes
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use hearsay::config::Settings;
//! use hearsay::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let outcome = orchestrator
//!         .answer("dQw4w9WgXcQ", "What is the song about?")
//!         .await;
//!     println!("{}", outcome.user_message());
//!
//!     Ok(())
//! }
//! ```

pub mod captions;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod openai;
pub mod orchestrator;
pub mod qa;
pub mod rerank;
pub mod vector_store;

pub use error::{HearsayError, Result};
