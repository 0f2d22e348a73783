//! Error types for Hearsay.

use thiserror::Error;

/// Library-level error type for Hearsay operations.
#[derive(Error, Debug)]
pub enum HearsayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid video reference: {0}")]
    InvalidReference(String),

    #[error("No transcript available: {0}")]
    NoTranscript(String),

    #[error("Caption source error: {0}")]
    CaptionSource(String),

    #[error("No matching transcript passages found")]
    NothingFound,

    #[error("Reranker model unavailable: {0}")]
    RerankerModel(String),

    #[error("Training failed: {0}")]
    Training(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),
}

/// Result type alias for Hearsay operations.
pub type Result<T> = std::result::Result<T, HearsayError>;
