//! Configuration module for Hearsay.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::AnswerPrompts;
pub use settings::{
    CaptionSettings, ChunkingPolicy, ChunkingSettings, EmbeddingProvider, EmbeddingSettings,
    GeneralSettings, GenerationProvider, GenerationSettings, IndexProvider, IndexSettings,
    PromptSettings, RerankerSettings, RetrieverSettings, Settings,
};
