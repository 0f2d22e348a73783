//! Answer generation backends.
//!
//! A [`Generator`] turns a rendered prompt into answer text. Implementations
//! exist for the OpenAI chat completions API and a local Ollama instance;
//! which one runs is decided once, from configuration, when the pipeline is
//! assembled.

mod ollama;
mod openai;

pub use ollama::OllamaGenerator;
pub use openai::OpenAIGenerator;

use crate::config::{GenerationProvider, GenerationSettings};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for text generation backends.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate an answer from a system prompt and a user prompt.
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// Create a generator from settings.
pub fn create_generator(settings: &GenerationSettings) -> Arc<dyn Generator> {
    match settings.provider {
        GenerationProvider::OpenAI => Arc::new(OpenAIGenerator::with_config(
            &settings.model,
            settings.max_tokens,
            settings.temperature,
        )),
        GenerationProvider::Ollama => Arc::new(OllamaGenerator::with_config(
            &settings.base_url,
            &settings.model,
            settings.max_tokens,
            settings.temperature,
        )),
    }
}
