//! Ollama generation backend for local inference.

use super::Generator;
use crate::error::{HearsayError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Generator backed by a local Ollama instance.
pub struct OllamaGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaGenerator {
    pub fn with_config(base_url: &str, model: &str, max_tokens: u32, temperature: f32) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            max_tokens,
            temperature,
        }
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    #[instrument(skip(self, system_prompt, user_prompt))]
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt: user_prompt,
            system: system_prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        };

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(HearsayError::Generation(format!(
                "Ollama returned HTTP {}: {}",
                status, snippet
            )));
        }

        let payload: GenerateResponse = response.json().await?;
        debug!("Generated {} characters", payload.response.len());

        Ok(payload.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_creation_normalizes_base_url() {
        let generator = OllamaGenerator::with_config("http://localhost:11434/", "llama3.1", 512, 0.2);
        assert_eq!(generator.base_url, "http://localhost:11434");
        assert_eq!(generator.max_tokens, 512);
    }

    #[test]
    fn test_request_serialization() {
        let request = GenerateRequest {
            model: "llama3.1",
            prompt: "What was said about rockets?",
            system: "Answer from the transcript.",
            stream: false,
            options: GenerateOptions {
                temperature: 0.7,
                num_predict: 1024,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 1024);
    }
}
