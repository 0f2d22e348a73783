//! Prompt templates for answer generation.
//!
//! Templates are selected by working language and can be overridden by
//! placing TOML files in the custom prompts directory
//! (`answer_{lang}.toml` with `system` and `user` fields).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Prompt templates used when turning retrieved context into an answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerPrompts {
    pub system: String,
    pub user: String,
}

impl Default for AnswerPrompts {
    fn default() -> Self {
        Self::english()
    }
}

impl AnswerPrompts {
    /// Built-in templates for the given language, falling back to English.
    pub fn for_language(language: &str) -> Self {
        match language {
            "ru" => Self::russian(),
            _ => Self::english(),
        }
    }

    fn english() -> Self {
        Self {
            system: r#"You are an assistant that answers questions about a video using excerpts from its transcript.

Guidelines:
- Answer using only the provided transcript excerpts
- If the excerpts do not contain the answer, say so clearly
- Be concise and factual; do not speculate beyond what was said"#
                .to_string(),

            user: r#"Transcript excerpts:

{{context}}

Question: {{question}}

Answer the question based only on the excerpts above."#
                .to_string(),
        }
    }

    fn russian() -> Self {
        Self {
            system: r#"Ты помощник, который отвечает на вопросы о видео по фрагментам его субтитров.

Правила:
- Отвечай только по приведённым фрагментам субтитров
- Если в фрагментах нет ответа, прямо скажи об этом
- Отвечай кратко и по делу, не выдумывай того, чего не было сказано"#
                .to_string(),

            user: r#"Фрагменты субтитров:

{{context}}

Вопрос: {{question}}

Ответь на вопрос только по приведённым фрагментам."#
                .to_string(),
        }
    }

    /// Load templates for a language, applying a custom-directory override
    /// when one exists.
    pub fn load(language: &str, custom_dir: Option<&str>) -> crate::error::Result<Self> {
        let mut prompts = Self::for_language(language);

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());
            let answer_path = custom_path.join(format!("answer_{}.toml", language));
            if answer_path.exists() {
                let content = std::fs::read_to_string(&answer_path)?;
                prompts = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }
}
