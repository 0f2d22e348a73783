//! Configuration settings for Hearsay.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
///
/// Built once at startup and passed to every component constructor; nothing
/// reads configuration through globals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Working language (ISO 639-1). Selects the caption track, the
    /// stopword set for reranking features, and the answer prompt.
    pub language: String,
    pub general: GeneralSettings,
    pub captions: CaptionSettings,
    pub embedding: EmbeddingSettings,
    pub generation: GenerationSettings,
    pub chunking: ChunkingSettings,
    pub retriever: RetrieverSettings,
    pub reranker: RerankerSettings,
    pub index: IndexSettings,
    pub prompts: PromptSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            general: GeneralSettings::default(),
            captions: CaptionSettings::default(),
            embedding: EmbeddingSettings::default(),
            generation: GenerationSettings::default(),
            chunking: ChunkingSettings::default(),
            retriever: RetrieverSettings::default(),
            reranker: RerankerSettings::default(),
            index: IndexSettings::default(),
            prompts: PromptSettings::default(),
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.hearsay".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Caption acquisition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionSettings {
    /// Prefer manually authored caption tracks over auto-generated ones.
    pub prefer_manual: bool,
    /// Fall back to downloading subtitles with yt-dlp when the direct
    /// timed-text fetch yields nothing.
    pub ytdlp_fallback: bool,
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            prefer_manual: true,
            ytdlp_fallback: true,
        }
    }
}

/// Embedding provider type.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// OpenAI embeddings API (default).
    #[default]
    OpenAI,
    /// Local Ollama instance.
    Ollama,
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(EmbeddingProvider::OpenAI),
            "ollama" => Ok(EmbeddingProvider::Ollama),
            _ => Err(format!("Unknown embedding provider: {}", s)),
        }
    }
}

impl std::fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProvider::OpenAI => write!(f, "openai"),
            EmbeddingProvider::Ollama => write!(f, "ollama"),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (openai, ollama).
    pub provider: EmbeddingProvider,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions. Fixed per model; every stored vector must
    /// share this dimension.
    pub dimensions: u32,
    /// Base URL for the local provider.
    pub base_url: String,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::OpenAI,
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            base_url: "http://localhost:11434".to_string(),
        }
    }
}

/// Generation provider type.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum GenerationProvider {
    /// OpenAI chat completions API (default).
    #[default]
    OpenAI,
    /// Local Ollama instance.
    Ollama,
}

impl std::str::FromStr for GenerationProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(GenerationProvider::OpenAI),
            "ollama" => Ok(GenerationProvider::Ollama),
            _ => Err(format!("Unknown generation provider: {}", s)),
        }
    }
}

impl std::fmt::Display for GenerationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationProvider::OpenAI => write!(f, "openai"),
            GenerationProvider::Ollama => write!(f, "ollama"),
        }
    }
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Generation provider (openai, ollama).
    pub provider: GenerationProvider,
    /// Model for answer generation.
    pub model: String,
    /// Maximum tokens in a generated answer.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Base URL for the local provider.
    pub base_url: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider: GenerationProvider::OpenAI,
            model: "gpt-4o-mini".to_string(),
            max_tokens: 1024,
            temperature: 0.7,
            base_url: "http://localhost:11434".to_string(),
        }
    }
}

/// Windowing policy for transcript chunking.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ChunkingPolicy {
    /// Fixed-duration windows over segment start times (default).
    #[default]
    Time,
    /// Fixed-size token windows over the concatenated transcript.
    Token,
}

impl std::str::FromStr for ChunkingPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "time" | "temporal" => Ok(ChunkingPolicy::Time),
            "token" | "tokens" => Ok(ChunkingPolicy::Token),
            _ => Err(format!("Unknown chunking policy: {}", s)),
        }
    }
}

impl std::fmt::Display for ChunkingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkingPolicy::Time => write!(f, "time"),
            ChunkingPolicy::Token => write!(f, "token"),
        }
    }
}

/// Transcript chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Windowing policy (time, token).
    pub policy: ChunkingPolicy,
    /// Window duration in seconds (time policy).
    pub block_duration: u32,
    /// Window overlap in seconds (time policy). Must be less than
    /// block_duration.
    pub block_overlap: u32,
    /// Window size in tokens (token policy).
    pub chunk_size_tokens: u32,
    /// Window overlap in tokens (token policy). Must be less than
    /// chunk_size_tokens.
    pub chunk_overlap_tokens: u32,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            policy: ChunkingPolicy::Time,
            block_duration: 60,
            block_overlap: 10,
            chunk_size_tokens: 200,
            chunk_overlap_tokens: 50,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrieverSettings {
    /// Number of candidates fetched from the vector index per query.
    pub top_k: u32,
}

impl Default for RetrieverSettings {
    fn default() -> Self {
        Self { top_k: 10 }
    }
}

/// Reranking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankerSettings {
    /// Rerank retrieved candidates with the trained model. Requires a
    /// trained model file at model_path.
    pub use_reranker: bool,
    /// Number of reranked candidates kept for the answer context.
    pub top_k: u32,
    /// Path to the trained reranker model file.
    pub model_path: String,
    /// Candidates shorter than this many characters are dropped before
    /// scoring.
    pub min_candidate_chars: u32,
}

impl Default for RerankerSettings {
    fn default() -> Self {
        Self {
            use_reranker: false,
            top_k: 5,
            model_path: "~/.hearsay/reranker.json".to_string(),
            min_candidate_chars: 30,
        }
    }
}

/// Vector index provider type.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum IndexProvider {
    /// Embedded SQLite database (default).
    #[default]
    Sqlite,
    /// Process-local in-memory index.
    Memory,
}

impl std::str::FromStr for IndexProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(IndexProvider::Sqlite),
            "memory" => Ok(IndexProvider::Memory),
            _ => Err(format!("Unknown index provider: {}", s)),
        }
    }
}

impl std::fmt::Display for IndexProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexProvider::Sqlite => write!(f, "sqlite"),
            IndexProvider::Memory => write!(f, "memory"),
        }
    }
}

/// Vector index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Index provider (sqlite, memory).
    pub provider: IndexProvider,
    /// Path to the SQLite database (sqlite provider).
    pub sqlite_path: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            provider: IndexProvider::Sqlite,
            sqlite_path: "~/.hearsay/index.db".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory with per-language prompt overrides (answer_{lang}.txt).
    pub custom_dir: Option<String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::HearsayError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hearsay")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.index.sqlite_path)
    }

    /// Get the expanded reranker model path.
    pub fn reranker_model_path(&self) -> PathBuf {
        Self::expand_path(&self.reranker.model_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_file_missing() {
        let missing = PathBuf::from("/nonexistent/hearsay-config.toml");
        let settings = Settings::load_from(Some(&missing)).unwrap();
        assert_eq!(settings.language, "en");
        assert_eq!(settings.chunking.block_duration, 60);
        assert_eq!(settings.chunking.block_overlap, 10);
        assert_eq!(settings.retriever.top_k, 10);
        assert!(!settings.reranker.use_reranker);
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.language = "ru".to_string();
        settings.chunking.policy = ChunkingPolicy::Token;
        settings.reranker.use_reranker = true;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.language, "ru");
        assert_eq!(loaded.chunking.policy, ChunkingPolicy::Token);
        assert!(loaded.reranker.use_reranker);
        assert_eq!(loaded.embedding.model, settings.embedding.model);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "language = \"ru\"\n\n[retriever]\ntop_k = 3\n").unwrap();

        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.language, "ru");
        assert_eq!(settings.retriever.top_k, 3);
        assert_eq!(settings.chunking.block_duration, 60);
    }

    #[test]
    fn test_policy_from_str() {
        use std::str::FromStr;
        assert_eq!(ChunkingPolicy::from_str("time").unwrap(), ChunkingPolicy::Time);
        assert_eq!(ChunkingPolicy::from_str("TOKEN").unwrap(), ChunkingPolicy::Token);
        assert!(ChunkingPolicy::from_str("semantic").is_err());
    }
}
