//! Answer pipeline strategies.
//!
//! The pipeline variant is selected once, at construction, from
//! configuration; per-query code never branches on whether reranking is
//! enabled.

use crate::config::{AnswerPrompts, Settings};
use crate::embedding::Embedder;
use crate::error::{HearsayError, Result};
use crate::generation::Generator;
use crate::rerank::Reranker;
use crate::vector_store::Retriever;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Turns a free-text question into generated answer text.
#[async_trait]
pub trait AnswerPipeline: Send + Sync {
    /// Run the full retrieve-assemble-generate chain for one question.
    ///
    /// Returns [`HearsayError::NothingFound`] when retrieval yields no
    /// candidates; any other error is an internal failure.
    async fn invoke(&self, query: &str) -> Result<String>;
}

/// Build the configured pipeline variant.
///
/// With `reranker.use_reranker` set this loads the trained model up front;
/// a missing model file fails here, not on the first query.
pub fn create_pipeline(
    settings: &Settings,
    retriever: Retriever,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
) -> Result<Arc<dyn AnswerPipeline>> {
    let prompts = AnswerPrompts::load(&settings.language, settings.prompts.custom_dir.as_deref())?;

    if settings.reranker.use_reranker {
        let reranker = Reranker::new(
            &settings.reranker_model_path(),
            &settings.language,
            settings.reranker.min_candidate_chars as usize,
            embedder,
        )?;

        Ok(Arc::new(RerankedPipeline {
            retriever,
            reranker,
            generator,
            prompts,
            retriever_top_k: settings.retriever.top_k as usize,
            rerank_top_k: settings.reranker.top_k as usize,
        }))
    } else {
        Ok(Arc::new(DirectPipeline {
            retriever,
            generator,
            prompts,
            top_k: settings.retriever.top_k as usize,
        }))
    }
}

/// Retrieve, take the top candidates as scored by the index, generate.
pub struct DirectPipeline {
    retriever: Retriever,
    generator: Arc<dyn Generator>,
    prompts: AnswerPrompts,
    top_k: usize,
}

#[async_trait]
impl AnswerPipeline for DirectPipeline {
    #[instrument(skip(self), fields(query = %query))]
    async fn invoke(&self, query: &str) -> Result<String> {
        let texts = retrieve_candidate_texts(&self.retriever, query, self.top_k).await?;
        debug!("Answering from {} passages", texts.len());

        generate_answer(self.generator.as_ref(), &self.prompts, query, &texts).await
    }
}

/// Retrieve, rescore with the trained reranker, take its top candidates,
/// generate.
pub struct RerankedPipeline {
    retriever: Retriever,
    reranker: Reranker,
    generator: Arc<dyn Generator>,
    prompts: AnswerPrompts,
    retriever_top_k: usize,
    rerank_top_k: usize,
}

#[async_trait]
impl AnswerPipeline for RerankedPipeline {
    #[instrument(skip(self), fields(query = %query))]
    async fn invoke(&self, query: &str) -> Result<String> {
        let texts =
            retrieve_candidate_texts(&self.retriever, query, self.retriever_top_k).await?;

        let ranked = self.reranker.rerank(query, &texts).await?;
        let selected: Vec<String> = ranked
            .into_iter()
            .take(self.rerank_top_k)
            .map(|r| r.text)
            .collect();
        debug!("Answering from {} reranked passages", selected.len());

        generate_answer(self.generator.as_ref(), &self.prompts, query, &selected).await
    }
}

/// Run retrieval, absorbing storage failures into an empty candidate set.
/// An empty set surfaces as [`HearsayError::NothingFound`].
async fn retrieve_candidate_texts(
    retriever: &Retriever,
    query: &str,
    top_k: usize,
) -> Result<Vec<String>> {
    let hits = match retriever.search(query, top_k).await {
        Ok(hits) => hits,
        Err(e) => {
            warn!("Retrieval failed, treating as no candidates: {}", e);
            Vec::new()
        }
    };

    if hits.is_empty() {
        return Err(HearsayError::NothingFound);
    }

    Ok(hits.into_iter().map(|hit| hit.record.text).collect())
}

/// Assemble the context block and prompt, and run generation.
async fn generate_answer(
    generator: &dyn Generator,
    prompts: &AnswerPrompts,
    query: &str,
    passages: &[String],
) -> Result<String> {
    let context = passages.join("\n");

    let mut vars = HashMap::new();
    vars.insert("question".to_string(), query.to_string());
    vars.insert("context".to_string(), context);

    let user_prompt = AnswerPrompts::render(&prompts.user, &vars);
    let answer = generator.generate(&prompts.system, &user_prompt).await?;

    Ok(answer.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunk;
    use crate::rerank::LogisticModel;
    use crate::vector_store::MemoryIndex;
    use async_trait::async_trait;

    struct KeyedEmbedder;

    #[async_trait]
    impl Embedder for KeyedEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(if text.contains("rocket") {
                vec![1.0, 0.0]
            } else {
                vec![0.0, 1.0]
            })
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    /// Echoes the rendered user prompt back, padded to prove trimming.
    struct EchoGenerator;

    #[async_trait]
    impl Generator for EchoGenerator {
        async fn generate(&self, _system_prompt: &str, user_prompt: &str) -> Result<String> {
            Ok(format!("  {}  ", user_prompt))
        }
    }

    const ROCKET: &str = "the rocket cleared the tower at four seconds";
    const BREAD: &str = "folding the dough keeps the crumb airy and light";

    async fn seeded_retriever() -> Retriever {
        let retriever = Retriever::new(Arc::new(KeyedEmbedder), Arc::new(MemoryIndex::new()));
        let chunks = vec![
            Chunk::new(ROCKET, 0.0, 60.0, "video1"),
            Chunk::new(BREAD, 60.0, 120.0, "video1"),
        ];
        retriever.ingest(&chunks).await.unwrap();
        retriever
    }

    #[tokio::test]
    async fn test_direct_pipeline_builds_prompt_from_passages() {
        let pipeline = DirectPipeline {
            retriever: seeded_retriever().await,
            generator: Arc::new(EchoGenerator),
            prompts: AnswerPrompts::for_language("en"),
            top_k: 10,
        };

        let answer = pipeline.invoke("what did the rocket do").await.unwrap();

        assert!(answer.contains("what did the rocket do"));
        assert!(answer.contains(ROCKET));
        // Generator output is trimmed.
        assert!(!answer.starts_with(' '));
        assert!(!answer.ends_with(' '));
    }

    #[tokio::test]
    async fn test_empty_index_surfaces_nothing_found() {
        let pipeline = DirectPipeline {
            retriever: Retriever::new(Arc::new(KeyedEmbedder), Arc::new(MemoryIndex::new())),
            generator: Arc::new(EchoGenerator),
            prompts: AnswerPrompts::for_language("en"),
            top_k: 10,
        };

        let result = pipeline.invoke("anything at all").await;
        assert!(matches!(result, Err(HearsayError::NothingFound)));
    }

    #[tokio::test]
    async fn test_reranked_pipeline_narrows_context() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("reranker.json");
        LogisticModel {
            weights: vec![5.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            bias: 0.0,
        }
        .save(&model_path)
        .unwrap();

        let embedder: Arc<dyn Embedder> = Arc::new(KeyedEmbedder);
        let pipeline = RerankedPipeline {
            retriever: seeded_retriever().await,
            reranker: Reranker::new(&model_path, "en", 30, embedder).unwrap(),
            generator: Arc::new(EchoGenerator),
            prompts: AnswerPrompts::for_language("en"),
            retriever_top_k: 10,
            rerank_top_k: 1,
        };

        let answer = pipeline.invoke("what did the rocket do").await.unwrap();

        // Only the top reranked passage reaches the context.
        assert!(answer.contains(ROCKET));
        assert!(!answer.contains(BREAD));
    }

    #[tokio::test]
    async fn test_create_pipeline_fails_without_model_file() {
        let dir = tempfile::tempdir().unwrap();

        let mut settings = Settings::default();
        settings.reranker.use_reranker = true;
        settings.reranker.model_path = dir
            .path()
            .join("missing.json")
            .to_string_lossy()
            .into_owned();

        let embedder: Arc<dyn Embedder> = Arc::new(KeyedEmbedder);
        let retriever = Retriever::new(embedder.clone(), Arc::new(MemoryIndex::new()));
        let result = create_pipeline(&settings, retriever, embedder, Arc::new(EchoGenerator));

        assert!(matches!(result, Err(HearsayError::RerankerModel(_))));
    }

    #[tokio::test]
    async fn test_create_pipeline_without_reranker() {
        let settings = Settings::default();
        let embedder: Arc<dyn Embedder> = Arc::new(KeyedEmbedder);
        let retriever = Retriever::new(embedder.clone(), Arc::new(MemoryIndex::new()));

        let pipeline =
            create_pipeline(&settings, retriever, embedder, Arc::new(EchoGenerator)).unwrap();

        // The default configuration builds the direct variant; with an
        // empty index it reports nothing found.
        let result = pipeline.invoke("any question").await;
        assert!(matches!(result, Err(HearsayError::NothingFound)));
    }
}
