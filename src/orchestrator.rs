//! Query orchestration.
//!
//! The [`Orchestrator`] owns every pipeline component and drives the two
//! top-level flows: making sure a video's transcript is indexed, and
//! answering a question against it. Component failures are mapped onto
//! [`QueryOutcome`] here so callers (CLI, HTTP) never see raw errors from
//! the answer path.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::captions::{parse_video_reference, CaptionFetcher};
use crate::chunking::{create_chunker, Chunker};
use crate::config::{EmbeddingProvider, GenerationProvider, Settings};
use crate::embedding::{create_embedder, Embedder};
use crate::error::{HearsayError, Result};
use crate::generation::{create_generator, Generator};
use crate::qa::{create_pipeline, AnswerPipeline, QueryOutcome};
use crate::vector_store::{create_index, IndexedSource, Retriever, SearchHit, VectorIndex};

/// Outcome of an ingestion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    /// Canonical video id the reference resolved to.
    pub source_id: String,
    /// Number of transcript records written to the index.
    pub chunks_ingested: usize,
    /// True when the source was already indexed and nothing was fetched.
    pub skipped: bool,
}

/// Owns the pipeline components and coordinates ingestion and answering.
pub struct Orchestrator {
    settings: Settings,
    fetcher: CaptionFetcher,
    chunker: Box<dyn Chunker>,
    retriever: Retriever,
    index: Arc<dyn VectorIndex>,
    pipeline: Arc<dyn AnswerPipeline>,
    /// Per-source advisory locks so concurrent requests for the same video
    /// ingest it at most once. In-process only; two separate processes
    /// sharing a database can still race.
    ingest_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Orchestrator {
    /// Create a new orchestrator with all components wired from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        // Pre-flight: OpenAI-backed providers need a key before any call.
        if settings.embedding.provider == EmbeddingProvider::OpenAI
            || settings.generation.provider == GenerationProvider::OpenAI
        {
            crate::openai::check_api_key()?;
        }

        let fetcher = CaptionFetcher::from_settings(&settings);
        let chunker = create_chunker(&settings.chunking)?;
        let embedder = create_embedder(&settings.embedding);
        let index = create_index(&settings)?;
        let generator = create_generator(&settings.generation);

        Self::with_components(settings, fetcher, chunker, embedder, index, generator)
    }

    /// Create an orchestrator from caller-supplied components.
    pub fn with_components(
        settings: Settings,
        fetcher: CaptionFetcher,
        chunker: Box<dyn Chunker>,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        let retriever = Retriever::new(embedder.clone(), index.clone());
        let pipeline = create_pipeline(&settings, retriever.clone(), embedder, generator)?;

        Ok(Self {
            settings,
            fetcher,
            chunker,
            retriever,
            index,
            pipeline,
            ingest_locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Answer a question about a video.
    ///
    /// Every failure mode collapses into a [`QueryOutcome`] variant; this
    /// method never errors.
    #[instrument(skip(self, question))]
    pub async fn answer(&self, reference: &str, question: &str) -> QueryOutcome {
        let Some(source_id) = parse_video_reference(reference) else {
            warn!(reference, "could not resolve video reference");
            return QueryOutcome::InvalidReference;
        };
        debug!(source_id, "reference resolved");

        match self.ensure_ingested(&source_id).await {
            Ok(report) if report.skipped => {
                debug!(source_id, "transcript already indexed");
            }
            Ok(report) => {
                info!(source_id, chunks = report.chunks_ingested, "transcript indexed");
            }
            Err(HearsayError::NoTranscript(_)) | Err(HearsayError::CaptionSource(_)) => {
                warn!(source_id, "no transcript obtainable");
                return QueryOutcome::NoTranscript;
            }
            Err(e) => {
                error!(source_id, error = %e, "ingestion failed");
                return QueryOutcome::Failed;
            }
        }

        match self.pipeline.invoke(question).await {
            Ok(answer) => QueryOutcome::Answer(answer),
            Err(HearsayError::NothingFound) => {
                info!(source_id, "no passages matched the question");
                QueryOutcome::NothingFound
            }
            Err(e) => {
                error!(source_id, error = %e, "answer pipeline failed");
                QueryOutcome::Failed
            }
        }
    }

    /// Resolve a reference and make sure its transcript is indexed.
    pub async fn ingest(&self, reference: &str) -> Result<IngestReport> {
        let source_id = parse_video_reference(reference)
            .ok_or_else(|| HearsayError::InvalidReference(reference.to_string()))?;
        self.ensure_ingested(&source_id).await
    }

    /// Fetch, chunk, and index a video's transcript unless it already is.
    ///
    /// Holds a per-source lock for the duration, so concurrent calls for
    /// the same video serialize and the later one skips.
    #[instrument(skip(self))]
    pub async fn ensure_ingested(&self, source_id: &str) -> Result<IngestReport> {
        let lock = self.source_lock(source_id).await;
        let _guard = lock.lock().await;

        if self.index.has_source(source_id).await? {
            debug!(source_id, "already indexed, skipping");
            return Ok(IngestReport {
                source_id: source_id.to_string(),
                chunks_ingested: 0,
                skipped: true,
            });
        }

        let segments = self
            .fetcher
            .fetch(source_id, &self.settings.language)
            .await?;
        let chunks = self.chunker.chunk(source_id, &segments);
        if chunks.is_empty() {
            return Err(HearsayError::NoTranscript(format!(
                "captions for video {} contained no usable text",
                source_id
            )));
        }

        let ingested = self.retriever.ingest(&chunks).await?;
        info!(source_id, chunks = ingested, "ingestion complete");

        Ok(IngestReport {
            source_id: source_id.to_string(),
            chunks_ingested: ingested,
            skipped: false,
        })
    }

    /// Semantic search over everything indexed.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        self.retriever.search(query, limit).await
    }

    /// All indexed sources, most recently indexed first.
    pub async fn list_sources(&self) -> Result<Vec<IndexedSource>> {
        self.index.list_sources().await
    }

    async fn source_lock(&self, source_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.ingest_locks.lock().await;
        locks
            .entry(source_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
