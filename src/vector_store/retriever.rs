//! Retrieval layer binding an embedder to a vector index.

use super::{SearchHit, TranscriptRecord, VectorIndex};
use crate::chunking::Chunk;
use crate::embedding::Embedder;
use crate::error::Result;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Embeds chunks into the index and answers nearest-passage queries.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Embed a source's chunks (one batched upstream call) and persist them.
    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    pub async fn ingest(&self, chunks: &[Chunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let records: Vec<TranscriptRecord> = chunks
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(position, (chunk, embedding))| {
                TranscriptRecord::new(
                    chunk.source_id.clone(),
                    chunk.text.clone(),
                    chunk.start,
                    chunk.end,
                    position as u32,
                    embedding,
                )
            })
            .collect();

        let stored = self.index.append(&records).await?;
        debug!("Ingested {} chunks", stored);
        Ok(stored)
    }

    /// Embed the query and return the `k` nearest stored passages,
    /// descending by similarity. Returns an empty list, not an error,
    /// when nothing is indexed.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        let query_embedding = self.embedder.embed(query).await?;
        self.index.search(&query_embedding, k).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::MemoryIndex;
    use async_trait::async_trait;

    /// Maps texts onto axis-aligned vectors so similarities are exact.
    struct KeyedEmbedder;

    #[async_trait]
    impl Embedder for KeyedEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(if text.contains("rocket") {
                vec![1.0, 0.0, 0.0]
            } else if text.contains("bread") {
                vec![0.0, 1.0, 0.0]
            } else {
                vec![0.0, 0.0, 1.0]
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
            3
        }
    }

    fn retriever() -> Retriever {
        Retriever::new(Arc::new(KeyedEmbedder), Arc::new(MemoryIndex::new()))
    }

    #[tokio::test]
    async fn test_own_text_is_top_hit() {
        let retriever = retriever();

        let chunks = vec![
            Chunk::new("the rocket launch was delayed", 0.0, 60.0, "video1"),
            Chunk::new("baking bread at home", 60.0, 120.0, "video1"),
        ];
        assert_eq!(retriever.ingest(&chunks).await.unwrap(), 2);

        let hits = retriever
            .search("the rocket launch was delayed", 5)
            .await
            .unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].record.text, "the rocket launch was delayed");
        assert!((hits[0].similarity - 1.0).abs() < 0.001);
        assert!(hits[1].similarity.abs() < 0.001);
    }

    #[tokio::test]
    async fn test_search_caps_results_at_k() {
        let retriever = retriever();

        let chunks: Vec<Chunk> = (0..4)
            .map(|i| {
                Chunk::new(
                    format!("rocket passage {}", i),
                    i as f64 * 60.0,
                    (i + 1) as f64 * 60.0,
                    "video1",
                )
            })
            .collect();
        retriever.ingest(&chunks).await.unwrap();

        // All four tie at similarity 1.0; the first two inserted win.
        let hits = retriever.search("rocket", 2).await.unwrap();
        let texts: Vec<&str> = hits.iter().map(|h| h.record.text.as_str()).collect();
        assert_eq!(texts, vec!["rocket passage 0", "rocket passage 1"]);
    }

    #[tokio::test]
    async fn test_ingest_empty_chunk_list() {
        let retriever = retriever();
        assert_eq!(retriever.ingest(&[]).await.unwrap(), 0);

        let hits = retriever.search("anything", 5).await.unwrap();
        assert!(hits.is_empty());
    }
}
