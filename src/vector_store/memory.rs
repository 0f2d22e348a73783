//! In-memory vector index implementation.
//!
//! Keeps records in insertion order, which is what gives equal-similarity
//! search hits their deterministic tie-break. Useful for testing and as a
//! throwaway backend for one-off sessions.

use super::{cosine_similarity, IndexedSource, SearchHit, TranscriptRecord, VectorIndex};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory vector index.
pub struct MemoryIndex {
    records: RwLock<Vec<TranscriptRecord>>,
}

impl MemoryIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn append(&self, records: &[TranscriptRecord]) -> Result<usize> {
        let mut store = self.records.write().unwrap();
        store.extend_from_slice(records);
        Ok(records.len())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        let store = self.records.read().unwrap();

        let mut hits: Vec<SearchHit> = store
            .iter()
            .map(|record| SearchHit {
                similarity: cosine_similarity(query_embedding, &record.embedding),
                record: record.clone(),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);

        Ok(hits)
    }

    async fn has_source(&self, source_id: &str) -> Result<bool> {
        let store = self.records.read().unwrap();
        Ok(store.iter().any(|r| r.source_id == source_id))
    }

    async fn list_sources(&self) -> Result<Vec<IndexedSource>> {
        let store = self.records.read().unwrap();

        let mut order: Vec<String> = Vec::new();
        let mut summaries: HashMap<String, IndexedSource> = HashMap::new();

        for record in store.iter() {
            let entry = summaries
                .entry(record.source_id.clone())
                .or_insert_with(|| {
                    order.push(record.source_id.clone());
                    IndexedSource {
                        source_id: record.source_id.clone(),
                        record_count: 0,
                        duration_seconds: 0.0,
                        indexed_at: record.indexed_at,
                    }
                });

            entry.record_count += 1;
            if record.end > entry.duration_seconds {
                entry.duration_seconds = record.end;
            }
            if record.indexed_at > entry.indexed_at {
                entry.indexed_at = record.indexed_at;
            }
        }

        let mut sources: Vec<IndexedSource> = order
            .into_iter()
            .filter_map(|id| summaries.remove(&id))
            .collect();
        sources.sort_by(|a, b| b.indexed_at.cmp(&a.indexed_at));

        Ok(sources)
    }

    async fn delete_source(&self, source_id: &str) -> Result<usize> {
        let mut store = self.records.write().unwrap();
        let initial_len = store.len();
        store.retain(|r| r.source_id != source_id);
        Ok(initial_len - store.len())
    }

    async fn record_count(&self) -> Result<usize> {
        let store = self.records.read().unwrap();
        Ok(store.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(source_id: &str, text: &str, start: f64, position: u32, embedding: Vec<f32>) -> TranscriptRecord {
        TranscriptRecord::new(
            source_id.to_string(),
            text.to_string(),
            start,
            start + 30.0,
            position,
            embedding,
        )
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let index = MemoryIndex::new();

        index
            .append(&[
                record("video1", "off topic", 0.0, 0, vec![0.0, 1.0, 0.0]),
                record("video1", "on topic", 30.0, 1, vec![1.0, 0.0, 0.0]),
            ])
            .await
            .unwrap();

        let hits = index.search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].record.text, "on topic");
        assert!(hits[0].similarity > hits[1].similarity);
    }

    #[tokio::test]
    async fn test_equal_similarity_keeps_insertion_order() {
        let index = MemoryIndex::new();

        index
            .append(&[
                record("video1", "first", 0.0, 0, vec![1.0, 0.0]),
                record("video1", "second", 30.0, 1, vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let hits = index.search(&[1.0, 0.0], 10).await.unwrap();
        assert_eq!(hits[0].record.text, "first");
        assert_eq!(hits[1].record.text, "second");
    }

    #[tokio::test]
    async fn test_search_on_empty_index() {
        let index = MemoryIndex::new();
        let hits = index.search(&[1.0, 0.0], 5).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_source_summary_and_delete() {
        let index = MemoryIndex::new();

        index
            .append(&[
                record("video1", "hello", 0.0, 0, vec![1.0]),
                record("video1", "world", 30.0, 1, vec![1.0]),
                record("video2", "other", 0.0, 0, vec![1.0]),
            ])
            .await
            .unwrap();

        assert_eq!(index.record_count().await.unwrap(), 3);
        assert!(index.has_source("video2").await.unwrap());

        let sources = index.list_sources().await.unwrap();
        assert_eq!(sources.len(), 2);
        let video1 = sources.iter().find(|s| s.source_id == "video1").unwrap();
        assert_eq!(video1.record_count, 2);
        assert!((video1.duration_seconds - 60.0).abs() < 0.001);

        let deleted = index.delete_source("video1").await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(index.record_count().await.unwrap(), 1);
        assert!(!index.has_source("video1").await.unwrap());
    }
}
