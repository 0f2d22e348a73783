//! Vector index abstraction for transcript passages.
//!
//! Provides a trait-based interface for different index backends. Records
//! are append-only: the query path never mutates stored passages.

mod memory;
mod retriever;
mod sqlite;

pub use memory::MemoryIndex;
pub use retriever::Retriever;
pub use sqlite::SqliteIndex;

use crate::config::{IndexProvider, Settings};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// A transcript passage stored in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptRecord {
    /// Unique record ID.
    pub id: Uuid,
    /// Source video this passage belongs to.
    pub source_id: String,
    /// Passage text.
    pub text: String,
    /// Start time in the video (seconds).
    pub start: f64,
    /// End time in the video (seconds).
    pub end: f64,
    /// Order of this passage in the source transcript.
    pub position: u32,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// When this record was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl TranscriptRecord {
    /// Create a new record with a fresh ID.
    pub fn new(
        source_id: String,
        text: String,
        start: f64,
        end: f64,
        position: u32,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_id,
            text,
            start,
            end,
            position,
            embedding,
            indexed_at: Utc::now(),
        }
    }

    /// Format the start time for display.
    pub fn format_timestamp(&self) -> String {
        let total_seconds = self.start as u32;
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let secs = total_seconds % 60;

        if hours > 0 {
            format!("{:02}:{:02}:{:02}", hours, minutes, secs)
        } else {
            format!("{:02}:{:02}", minutes, secs)
        }
    }
}

/// A search hit with its similarity score.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// The matched record.
    pub record: TranscriptRecord,
    /// Cosine similarity to the query (higher is better).
    pub similarity: f32,
}

/// Summary information about an indexed source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedSource {
    /// Source video ID.
    pub source_id: String,
    /// Number of indexed passages.
    pub record_count: u32,
    /// Duration covered by the indexed passages (seconds).
    pub duration_seconds: f64,
    /// When the source was indexed.
    pub indexed_at: DateTime<Utc>,
}

/// Trait for vector index implementations.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Append a batch of records. Returns the number stored.
    async fn append(&self, records: &[TranscriptRecord]) -> Result<usize>;

    /// Find the `limit` nearest records by cosine similarity, descending.
    /// Equal similarities keep insertion order.
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchHit>>;

    /// Check whether any records exist for a source.
    async fn has_source(&self, source_id: &str) -> Result<bool>;

    /// List all indexed sources, most recently indexed first.
    async fn list_sources(&self) -> Result<Vec<IndexedSource>>;

    /// Delete all records for a source. Returns the number removed.
    async fn delete_source(&self, source_id: &str) -> Result<usize>;

    /// Total number of stored records.
    async fn record_count(&self) -> Result<usize>;
}

/// Create a vector index from settings.
pub fn create_index(settings: &Settings) -> Result<Arc<dyn VectorIndex>> {
    match settings.index.provider {
        IndexProvider::Sqlite => Ok(Arc::new(SqliteIndex::new(&settings.sqlite_path())?)),
        IndexProvider::Memory => Ok(Arc::new(MemoryIndex::new())),
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 for mismatched lengths or zero-norm inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_record_timestamp_format() {
        let record = TranscriptRecord::new(
            "dQw4w9WgXcQ".to_string(),
            "never gonna give you up".to_string(),
            125.0,
            130.0,
            2,
            vec![],
        );

        assert_eq!(record.format_timestamp(), "02:05");

        let late = TranscriptRecord::new(
            "dQw4w9WgXcQ".to_string(),
            "later".to_string(),
            3725.0,
            3730.0,
            3,
            vec![],
        );
        assert_eq!(late.format_timestamp(), "01:02:05");
    }
}
