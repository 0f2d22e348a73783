//! SQLite-based vector index implementation.
//!
//! Similarity is computed in Rust over a full table scan; fine for the
//! few thousand passages a transcript library holds. Larger corpora would
//! want the sqlite-vec extension or a dedicated vector database.

use super::{cosine_similarity, IndexedSource, SearchHit, TranscriptRecord, VectorIndex};
use crate::error::{HearsayError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS records (
        id TEXT PRIMARY KEY,
        source_id TEXT NOT NULL,
        text TEXT NOT NULL,
        start_seconds REAL NOT NULL,
        end_seconds REAL NOT NULL,
        position INTEGER NOT NULL,
        embedding BLOB NOT NULL,
        indexed_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_records_source_id ON records(source_id);
"#;

/// SQLite-backed vector index.
pub struct SqliteIndex {
    conn: Mutex<Connection>,
}

impl SqliteIndex {
    /// Open (or create) an index at the given path.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Opened transcript index at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory index (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| HearsayError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize an embedding to little-endian bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize an embedding from little-endian bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<TranscriptRecord> {
        let id_str: String = row.get(0)?;
        let embedding_bytes: Vec<u8> = row.get(6)?;
        let indexed_at_str: String = row.get(7)?;

        Ok(TranscriptRecord {
            id: uuid::Uuid::parse_str(&id_str).unwrap_or_default(),
            source_id: row.get(1)?,
            text: row.get(2)?,
            start: row.get(3)?,
            end: row.get(4)?,
            position: row.get(5)?,
            embedding: Self::bytes_to_embedding(&embedding_bytes),
            indexed_at: DateTime::parse_from_rfc3339(&indexed_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }

    fn row_to_source(row: &rusqlite::Row<'_>) -> rusqlite::Result<IndexedSource> {
        let indexed_at_str: String = row.get(3)?;
        Ok(IndexedSource {
            source_id: row.get(0)?,
            record_count: row.get(1)?,
            duration_seconds: row.get(2)?,
            indexed_at: DateTime::parse_from_rfc3339(&indexed_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

#[async_trait]
impl VectorIndex for SqliteIndex {
    #[instrument(skip(self, records))]
    async fn append(&self, records: &[TranscriptRecord]) -> Result<usize> {
        let conn = self.lock_conn()?;
        let tx = conn.unchecked_transaction()?;

        for record in records {
            let embedding_bytes = Self::embedding_to_bytes(&record.embedding);

            tx.execute(
                r#"
                INSERT INTO records
                (id, source_id, text, start_seconds, end_seconds, position, embedding, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    record.id.to_string(),
                    record.source_id,
                    record.text,
                    record.start,
                    record.end,
                    record.position,
                    embedding_bytes,
                    record.indexed_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        info!("Appended {} records", records.len());
        Ok(records.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        let conn = self.lock_conn()?;

        // rowid order fixes the tie-break: equal similarities keep
        // insertion order through the stable sort below.
        let mut stmt = conn.prepare(
            r#"
            SELECT id, source_id, text, start_seconds, end_seconds, position, embedding, indexed_at
            FROM records
            ORDER BY rowid
            "#,
        )?;

        let records = stmt.query_map([], Self::row_to_record)?;

        let mut hits: Vec<SearchHit> = records
            .filter_map(|record| record.ok())
            .map(|record| {
                let similarity = cosine_similarity(query_embedding, &record.embedding);
                SearchHit { record, similarity }
            })
            .collect();

        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);

        debug!("Found {} matching records", hits.len());
        Ok(hits)
    }

    async fn has_source(&self, source_id: &str) -> Result<bool> {
        let conn = self.lock_conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records WHERE source_id = ?1",
            params![source_id],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    #[instrument(skip(self))]
    async fn list_sources(&self) -> Result<Vec<IndexedSource>> {
        let conn = self.lock_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT source_id, COUNT(*) as record_count,
                   MAX(end_seconds) as duration, MAX(indexed_at) as indexed_at
            FROM records
            GROUP BY source_id
            ORDER BY indexed_at DESC
            "#,
        )?;

        let sources = stmt.query_map([], Self::row_to_source)?;
        Ok(sources.filter_map(|s| s.ok()).collect())
    }

    #[instrument(skip(self))]
    async fn delete_source(&self, source_id: &str) -> Result<usize> {
        let conn = self.lock_conn()?;

        let deleted = conn.execute(
            "DELETE FROM records WHERE source_id = ?1",
            params![source_id],
        )?;

        info!("Deleted {} records for source {}", deleted, source_id);
        Ok(deleted)
    }

    async fn record_count(&self) -> Result<usize> {
        let conn = self.lock_conn()?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
