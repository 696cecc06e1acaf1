//! SQLite-based transcript store implementation.
//!
//! Uses SQLite with cosine similarity computed in Rust for simplicity.
//! For large corpora consider the sqlite-vec extension or a dedicated
//! vector database.

use super::{cosine_similarity, ScoredRecord, TranscriptRecord, TranscriptStore, TranscriptSummary};
use crate::error::{Result, SvarError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS transcripts (
    doc_id TEXT PRIMARY KEY,
    filepath TEXT NOT NULL,
    filename TEXT NOT NULL,
    content TEXT NOT NULL,
    embedding BLOB NOT NULL,
    ingested_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_transcripts_ingested_at ON transcripts(ingested_at);
"#;

/// SQLite-based transcript store.
pub struct SqliteTranscriptStore {
    conn: Mutex<Connection>,
}

impl SqliteTranscriptStore {
    /// Create a new SQLite transcript store.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite transcript store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite transcript store (useful for testing).
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
            .map_err(|e| SvarError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
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
        let embedding_bytes: Vec<u8> = row.get(4)?;
        let ingested_at_str: String = row.get(5)?;

        Ok(TranscriptRecord {
            doc_id: row.get(0)?,
            filepath: row.get(1)?,
            filename: row.get(2)?,
            content: row.get(3)?,
            embedding: Self::bytes_to_embedding(&embedding_bytes),
            ingested_at: DateTime::parse_from_rfc3339(&ingested_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

#[async_trait]
impl TranscriptStore for SqliteTranscriptStore {
    #[instrument(skip(self, record), fields(doc_id = %record.doc_id))]
    async fn upsert(&self, record: &TranscriptRecord) -> Result<()> {
        let conn = self.lock_conn()?;

        let embedding_bytes = Self::embedding_to_bytes(&record.embedding);

        conn.execute(
            r#"
            INSERT OR REPLACE INTO transcripts
            (doc_id, filepath, filename, content, embedding, ingested_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.doc_id,
                record.filepath,
                record.filename,
                record.content,
                embedding_bytes,
                record.ingested_at.to_rfc3339(),
            ],
        )?;

        debug!("Upserted transcript {}", record.doc_id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_by_doc_id(&self, doc_id: &str) -> Result<usize> {
        let conn = self.lock_conn()?;

        let deleted = conn.execute(
            "DELETE FROM transcripts WHERE doc_id = ?1",
            params![doc_id],
        )?;

        debug!("Deleted {} rows for doc {}", deleted, doc_id);
        Ok(deleted)
    }

    #[instrument(skip(self, query_embedding))]
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<ScoredRecord>> {
        let conn = self.lock_conn()?;

        let mut stmt = conn.prepare(
            "SELECT doc_id, filepath, filename, content, embedding, ingested_at FROM transcripts",
        )?;

        let records = stmt.query_map([], Self::row_to_record)?;

        let mut results: Vec<ScoredRecord> = records
            .filter_map(|r| r.ok())
            .map(|record| {
                let score = cosine_similarity(query_embedding, &record.embedding);
                ScoredRecord { record, score }
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        debug!("Found {} matching transcripts", results.len());
        Ok(results)
    }

    #[instrument(skip(self))]
    async fn get_by_doc_id(&self, doc_id: &str) -> Result<Option<TranscriptRecord>> {
        let conn = self.lock_conn()?;

        let record = conn.query_row(
            r#"
            SELECT doc_id, filepath, filename, content, embedding, ingested_at
            FROM transcripts
            WHERE doc_id = ?1
            "#,
            params![doc_id],
            Self::row_to_record,
        );

        match record {
            Ok(r) => Ok(Some(r)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<TranscriptSummary>> {
        let conn = self.lock_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT doc_id, filename, LENGTH(content), ingested_at
            FROM transcripts
            ORDER BY ingested_at DESC
            "#,
        )?;

        let summaries = stmt.query_map([], |row| {
            let content_len: i64 = row.get(2)?;
            let ingested_at_str: String = row.get(3)?;
            Ok(TranscriptSummary {
                doc_id: row.get(0)?,
                filename: row.get(1)?,
                content_len: content_len as usize,
                ingested_at: DateTime::parse_from_rfc3339(&ingested_at_str)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        })?;

        let result: Vec<TranscriptSummary> = summaries.filter_map(|s| s.ok()).collect();
        Ok(result)
    }

    async fn count(&self) -> Result<usize> {
        let conn = self.lock_conn()?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM transcripts", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(doc_id: &str, content: &str, embedding: Vec<f32>) -> TranscriptRecord {
        TranscriptRecord::new(
            doc_id.to_string(),
            format!("/data/{}.md", doc_id),
            doc_id.to_string(),
            content.to_string(),
            embedding,
        )
    }

    #[tokio::test]
    async fn test_upsert_search_delete() {
        let store = SqliteTranscriptStore::in_memory().unwrap();

        store
            .upsert(&record("pipelines", "all about data pipelines", vec![1.0, 0.0, 0.0]))
            .await
            .unwrap();
        store
            .upsert(&record("kafka", "streaming with kafka", vec![0.0, 1.0, 0.0]))
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 2);

        let results = store.search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].record.doc_id, "pipelines");
        assert!(results[0].score > results[1].score);

        let deleted = store.delete_by_doc_id("pipelines").await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_same_doc_id() {
        let store = SqliteTranscriptStore::in_memory().unwrap();

        store
            .upsert(&record("pipelines", "first version", vec![1.0, 0.0, 0.0]))
            .await
            .unwrap();
        store
            .upsert(&record("pipelines", "second version", vec![0.5, 0.5, 0.0]))
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let fetched = store.get_by_doc_id("pipelines").await.unwrap().unwrap();
        assert_eq!(fetched.content, "second version");
    }

    #[tokio::test]
    async fn test_get_by_doc_id_missing() {
        let store = SqliteTranscriptStore::in_memory().unwrap();
        assert!(store.get_by_doc_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcripts.db");

        {
            let store = SqliteTranscriptStore::new(&path).unwrap();
            store
                .upsert(&record("persisted", "still here", vec![1.0]))
                .await
                .unwrap();
        }

        let store = SqliteTranscriptStore::new(&path).unwrap();
        let fetched = store.get_by_doc_id("persisted").await.unwrap().unwrap();
        assert_eq!(fetched.content, "still here");
        assert_eq!(fetched.embedding, vec![1.0]);
    }
}
