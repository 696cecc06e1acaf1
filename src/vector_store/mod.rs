//! Vector store abstraction for Svar.
//!
//! Provides a trait-based interface for different transcript store backends.

mod memory;
mod sqlite;

pub use memory::MemoryTranscriptStore;
pub use sqlite::SqliteTranscriptStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A transcript stored in the vector database.
///
/// Identity is the `doc_id` derived from the source filename stem;
/// re-ingesting the same file overwrites the record wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptRecord {
    /// Stable identifier (source filename without extension).
    pub doc_id: String,
    /// Full path to the source file.
    pub filepath: String,
    /// Display name (filename stem).
    pub filename: String,
    /// Raw, uncleaned transcript content.
    pub content: String,
    /// Embedding vector of the content.
    pub embedding: Vec<f32>,
    /// When this transcript was ingested.
    pub ingested_at: DateTime<Utc>,
}

impl TranscriptRecord {
    /// Create a new record stamped with the current time.
    pub fn new(
        doc_id: String,
        filepath: String,
        filename: String,
        content: String,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            doc_id,
            filepath,
            filename,
            content,
            embedding,
            ingested_at: Utc::now(),
        }
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    /// The matched transcript.
    pub record: TranscriptRecord,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Summary information about an ingested transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSummary {
    /// Document ID.
    pub doc_id: String,
    /// Display name.
    pub filename: String,
    /// Content length in bytes.
    pub content_len: usize,
    /// When the transcript was ingested.
    pub ingested_at: DateTime<Utc>,
}

/// Trait for transcript store implementations.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Store a transcript with its embedding.
    async fn upsert(&self, record: &TranscriptRecord) -> Result<()>;

    /// Delete the transcript with the given doc ID. Returns rows removed.
    async fn delete_by_doc_id(&self, doc_id: &str) -> Result<usize>;

    /// Search for similar transcripts, ranked by descending score.
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<ScoredRecord>>;

    /// Exact lookup by doc ID.
    async fn get_by_doc_id(&self, doc_id: &str) -> Result<Option<TranscriptRecord>>;

    /// List all ingested transcripts, newest first.
    async fn list(&self) -> Result<Vec<TranscriptSummary>>;

    /// Get total transcript count.
    async fn count(&self) -> Result<usize>;
}

/// Open the transcript store selected by configuration.
pub fn open_store(settings: &crate::config::Settings) -> Result<std::sync::Arc<dyn TranscriptStore>> {
    match settings.vector_store.provider.as_str() {
        "memory" => Ok(std::sync::Arc::new(MemoryTranscriptStore::new())),
        "sqlite" => Ok(std::sync::Arc::new(SqliteTranscriptStore::new(
            &settings.sqlite_path(),
        )?)),
        other => Err(crate::error::SvarError::Config(format!(
            "Unknown vector store provider: {}",
            other
        ))),
    }
}

/// Compute cosine similarity between two vectors.
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
    fn test_cosine_similarity_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }
}
