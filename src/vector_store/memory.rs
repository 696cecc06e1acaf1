//! In-memory transcript store implementation.
//!
//! Useful for testing and small corpora.

use super::{cosine_similarity, ScoredRecord, TranscriptRecord, TranscriptStore, TranscriptSummary};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory transcript store.
pub struct MemoryTranscriptStore {
    records: RwLock<HashMap<String, TranscriptRecord>>,
}

impl MemoryTranscriptStore {
    /// Create a new in-memory transcript store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryTranscriptStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptStore for MemoryTranscriptStore {
    async fn upsert(&self, record: &TranscriptRecord) -> Result<()> {
        let mut records = self.records.write().unwrap();
        records.insert(record.doc_id.clone(), record.clone());
        Ok(())
    }

    async fn delete_by_doc_id(&self, doc_id: &str) -> Result<usize> {
        let mut records = self.records.write().unwrap();
        Ok(records.remove(doc_id).map(|_| 1).unwrap_or(0))
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<ScoredRecord>> {
        let records = self.records.read().unwrap();

        let mut results: Vec<ScoredRecord> = records
            .values()
            .map(|record| {
                let score = cosine_similarity(query_embedding, &record.embedding);
                ScoredRecord {
                    record: record.clone(),
                    score,
                }
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        Ok(results)
    }

    async fn get_by_doc_id(&self, doc_id: &str) -> Result<Option<TranscriptRecord>> {
        let records = self.records.read().unwrap();
        Ok(records.get(doc_id).cloned())
    }

    async fn list(&self) -> Result<Vec<TranscriptSummary>> {
        let records = self.records.read().unwrap();

        let mut summaries: Vec<TranscriptSummary> = records
            .values()
            .map(|r| TranscriptSummary {
                doc_id: r.doc_id.clone(),
                filename: r.filename.clone(),
                content_len: r.content.len(),
                ingested_at: r.ingested_at,
            })
            .collect();

        summaries.sort_by(|a, b| b.ingested_at.cmp(&a.ingested_at));
        Ok(summaries)
    }

    async fn count(&self) -> Result<usize> {
        let records = self.records.read().unwrap();
        Ok(records.len())
    }
}
