//! Transcript retrieval against the vector store.
//!
//! Composes the embedder and the store into the ranked text-retrieval
//! service the agent and the generators consume.

use crate::embedding::Embedder;
use crate::error::Result;
use crate::text::clean_text;
use crate::vector_store::{TranscriptRecord, TranscriptStore};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Sentinel returned when a retrieval query matches nothing.
pub const NO_MATCH_SENTINEL: &str = "No relevant transcripts found.";

/// Retrieves transcripts by similarity for the RAG agent and generators.
pub struct Retriever {
    store: Arc<dyn TranscriptStore>,
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    /// Create a new retriever.
    pub fn new(store: Arc<dyn TranscriptStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    /// Retrieve the top-k transcripts for a query, formatted for the model.
    ///
    /// Returns titled, cleaned excerpts joined by blank lines, or the
    /// [`NO_MATCH_SENTINEL`] when the store has no matches. An empty result
    /// is not an error.
    #[instrument(skip(self), fields(query = %query, k))]
    pub async fn retrieve_top_documents(&self, query: &str, k: usize) -> Result<String> {
        let query_embedding = self.embedder.embed(query).await?;
        let results = self.store.search(&query_embedding, k).await?;

        if results.is_empty() {
            debug!("No transcripts matched query");
            return Ok(NO_MATCH_SENTINEL.to_string());
        }

        let formatted = results
            .iter()
            .map(|r| {
                format!(
                    "Transcript title: {}\n{}",
                    r.record.filename,
                    clean_text(&r.record.content)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(formatted)
    }

    /// Look up a single transcript by filename.
    ///
    /// Tries an exact doc-id match first; falls back to a similarity search
    /// with the filename as the query, which is how loosely-worded model
    /// outputs still resolve to a record.
    #[instrument(skip(self))]
    pub async fn lookup(&self, filename: &str) -> Result<Option<TranscriptRecord>> {
        let doc_id = strip_known_extension(filename);

        if let Some(record) = self.store.get_by_doc_id(doc_id).await? {
            return Ok(Some(record));
        }

        debug!("No exact match for {}, falling back to similarity", filename);
        let embedding = self.embedder.embed(filename).await?;
        let mut results = self.store.search(&embedding, 1).await?;
        Ok(results.pop().map(|r| r.record))
    }
}

/// Strip a transcript file extension, if present.
fn strip_known_extension(filename: &str) -> &str {
    filename.strip_suffix(".md").unwrap_or(filename)
}
