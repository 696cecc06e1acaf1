//! Transcript ingestion into the vector store.
//!
//! Batch job: one record per transcript file, delete-then-insert keyed on
//! the filename stem so re-runs converge on the input file set.

use crate::embedding::Embedder;
use crate::error::{Result, SvarError};
use crate::vector_store::{TranscriptRecord, TranscriptStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Result of an ingestion run.
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// Doc IDs ingested, in processing order.
    pub ingested: Vec<String>,
    /// Files that could not be processed.
    pub skipped: Vec<PathBuf>,
}

/// Ingests transcript files into the store.
pub struct Ingestor {
    store: Arc<dyn TranscriptStore>,
    embedder: Arc<dyn Embedder>,
    extension: String,
    delay: Duration,
}

impl Ingestor {
    /// Create a new ingestor for files with the given extension (no dot).
    pub fn new(
        store: Arc<dyn TranscriptStore>,
        embedder: Arc<dyn Embedder>,
        extension: &str,
        delay: Duration,
    ) -> Self {
        Self {
            store,
            embedder,
            extension: extension.to_string(),
            delay,
        }
    }

    /// Ingest every matching file in the directory, sequentially.
    ///
    /// Each file is embedded and replaces any existing record with the same
    /// doc ID. A fixed delay between files throttles the embedding API. A
    /// failed file is skipped, not fatal; a crash mid-run leaves the store
    /// partially updated and the next run converges it.
    #[instrument(skip(self), fields(dir = %dir.display()))]
    pub async fn run(&self, dir: &Path) -> Result<IngestReport> {
        if !dir.is_dir() {
            return Err(SvarError::Ingestion(format!(
                "Transcript directory not found: {}",
                dir.display()
            )));
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.is_file()
                    && p.extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
            })
            .collect();
        files.sort();

        info!("Found {} transcript files in {}", files.len(), dir.display());

        let mut report = IngestReport {
            ingested: Vec::new(),
            skipped: Vec::new(),
        };

        for (i, file) in files.iter().enumerate() {
            match self.ingest_file(file).await {
                Ok(doc_id) => {
                    info!("Ingested {} ({}/{})", doc_id, i + 1, files.len());
                    report.ingested.push(doc_id);
                }
                Err(e) => {
                    warn!("Skipping {}: {}", file.display(), e);
                    report.skipped.push(file.clone());
                }
            }

            // Embedding API throttle between files
            if i + 1 < files.len() && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        Ok(report)
    }

    /// Ingest a single file: delete any record with its doc ID, insert fresh.
    async fn ingest_file(&self, path: &Path) -> Result<String> {
        let doc_id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                SvarError::Ingestion(format!("Unusable filename: {}", path.display()))
            })?
            .to_string();

        let content = std::fs::read_to_string(path)?;
        let embedding = self.embedder.embed(&content).await?;

        let record = TranscriptRecord::new(
            doc_id.clone(),
            path.display().to_string(),
            doc_id.clone(),
            content,
            embedding,
        );

        self.store.delete_by_doc_id(&doc_id).await?;
        self.store.upsert(&record).await?;

        Ok(doc_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::MemoryTranscriptStore;
    use async_trait::async_trait;

    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.len() as f32, 1.0])
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    fn ingestor(store: Arc<MemoryTranscriptStore>) -> Ingestor {
        Ingestor::new(store, Arc::new(StubEmbedder), "md", Duration::ZERO)
    }

    #[tokio::test]
    async fn test_ingest_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("alpha.md"), "alpha content").unwrap();
        std::fs::write(dir.path().join("beta.md"), "beta content").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "wrong extension").unwrap();

        let store = Arc::new(MemoryTranscriptStore::new());
        let report = ingestor(store.clone()).run(dir.path()).await.unwrap();

        assert_eq!(report.ingested, vec!["alpha", "beta"]);
        assert!(report.skipped.is_empty());
        assert_eq!(store.count().await.unwrap(), 2);

        let alpha = store.get_by_doc_id("alpha").await.unwrap().unwrap();
        assert_eq!(alpha.content, "alpha content");
        assert!(alpha.filepath.ends_with("alpha.md"));
    }

    #[tokio::test]
    async fn test_reingest_converges() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("alpha.md");
        std::fs::write(&file, "first version").unwrap();

        let store = Arc::new(MemoryTranscriptStore::new());
        let ingestor = ingestor(store.clone());

        ingestor.run(dir.path()).await.unwrap();
        std::fs::write(&file, "second version").unwrap();
        ingestor.run(dir.path()).await.unwrap();

        // Exactly one record per identity, content reflects the latest run
        assert_eq!(store.count().await.unwrap(), 1);
        let record = store.get_by_doc_id("alpha").await.unwrap().unwrap();
        assert_eq!(record.content, "second version");
    }

    #[tokio::test]
    async fn test_missing_directory_is_error() {
        let store = Arc::new(MemoryTranscriptStore::new());
        let result = ingestor(store).run(Path::new("/no/such/dir")).await;
        assert!(result.is_err());
    }
}
