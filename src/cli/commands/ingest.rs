//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::OpenAIEmbedder;
use crate::ingest::Ingestor;
use crate::vector_store::open_store;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

/// Run the ingest command.
pub async fn run_ingest(dir: Option<&str>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ingest) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let dir = match dir {
        Some(d) => Settings::expand_path(d),
        None => settings.transcripts_dir(),
    };

    let store = open_store(&settings)?;
    let embedder = Arc::new(OpenAIEmbedder::with_config(
        &settings.embedding.model,
        settings.embedding.dimensions as usize,
    ));

    let ingestor = Ingestor::new(
        store,
        embedder,
        &settings.ingestion.file_extension,
        Duration::from_millis(settings.ingestion.delay_ms),
    );

    let spinner = Output::spinner(&format!("Ingesting transcripts from {}...", dir.display()));

    match ingestor.run(&dir).await {
        Ok(report) => {
            spinner.finish_and_clear();
            Output::success(&format!("Ingested {} transcripts", report.ingested.len()));
            for doc_id in &report.ingested {
                Output::kv("Ingested", doc_id);
            }
            if !report.skipped.is_empty() {
                Output::warning(&format!("Skipped {} files", report.skipped.len()));
                for file in &report.skipped {
                    Output::kv("Skipped", &file.display().to_string());
                }
            }
            Ok(())
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Ingestion failed: {}", e));
            Err(e.into())
        }
    }
}
