//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::vector_store::open_store;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let store = open_store(&settings)?;

    match store.list().await {
        Ok(transcripts) => {
            if transcripts.is_empty() {
                Output::info("No transcripts ingested yet. Use 'svar ingest' to add content.");
            } else {
                Output::header(&format!("Ingested Transcripts ({})", transcripts.len()));
                println!();

                for t in &transcripts {
                    Output::transcript_info(
                        &t.filename,
                        &t.doc_id,
                        t.content_len,
                        &t.ingested_at.format("%Y-%m-%d %H:%M").to_string(),
                    );
                }
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Failed to list transcripts: {}", e));
            Err(e.into())
        }
    }
}
