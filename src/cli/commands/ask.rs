//! Ask command implementation.
//!
//! One-shot question through the agent, skipping the HTTP server.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::server::AppState;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let state = AppState::from_settings(&settings)?;

    let spinner = Output::spinner("Searching transcripts...");

    match state.agent().run(question).await {
        Ok(answer) => {
            spinner.finish_and_clear();
            println!("\n{}\n", answer.answer);
            if let Some(filename) = &answer.filename {
                Output::kv("Source", filename);
            }
            Ok(())
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            Err(e.into())
        }
    }
}
