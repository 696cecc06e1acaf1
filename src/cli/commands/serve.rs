//! Serve command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::server::{run_server, AppState};
use anyhow::Result;
use std::sync::Arc;

/// Run the HTTP API server.
pub async fn run_serve(host: Option<&str>, port: Option<u16>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Serve) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let host = host.unwrap_or(&settings.server.host).to_string();
    let port = port.unwrap_or(settings.server.port);

    let state = Arc::new(AppState::from_settings(&settings)?);

    Output::header("Svar API Server");
    println!();
    Output::success(&format!("Listening on http://{}:{}", host, port));
    println!();
    println!("Endpoints:");
    Output::kv("Liveness", "GET  /");
    Output::kv("Query (RAG)", "POST /rag/query");
    Output::kv("History", "GET  /history");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    run_server(&host, port, state).await?;

    Ok(())
}
