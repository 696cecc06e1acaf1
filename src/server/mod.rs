//! HTTP API server for the transcript assistant.
//!
//! Exposes the query endpoint consumed by the chat client, a liveness
//! check, and the conversation history view.

use crate::agent::RagAgent;
use crate::config::{Prompts, Settings};
use crate::embedding::OpenAIEmbedder;
use crate::enrich::{Enricher, SUMMARY_NOT_FOUND};
use crate::error::Result;
use crate::memory::ConversationMemory;
use crate::retrieval::Retriever;
use crate::vector_store::open_store;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Title used when the agent names no source transcript.
pub const UNKNOWN_SOURCE_TITLE: &str = "unknown source";

/// Shared application state.
pub struct AppState {
    agent: RagAgent,
    enricher: Enricher,
    memory: ConversationMemory,
    transcript_suffix: String,
}

impl AppState {
    /// Wire up agent, enricher, and memory from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(settings.prompts.custom_dir.as_deref())?;

        let store = open_store(settings)?;
        let embedder = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        ));
        let retriever = Arc::new(Retriever::new(store, embedder));

        let agent = RagAgent::new(retriever.clone(), &settings.rag.model, &prompts.rag.system)
            .with_retries(settings.rag.retries)
            .with_top_k(settings.rag.top_k);

        let enricher = Enricher::new(
            retriever,
            &settings.rag.model,
            prompts,
            settings.rag.max_keywords,
        );

        Ok(Self {
            agent,
            enricher,
            memory: ConversationMemory::new(settings.memory.max_entries),
            transcript_suffix: settings.transcript_suffix(),
        })
    }

    /// The RAG agent (used by the one-shot ask command).
    pub fn agent(&self) -> &RagAgent {
        &self.agent
    }
}

/// Build the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(liveness))
        .route("/rag/query", post(rag_query))
        .route("/history", get(history))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP API server until interrupted.
pub async fn run_server(host: &str, port: u16, state: Arc<AppState>) -> Result<()> {
    let app = build_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(crate::error::SvarError::Io)?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct QueryRequest {
    prompt: String,
}

#[derive(Serialize)]
struct QueryResponse {
    answer: String,
    summary: String,
    keywords: String,
}

#[derive(Serialize)]
struct HistoryEntry {
    user: String,
    bot: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// === Handlers ===

async fn liveness() -> impl IntoResponse {
    Json(serde_json::json!({ "test": "hello" }))
}

async fn rag_query(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QueryRequest>,
) -> impl IntoResponse {
    let answer = match state.agent.run(&req.prompt).await {
        Ok(answer) => answer,
        Err(e) => {
            error!("Agent failed: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response();
        }
    };

    state.memory.append(&req.prompt, &answer.answer);

    let title = derive_title(answer.filename.as_deref(), &state.transcript_suffix);

    // No named source means nothing to enrich
    let (summary, keywords) = match answer.filename.as_deref() {
        Some(filename) => {
            let summary = match state.enricher.summary(filename).await {
                Ok(generation) => generation.text_or(SUMMARY_NOT_FOUND),
                Err(e) => {
                    error!("Summary lookup failed: {}", e);
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(ErrorResponse {
                            error: e.to_string(),
                        }),
                    )
                        .into_response();
                }
            };
            let keywords = match state.enricher.keywords(filename).await {
                Ok(generation) => generation.text_or(""),
                Err(e) => {
                    error!("Keyword lookup failed: {}", e);
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(ErrorResponse {
                            error: e.to_string(),
                        }),
                    )
                        .into_response();
                }
            };
            (summary, keywords)
        }
        None => (SUMMARY_NOT_FOUND.to_string(), String::new()),
    };

    let full_answer = format!("{}\n\nYouTube title: {}", answer.answer, title);

    Json(QueryResponse {
        answer: full_answer,
        summary,
        keywords,
    })
    .into_response()
}

async fn history(State(state): State<Arc<AppState>>) -> Json<Vec<HistoryEntry>> {
    let entries: Vec<HistoryEntry> = state
        .memory
        .entries()
        .into_iter()
        .map(|e| HistoryEntry {
            user: e.question,
            bot: e.answer,
        })
        .collect();

    Json(entries)
}

/// Derive the display title from the agent's source filename.
///
/// Strips the transcript extension; an absent filename becomes the explicit
/// "unknown source" title rather than echoing the prompt back.
fn derive_title(filename: Option<&str>, suffix: &str) -> String {
    match filename {
        Some(f) => f.strip_suffix(suffix).unwrap_or(f).to_string(),
        None => UNKNOWN_SOURCE_TITLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_backed_state() -> Arc<AppState> {
        let mut settings = Settings::default();
        settings.vector_store.provider = "memory".to_string();
        Arc::new(AppState::from_settings(&settings).unwrap())
    }

    #[tokio::test]
    async fn test_history_returns_appended_exchanges_in_order() {
        let state = memory_backed_state();
        state.memory.append("What is Kafka?", "An event log.");
        state.memory.append("And Spark?", "A batch engine.");

        let Json(entries) = history(State(state)).await;

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].user, "What is Kafka?");
        assert_eq!(entries[0].bot, "An event log.");
        assert_eq!(entries[1].user, "And Spark?");
        assert_eq!(entries[1].bot, "A batch engine.");
    }

    #[tokio::test]
    async fn test_history_empty_before_any_query() {
        let Json(entries) = history(State(memory_backed_state())).await;
        assert!(entries.is_empty());
    }

    #[test]
    fn test_derive_title_strips_extension() {
        assert_eq!(
            derive_title(Some("data_pipeline_basics.md"), ".md"),
            "data_pipeline_basics"
        );
    }

    #[test]
    fn test_derive_title_without_extension() {
        assert_eq!(derive_title(Some("kafka_streaming"), ".md"), "kafka_streaming");
    }

    #[test]
    fn test_derive_title_unknown_source() {
        assert_eq!(derive_title(None, ".md"), UNKNOWN_SOURCE_TITLE);
    }
}
