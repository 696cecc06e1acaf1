//! Svar - YouTube Transcript Q&A
//!
//! A RAG assistant for asking questions over YouTube video transcripts.
//!
//! The name "Svar" comes from the Norwegian word for "answer."
//!
//! # Overview
//!
//! Svar allows you to:
//! - Ingest transcript files into a searchable vector store
//! - Ask questions answered strictly from the transcripts, with the source named
//! - Get an auto-generated summary and keyword list for the source video
//! - Chat with the assistant through a terminal client and an HTTP API
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt templates
//! - `text` - Transcript text cleanup
//! - `vector_store` - Transcript store abstraction
//! - `embedding` - Embedding generation
//! - `retrieval` - Similarity retrieval over stored transcripts
//! - `ingest` - Transcript file ingestion
//! - `agent` - RAG agent with structured answers
//! - `enrich` - Summary and keyword generation
//! - `memory` - Conversation memory
//! - `server` - HTTP API
//! - `chat` - Terminal chat client
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use svar::config::Settings;
//! use svar::server::AppState;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let state = AppState::from_settings(&settings)?;
//!
//!     let answer = state.agent().run("What is a data pipeline?").await?;
//!     println!("{}", answer.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod chat;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod enrich;
pub mod error;
pub mod ingest;
pub mod memory;
pub mod openai;
pub mod retrieval;
pub mod server;
pub mod text;
pub mod vector_store;

pub use error::{Result, SvarError};
