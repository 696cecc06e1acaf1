//! CLI module for Svar.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Svar - YouTube Transcript Q&A
///
/// A RAG assistant for asking questions over YouTube video transcripts.
/// The name "Svar" comes from the Norwegian word for "answer."
#[derive(Parser, Debug)]
#[command(name = "svar")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest transcript files into the vector store
    Ingest {
        /// Directory of transcript files (defaults to configured directory)
        #[arg(short, long)]
        dir: Option<String>,
    },

    /// Start the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Start an interactive chat session against the API
    Chat {
        /// Query endpoint URL (defaults to configured URL)
        #[arg(short, long)]
        url: Option<String>,
    },

    /// Ask a single question in-process, without the HTTP hop
    Ask {
        /// The question to ask
        question: String,
    },

    /// List ingested transcripts
    List,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration file
    Init,
}
