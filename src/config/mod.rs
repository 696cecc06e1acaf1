//! Configuration module for Svar.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{KeywordPrompts, Prompts, RagPrompts, SummaryPrompts};
pub use settings::{
    ChatSettings, EmbeddingSettings, GeneralSettings, IngestionSettings, MemorySettings,
    PromptSettings, RagSettings, ServerSettings, Settings, VectorStoreSettings,
};
