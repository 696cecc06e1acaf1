//! Configuration settings for Svar.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub vector_store: VectorStoreSettings,
    pub ingestion: IngestionSettings,
    pub embedding: EmbeddingSettings,
    pub rag: RagSettings,
    pub memory: MemorySettings,
    pub server: ServerSettings,
    pub chat: ChatSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.svar".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Vector store provider (sqlite, memory).
    pub provider: String,
    /// Path to SQLite database (for sqlite provider).
    pub sqlite_path: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: "sqlite".to_string(),
            sqlite_path: "~/.svar/transcripts.db".to_string(),
        }
    }
}

/// Transcript ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionSettings {
    /// Directory containing transcript files to ingest.
    pub transcripts_dir: String,
    /// File extension of transcript files (without the dot).
    pub file_extension: String,
    /// Fixed delay between files in milliseconds (embedding API throttle).
    pub delay_ms: u64,
}

impl Default for IngestionSettings {
    fn default() -> Self {
        Self {
            transcripts_dir: "~/.svar/transcripts".to_string(),
            file_extension: "md".to_string(),
            delay_ms: 5000,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// RAG (Retrieval-Augmented Generation) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// LLM model for response generation.
    pub model: String,
    /// Retries when the model fails to produce a valid structured answer.
    pub retries: u32,
    /// Default number of transcripts returned per retrieval call.
    pub top_k: usize,
    /// Maximum keywords extracted per transcript.
    pub max_keywords: usize,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            retries: 2,
            top_k: 3,
            max_keywords: 30,
        }
    }
}

/// Conversation memory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySettings {
    /// Maximum retained conversation entries; oldest entries are dropped.
    pub max_entries: usize,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self { max_entries: 1000 }
    }
}

/// HTTP API server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7071,
        }
    }
}

/// Chat client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// URL of the query endpoint the chat client talks to.
    pub endpoint_url: String,
    /// Request timeout in seconds for the blocking query call.
    pub timeout_secs: u64,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            endpoint_url: "http://127.0.0.1:7071/rag/query".to_string(),
            timeout_secs: 20,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SvarError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("svar")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.sqlite_path)
    }

    /// Get the expanded transcripts directory path.
    pub fn transcripts_dir(&self) -> PathBuf {
        Self::expand_path(&self.ingestion.transcripts_dir)
    }

    /// Transcript file extension with a leading dot (e.g., ".md").
    pub fn transcript_suffix(&self) -> String {
        format!(".{}", self.ingestion.file_extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.rag.retries, 2);
        assert_eq!(settings.rag.top_k, 3);
        assert_eq!(settings.transcript_suffix(), ".md");
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [rag]
            model = "gpt-4o"
            "#,
        )
        .unwrap();
        assert_eq!(settings.rag.model, "gpt-4o");
        assert_eq!(settings.rag.max_keywords, 30);
        assert_eq!(settings.server.port, 7071);
    }
}
