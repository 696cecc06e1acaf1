//! Pre-flight checks before operations that call out to the LLM.
//!
//! Catching a missing API key up front beats failing midway through an
//! ingestion run or a chat session.

use crate::error::{Result, SvarError};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Ingestion embeds every file, so it needs the API key.
    Ingest,
    /// Serving answers requires the API key.
    Serve,
    /// One-shot asking requires the API key.
    Ask,
    /// The chat client only talks to the local endpoint.
    Chat,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Ingest | Operation::Serve | Operation::Ask => check_api_key(),
        Operation::Chat => Ok(()),
    }
}

/// Check if OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(SvarError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(SvarError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_has_no_requirements() {
        assert!(check(Operation::Chat).is_ok());
    }
}
