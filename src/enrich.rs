//! Summary and keyword generation for source transcripts.
//!
//! Each generator makes one model call, no retries. Any failure degrades to
//! a deterministic local heuristic; degradation is carried in the result so
//! callers can observe it instead of it being silent.

use crate::config::Prompts;
use crate::error::{Result, SvarError};
use crate::openai::create_client;
use crate::retrieval::Retriever;
use crate::text::clean_text;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Sentinel for a summary request against a missing transcript.
pub const SUMMARY_NOT_FOUND: &str = "No transcript found to summarize.";

/// Outcome of a generation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Generation {
    /// The model produced the text.
    Model(String),
    /// The model call failed; a local heuristic produced the text.
    Fallback { text: String, reason: String },
    /// No transcript record matched the request.
    Missing,
}

impl Generation {
    /// Extract the text, substituting a sentinel for the missing case.
    pub fn text_or(self, missing_sentinel: &str) -> String {
        match self {
            Generation::Model(text) => text,
            Generation::Fallback { text, .. } => text,
            Generation::Missing => missing_sentinel.to_string(),
        }
    }
}

/// Generates summaries and keyword lists for stored transcripts.
pub struct Enricher {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    retriever: Arc<Retriever>,
    prompts: Prompts,
    max_keywords: usize,
}

impl Enricher {
    /// Create a new enricher.
    pub fn new(
        retriever: Arc<Retriever>,
        model: &str,
        prompts: Prompts,
        max_keywords: usize,
    ) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
            retriever,
            prompts,
            max_keywords,
        }
    }

    /// Generate a 2-3 sentence summary for the named transcript.
    #[instrument(skip(self))]
    pub async fn summary(&self, filename: &str) -> Result<Generation> {
        let Some(record) = self.retriever.lookup(filename).await? else {
            return Ok(Generation::Missing);
        };

        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), record.content.clone());
        let prompt = Prompts::render(&self.prompts.summary.user, &vars);

        match self.complete_once(&prompt).await {
            Ok(text) => Ok(Generation::Model(clean_text(&text))),
            Err(e) => {
                warn!("Summary generation failed, using fallback: {}", e);
                Ok(Generation::Fallback {
                    text: fallback_summary(&record.content),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Extract a bounded, de-duplicated keyword list for the named transcript.
    #[instrument(skip(self))]
    pub async fn keywords(&self, filename: &str) -> Result<Generation> {
        let Some(record) = self.retriever.lookup(filename).await? else {
            return Ok(Generation::Missing);
        };

        let content = clean_text(&record.content);

        let mut vars = HashMap::new();
        vars.insert("max_keywords".to_string(), self.max_keywords.to_string());
        vars.insert("transcript".to_string(), content.clone());
        let prompt = Prompts::render(&self.prompts.keywords.user, &vars);

        match self.complete_once(&prompt).await {
            Ok(text) => Ok(Generation::Model(dedupe_keywords(&text))),
            Err(e) => {
                warn!("Keyword generation failed, using fallback: {}", e);
                Ok(Generation::Fallback {
                    text: fallback_keywords(&content, self.max_keywords),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// One-shot chat completion with a single user message.
    async fn complete_once(&self, prompt: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> =
            vec![ChatCompletionRequestUserMessageArgs::default()
                .content(prompt.to_string())
                .build()
                .map_err(|e| SvarError::Rag(e.to_string()))?
                .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()
            .map_err(|e| SvarError::Rag(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| SvarError::OpenAI(format!("Generation API error: {}", e)))?;

        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| SvarError::Rag("Empty response from model".to_string()))?
            .trim()
            .to_string();

        debug!("Generated {} chars", text.len());
        Ok(text)
    }
}

/// De-duplicate a comma-separated keyword list, preserving first-seen order.
pub fn dedupe_keywords(raw: &str) -> String {
    let mut seen: Vec<String> = Vec::new();
    for keyword in raw.split(',') {
        let keyword = keyword.trim();
        if !keyword.is_empty() && !seen.iter().any(|s| s.as_str() == keyword) {
            seen.push(keyword.to_string());
        }
    }
    seen.join(",")
}

/// Local keyword heuristic: first distinct words longer than 3 characters.
pub fn fallback_keywords(content: &str, max_keywords: usize) -> String {
    let mut seen: Vec<String> = Vec::new();
    for word in content.split_whitespace() {
        let word = word.to_lowercase();
        let word = word.trim_matches(|c| ".,!?()[]{}".contains(c));
        if word.len() > 3 && !seen.iter().any(|s| s.as_str() == word) {
            seen.push(word.to_string());
        }
        if seen.len() >= max_keywords {
            break;
        }
    }
    seen.join(",")
}

/// Local summary heuristic: first three content lines, cleaned.
pub fn fallback_summary(content: &str) -> String {
    let head = content.lines().take(3).collect::<Vec<_>>().join(" ");
    clean_text(&head)
}
