//! Prompt templates for Svar.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub rag: RagPrompts,
    pub summary: SummaryPrompts,
    pub keywords: KeywordPrompts,
}

/// Prompts for the RAG agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    pub system: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a quirky and fun YouTuber who is an expert in Data Engineering and tech.
Answer questions like a pedagogical teacher but add humor and fun facts.
Always base your answers strictly on the retrieved transcript content.
Use the retrieve_top_documents tool to find relevant transcripts before answering.
If the question is outside the transcripts, say 'I'm not sure' and optionally include a fun fact.
Always mention the transcript title your answer comes from. NEVER include file paths or system locations.
Keep answers concise, clear, and in your fun teaching style, max 6 sentences.

When you are done, respond with ONLY a JSON object in this exact form:
{"answer": "<your answer>", "filename": "<transcript filename your answer comes from, or null>"}"#
                .to_string(),
        }
    }
}

/// Prompt for transcript summarization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    pub user: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            user: r#"Summarize this YouTube transcript in 2-3 sentences,
keeping it clear and informative. Only return the summary.

Transcript:
{{transcript}}"#
                .to_string(),
        }
    }
}

/// Prompt for keyword extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordPrompts {
    pub user: String,
}

impl Default for KeywordPrompts {
    fn default() -> Self {
        Self {
            user: r#"Extract {{max_keywords}} concise and relevant keywords from this cleaned YouTube transcript.
Ignore filler words like 'this', 'where', 'we'll', 'into', 'some', etc.
Output only comma-separated words, no explanations.

Transcript:
{{transcript}}"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from defaults, with optional overrides from a custom directory.
    pub fn load(custom_dir: Option<&str>) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }

            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                let content = std::fs::read_to_string(&summary_path)?;
                prompts.summary = toml::from_str(&content)?;
            }

            let keywords_path = custom_path.join("keywords.toml");
            if keywords_path.exists() {
                let content = std::fs::read_to_string(&keywords_path)?;
                prompts.keywords = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.rag.system.contains("transcript"));
        assert!(prompts.summary.user.contains("{{transcript}}"));
        assert!(prompts.keywords.user.contains("{{max_keywords}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Extract {{max_keywords}} keywords from {{transcript}}.";
        let mut vars = std::collections::HashMap::new();
        vars.insert("max_keywords".to_string(), "30".to_string());
        vars.insert("transcript".to_string(), "text".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Extract 30 keywords from text.");
    }
}
