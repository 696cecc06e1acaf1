//! Tool definitions for the RAG agent.
//!
//! The agent exposes exactly one capability to the model: ranked transcript
//! retrieval. The capability is a trait so tests can inject a stub.

use crate::error::{Result, SvarError};
use crate::retrieval::Retriever;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Number of transcripts per retrieval call when the configuration does not
/// override it.
pub const DEFAULT_TOP_K: usize = 3;

/// Retrieval capability injected into the agent at construction.
#[async_trait]
pub trait RetrieveTool: Send + Sync {
    /// Retrieve the top-k transcripts for a query, formatted for the model.
    async fn retrieve(&self, query: &str, k: usize) -> Result<String>;
}

#[async_trait]
impl RetrieveTool for Retriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<String> {
        self.retrieve_top_documents(query, k).await
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum ToolCall {
    /// Retrieve top-k transcripts for a query.
    RetrieveTopDocuments {
        query: String,
        #[serde(default = "default_k")]
        k: usize,
    },
}

fn default_k() -> usize {
    DEFAULT_TOP_K
}

/// Get OpenAI function/tool definitions for the agent.
///
/// `default_k` is the configured retrieval depth; it is advertised to the
/// model as the default for the `k` parameter.
pub fn tool_definitions(default_k: usize) -> Vec<async_openai::types::ChatCompletionTool> {
    use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};

    vec![ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: "retrieve_top_documents".to_string(),
            description: Some(
                "Retrieve the most relevant YouTube transcripts for a query. \
                Use this before answering any question about the videos."
                    .to_string(),
            ),
            parameters: Some(serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    },
                    "k": {
                        "type": "integer",
                        "description": "Number of transcripts to retrieve",
                        "default": default_k
                    }
                },
                "required": ["query"]
            })),
            strict: None,
        },
    }]
}

/// Parse a tool call from the OpenAI response format.
///
/// A missing `k` argument falls back to `default_k`.
pub fn parse_tool_call(name: &str, arguments: &str, default_k: usize) -> Result<ToolCall> {
    let args: serde_json::Value = serde_json::from_str(arguments)
        .map_err(|e| SvarError::Agent(format!("Invalid tool arguments: {}", e)))?;

    match name {
        "retrieve_top_documents" => {
            let query = args["query"]
                .as_str()
                .ok_or_else(|| SvarError::Agent("Missing 'query' argument".to_string()))?
                .to_string();
            let k = args["k"].as_u64().unwrap_or(default_k as u64) as usize;
            Ok(ToolCall::RetrieveTopDocuments { query, k })
        }
        _ => Err(SvarError::Agent(format!("Unknown tool: {}", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_retrieve_tool() {
        let tool = parse_tool_call(
            "retrieve_top_documents",
            r#"{"query": "data pipelines", "k": 5}"#,
            DEFAULT_TOP_K,
        )
        .unwrap();
        assert_eq!(
            tool,
            ToolCall::RetrieveTopDocuments {
                query: "data pipelines".to_string(),
                k: 5,
            }
        );
    }

    #[test]
    fn test_parse_retrieve_tool_falls_back_to_configured_k() {
        let tool = parse_tool_call("retrieve_top_documents", r#"{"query": "kafka"}"#, 7).unwrap();
        assert_eq!(
            tool,
            ToolCall::RetrieveTopDocuments {
                query: "kafka".to_string(),
                k: 7,
            }
        );
    }

    #[test]
    fn test_tool_definitions_advertise_configured_k() {
        let tools = tool_definitions(5);
        assert_eq!(tools.len(), 1);
        let params = tools[0].function.parameters.as_ref().unwrap();
        assert_eq!(params["properties"]["k"]["default"], 5);
    }

    #[test]
    fn test_parse_unknown_tool() {
        assert!(parse_tool_call("delete_everything", "{}", DEFAULT_TOP_K).is_err());
    }

    #[test]
    fn test_parse_missing_query() {
        assert!(parse_tool_call("retrieve_top_documents", r#"{"k": 2}"#, DEFAULT_TOP_K).is_err());
    }
}
