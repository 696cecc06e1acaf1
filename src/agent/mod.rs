//! RAG agent for transcript-grounded question answering.
//!
//! An LLM with a single retrieval capability it may invoke zero or more
//! times per request before producing a structured answer.

mod runner;
mod tools;

pub use runner::{parse_structured_answer, ChatModel, ModelTurn, OpenAiChatModel, RagAgent, RagAnswer};
pub use tools::{parse_tool_call, tool_definitions, RetrieveTool, ToolCall, DEFAULT_TOP_K};
