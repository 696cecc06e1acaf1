//! Agent runner with tool calling loop and structured output validation.

use super::tools::{parse_tool_call, tool_definitions, RetrieveTool, ToolCall, DEFAULT_TOP_K};
use crate::error::{Result, SvarError};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Structured answer produced by the agent.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RagAnswer {
    /// The answer text, grounded in retrieved transcripts.
    pub answer: String,
    /// Transcript filename the answer comes from, if any.
    #[serde(default)]
    pub filename: Option<String>,
}

/// One completion turn from the model: plain content, tool calls, or both.
#[derive(Debug, Clone)]
pub struct ModelTurn {
    pub content: Option<String>,
    pub tool_calls: Vec<ChatCompletionMessageToolCall>,
}

/// Chat-completion capability behind the agent.
///
/// A trait for the same reason retrieval is one: tests inject a scripted
/// model instead of the OpenAI API.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
        tools: Vec<ChatCompletionTool>,
    ) -> Result<ModelTurn>;
}

/// OpenAI-backed [`ChatModel`].
pub struct OpenAiChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAiChatModel {
    pub fn new(model: &str) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn complete(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
        tools: Vec<ChatCompletionTool>,
    ) -> Result<ModelTurn> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .tools(tools)
            .build()
            .map_err(|e| SvarError::Agent(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| SvarError::OpenAI(format!("Agent API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SvarError::Agent("No response from model".to_string()))?;

        Ok(ModelTurn {
            content: choice.message.content,
            tool_calls: choice.message.tool_calls.unwrap_or_default(),
        })
    }
}

/// RAG agent: persona-driven responder with a single retrieval capability.
pub struct RagAgent {
    model: Arc<dyn ChatModel>,
    tool: Arc<dyn RetrieveTool>,
    system_prompt: String,
    retries: u32,
    top_k: usize,
    max_tool_iterations: usize,
}

impl RagAgent {
    /// Create a new agent with the given retrieval capability.
    pub fn new(tool: Arc<dyn RetrieveTool>, model: &str, system_prompt: &str) -> Self {
        Self {
            model: Arc::new(OpenAiChatModel::new(model)),
            tool,
            system_prompt: system_prompt.to_string(),
            retries: 2,
            top_k: DEFAULT_TOP_K,
            max_tool_iterations: 8,
        }
    }

    /// Set the number of validation retries.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Set the retrieval depth advertised to the model and used as the
    /// fallback when it omits `k`.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Replace the chat-completion backend.
    pub fn with_chat_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.model = model;
        self
    }

    /// Run the agent with a user prompt and return its structured answer.
    ///
    /// The model may call the retrieval capability zero or more times, then
    /// must reply with a JSON object matching [`RagAnswer`]. Invalid output
    /// is retried a bounded number of times; exhaustion is a `Rag` error.
    #[instrument(skip(self, prompt))]
    pub async fn run(&self, prompt: &str) -> Result<RagAnswer> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.system_prompt.clone())
                .build()
                .map_err(|e| SvarError::Agent(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt.to_string())
                .build()
                .map_err(|e| SvarError::Agent(e.to_string()))?
                .into(),
        ];

        let mut attempts = 0;

        loop {
            let content = self.run_tool_loop(&mut messages).await?;

            match parse_structured_answer(&content) {
                Ok(answer) => {
                    info!("Agent produced structured answer");
                    return Ok(answer);
                }
                Err(e) => {
                    attempts += 1;
                    if attempts > self.retries {
                        return Err(SvarError::Rag(format!(
                            "Model failed to produce a valid structured answer after {} retries: {}",
                            self.retries, e
                        )));
                    }

                    warn!("Invalid structured answer (attempt {}): {}", attempts, e);

                    // Feed the invalid reply back with a correction request
                    messages.push(
                        ChatCompletionRequestAssistantMessageArgs::default()
                            .content(content)
                            .build()
                            .map_err(|e| SvarError::Agent(e.to_string()))?
                            .into(),
                    );
                    messages.push(
                        ChatCompletionRequestUserMessageArgs::default()
                            .content(
                                "Your last reply was not valid. Respond with ONLY a JSON object: \
                                {\"answer\": \"...\", \"filename\": \"...\" or null}",
                            )
                            .build()
                            .map_err(|e| SvarError::Agent(e.to_string()))?
                            .into(),
                    );
                }
            }
        }
    }

    /// Drive the tool-calling loop until the model produces plain content.
    async fn run_tool_loop(
        &self,
        messages: &mut Vec<ChatCompletionRequestMessage>,
    ) -> Result<String> {
        let mut iterations = 0;

        loop {
            iterations += 1;
            if iterations > self.max_tool_iterations {
                return Err(SvarError::Agent(format!(
                    "Agent exceeded maximum tool iterations ({})",
                    self.max_tool_iterations
                )));
            }

            debug!("Agent iteration {}, {} messages", iterations, messages.len());

            let turn = self
                .model
                .complete(messages.clone(), tool_definitions(self.top_k))
                .await?;

            if turn.tool_calls.is_empty() {
                return Ok(turn.content.unwrap_or_default());
            }
            let tool_calls = turn.tool_calls;

            let assistant_msg = ChatCompletionRequestAssistantMessageArgs::default()
                .tool_calls(tool_calls.clone())
                .build()
                .map_err(|e| SvarError::Agent(e.to_string()))?;
            messages.push(assistant_msg.into());

            for tool_call in &tool_calls {
                let name = &tool_call.function.name;
                let arguments = &tool_call.function.arguments;
                info!("Agent calling tool: {} with args: {}", name, arguments);

                let result = match parse_tool_call(name, arguments, self.top_k) {
                    Ok(ToolCall::RetrieveTopDocuments { query, k }) => {
                        match self.tool.retrieve(&query, k).await {
                            Ok(output) => output,
                            Err(e) => format!("Tool error: {}", e),
                        }
                    }
                    Err(e) => format!("Failed to parse tool call: {}", e),
                };

                let tool_msg = ChatCompletionRequestToolMessageArgs::default()
                    .tool_call_id(&tool_call.id)
                    .content(result)
                    .build()
                    .map_err(|e| SvarError::Agent(e.to_string()))?;
                messages.push(tool_msg.into());
            }
        }
    }
}

/// Parse the model's final reply into a [`RagAnswer`].
///
/// Tolerates a markdown code fence around the JSON object; an absent, null,
/// or empty `filename` becomes `None`.
pub fn parse_structured_answer(content: &str) -> Result<RagAnswer> {
    let trimmed = strip_code_fence(content.trim());

    let mut answer: RagAnswer = serde_json::from_str(trimmed)
        .map_err(|e| SvarError::Rag(format!("Invalid structured answer: {}", e)))?;

    if answer.answer.trim().is_empty() {
        return Err(SvarError::Rag("Structured answer has empty text".to_string()));
    }

    if answer.filename.as_deref().is_some_and(|f| f.trim().is_empty()) {
        answer.filename = None;
    }

    Ok(answer)
}

/// Strip a surrounding markdown code fence, if present.
fn strip_code_fence(content: &str) -> &str {
    let content = content
        .strip_prefix("```json")
        .or_else(|| content.strip_prefix("```"))
        .unwrap_or(content);
    content.strip_suffix("```").unwrap_or(content).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::types::{ChatCompletionToolType, FunctionCall};
    use std::sync::Mutex;

    /// Chat model that replays a fixed transcript of turns.
    struct ScriptedModel {
        turns: Mutex<Vec<ModelTurn>>,
    }

    impl ScriptedModel {
        fn new(turns: Vec<ModelTurn>) -> Arc<Self> {
            Arc::new(Self {
                turns: Mutex::new(turns),
            })
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(
            &self,
            _messages: Vec<ChatCompletionRequestMessage>,
            _tools: Vec<ChatCompletionTool>,
        ) -> Result<ModelTurn> {
            let mut turns = self.turns.lock().unwrap();
            if turns.is_empty() {
                return Err(SvarError::Agent("Scripted model ran out of turns".to_string()));
            }
            Ok(turns.remove(0))
        }
    }

    /// Retrieval stub that records every (query, k) it is asked for.
    struct RecordingRetrieve {
        calls: Mutex<Vec<(String, usize)>>,
    }

    impl RecordingRetrieve {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl RetrieveTool for RecordingRetrieve {
        async fn retrieve(&self, query: &str, k: usize) -> Result<String> {
            self.calls.lock().unwrap().push((query.to_string(), k));
            Ok("Transcript title: kafka_streaming.md\nKafka moves events.".to_string())
        }
    }

    fn content_turn(text: &str) -> ModelTurn {
        ModelTurn {
            content: Some(text.to_string()),
            tool_calls: Vec::new(),
        }
    }

    fn retrieve_turn(arguments: &str) -> ModelTurn {
        ModelTurn {
            content: None,
            tool_calls: vec![ChatCompletionMessageToolCall {
                id: "call_0".to_string(),
                r#type: ChatCompletionToolType::Function,
                function: FunctionCall {
                    name: "retrieve_top_documents".to_string(),
                    arguments: arguments.to_string(),
                },
            }],
        }
    }

    fn agent_with(model: Arc<ScriptedModel>, tool: Arc<RecordingRetrieve>) -> RagAgent {
        RagAgent::new(tool, "gpt-4o-mini", "You answer from transcripts.")
            .with_chat_model(model)
    }

    #[tokio::test]
    async fn test_run_retry_exhaustion_is_an_error() {
        let model = ScriptedModel::new(vec![
            content_turn("Pipelines are great, trust me."),
            content_turn("Still not JSON."),
            content_turn("Nope."),
        ]);
        let agent = agent_with(model, RecordingRetrieve::new()).with_retries(2);

        let err = agent.run("What is a pipeline?").await.unwrap_err();
        match err {
            SvarError::Rag(msg) => assert!(msg.contains("after 2 retries"), "msg: {}", msg),
            other => panic!("expected Rag error, got: {}", other),
        }
    }

    #[tokio::test]
    async fn test_run_recovers_after_invalid_reply() {
        let model = ScriptedModel::new(vec![
            content_turn("Let me think out loud first."),
            content_turn(r#"{"answer": "Kafka moves events.", "filename": "kafka_streaming.md"}"#),
        ]);
        let agent = agent_with(model, RecordingRetrieve::new()).with_retries(2);

        let answer = agent.run("What does Kafka do?").await.unwrap();
        assert_eq!(answer.answer, "Kafka moves events.");
        assert_eq!(answer.filename.as_deref(), Some("kafka_streaming.md"));
    }

    #[tokio::test]
    async fn test_run_executes_tool_with_configured_k() {
        let model = ScriptedModel::new(vec![
            retrieve_turn(r#"{"query": "kafka"}"#),
            content_turn(r#"{"answer": "Kafka moves events.", "filename": "kafka_streaming.md"}"#),
        ]);
        let tool = RecordingRetrieve::new();
        let agent = agent_with(model, tool.clone()).with_top_k(5);

        let answer = agent.run("What does Kafka do?").await.unwrap();
        assert_eq!(answer.filename.as_deref(), Some("kafka_streaming.md"));

        let calls = tool.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[("kafka".to_string(), 5)]);
    }

    #[test]
    fn test_parse_structured_answer() {
        let answer = parse_structured_answer(
            r#"{"answer": "Pipelines move data!", "filename": "data_pipeline_basics.md"}"#,
        )
        .unwrap();
        assert_eq!(answer.answer, "Pipelines move data!");
        assert_eq!(answer.filename.as_deref(), Some("data_pipeline_basics.md"));
    }

    #[test]
    fn test_parse_structured_answer_null_filename() {
        let answer =
            parse_structured_answer(r#"{"answer": "I'm not sure", "filename": null}"#).unwrap();
        assert_eq!(answer.filename, None);
    }

    #[test]
    fn test_parse_structured_answer_missing_filename() {
        let answer = parse_structured_answer(r#"{"answer": "I'm not sure"}"#).unwrap();
        assert_eq!(answer.filename, None);
    }

    #[test]
    fn test_parse_structured_answer_empty_filename_is_none() {
        let answer =
            parse_structured_answer(r#"{"answer": "ok then", "filename": "  "}"#).unwrap();
        assert_eq!(answer.filename, None);
    }

    #[test]
    fn test_parse_structured_answer_code_fence() {
        let content = "```json\n{\"answer\": \"Fenced!\", \"filename\": \"kafka.md\"}\n```";
        let answer = parse_structured_answer(content).unwrap();
        assert_eq!(answer.answer, "Fenced!");
    }

    #[test]
    fn test_parse_structured_answer_rejects_prose() {
        assert!(parse_structured_answer("Pipelines are great, trust me.").is_err());
    }

    #[test]
    fn test_parse_structured_answer_rejects_empty_answer() {
        assert!(parse_structured_answer(r#"{"answer": "   "}"#).is_err());
    }
}
