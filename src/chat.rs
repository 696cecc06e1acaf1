//! Chat client session against the query endpoint.
//!
//! Keeps the full session transcript, sends it as conversation context with
//! every question, and folds the structured reply back into the history.

use chrono::Local;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::text::clean_text;

/// Structured reply from the query endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryReply {
    pub answer: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
}

/// One interactive chat session.
///
/// History grows for the session lifetime; every line ever shown is part of
/// the context sent with the next question.
pub struct ChatSession {
    client: reqwest::Client,
    endpoint_url: String,
    history: Vec<String>,
}

impl ChatSession {
    /// Create a session against the given endpoint with a fixed timeout.
    pub fn new(endpoint_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            endpoint_url: endpoint_url.to_string(),
            history: Vec::new(),
        }
    }

    /// Submit a user turn: record it, query the endpoint, record the reply.
    ///
    /// Transport and parse failures become inline history lines; the session
    /// continues either way.
    #[instrument(skip(self, input))]
    pub async fn submit(&mut self, input: &str) {
        let timestamp = Local::now().format("%H:%M");
        self.history.push(format!("{}: {}", timestamp, input));

        let prompt = build_prompt(&self.history, input);
        debug!("Submitting prompt of {} chars", prompt.len());

        let response = self
            .client
            .post(&self.endpoint_url)
            .json(&serde_json::json!({ "prompt": prompt }))
            .send()
            .await
            .and_then(|r| r.error_for_status());

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                self.history.push(format!("Error: {}", e));
                return;
            }
        };

        match response.json::<QueryReply>().await {
            Ok(reply) => {
                for line in reply_lines(&reply) {
                    self.history.push(line);
                }
            }
            Err(_) => {
                self.history.push("Invalid response from server".to_string());
            }
        }
    }

    /// Reset the session history.
    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// History lines, most recent first, for rendering.
    pub fn rendered_history(&self) -> impl Iterator<Item = &String> {
        self.history.iter().rev()
    }
}

/// Build the endpoint prompt from the session history and the latest turn.
fn build_prompt(history: &[String], input: &str) -> String {
    format!(
        "Conversation so far:\n{}\n\nUser question:\n{}\n",
        history.join("\n"),
        input
    )
}

/// Format a structured reply as cleaned display lines.
fn reply_lines(reply: &QueryReply) -> [String; 3] {
    let summary = reply.summary.as_deref().unwrap_or("No summary available.");
    let keywords = reply.keywords.as_deref().unwrap_or("No keywords available.");

    [
        format!("Keywords:\n{}", clean_text(keywords)),
        format!("Summary:\n{}", clean_text(summary)),
        format!("Answer:\n{}", clean_text(&reply.answer)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt_includes_full_history() {
        let history = vec![
            "10:00: what is kafka?".to_string(),
            "Answer:\nkafka is a log".to_string(),
            "10:01: and spark?".to_string(),
        ];
        let prompt = build_prompt(&history, "and spark?");

        assert!(prompt.starts_with("Conversation so far:\n10:00: what is kafka?"));
        assert!(prompt.contains("Answer:\nkafka is a log"));
        assert!(prompt.ends_with("User question:\nand spark?\n"));
    }

    #[test]
    fn test_reply_lines_order_and_cleaning() {
        let reply = QueryReply {
            answer: "pipelines  move   data".to_string(),
            summary: Some("[00:00:01] a summary".to_string()),
            keywords: Some("kafka, spark".to_string()),
        };

        let lines = reply_lines(&reply);
        assert_eq!(lines[0], "Keywords:\nkafka, spark");
        assert_eq!(lines[1], "Summary:\na summary");
        assert_eq!(lines[2], "Answer:\npipelines move data");
    }

    #[test]
    fn test_reply_lines_missing_fields() {
        let reply = QueryReply {
            answer: "an answer".to_string(),
            summary: None,
            keywords: None,
        };

        let lines = reply_lines(&reply);
        assert!(lines[0].contains("No keywords available."));
        assert!(lines[1].contains("No summary available."));
    }

    #[test]
    fn test_rendered_history_most_recent_first() {
        let mut session = ChatSession::new("http://localhost:7071/rag/query", Duration::from_secs(1));
        session.history.push("first".to_string());
        session.history.push("second".to_string());

        let rendered: Vec<&String> = session.rendered_history().collect();
        assert_eq!(rendered[0], "second");
        assert_eq!(rendered[1], "first");
    }

    #[test]
    fn test_clear_resets_history() {
        let mut session = ChatSession::new("http://localhost:7071/rag/query", Duration::from_secs(1));
        session.history.push("line".to_string());
        session.clear();
        assert_eq!(session.rendered_history().count(), 0);
    }
}
