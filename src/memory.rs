//! Conversation memory for the query endpoint.
//!
//! Process-lifetime store of question/answer pairs with an explicit
//! capacity; not persisted across restarts.

use serde::Serialize;
use std::sync::RwLock;

/// A single question/answer exchange.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConversationEntry {
    /// The user's prompt.
    pub question: String,
    /// The agent's answer.
    pub answer: String,
}

/// Bounded, append-only conversation memory.
pub struct ConversationMemory {
    entries: RwLock<Vec<ConversationEntry>>,
    max_entries: usize,
}

impl ConversationMemory {
    /// Create a memory retaining at most `max_entries` exchanges.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            max_entries: max_entries.max(1),
        }
    }

    /// Append an exchange, dropping the oldest entry at capacity.
    pub fn append(&self, question: &str, answer: &str) {
        let mut entries = self.entries.write().unwrap();
        if entries.len() >= self.max_entries {
            entries.remove(0);
        }
        entries.push(ConversationEntry {
            question: question.to_string(),
            answer: answer.to_string(),
        });
    }

    /// Read all entries in insertion order.
    pub fn entries(&self) -> Vec<ConversationEntry> {
        self.entries.read().unwrap().clone()
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    /// Whether the memory is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let memory = ConversationMemory::new(10);
        memory.append("q1", "a1");
        memory.append("q2", "a2");
        memory.append("q3", "a3");

        let entries = memory.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].question, "q1");
        assert_eq!(entries[1].question, "q2");
        assert_eq!(entries[2].question, "q3");
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let memory = ConversationMemory::new(2);
        memory.append("q1", "a1");
        memory.append("q2", "a2");
        memory.append("q3", "a3");

        let entries = memory.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].question, "q2");
        assert_eq!(entries[1].question, "q3");
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let memory = ConversationMemory::new(0);
        memory.append("q", "a");
        assert_eq!(memory.len(), 1);
    }
}
