//! Bounded-window, role-tagged message log with plain-text rendering (C6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationRole {
    System,
    User,
    Assistant,
}

impl ConversationRole {
    fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub role: ConversationRole,
    pub content: String,
}

/// A fixed-capacity window of the most recent entries; oldest is evicted
/// first once full.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    capacity: usize,
    entries: std::collections::VecDeque<ConversationEntry>,
}

impl ConversationMemory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: std::collections::VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, role: ConversationRole, content: impl Into<String>) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(ConversationEntry {
            role,
            content: content.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &ConversationEntry> {
        self.entries.iter()
    }

    /// Renders the window as `"{role}: {content}"` lines joined by newlines.
    pub fn render_plain_text(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{}: {}", e.role.as_str(), e.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_once_full() {
        let mut mem = ConversationMemory::new(2);
        mem.push(ConversationRole::User, "one");
        mem.push(ConversationRole::Assistant, "two");
        mem.push(ConversationRole::User, "three");
        assert_eq!(mem.len(), 2);
        let rendered = mem.render_plain_text();
        assert!(!rendered.contains("one"));
        assert!(rendered.contains("two"));
        assert!(rendered.contains("three"));
    }

    #[test]
    fn renders_role_tagged_lines() {
        let mut mem = ConversationMemory::new(4);
        mem.push(ConversationRole::System, "be concise");
        mem.push(ConversationRole::User, "hello");
        assert_eq!(mem.render_plain_text(), "system: be concise\nuser: hello");
    }
}
