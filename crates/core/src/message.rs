//! Turn and prompt domain types.
//!
//! A [`Turn`] is one message inside a session's bounded history. A
//! [`ChatPrompt`] is the provider-agnostic request the prompt assembler
//! builds from that history: role-tagged messages only, no model parameters
//! (those belong to the chat provider's own configuration).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (the fixed journaling directive)
    System,
    /// The end user
    User,
    /// The AI assistant
    Assistant,
}

/// A single turn in a session's conversation history.
///
/// Immutable once created. The timestamp is diagnostic only and plays no
/// part in eviction, which is strictly insertion-ordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a new user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new assistant turn.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// One role-tagged message within a [`ChatPrompt`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

impl From<&Turn> for ChatMessage {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role,
            content: turn.text.clone(),
        }
    }
}

/// The structured, provider-agnostic request sent to the chat collaborator.
///
/// Ordering is semantically meaningful: the system directive first, the
/// history window in chronological order, the new user message last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPrompt {
    pub messages: Vec<ChatMessage>,
}

impl ChatPrompt {
    /// Whether the prompt opens with a system directive.
    pub fn has_system_directive(&self) -> bool {
        self.messages
            .first()
            .map(|m| m.role == Role::System)
            .unwrap_or(false)
    }

    /// Whether the prompt carries at least one user message.
    pub fn has_user_message(&self) -> bool {
        self.messages.iter().any(|m| m.role == Role::User)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_turn() {
        let turn = Turn::user("I had a stressful day");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.text, "I had a stressful day");
    }

    #[test]
    fn turn_converts_to_chat_message() {
        let turn = Turn::assistant("That sounds hard");
        let msg = ChatMessage::from(&turn);
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content, "That sounds hard");
    }

    #[test]
    fn prompt_shape_checks() {
        let prompt = ChatPrompt {
            messages: vec![
                ChatMessage::system("You are a journaling companion"),
                ChatMessage::user("hello"),
            ],
        };
        assert!(prompt.has_system_directive());
        assert!(prompt.has_user_message());

        let no_system = ChatPrompt {
            messages: vec![ChatMessage::user("hello")],
        };
        assert!(!no_system.has_system_directive());
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }

    #[test]
    fn turn_serialization_roundtrip() {
        let turn = Turn::user("Test message");
        let json = serde_json::to_string(&turn).unwrap();
        let parsed: Turn = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.text, "Test message");
        assert_eq!(parsed.role, Role::User);
    }
}
