//! Prompt assembly — turns a history window and a new message into the
//! provider-agnostic chat request.

use voxlog_core::{ChatMessage, ChatPrompt, Error, Result, Turn};

/// The fixed persona directive sent as the first message of every prompt.
pub const SYSTEM_DIRECTIVE: &str = "You are a supportive journaling companion grounded in \
cognitive-behavioral techniques. Help the user reflect on their thoughts and feelings through \
warm, non-judgmental conversation. Ask open-ended questions that invite self-reflection, gently \
name patterns in what the user shares, and offer reframing when it seems helpful. Never give \
medical advice or a diagnosis. Keep replies to two or three sentences, and reflect back what \
you heard before moving on.";

/// Builds [`ChatPrompt`]s from session history.
///
/// `build` is a pure function: identical inputs always yield an identical
/// prompt, and the history is never mutated.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    max_message_chars: usize,
}

impl PromptAssembler {
    pub fn new(max_message_chars: usize) -> Self {
        Self { max_message_chars }
    }

    /// Assemble the ordered message list: the system directive, each
    /// history turn in insertion order, then the new user message last.
    pub fn build(&self, history: &[Turn], new_user_text: &str) -> Result<ChatPrompt> {
        let text = new_user_text.trim();
        if text.is_empty() {
            return Err(Error::validation("message must not be empty"));
        }
        if text.chars().count() > self.max_message_chars {
            return Err(Error::validation(format!(
                "message exceeds the maximum length of {} characters",
                self.max_message_chars
            )));
        }

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(SYSTEM_DIRECTIVE));
        messages.extend(history.iter().map(ChatMessage::from));
        messages.push(ChatMessage::user(text));

        Ok(ChatPrompt { messages })
    }
}
