//! Prompt messages and the normalized result every prompt handler produces.

use serde::{Deserialize, Serialize};

/// The speaker a prompt message is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Content attributed to the user.
    User,
    /// Content attributed to the assistant.
    Assistant,
}

/// Message payload. Only text content is supported today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageContent {
    /// Plain text content.
    Text { text: String },
}

impl MessageContent {
    /// Return the text of this content block.
    pub fn as_text(&self) -> &str {
        match self {
            MessageContent::Text { text } => text,
        }
    }
}

/// A single role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: MessageRole,
    pub content: MessageContent,
}

impl PromptMessage {
    /// Create a text message for the given role.
    pub fn text(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            content: MessageContent::Text { text: text.into() },
        }
    }

    /// Create a user text message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::text(MessageRole::User, text)
    }

    /// Create an assistant text message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::text(MessageRole::Assistant, text)
    }
}

/// The uniform shape every prompt result is converted into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedResult {
    /// Optional description of the rendered prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Messages in the order the handler produced them.
    pub messages: Vec<PromptMessage>,
}

impl NormalizedResult {
    /// Create a result from an ordered list of messages.
    pub fn new(messages: Vec<PromptMessage>) -> Self {
        Self {
            description: None,
            messages,
        }
    }

    /// Attach a description to the result.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Raw value returned by a prompt handler.
///
/// Handlers either build a [`NormalizedResult`] themselves or return a bare
/// sequence of messages which is wrapped during normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutput {
    Result(NormalizedResult),
    Messages(Vec<PromptMessage>),
}

impl PromptOutput {
    /// Convert into the normalized shape, filling in `description` for bare
    /// message sequences.
    pub fn normalize(self, description: Option<&str>) -> NormalizedResult {
        match self {
            PromptOutput::Result(result) => result,
            PromptOutput::Messages(messages) => NormalizedResult {
                description: description.map(ToString::to_string),
                messages,
            },
        }
    }
}

impl From<NormalizedResult> for PromptOutput {
    fn from(result: NormalizedResult) -> Self {
        PromptOutput::Result(result)
    }
}

impl From<Vec<PromptMessage>> for PromptOutput {
    fn from(messages: Vec<PromptMessage>) -> Self {
        PromptOutput::Messages(messages)
    }
}
