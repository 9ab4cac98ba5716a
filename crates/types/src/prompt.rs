//! Prompt catalog entries as exposed by `prompts/list`.

use serde::{Deserialize, Serialize};

/// A single named argument accepted by a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptArgument {
    /// The argument name callers supply values under.
    pub name: String,
    /// Human-readable description of the argument.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether callers must supply a value for this argument.
    pub required: bool,
}

impl PromptArgument {
    /// Create an argument entry.
    pub fn new(name: impl Into<String>, description: Option<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            description,
            required,
        }
    }
}

/// Catalog metadata describing a registered prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptDescriptor {
    /// Unique prompt name. Uniqueness is case-insensitive.
    pub name: String,
    /// Human-readable description of what the prompt produces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Arguments in declaration order.
    #[serde(default)]
    pub arguments: Vec<PromptArgument>,
}

impl PromptDescriptor {
    /// Names of the arguments callers must always supply.
    pub fn required_arguments(&self) -> impl Iterator<Item = &str> {
        self.arguments
            .iter()
            .filter(|argument| argument.required)
            .map(|argument| argument.name.as_str())
    }
}
