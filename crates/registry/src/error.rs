//! Error types for prompt registration and dispatch.

use thiserror::Error;

/// Errors raised while registering prompts on a [`crate::PromptRegistryBuilder`].
///
/// A failed registration never leaves a partial entry behind; the builder is
/// unchanged and further registrations may continue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Duplicate prompt name: '{name}' conflicts with already registered '{existing}'")]
    DuplicatePromptName { name: String, existing: String },

    #[error("Missing owning instance: prompt '{name}' is declared on {expected_type} but no such instance was supplied")]
    MissingOwningInstance { name: String, expected_type: String },

    #[error("Invalid result shape: prompt '{name}' returns {declared_type}; expected NormalizedResult or Vec<PromptMessage>")]
    InvalidResultShape { name: String, declared_type: String },

    #[error("Invalid prompt definition '{name}': {reason}")]
    InvalidDefinition { name: String, reason: String },
}

/// Errors raised while resolving, binding or invoking a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Unknown prompt: '{name}'")]
    UnknownPrompt { name: String },

    #[error("Missing required argument '{argument}' for prompt '{prompt}'")]
    MissingRequiredArgument { prompt: String, argument: String },

    #[error("Argument '{argument}' for prompt '{prompt}' cannot be converted to {expected}: {reason}")]
    ArgumentConversion {
        prompt: String,
        argument: String,
        expected: String,
        reason: String,
    },

    #[error("Prompt '{prompt}' failed: {message}")]
    HandlerInvocation { prompt: String, message: String },
}

impl RegistryError {
    /// Create a duplicate prompt name error.
    pub fn duplicate_prompt_name(name: impl Into<String>, existing: impl Into<String>) -> Self {
        Self::DuplicatePromptName {
            name: name.into(),
            existing: existing.into(),
        }
    }

    /// Create a missing owning instance error.
    pub fn missing_owning_instance(name: impl Into<String>, expected_type: impl Into<String>) -> Self {
        Self::MissingOwningInstance {
            name: name.into(),
            expected_type: expected_type.into(),
        }
    }

    /// Create an invalid result shape error.
    pub fn invalid_result_shape(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self::InvalidResultShape {
            name: name.into(),
            declared_type: declared_type.into(),
        }
    }

    /// Create an invalid definition error.
    pub fn invalid_definition(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl DispatchError {
    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest { message: message.into() }
    }

    /// Create an unknown prompt error.
    pub fn unknown_prompt(name: impl Into<String>) -> Self {
        Self::UnknownPrompt { name: name.into() }
    }

    /// Create a missing required argument error.
    pub fn missing_required_argument(prompt: impl Into<String>, argument: impl Into<String>) -> Self {
        Self::MissingRequiredArgument {
            prompt: prompt.into(),
            argument: argument.into(),
        }
    }

    /// Create an argument conversion error.
    pub fn argument_conversion(
        prompt: impl Into<String>,
        argument: impl Into<String>,
        expected: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ArgumentConversion {
            prompt: prompt.into(),
            argument: argument.into(),
            expected: expected.into(),
            reason: reason.into(),
        }
    }

    /// Create a handler invocation error.
    pub fn handler_invocation(prompt: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HandlerInvocation {
            prompt: prompt.into(),
            message: message.into(),
        }
    }

    /// Name of the prompt the error refers to, when known.
    pub fn prompt_name(&self) -> Option<&str> {
        match self {
            Self::InvalidRequest { .. } => None,
            Self::UnknownPrompt { name } => Some(name),
            Self::MissingRequiredArgument { prompt, .. }
            | Self::ArgumentConversion { prompt, .. }
            | Self::HandlerInvocation { prompt, .. } => Some(prompt),
        }
    }
}
