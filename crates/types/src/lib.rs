//! Shared type definitions for the Cuecard prompt catalog.
//!
//! These types describe what the registry publishes (`PromptDescriptor`,
//! `PromptArgument`) and what every prompt invocation returns
//! (`NormalizedResult`).

mod message;
mod prompt;

pub use message::{MessageContent, MessageRole, NormalizedResult, PromptMessage, PromptOutput};
pub use prompt::{PromptArgument, PromptDescriptor};
