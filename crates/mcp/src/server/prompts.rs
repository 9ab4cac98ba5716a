//! Translation between the prompt catalog and MCP prompt types.

use cuecard_registry::PromptDispatcher;
use cuecard_types::{MessageContent, MessageRole, NormalizedResult, PromptArgument, PromptDescriptor, PromptMessage};
use rmcp::model::{self, GetPromptResult, ListPromptsResult, Prompt, PromptMessageRole};

/// List every registered prompt in registration order.
pub fn list_prompts(dispatcher: &PromptDispatcher) -> ListPromptsResult {
    ListPromptsResult::with_all_items(dispatcher.list().iter().map(prompt_definition).collect())
}

pub fn prompt_definition(descriptor: &PromptDescriptor) -> Prompt {
    Prompt {
        name: descriptor.name.clone(),
        title: None,
        description: descriptor.description.clone(),
        arguments: Some(descriptor.arguments.iter().map(prompt_argument).collect()),
        icons: None,
        meta: None,
    }
}

fn prompt_argument(argument: &PromptArgument) -> model::PromptArgument {
    model::PromptArgument {
        name: argument.name.clone(),
        title: None,
        description: argument.description.clone(),
        required: Some(argument.required),
    }
}

/// Convert a normalized prompt result into the `prompts/get` response.
pub fn prompt_result(result: NormalizedResult) -> GetPromptResult {
    GetPromptResult {
        description: result.description,
        messages: result.messages.into_iter().map(prompt_message).collect(),
    }
}

fn prompt_message(message: PromptMessage) -> model::PromptMessage {
    let role = match message.role {
        MessageRole::User => PromptMessageRole::User,
        MessageRole::Assistant => PromptMessageRole::Assistant,
    };
    match message.content {
        MessageContent::Text { text } => model::PromptMessage::new_text(role, text),
    }
}
