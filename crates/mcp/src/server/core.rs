use std::sync::Arc;

use cuecard_registry::PromptDispatcher;
use rmcp::model::{
    ErrorData as McpError, GetPromptRequestParams, GetPromptResult, Implementation, ListPromptsResult, PaginatedRequestParams,
    ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{ServerHandler, service::RequestContext};
use tracing::{debug, warn};

use crate::server::errors::dispatch_error;
use crate::server::prompts::{list_prompts, prompt_result};

const DEFAULT_INSTRUCTIONS: &str = "Call prompts/list to discover the available prompts and their arguments, then prompts/get with a prompt name and an arguments object. Argument values may be strings; numbers and booleans are parsed from text.";

/// MCP prompt capability backed by a [`PromptDispatcher`].
///
/// Every session gets its own clone; clones share the frozen registry.
#[derive(Debug, Clone)]
pub struct PromptServer {
    dispatcher: PromptDispatcher,
    instructions: Option<Arc<str>>,
}

impl PromptServer {
    pub fn new(dispatcher: PromptDispatcher) -> Self {
        Self {
            dispatcher,
            instructions: None,
        }
    }

    /// Replace the default server instructions sent during `initialize`.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(Arc::from(instructions.into()));
        self
    }

    pub fn dispatcher(&self) -> &PromptDispatcher {
        &self.dispatcher
    }
}

impl ServerHandler for PromptServer {
    fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListPromptsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(list_prompts(&self.dispatcher)))
    }

    fn get_prompt(
        &self,
        request: GetPromptRequestParams,
        context: RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<GetPromptResult, McpError>> + Send + '_ {
        async move {
            debug!(prompt = %request.name, "prompts/get");
            match self.dispatcher.invoke(&request.name, request.arguments.as_ref(), context.ct.clone()).await {
                Ok(result) => Ok(prompt_result(result)),
                Err(error) => {
                    warn!(prompt = %request.name, error = %error, "prompts/get failed");
                    Err(dispatch_error(&error))
                }
            }
        }
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_prompts().build(),
            protocol_version: ProtocolVersion::LATEST,
            server_info: Implementation {
                name: "Cuecard".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some("Cuecard Prompts".to_string()),
                ..Default::default()
            },
            instructions: Some(self.instructions.as_deref().unwrap_or(DEFAULT_INSTRUCTIONS).to_string()),
        }
    }
}
