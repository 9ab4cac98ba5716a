mod core;
mod errors;
mod http;
mod prompts;
mod stdio;

pub use core::PromptServer;
pub use errors::dispatch_error;
pub use http::{McpHttpServer, RunningMcpHttpServer, resolve_bind_address};
pub use prompts::{list_prompts, prompt_definition, prompt_result};
pub use stdio::serve_stdio;
