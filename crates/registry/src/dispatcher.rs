//! Listing and invoking prompts from a frozen registry.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use cuecard_types::{NormalizedResult, PromptDescriptor};
use futures_util::FutureExt;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::binder::bind_arguments;
use crate::error::DispatchError;
use crate::registry::PromptRegistry;

/// Entry point for `prompts/list` and `prompts/get`.
///
/// Cloning is cheap; every clone shares the same registry.
#[derive(Debug, Clone)]
pub struct PromptDispatcher {
    registry: Arc<PromptRegistry>,
}

impl PromptDispatcher {
    pub fn new(registry: Arc<PromptRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this dispatcher resolves prompts from.
    pub fn registry(&self) -> &Arc<PromptRegistry> {
        &self.registry
    }

    /// Every registered descriptor in registration order.
    pub fn list(&self) -> Vec<PromptDescriptor> {
        self.registry.list_descriptors()
    }

    /// Resolve, bind and run a prompt, returning its normalized result.
    ///
    /// `cancellation` is handed to the handler's trailing cancellation
    /// parameter when it declares one; the dispatcher never aborts a running
    /// handler itself. Errors raised by the handler are reported as
    /// [`DispatchError::HandlerInvocation`] unless they already are a
    /// [`DispatchError`].
    pub async fn invoke(
        &self,
        name: &str,
        arguments: Option<&Map<String, Value>>,
        cancellation: CancellationToken,
    ) -> Result<NormalizedResult, DispatchError> {
        if name.trim().is_empty() {
            return Err(DispatchError::invalid_request("prompt name must not be empty"));
        }

        let entry = self.registry.resolve(name).inspect_err(|_| warn!(prompt = %name, "unknown prompt requested"))?;
        let prompt = entry.descriptor().name.as_str();
        let binding = entry.binding();

        let bound = bind_arguments(prompt, binding.parameters(), arguments, &cancellation)?;
        debug!(prompt, arguments = bound.positional().len(), "invoking prompt");

        let output = match AssertUnwindSafe(async move { binding.call(bound).await }).catch_unwind().await {
            Ok(Ok(output)) => output,
            Ok(Err(error)) => {
                let error = match error.downcast::<DispatchError>() {
                    Ok(dispatch_error) => dispatch_error,
                    Err(error) => DispatchError::handler_invocation(prompt, format!("{error:#}")),
                };
                warn!(prompt, error = %error, "prompt handler failed");
                return Err(error);
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!(prompt, panic = %message, "prompt handler panicked");
                return Err(DispatchError::handler_invocation(prompt, message));
            }
        };

        let shape = binding.result_shape();
        let Some(result) = shape.conform(output, binding.result_description()) else {
            warn!(prompt, ?shape, "prompt handler returned a result of the wrong shape");
            return Err(DispatchError::handler_invocation(prompt, format!("handler result does not match its declared {shape:?} shape")));
        };
        debug!(prompt, messages = result.messages.len(), "prompt completed");
        Ok(result)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("handler panicked: {message}")
    } else {
        "handler panicked".to_string()
    }
}
