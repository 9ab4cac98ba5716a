//! Structured prompt error helpers.

use chrono::Utc;
use cuecard_registry::DispatchError;
use rmcp::model::ErrorData;
use serde_json::{Value, json};

fn build_error_data(error_code: &str, category: &str, message: &str, context: Value, retryable: bool, suggested_action: &str) -> Value {
    json!({
        "error_code": error_code,
        "category": category,
        "message": message,
        "context": context,
        "retryable": retryable,
        "suggested_action": suggested_action,
        "correlation_id": format!("prompt-{}", Utc::now().timestamp_millis()),
    })
}

pub fn invalid_request_error(error_code: &str, message: impl Into<String>, context: Value, suggested_action: &str) -> ErrorData {
    let message = message.into();
    ErrorData::invalid_request(
        message.clone(),
        Some(build_error_data(error_code, "request", &message, context, false, suggested_action)),
    )
}

pub fn invalid_params_error(error_code: &str, message: impl Into<String>, context: Value, suggested_action: &str) -> ErrorData {
    let message = message.into();
    ErrorData::invalid_params(
        message.clone(),
        Some(build_error_data(error_code, "validation", &message, context, false, suggested_action)),
    )
}

pub fn not_found_error(error_code: &str, message: impl Into<String>, context: Value, suggested_action: &str) -> ErrorData {
    let message = message.into();
    ErrorData::resource_not_found(
        message.clone(),
        Some(build_error_data(error_code, "not_found", &message, context, false, suggested_action)),
    )
}

pub fn execution_error(error_code: &str, message: impl Into<String>, context: Value, retryable: bool, suggested_action: &str) -> ErrorData {
    let message = message.into();
    ErrorData::internal_error(
        message.clone(),
        Some(build_error_data(error_code, "execution", &message, context, retryable, suggested_action)),
    )
}

/// Render a dispatcher failure as an MCP error.
pub fn dispatch_error(error: &DispatchError) -> ErrorData {
    let message = error.to_string();
    match error {
        DispatchError::InvalidRequest { .. } => invalid_request_error(
            "PROMPT_REQUEST_INVALID",
            message,
            json!({}),
            "Provide a non-empty prompt name.",
        ),
        DispatchError::UnknownPrompt { name } => not_found_error(
            "PROMPT_NOT_FOUND",
            message,
            json!({ "name": name }),
            "Call prompts/list to inspect available prompts.",
        ),
        DispatchError::MissingRequiredArgument { prompt, argument } => invalid_params_error(
            "PROMPT_ARGUMENT_MISSING",
            message,
            json!({ "prompt": prompt, "argument": argument }),
            "Provide all required prompt arguments and retry.",
        ),
        DispatchError::ArgumentConversion {
            prompt,
            argument,
            expected,
            reason,
        } => invalid_params_error(
            "PROMPT_ARGUMENT_INVALID",
            message,
            json!({ "prompt": prompt, "argument": argument, "expected": expected, "reason": reason }),
            "Supply a value of the declared type and retry.",
        ),
        DispatchError::HandlerInvocation { prompt, message: inner } => execution_error(
            "PROMPT_EXECUTION_FAILED",
            message,
            json!({ "prompt": prompt, "cause": inner }),
            false,
            "Inspect the server logs for the handler failure.",
        ),
    }
}

#[cfg(test)]
mod tests {
    use rmcp::model::ErrorCode;

    use super::*;

    #[test]
    fn error_kinds_map_to_protocol_codes() {
        assert_eq!(dispatch_error(&DispatchError::invalid_request("empty")).code, ErrorCode::INVALID_REQUEST);
        assert_eq!(dispatch_error(&DispatchError::unknown_prompt("missing")).code, ErrorCode::RESOURCE_NOT_FOUND);
        assert_eq!(
            dispatch_error(&DispatchError::missing_required_argument("summary", "text")).code,
            ErrorCode::INVALID_PARAMS
        );
        assert_eq!(
            dispatch_error(&DispatchError::argument_conversion("summary", "sentences", "integer", "bad")).code,
            ErrorCode::INVALID_PARAMS
        );
        assert_eq!(dispatch_error(&DispatchError::handler_invocation("summary", "boom")).code, ErrorCode::INTERNAL_ERROR);
    }

    #[test]
    fn payload_carries_code_and_context() {
        let error = dispatch_error(&DispatchError::missing_required_argument("summary", "text"));
        let data = error.data.expect("structured payload");

        assert_eq!(data["error_code"], "PROMPT_ARGUMENT_MISSING");
        assert_eq!(data["context"]["argument"], "text");
        assert_eq!(data["retryable"], false);
        assert!(data["correlation_id"].as_str().is_some_and(|id| id.starts_with("prompt-")));
        assert_eq!(error.message, "Missing required argument 'text' for prompt 'summary'");
    }
}
