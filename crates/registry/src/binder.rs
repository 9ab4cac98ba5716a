//! Binding caller-supplied argument maps to a prompt's formal parameters.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::DispatchError;
use crate::schema::ParameterSpec;

/// A single positional argument after binding.
#[derive(Debug, Clone)]
pub enum BoundValue {
    /// A converted value supplied by the caller or taken from a default.
    Value(Value),
    /// The ambient cancellation token of the call.
    Cancellation(CancellationToken),
}

/// Errors raised by the typed accessors on [`BoundArguments`].
#[derive(Debug, Error)]
pub enum ArgumentError {
    #[error("prompt '{prompt}' does not declare a parameter named '{name}'")]
    Undeclared { prompt: String, name: String },

    #[error("parameter '{name}' of prompt '{prompt}' cannot be read as the requested type: {reason}")]
    Type { prompt: String, name: String, reason: String },
}

/// The positional argument list a handler is called with.
#[derive(Debug, Clone)]
pub struct BoundArguments {
    prompt: String,
    parameters: Arc<[ParameterSpec]>,
    values: Vec<BoundValue>,
}

impl BoundArguments {
    /// Name of the prompt being invoked.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Bound values in declaration order.
    pub fn positional(&self) -> &[BoundValue] {
        &self.values
    }

    /// Raw JSON value bound to `name`.
    pub fn value(&self, name: &str) -> Option<&Value> {
        let index = self.parameters.iter().position(|parameter| parameter.name() == name)?;
        match self.values.get(index)? {
            BoundValue::Value(value) => Some(value),
            BoundValue::Cancellation(_) => None,
        }
    }

    /// Deserialize the value bound to `name` into `T`.
    ///
    /// Optional parameters bound as `null` read back as `None` when `T` is an
    /// `Option`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, ArgumentError> {
        let value = self.value(name).ok_or_else(|| ArgumentError::Undeclared {
            prompt: self.prompt.clone(),
            name: name.to_string(),
        })?;
        serde_json::from_value(value.clone()).map_err(|error| ArgumentError::Type {
            prompt: self.prompt.clone(),
            name: name.to_string(),
            reason: error.to_string(),
        })
    }

    /// Cancellation token bound to the trailing cancellation slot, if declared.
    pub fn cancellation(&self) -> Option<&CancellationToken> {
        match self.values.last()? {
            BoundValue::Cancellation(token) => Some(token),
            BoundValue::Value(_) => None,
        }
    }
}

/// Produce the positional argument list for `parameters` from a loosely typed
/// argument map.
///
/// Entries in `supplied` that match no declared parameter are ignored.
pub fn bind_arguments(
    prompt: &str,
    parameters: &Arc<[ParameterSpec]>,
    supplied: Option<&Map<String, Value>>,
    cancellation: &CancellationToken,
) -> Result<BoundArguments, DispatchError> {
    let mut values = Vec::with_capacity(parameters.len());

    for parameter in parameters.iter() {
        if parameter.is_cancellation() {
            values.push(BoundValue::Cancellation(cancellation.clone()));
            continue;
        }

        // Optional parameters always carry a default (null when none was declared).
        let bound = match (supplied.and_then(|map| map.get(parameter.name())), parameter.default_value()) {
            (Some(Value::Null), Some(default)) => default.clone(),
            (Some(value), _) => parameter.convert(value).map_err(|reason| {
                DispatchError::argument_conversion(prompt, parameter.name(), parameter.type_label(), reason)
            })?,
            (None, Some(default)) => default.clone(),
            (None, None) => return Err(DispatchError::missing_required_argument(prompt, parameter.name())),
        };
        values.push(BoundValue::Value(bound));
    }

    if let Some(map) = supplied {
        for key in map.keys() {
            if !parameters.iter().any(|parameter| !parameter.is_cancellation() && parameter.name() == key) {
                debug!(prompt, argument = %key, "ignoring undeclared argument");
            }
        }
    }

    Ok(BoundArguments {
        prompt: prompt.to_string(),
        parameters: Arc::clone(parameters),
        values,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::definition::Parameter;
    use crate::schema::build_schema;

    fn specs(parameters: &[Parameter]) -> Arc<[ParameterSpec]> {
        let (_, specs) = build_schema("test", parameters).expect("schema builds");
        specs.into()
    }

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    #[test]
    fn textual_integer_is_coerced() {
        let parameters = specs(&[Parameter::integer("count")]);
        let supplied = map(json!({ "count": "5" }));

        let bound = bind_arguments("test", &parameters, Some(&supplied), &CancellationToken::new()).expect("binds");

        assert_eq!(bound.get::<i64>("count").expect("integer"), 5);
    }

    #[test]
    fn unparsable_integer_is_a_conversion_failure() {
        let parameters = specs(&[Parameter::integer("count")]);
        let supplied = map(json!({ "count": "abc" }));

        let error = bind_arguments("test", &parameters, Some(&supplied), &CancellationToken::new()).expect_err("rejects");

        match error {
            DispatchError::ArgumentConversion { argument, expected, .. } => {
                assert_eq!(argument, "count");
                assert_eq!(expected, "integer");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_required_value_fails_before_binding_completes() {
        let parameters = specs(&[Parameter::text("text"), Parameter::integer("sentences").optional().default_value(3)]);

        let error = bind_arguments("summary", &parameters, None, &CancellationToken::new()).expect_err("rejects");

        assert_eq!(error, DispatchError::missing_required_argument("summary", "text"));
    }

    #[test]
    fn defaults_fill_absent_and_null_values() {
        let parameters = specs(&[Parameter::text("tone").default_value("neutral"), Parameter::text("audience").optional()]);
        let supplied = map(json!({ "tone": null }));

        let bound = bind_arguments("test", &parameters, Some(&supplied), &CancellationToken::new()).expect("binds");

        assert_eq!(bound.get::<String>("tone").expect("tone"), "neutral");
        assert_eq!(bound.get::<Option<String>>("audience").expect("audience"), None);
    }

    #[test]
    fn cancellation_comes_from_the_call_context() {
        let parameters = specs(&[Parameter::text("topic"), Parameter::cancellation("cancellation")]);
        let supplied = map(json!({ "topic": "rust", "cancellation": "ignored" }));
        let token = CancellationToken::new();

        let bound = bind_arguments("test", &parameters, Some(&supplied), &token).expect("binds");
        token.cancel();

        assert_eq!(bound.positional().len(), 2);
        assert!(bound.cancellation().is_some_and(CancellationToken::is_cancelled));
        assert!(bound.value("cancellation").is_none());
    }

    #[test]
    fn undeclared_accessor_names_are_reported() {
        let parameters = specs(&[Parameter::text("topic")]);
        let supplied = map(json!({ "topic": "rust" }));

        let bound = bind_arguments("test", &parameters, Some(&supplied), &CancellationToken::new()).expect("binds");

        assert!(matches!(bound.get::<String>("missing"), Err(ArgumentError::Undeclared { .. })));
        assert!(matches!(bound.get::<i64>("topic"), Err(ArgumentError::Type { .. })));
    }
}
