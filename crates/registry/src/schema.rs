//! Argument schema derivation from a prompt's declared parameters.

use std::collections::HashSet;
use std::fmt;

use cuecard_types::PromptArgument;
use serde_json::Value;

use crate::coercion::{Converter, ValueKind};
use crate::definition::Parameter;
use crate::error::RegistryError;

/// Per-parameter data the binder needs at invocation time.
#[derive(Clone)]
pub struct ParameterSpec {
    name: String,
    kind: ValueKind,
    type_label: String,
    converter: Converter,
    optional: bool,
    cancellation: bool,
    default: Option<Value>,
}

impl ParameterSpec {
    /// Parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type label used in conversion errors.
    pub fn type_label(&self) -> &str {
        &self.type_label
    }

    /// Whether this is the trailing cancellation slot.
    pub fn is_cancellation(&self) -> bool {
        self.cancellation
    }

    /// Value bound when the caller omits the parameter.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub(crate) fn convert(&self, value: &Value) -> Result<Value, String> {
        (self.converter)(value)
    }
}

impl fmt::Debug for ParameterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterSpec")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("type_label", &self.type_label)
            .field("optional", &self.optional)
            .field("cancellation", &self.cancellation)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

/// Whether callers must supply a value for `parameter`.
///
/// An explicit annotation wins. Otherwise `Option` parameters are optional,
/// scalar parameters are required, and anything else is required unless it
/// has a default.
pub fn infer_required(parameter: &Parameter) -> bool {
    if let Some(required) = parameter.required {
        return required;
    }
    if parameter.optional {
        return false;
    }
    if parameter.kind.is_value_shaped() {
        return true;
    }
    parameter.default.is_none()
}

/// Derive the published argument schema and the binder's parameter list.
///
/// A cancellation parameter is only accepted in the last position and never
/// appears in the published schema.
pub(crate) fn build_schema(prompt: &str, parameters: &[Parameter]) -> Result<(Vec<PromptArgument>, Vec<ParameterSpec>), RegistryError> {
    let mut seen = HashSet::new();
    let mut arguments = Vec::new();
    let mut specs = Vec::with_capacity(parameters.len());
    let last_index = parameters.len().saturating_sub(1);

    for (index, parameter) in parameters.iter().enumerate() {
        if parameter.name.trim().is_empty() {
            return Err(RegistryError::invalid_definition(prompt, format!("parameter {index} has an empty name")));
        }
        if !seen.insert(parameter.name.as_str()) {
            return Err(RegistryError::invalid_definition(
                prompt,
                format!("parameter '{}' is declared more than once", parameter.name),
            ));
        }

        let cancellation = parameter.kind == ValueKind::Cancellation;
        if cancellation && index != last_index {
            return Err(RegistryError::invalid_definition(
                prompt,
                format!("cancellation parameter '{}' must be the last parameter", parameter.name),
            ));
        }

        // Option parameters without an explicit default bind as null.
        let default = match (&parameter.default, parameter.optional) {
            (Some(value), _) => Some(value.clone()),
            (None, true) => Some(Value::Null),
            (None, false) => None,
        };

        if !cancellation {
            arguments.push(PromptArgument::new(
                parameter.name.clone(),
                parameter.description.clone(),
                infer_required(parameter),
            ));
        }
        specs.push(ParameterSpec {
            name: parameter.name.clone(),
            kind: parameter.kind,
            type_label: parameter.type_label.clone(),
            converter: parameter.converter,
            optional: parameter.optional,
            cancellation,
            default,
        });
    }

    Ok((arguments, specs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_parameters_infer_required_flags() {
        let parameters = vec![
            Parameter::text("text").description("Text to summarize"),
            Parameter::integer("sentences").optional().default_value(3),
        ];

        let (arguments, specs) = build_schema("summary", &parameters).expect("schema builds");

        assert_eq!(arguments.len(), 2);
        assert!(arguments[0].required);
        assert_eq!(arguments[0].description.as_deref(), Some("Text to summarize"));
        assert!(!arguments[1].required);
        assert_eq!(specs[1].default_value(), Some(&Value::from(3)));
    }

    #[test]
    fn scalars_stay_required_even_with_a_default() {
        assert!(infer_required(&Parameter::integer("count").default_value(3)));
        assert!(infer_required(&Parameter::boolean("verbose")));
    }

    #[test]
    fn reference_shaped_parameters_with_defaults_are_optional() {
        assert!(!infer_required(&Parameter::text("tone").default_value("neutral")));
        assert!(infer_required(&Parameter::text("tone")));
        assert!(infer_required(&Parameter::json("payload")));
    }

    #[test]
    fn explicit_annotation_overrides_inference() {
        assert!(!infer_required(&Parameter::integer("count").required(false)));
        assert!(infer_required(&Parameter::text("tone").optional().required(true)));
    }

    #[test]
    fn trailing_cancellation_is_excluded_from_the_schema() {
        let parameters = vec![Parameter::text("topic"), Parameter::cancellation("cancellation")];

        let (arguments, specs) = build_schema("brainstorm", &parameters).expect("schema builds");

        assert_eq!(arguments.iter().map(|argument| argument.name.as_str()).collect::<Vec<_>>(), vec!["topic"]);
        assert_eq!(specs.len(), 2);
        assert!(specs[1].is_cancellation());
    }

    #[test]
    fn cancellation_must_be_last() {
        let parameters = vec![Parameter::cancellation("cancellation"), Parameter::text("topic")];
        let error = build_schema("brainstorm", &parameters).expect_err("misplaced cancellation is rejected");
        assert!(matches!(error, RegistryError::InvalidDefinition { .. }));
    }

    #[test]
    fn duplicate_parameter_names_are_rejected() {
        let parameters = vec![Parameter::text("topic"), Parameter::integer("topic")];
        let error = build_schema("brainstorm", &parameters).expect_err("duplicate parameter is rejected");
        assert!(error.to_string().contains("more than once"));
    }

    #[test]
    fn optional_without_default_binds_null() {
        let (_, specs) = build_schema("review", &[Parameter::text("language").optional()]).expect("schema builds");
        assert_eq!(specs[0].default_value(), Some(&Value::Null));
    }
}
