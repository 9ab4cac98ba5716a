//! Registration-time annotations for prompts and their parameters.
//!
//! A [`PromptDefinition`] is the explicit replacement for marking a method as
//! a prompt: it carries the prompt name, optional description, the ordered
//! parameter list and the handler itself. Definitions are read once, when they
//! are registered on a [`crate::PromptRegistryBuilder`].

use std::any::type_name;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use cuecard_types::PromptOutput;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::binder::BoundArguments;
use crate::coercion::{Converter, ValueKind, structured_converter};
use crate::handler::{Invoker, Receiver, TypeTag, method_invoker, static_invoker};

/// Factory producing the definitions of a registration table.
pub type DefinitionFactory = fn() -> Vec<PromptDefinition>;

/// A type that declares a set of prompts, typically as methods on itself.
///
/// Register every declared prompt with
/// [`crate::PromptRegistryBuilder::register_all_on`].
pub trait PromptProvider: Send + Sync + 'static {
    /// Definitions of every prompt this type exposes.
    fn prompt_definitions() -> Vec<PromptDefinition>;
}

/// Annotation for a single formal parameter of a prompt handler.
#[derive(Clone)]
pub struct Parameter {
    pub(crate) name: String,
    pub(crate) kind: ValueKind,
    pub(crate) type_label: String,
    pub(crate) converter: Converter,
    pub(crate) description: Option<String>,
    pub(crate) required: Option<bool>,
    pub(crate) optional: bool,
    pub(crate) default: Option<Value>,
}

impl Parameter {
    fn of_kind(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            type_label: kind.label().to_string(),
            converter: kind.converter(),
            description: None,
            required: None,
            optional: false,
            default: None,
        }
    }

    /// A text parameter.
    pub fn text(name: impl Into<String>) -> Self {
        Self::of_kind(name, ValueKind::Text)
    }

    /// A signed integer parameter.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::of_kind(name, ValueKind::Integer)
    }

    /// A floating point parameter.
    pub fn float(name: impl Into<String>) -> Self {
        Self::of_kind(name, ValueKind::Float)
    }

    /// A boolean parameter.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::of_kind(name, ValueKind::Boolean)
    }

    /// A parameter accepting any JSON document.
    pub fn json(name: impl Into<String>) -> Self {
        Self::of_kind(name, ValueKind::Structured)
    }

    /// A parameter whose values must deserialize into `T`.
    pub fn structured<T: DeserializeOwned>(name: impl Into<String>) -> Self {
        let mut parameter = Self::of_kind(name, ValueKind::Structured);
        parameter.type_label = type_name::<T>().to_string();
        parameter.converter = structured_converter::<T>();
        parameter
    }

    /// The trailing cancellation slot, bound from the call context.
    pub fn cancellation(name: impl Into<String>) -> Self {
        Self::of_kind(name, ValueKind::Cancellation)
    }

    /// Describe the parameter for the catalog.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Override the inferred required flag.
    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    /// Wrap the parameter in `Option`; absent values bind as `null`.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Value bound when the caller omits the parameter.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared kind.
    pub fn kind(&self) -> ValueKind {
        self.kind
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("type_label", &self.type_label)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

/// A prompt ready for registration.
#[derive(Clone)]
pub struct PromptDefinition {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) result_description: Option<String>,
    pub(crate) parameters: Vec<Parameter>,
    pub(crate) receiver: Receiver,
    pub(crate) result_type: TypeTag,
    pub(crate) invoker: Invoker,
}

impl PromptDefinition {
    /// Start describing a prompt with the given name.
    pub fn builder(name: impl Into<String>) -> PromptDefinitionBuilder {
        PromptDefinitionBuilder {
            name: name.into(),
            description: None,
            result_description: None,
            parameters: Vec::new(),
        }
    }

    /// Prompt name as declared.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the handler needs an owning instance.
    pub fn is_instance_bound(&self) -> bool {
        matches!(self.receiver, Receiver::Instance(_))
    }
}

impl fmt::Debug for PromptDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .field("receiver", &self.receiver)
            .field("result_type", &self.result_type.name)
            .finish_non_exhaustive()
    }
}

/// Builder for [`PromptDefinition`]; finished by attaching a handler.
#[derive(Debug, Clone)]
pub struct PromptDefinitionBuilder {
    name: String,
    description: Option<String>,
    result_description: Option<String>,
    parameters: Vec<Parameter>,
}

impl PromptDefinitionBuilder {
    /// Describe the prompt for the catalog.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Description attached to results when the handler returns bare messages.
    pub fn result_description(mut self, description: impl Into<String>) -> Self {
        self.result_description = Some(description.into());
        self
    }

    /// Append a formal parameter.
    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Finish with a free-standing handler.
    pub fn handler<F, Fut, R>(self, function: F) -> PromptDefinition
    where
        F: Fn(BoundArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: Into<PromptOutput> + Send + 'static,
    {
        self.finish(Receiver::Static, TypeTag::of::<R>(), static_invoker(function))
    }

    /// Finish with a handler that runs against an owning instance of `T`.
    pub fn method<T, F, Fut, R>(self, method: F) -> PromptDefinition
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<T>, BoundArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: Into<PromptOutput> + Send + 'static,
    {
        self.finish(Receiver::Instance(TypeTag::of::<T>()), TypeTag::of::<R>(), method_invoker(method))
    }

    fn finish(self, receiver: Receiver, result_type: TypeTag, invoker: Invoker) -> PromptDefinition {
        PromptDefinition {
            name: self.name,
            description: self.description,
            result_description: self.result_description,
            parameters: self.parameters,
            receiver,
            result_type,
            invoker,
        }
    }
}
