//! Type-erased prompt handlers and the bindings that own them.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use anyhow::anyhow;
use cuecard_types::{NormalizedResult, PromptMessage, PromptOutput};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use crate::binder::BoundArguments;
use crate::schema::ParameterSpec;

/// Shared reference to the instance an instance-bound prompt is declared on.
pub type OwnerRef = Arc<dyn Any + Send + Sync>;

pub(crate) type HandlerFuture = BoxFuture<'static, anyhow::Result<PromptOutput>>;
pub(crate) type Invoker = Arc<dyn Fn(Option<OwnerRef>, BoundArguments) -> HandlerFuture + Send + Sync>;

/// Runtime identity of a Rust type, kept for registration checks and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TypeTag {
    pub(crate) id: TypeId,
    pub(crate) name: &'static str,
}

impl TypeTag {
    pub(crate) fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }
}

/// Whether a prompt handler needs an owning instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Receiver {
    Static,
    Instance(TypeTag),
}

/// The two result types a prompt handler may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    /// The handler builds a [`NormalizedResult`] itself.
    Normalized,
    /// The handler returns a bare `Vec<PromptMessage>`.
    Messages,
}

impl ResultShape {
    /// Normalize `output`, refusing a result whose variant differs from the
    /// declared shape.
    pub(crate) fn conform(self, output: PromptOutput, description: Option<&str>) -> Option<NormalizedResult> {
        match (self, output) {
            (ResultShape::Normalized, PromptOutput::Result(result)) => Some(result),
            (ResultShape::Messages, output @ PromptOutput::Messages(_)) => Some(output.normalize(description)),
            _ => None,
        }
    }

    /// Map a declared result type onto a sanctioned shape, if it is one.
    pub(crate) fn of(declared: TypeTag) -> Option<Self> {
        if declared.id == TypeId::of::<NormalizedResult>() {
            Some(ResultShape::Normalized)
        } else if declared.id == TypeId::of::<Vec<PromptMessage>>() {
            Some(ResultShape::Messages)
        } else {
            None
        }
    }
}

pub(crate) fn static_invoker<F, Fut, R>(function: F) -> Invoker
where
    F: Fn(BoundArguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    R: Into<PromptOutput> + Send + 'static,
{
    let function = Arc::new(function);
    Arc::new(move |_owner: Option<OwnerRef>, arguments: BoundArguments| {
        let function = Arc::clone(&function);
        async move {
            let output: R = function(arguments).await?;
            Ok::<PromptOutput, anyhow::Error>(output.into())
        }
        .boxed()
    })
}

pub(crate) fn method_invoker<T, F, Fut, R>(method: F) -> Invoker
where
    T: Send + Sync + 'static,
    F: Fn(Arc<T>, BoundArguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    R: Into<PromptOutput> + Send + 'static,
{
    let method = Arc::new(method);
    Arc::new(move |owner: Option<OwnerRef>, arguments: BoundArguments| {
        let method = Arc::clone(&method);
        async move {
            let instance = owner
                .and_then(|owner| owner.downcast::<T>().ok())
                .ok_or_else(|| anyhow!("owning instance of {} is not available", type_name::<T>()))?;
            let output: R = method(instance, arguments).await?;
            Ok::<PromptOutput, anyhow::Error>(output.into())
        }
        .boxed()
    })
}

/// Runtime linkage between a catalog entry and its callable.
///
/// Kept apart from [`cuecard_types::PromptDescriptor`] so the catalog can be
/// handed out without exposing invocation details.
#[derive(Clone)]
pub struct HandlerBinding {
    invoker: Invoker,
    owner: Option<OwnerRef>,
    parameters: Arc<[ParameterSpec]>,
    result_shape: ResultShape,
    result_description: Option<String>,
}

impl HandlerBinding {
    pub(crate) fn new(
        invoker: Invoker,
        owner: Option<OwnerRef>,
        parameters: Vec<ParameterSpec>,
        result_shape: ResultShape,
        result_description: Option<String>,
    ) -> Self {
        Self {
            invoker,
            owner,
            parameters: parameters.into(),
            result_shape,
            result_description,
        }
    }

    /// Formal parameters in declaration order, including a trailing
    /// cancellation slot when declared.
    pub fn parameters(&self) -> &Arc<[ParameterSpec]> {
        &self.parameters
    }

    /// The result type the handler declared.
    pub fn result_shape(&self) -> ResultShape {
        self.result_shape
    }

    /// Description applied to bare message results.
    pub fn result_description(&self) -> Option<&str> {
        self.result_description.as_deref()
    }

    /// Whether the handler is bound to an owning instance.
    pub fn has_owner(&self) -> bool {
        self.owner.is_some()
    }

    pub(crate) fn call(&self, arguments: BoundArguments) -> HandlerFuture {
        (self.invoker)(self.owner.clone(), arguments)
    }
}

impl fmt::Debug for HandlerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerBinding")
            .field("owner", &self.owner.is_some())
            .field("parameters", &self.parameters)
            .field("result_shape", &self.result_shape)
            .field("result_description", &self.result_description)
            .finish_non_exhaustive()
    }
}
