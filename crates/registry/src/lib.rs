//! Prompt registry and dispatcher for Cuecard.
//!
//! Prompts are declared as [`PromptDefinition`]s, registered on a
//! [`PromptRegistryBuilder`], frozen into a [`PromptRegistry`] and served
//! through a [`PromptDispatcher`]. Registration derives each prompt's argument
//! schema and picks a converter per parameter; invocation binds a loosely
//! typed argument map against that schema, runs the handler and normalizes
//! its output.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use cuecard_registry::{BoundArguments, Parameter, PromptDefinition, PromptDispatcher, PromptRegistryBuilder};
//! use cuecard_types::PromptMessage;
//!
//! async fn summary(arguments: BoundArguments) -> anyhow::Result<Vec<PromptMessage>> {
//!     let text: String = arguments.get("text")?;
//!     let sentences: i64 = arguments.get("sentences")?;
//!     Ok(vec![PromptMessage::user(format!("Summarize in {sentences} sentences: {text}"))])
//! }
//!
//! let mut builder = PromptRegistryBuilder::new();
//! builder
//!     .register(
//!         PromptDefinition::builder("summary")
//!             .parameter(Parameter::text("text"))
//!             .parameter(Parameter::integer("sentences").optional().default_value(3))
//!             .handler(summary),
//!     )
//!     .expect("register summary");
//!
//! let dispatcher = PromptDispatcher::new(Arc::new(builder.build()));
//! let descriptors = dispatcher.list();
//! assert!(descriptors[0].arguments[0].required);
//! assert!(!descriptors[0].arguments[1].required);
//! ```

mod binder;
mod coercion;
mod definition;
mod dispatcher;
mod error;
mod handler;
mod registry;
mod schema;

pub use binder::{ArgumentError, BoundArguments, BoundValue, bind_arguments};
pub use coercion::{Converter, ValueKind, structured_converter};
pub use definition::{DefinitionFactory, Parameter, PromptDefinition, PromptDefinitionBuilder, PromptProvider};
pub use dispatcher::PromptDispatcher;
pub use error::{DispatchError, RegistryError};
pub use handler::{HandlerBinding, OwnerRef, ResultShape};
pub use registry::{PromptEntry, PromptRegistry, PromptRegistryBuilder};
pub use schema::{ParameterSpec, infer_required};
