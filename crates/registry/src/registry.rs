//! Prompt catalog construction and lookup.
//!
//! Prompts are registered on a [`PromptRegistryBuilder`] during setup and
//! frozen into a read-only [`PromptRegistry`] by [`PromptRegistryBuilder::build`].
//! Names are unique ignoring case; lookups are case-insensitive as well.

use std::any::{Any, type_name};
use std::sync::Arc;

use cuecard_types::PromptDescriptor;
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::definition::{DefinitionFactory, PromptDefinition, PromptProvider};
use crate::error::{DispatchError, RegistryError};
use crate::handler::{HandlerBinding, OwnerRef, Receiver, ResultShape};
use crate::schema::build_schema;

/// A registered prompt: its published metadata and its runtime binding.
#[derive(Debug, Clone)]
pub struct PromptEntry {
    descriptor: PromptDescriptor,
    binding: HandlerBinding,
}

impl PromptEntry {
    /// Catalog metadata.
    pub fn descriptor(&self) -> &PromptDescriptor {
        &self.descriptor
    }

    /// Invocation details.
    pub fn binding(&self) -> &HandlerBinding {
        &self.binding
    }
}

/// Accumulates prompt registrations before the catalog is frozen.
#[derive(Debug, Default)]
pub struct PromptRegistryBuilder {
    entries: IndexMap<String, PromptEntry>,
}

impl PromptRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a free-standing prompt.
    pub fn register(&mut self, definition: PromptDefinition) -> Result<&mut Self, RegistryError> {
        self.register_callable(None, definition)
    }

    /// Register a prompt whose handler runs against `instance`.
    pub fn register_on_instance<T>(&mut self, instance: Arc<T>, definition: PromptDefinition) -> Result<&mut Self, RegistryError>
    where
        T: Send + Sync + 'static,
    {
        let owner: OwnerRef = instance;
        self.register_callable(Some(owner), definition)
    }

    /// Register a single definition with an optional owning instance.
    ///
    /// Fails with [`RegistryError::DuplicatePromptName`] when a prompt with the
    /// same name (ignoring case) already exists,
    /// [`RegistryError::MissingOwningInstance`] when an instance-bound
    /// definition has no owner of the declared type, and
    /// [`RegistryError::InvalidResultShape`] when the handler's result type is
    /// not `NormalizedResult` or `Vec<PromptMessage>`. A failed registration
    /// leaves the builder unchanged.
    pub fn register_callable(&mut self, owner: Option<OwnerRef>, definition: PromptDefinition) -> Result<&mut Self, RegistryError> {
        let (key, entry) = prepare_entry(owner, definition)?;
        if let Some(existing) = self.entries.get(&key) {
            return Err(RegistryError::duplicate_prompt_name(&entry.descriptor.name, &existing.descriptor.name));
        }
        info!(
            prompt = %entry.descriptor.name,
            arguments = entry.descriptor.arguments.len(),
            instance_bound = entry.binding.has_owner(),
            "registered prompt"
        );
        self.entries.insert(key, entry);
        Ok(self)
    }

    /// Register every prompt `T` declares.
    ///
    /// Instance-bound definitions run against `instance`; if any of them is
    /// declared but `instance` is `None`, nothing is registered.
    pub fn register_all_on<T: PromptProvider>(&mut self, instance: Option<Arc<T>>) -> Result<&mut Self, RegistryError> {
        let owner = instance.map(|instance| instance as OwnerRef);
        let definitions = T::prompt_definitions();
        debug!(provider = type_name::<T>(), count = definitions.len(), "registering provider prompts");
        self.register_batch(owner, definitions)
    }

    /// Register every definition produced by a static registration table.
    pub fn register_table(&mut self, table: &[DefinitionFactory]) -> Result<&mut Self, RegistryError> {
        let definitions = table.iter().flat_map(|factory| factory()).collect();
        self.register_batch(None, definitions)
    }

    /// Number of prompts registered so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze the catalog. No prompts can be added afterwards.
    pub fn build(self) -> PromptRegistry {
        info!(count = self.entries.len(), "prompt registry built");
        PromptRegistry { entries: self.entries }
    }

    fn register_batch(&mut self, owner: Option<OwnerRef>, definitions: Vec<PromptDefinition>) -> Result<&mut Self, RegistryError> {
        let mut staged: IndexMap<String, PromptEntry> = IndexMap::with_capacity(definitions.len());
        for definition in definitions {
            let (key, entry) = prepare_entry(owner.clone(), definition)?;
            if let Some(existing) = self.entries.get(&key).or_else(|| staged.get(&key)) {
                return Err(RegistryError::duplicate_prompt_name(&entry.descriptor.name, &existing.descriptor.name));
            }
            staged.insert(key, entry);
        }

        for (key, entry) in staged {
            info!(
                prompt = %entry.descriptor.name,
                arguments = entry.descriptor.arguments.len(),
                instance_bound = entry.binding.has_owner(),
                "registered prompt"
            );
            self.entries.insert(key, entry);
        }
        Ok(self)
    }
}

/// Validate a definition and build its catalog entry, keyed by lowercase name.
fn prepare_entry(owner: Option<OwnerRef>, definition: PromptDefinition) -> Result<(String, PromptEntry), RegistryError> {
    let PromptDefinition {
        name,
        description,
        result_description,
        parameters,
        receiver,
        result_type,
        invoker,
    } = definition;

    if name.trim().is_empty() {
        return Err(RegistryError::invalid_definition(name, "prompt name is empty"));
    }

    let result_shape = ResultShape::of(result_type).ok_or_else(|| RegistryError::invalid_result_shape(&name, result_type.name))?;

    let owner = match receiver {
        Receiver::Instance(expected) => match owner {
            Some(owner) if Any::type_id(&*owner) == expected.id => Some(owner),
            _ => return Err(RegistryError::missing_owning_instance(&name, expected.name)),
        },
        Receiver::Static => {
            if owner.is_some() {
                debug!(prompt = %name, "ignoring owning instance for free-standing prompt");
            }
            None
        }
    };

    let (arguments, specs) = build_schema(&name, &parameters)?;
    let descriptor = PromptDescriptor {
        name: name.clone(),
        description,
        arguments,
    };
    let binding = HandlerBinding::new(invoker, owner, specs, result_shape, result_description);

    Ok((name.to_lowercase(), PromptEntry { descriptor, binding }))
}

/// The frozen prompt catalog. Safe to share and query concurrently.
#[derive(Debug, Default)]
pub struct PromptRegistry {
    entries: IndexMap<String, PromptEntry>,
}

impl PromptRegistry {
    /// Snapshot of every descriptor in registration order.
    pub fn list_descriptors(&self) -> Vec<PromptDescriptor> {
        self.descriptors().cloned().collect()
    }

    /// Iterate descriptors in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &PromptDescriptor> {
        self.entries.values().map(PromptEntry::descriptor)
    }

    /// Look up a prompt ignoring case.
    pub fn get(&self, name: &str) -> Option<&PromptEntry> {
        self.entries.get(&name.to_lowercase())
    }

    /// Look up a prompt ignoring case, failing with [`DispatchError::UnknownPrompt`].
    pub fn resolve(&self, name: &str) -> Result<&PromptEntry, DispatchError> {
        self.get(name).ok_or_else(|| DispatchError::unknown_prompt(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
