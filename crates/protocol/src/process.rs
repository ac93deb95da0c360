//! Declarative metadata for server-side script processes.
//!
//! Scripts published as processes describe themselves with a title, a
//! description and typed inputs and outputs. Descriptors are plain records
//! attached to a registry entry, built up front instead of being injected
//! onto a callable at runtime.

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};

/// One named input or output of a process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name as seen by callers.
    pub name: String,
    /// Type tag understood by the server, e.g. `Geometry` or `float`.
    #[serde(rename = "type")]
    pub type_tag: String,
    /// Human readable description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Title, description, inputs and outputs of a process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessDescriptor {
    /// Registration name.
    pub name: String,
    /// Short title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Inputs in declaration order.
    #[serde(default)]
    pub inputs: Vec<Parameter>,
    /// Outputs in declaration order.
    #[serde(default)]
    pub outputs: Vec<Parameter>,
}

impl ProcessDescriptor {
    /// Start a descriptor for `name` with no metadata.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Set the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declare an input. Redeclaring a name replaces the earlier entry in place.
    pub fn input(
        mut self,
        name: impl Into<String>,
        type_tag: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        upsert(&mut self.inputs, name.into(), type_tag.into(), description.into());
        self
    }

    /// Declare an output. Redeclaring a name replaces the earlier entry in place.
    pub fn output(
        mut self,
        name: impl Into<String>,
        type_tag: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        upsert(&mut self.outputs, name.into(), type_tag.into(), description.into());
        self
    }

    /// Look up an input by name.
    pub fn find_input(&self, name: &str) -> Option<&Parameter> {
        self.inputs.iter().find(|p| p.name == name)
    }

    /// Look up an output by name.
    pub fn find_output(&self, name: &str) -> Option<&Parameter> {
        self.outputs.iter().find(|p| p.name == name)
    }
}

fn upsert(params: &mut Vec<Parameter>, name: String, type_tag: String, description: String) {
    let param = Parameter {
        name,
        type_tag,
        description,
    };
    match params.iter_mut().find(|p| p.name == param.name) {
        Some(existing) => *existing = param,
        None => params.push(param),
    }
}

/// Registry of process descriptors in registration order.
#[derive(Debug, Clone, Default)]
pub struct ProcessRegistry {
    entries: Vec<ProcessDescriptor>,
}

impl ProcessRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor; names must be unique.
    pub fn register(&mut self, descriptor: ProcessDescriptor) -> Result<()> {
        if self.get(&descriptor.name).is_some() {
            return Err(ProtocolError::DuplicateProcess {
                name: descriptor.name,
            });
        }
        self.entries.push(descriptor);
        Ok(())
    }

    /// Look up a descriptor by name.
    pub fn get(&self, name: &str) -> Option<&ProcessDescriptor> {
        self.entries.iter().find(|d| d.name == name)
    }

    /// Iterate descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ProcessDescriptor> {
        self.entries.iter()
    }

    /// Number of registered processes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
