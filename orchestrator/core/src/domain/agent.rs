// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Agent definitions.
//!
//! An agent either *declares* a full definition (instructions, model, tools)
//! or *references* an agent registered elsewhere by carrying only its `id`.

use serde::{Deserialize, Serialize};

use crate::domain::knowledge::KnowledgeBinding;
use crate::domain::resource::{Input, Resource, ResourceError, ResourceType, ResourceValue};
use crate::domain::tool::ToolConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub instructions: String,

    /// Model reference in `provider:model` form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub knowledge: Vec<KnowledgeBinding>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub memory: Vec<MemoryReference>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<AgentAction>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with: Option<Input>,
}

/// Binding from an agent to a memory resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryReference {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// Named prompt an agent can be asked to perform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentAction {
    pub id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prompt: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with: Option<Input>,
}

impl AgentConfig {
    /// Id-only agent pointing at a definition registered elsewhere.
    pub fn reference(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn new(id: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            instructions: instructions.into(),
            ..Default::default()
        }
    }

    /// True when the config carries nothing but an id.
    pub fn is_reference(&self) -> bool {
        !self.id.trim().is_empty()
            && self.instructions.trim().is_empty()
            && self.model.is_none()
            && self.with.as_ref().map_or(true, |w| w.is_empty())
            && self.tools.is_empty()
            && self.knowledge.is_empty()
            && self.memory.is_empty()
            && self.actions.is_empty()
    }

    /// Checks applied to an inline definition embedded in a workflow or task.
    pub fn validate_definition(&self) -> Result<(), ResourceError> {
        if self.instructions.trim().is_empty() {
            return Err(ResourceError::MissingField("instructions".to_string()));
        }
        if let Some(model) = &self.model {
            if model.trim().is_empty() {
                return Err(ResourceError::invalid("model", "model reference cannot be blank"));
            }
        }
        for tool in &self.tools {
            if tool.id.trim().is_empty() {
                return Err(ResourceError::MissingField("tools[].id".to_string()));
            }
        }
        for memory in &self.memory {
            if memory.id.trim().is_empty() {
                return Err(ResourceError::MissingField("memory[].id".to_string()));
            }
        }
        for action in &self.actions {
            if action.id.trim().is_empty() {
                return Err(ResourceError::MissingField("actions[].id".to_string()));
            }
        }
        Ok(())
    }
}

impl Resource for AgentConfig {
    const KIND: ResourceType = ResourceType::Agent;

    fn resource_id(&self) -> String {
        self.id.trim().to_string()
    }

    fn validate(&self) -> Result<(), ResourceError> {
        self.validate_definition()
    }

    fn into_value(self) -> ResourceValue {
        ResourceValue::Agent(self)
    }

    fn from_value(value: ResourceValue) -> Option<Self> {
        match value {
            ResourceValue::Agent(config) => Some(config),
            _ => None,
        }
    }
}
