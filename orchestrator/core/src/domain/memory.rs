// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};

use crate::domain::resource::{Resource, ResourceError, ResourceType, ResourceValue};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    #[default]
    TokenBased,
    MessageCountBased,
    Buffer,
}

/// Conversation memory shared between agents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfig {
    pub id: String,

    #[serde(rename = "type", default)]
    pub memory_type: MemoryType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_messages: Option<u32>,

    /// Persistence backend (`in_memory`, `redis`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistence: Option<String>,
}

impl MemoryConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

impl Resource for MemoryConfig {
    const KIND: ResourceType = ResourceType::Memory;

    fn resource_id(&self) -> String {
        self.id.trim().to_string()
    }

    fn validate(&self) -> Result<(), ResourceError> {
        match self.memory_type {
            MemoryType::TokenBased if self.max_tokens == Some(0) => {
                Err(ResourceError::invalid("max_tokens", "must be greater than zero"))
            }
            MemoryType::MessageCountBased if self.max_messages.unwrap_or(0) == 0 => {
                Err(ResourceError::MissingField("max_messages".to_string()))
            }
            _ => Ok(()),
        }
    }

    fn into_value(self) -> ResourceValue {
        ResourceValue::Memory(self)
    }

    fn from_value(value: ResourceValue) -> Option<Self> {
        match value {
            ResourceValue::Memory(config) => Some(config),
            _ => None,
        }
    }
}
