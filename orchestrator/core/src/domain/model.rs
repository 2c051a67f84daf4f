// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};

use crate::domain::resource::{Input, Resource, ResourceError, ResourceType, ResourceValue};

/// LLM provider/model pair. Identified as `provider:model`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub provider: String,
    pub model: String,

    /// Environment variable holding the provider API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Input>,
}

impl ModelConfig {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            ..Default::default()
        }
    }
}

impl Resource for ModelConfig {
    const KIND: ResourceType = ResourceType::Model;

    fn resource_id(&self) -> String {
        let provider = self.provider.trim();
        let model = self.model.trim();
        if provider.is_empty() && model.is_empty() {
            return String::new();
        }
        format!("{}:{}", provider, model)
    }

    fn validate(&self) -> Result<(), ResourceError> {
        if self.provider.trim().is_empty() {
            return Err(ResourceError::MissingField("provider".to_string()));
        }
        if self.model.trim().is_empty() {
            return Err(ResourceError::MissingField("model".to_string()));
        }
        Ok(())
    }

    fn into_value(self) -> ResourceValue {
        ResourceValue::Model(self)
    }

    fn from_value(value: ResourceValue) -> Option<Self> {
        match value {
            ResourceValue::Model(config) => Some(config),
            _ => None,
        }
    }
}
