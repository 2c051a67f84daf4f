// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};

use crate::domain::resource::{Resource, ResourceError, ResourceType, ResourceValue};

/// Named JSON schema reusable by tools and tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    pub id: String,
    pub schema: serde_json::Value,
}

impl SchemaConfig {
    pub fn new(id: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            schema,
        }
    }
}

impl Resource for SchemaConfig {
    const KIND: ResourceType = ResourceType::Schema;

    fn resource_id(&self) -> String {
        self.id.trim().to_string()
    }

    fn validate(&self) -> Result<(), ResourceError> {
        let body = self
            .schema
            .as_object()
            .ok_or_else(|| ResourceError::invalid("schema", "must be a JSON object"))?;
        if let Some(kind) = body.get("type") {
            if !kind.is_string() && !kind.is_array() {
                return Err(ResourceError::invalid("schema.type", "must be a string or array"));
            }
        }
        Ok(())
    }

    fn into_value(self) -> ResourceValue {
        ResourceValue::Schema(self)
    }

    fn from_value(value: ResourceValue) -> Option<Self> {
        match value {
            ResourceValue::Schema(config) => Some(config),
            _ => None,
        }
    }
}
