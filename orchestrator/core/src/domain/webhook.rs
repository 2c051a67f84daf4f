// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};

use crate::domain::resource::{Resource, ResourceError, ResourceType, ResourceValue};

/// Inbound HTTP trigger. Identified by its slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub slug: String,

    #[serde(default = "default_method")]
    pub method: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<WebhookEvent>,
}

/// Maps an inbound event to the workflow it starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub name: String,
    pub workflow_id: String,

    /// Optional filter expression evaluated against the payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

fn default_method() -> String {
    "POST".to_string()
}

impl WebhookConfig {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            method: default_method(),
            events: Vec::new(),
        }
    }

    pub fn with_event(mut self, name: impl Into<String>, workflow_id: impl Into<String>) -> Self {
        self.events.push(WebhookEvent {
            name: name.into(),
            workflow_id: workflow_id.into(),
            filter: None,
        });
        self
    }
}

impl Resource for WebhookConfig {
    const KIND: ResourceType = ResourceType::Webhook;

    fn resource_id(&self) -> String {
        self.slug.trim().to_string()
    }

    fn validate(&self) -> Result<(), ResourceError> {
        match self.method.to_ascii_uppercase().as_str() {
            "POST" | "PUT" | "PATCH" | "GET" => {}
            other => {
                return Err(ResourceError::invalid(
                    "method",
                    format!("unsupported method {}", other),
                ));
            }
        }
        for event in &self.events {
            if event.name.trim().is_empty() {
                return Err(ResourceError::MissingField("events[].name".to_string()));
            }
            if event.workflow_id.trim().is_empty() {
                return Err(ResourceError::MissingField("events[].workflow_id".to_string()));
            }
        }
        Ok(())
    }

    fn into_value(self) -> ResourceValue {
        ResourceValue::Webhook(self)
    }

    fn from_value(value: ResourceValue) -> Option<Self> {
        match value {
            ResourceValue::Webhook(config) => Some(config),
            _ => None,
        }
    }
}
