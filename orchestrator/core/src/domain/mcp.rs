// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::resource::{Resource, ResourceError, ResourceType, ResourceValue};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum McpTransport {
    #[default]
    Sse,
    StreamableHttp,
    Stdio,
}

/// Model Context Protocol server exposed to agents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McpConfig {
    pub id: String,

    #[serde(default)]
    pub transport: McpTransport,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl McpConfig {
    pub fn remote(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn stdio(id: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            transport: McpTransport::Stdio,
            command: Some(command.into()),
            ..Default::default()
        }
    }
}

impl Resource for McpConfig {
    const KIND: ResourceType = ResourceType::Mcp;

    fn resource_id(&self) -> String {
        self.id.trim().to_string()
    }

    fn validate(&self) -> Result<(), ResourceError> {
        let has_url = self.url.as_deref().is_some_and(|u| !u.trim().is_empty());
        let has_command = self.command.as_deref().is_some_and(|c| !c.trim().is_empty());
        match (has_url, has_command) {
            (true, true) => Err(ResourceError::invalid(
                "url",
                "url and command are mutually exclusive",
            )),
            (false, false) => Err(ResourceError::MissingField("url or command".to_string())),
            (true, false) if self.transport == McpTransport::Stdio => {
                Err(ResourceError::invalid("transport", "stdio transport requires a command"))
            }
            (false, true) if self.transport != McpTransport::Stdio => {
                Err(ResourceError::invalid("transport", "command requires the stdio transport"))
            }
            _ => Ok(()),
        }
    }

    fn into_value(self) -> ResourceValue {
        ResourceValue::Mcp(self)
    }

    fn from_value(value: ResourceValue) -> Option<Self> {
        match value {
            ResourceValue::Mcp(config) => Some(config),
            _ => None,
        }
    }
}
