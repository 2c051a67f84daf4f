// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Tool definitions and the built-in workflow-call tools.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::resource::{Input, Resource, ResourceError, ResourceType, ResourceValue};

/// Built-in tool that invokes a single workflow (`with.workflow_id`).
pub const CALL_WORKFLOW_TOOL: &str = "cp__call_workflow";

/// Built-in tool that invokes several workflows (`with.workflows[].workflow_id`).
pub const CALL_WORKFLOWS_TOOL: &str = "cp__call_workflows";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
    pub id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Runtime for inline code (`bun`, `deno`, ...)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub runtime: String,

    /// Inline source executed by the runtime.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub code: String,

    /// Execution timeout, humantime formatted (`30s`, `2m`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub timeout: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with: Option<Input>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Input>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
}

impl ToolConfig {
    pub fn reference(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Inline tool backed by source code.
    pub fn inline(
        id: impl Into<String>,
        runtime: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            runtime: runtime.into(),
            code: code.into(),
            ..Default::default()
        }
    }

    /// True when the config carries nothing but an id.
    pub fn is_reference(&self) -> bool {
        !self.id.trim().is_empty()
            && self.name.is_empty()
            && self.description.is_empty()
            && self.runtime.is_empty()
            && self.code.is_empty()
            && self.timeout.is_empty()
            && self.input_schema.is_none()
            && self.output_schema.is_none()
            && self.with.is_none()
            && self.config.is_none()
            && self.env.is_none()
    }

    pub fn has_inline_code(&self) -> bool {
        !self.code.trim().is_empty()
    }

    pub fn is_builtin(&self) -> bool {
        is_builtin_tool(self.id.trim())
    }
}

pub fn is_builtin_tool(id: &str) -> bool {
    matches!(id, CALL_WORKFLOW_TOOL | CALL_WORKFLOWS_TOOL)
}

/// Workflow ids a call-workflow tool invocation targets, read from its
/// structured input. Empty for any other tool.
pub fn workflow_call_targets(tool_id: &str, input: &Input) -> Vec<String> {
    match tool_id.trim() {
        CALL_WORKFLOW_TOOL => input
            .get("workflow_id")
            .and_then(non_blank_str)
            .into_iter()
            .collect(),
        CALL_WORKFLOWS_TOOL => input
            .get("workflows")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.get("workflow_id").and_then(non_blank_str))
                    .collect()
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn non_blank_str(value: &serde_json::Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl Resource for ToolConfig {
    const KIND: ResourceType = ResourceType::Tool;

    fn resource_id(&self) -> String {
        self.id.trim().to_string()
    }

    fn validate(&self) -> Result<(), ResourceError> {
        if !self.timeout.trim().is_empty() {
            humantime_serde::re::humantime::parse_duration(self.timeout.trim())
                .map_err(|e| ResourceError::invalid("timeout", e.to_string()))?;
        }
        if self.has_inline_code() && self.runtime.trim().is_empty() {
            return Err(ResourceError::MissingField("runtime".to_string()));
        }
        if let Some(schema) = &self.input_schema {
            if !schema.is_object() {
                return Err(ResourceError::invalid("input_schema", "must be an object"));
            }
        }
        if let Some(schema) = &self.output_schema {
            if !schema.is_object() {
                return Err(ResourceError::invalid("output_schema", "must be an object"));
            }
        }
        Ok(())
    }

    fn into_value(self) -> ResourceValue {
        ResourceValue::Tool(self)
    }

    fn from_value(value: ResourceValue) -> Option<Self> {
        match value {
            ResourceValue::Tool(config) => Some(config),
            _ => None,
        }
    }
}
