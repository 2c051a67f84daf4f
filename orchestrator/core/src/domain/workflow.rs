// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Workflow Domain Model
//!
//! A workflow is an ordered list of tasks. Each task binds an agent or a tool,
//! may attach knowledge and memory, and names the task that follows it on
//! success or on error.
//!
//! # Architecture
//!
//! - **Layer:** Domain
//! - **Purpose:** Workflow and task definitions with structural invariants
//! - **Related:** [`crate::domain::graph`] turns workflows into dependency edges
//!
//! # Workflow calls
//!
//! A task whose tool is one of the built-in call-workflow tools depends on
//! other workflows. The targets are read from the structured `with` input:
//!
//! ```yaml
//! tasks:
//!   - id: delegate
//!     tool: { id: cp__call_workflow }
//!     with: { workflow_id: summarize }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::agent::AgentConfig;
use crate::domain::knowledge::{KnowledgeBaseConfig, KnowledgeBinding};
use crate::domain::resource::{Input, Resource, ResourceError, ResourceType, ResourceValue};
use crate::domain::schema::SchemaConfig;
use crate::domain::tool::{workflow_call_targets, ToolConfig, CALL_WORKFLOW_TOOL};
#[cfg(test)]
use crate::domain::tool::CALL_WORKFLOWS_TOOL;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Agents scoped to this workflow.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agents: Vec<AgentConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub knowledge_bases: Vec<KnowledgeBaseConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub knowledge: Vec<KnowledgeBinding>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schemas: Vec<SchemaConfig>,

    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<ToolConfig>,

    /// Action to invoke on the bound agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with: Option<Input>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub knowledge: Vec<KnowledgeBinding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_ref: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_success: Option<Transition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_error: Option<Transition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

impl Transition {
    pub fn to(next: impl Into<String>) -> Self {
        Self {
            next: Some(next.into()),
        }
    }

    /// Trimmed target, `None` when blank.
    pub fn target(&self) -> Option<&str> {
        self.next.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

impl WorkflowConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_task(mut self, task: TaskConfig) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn task(&self, id: &str) -> Option<&TaskConfig> {
        self.tasks.iter().find(|t| t.id.trim() == id)
    }

    /// Every workflow id this workflow calls, in task order, de-duplicated.
    pub fn called_workflows(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.tasks
            .iter()
            .flat_map(TaskConfig::called_workflows)
            .filter(|id| seen.insert(id.clone()))
            .collect()
    }
}

impl TaskConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_agent(mut self, agent: AgentConfig) -> Self {
        self.agent = Some(agent);
        self
    }

    pub fn with_tool(mut self, tool: ToolConfig) -> Self {
        self.tool = Some(tool);
        self
    }

    pub fn with_input(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.with.get_or_insert_with(Input::new).insert(key.into(), value);
        self
    }

    pub fn on_success(mut self, next: impl Into<String>) -> Self {
        self.on_success = Some(Transition::to(next));
        self
    }

    pub fn on_error(mut self, next: impl Into<String>) -> Self {
        self.on_error = Some(Transition::to(next));
        self
    }

    /// Task that invokes another workflow through `cp__call_workflow`.
    pub fn call_workflow(id: impl Into<String>, workflow_id: impl Into<String>) -> Self {
        Self::new(id)
            .with_tool(ToolConfig::reference(CALL_WORKFLOW_TOOL))
            .with_input("workflow_id", serde_json::Value::String(workflow_id.into()))
    }

    /// Input used to resolve workflow-call targets: the task's own `with`,
    /// falling back to the tool's.
    fn call_input(&self) -> Option<&Input> {
        self.with
            .as_ref()
            .or_else(|| self.tool.as_ref().and_then(|t| t.with.as_ref()))
    }

    /// Workflow ids reached through a built-in call-workflow tool.
    pub fn called_workflows(&self) -> Vec<String> {
        match (&self.tool, self.call_input()) {
            (Some(tool), Some(input)) => workflow_call_targets(&tool.id, input),
            _ => Vec::new(),
        }
    }

    /// Targets of the success and error transitions.
    pub fn transitions(&self) -> impl Iterator<Item = &str> {
        self.on_success
            .iter()
            .chain(self.on_error.iter())
            .filter_map(Transition::target)
    }
}

impl Resource for WorkflowConfig {
    const KIND: ResourceType = ResourceType::Workflow;

    fn resource_id(&self) -> String {
        self.id.trim().to_string()
    }

    fn validate(&self) -> Result<(), ResourceError> {
        if self.tasks.is_empty() {
            return Err(ResourceError::MissingField("tasks".to_string()));
        }

        let mut seen = HashSet::new();
        for task in &self.tasks {
            let task_id = task.id.trim();
            if task_id.is_empty() {
                return Err(ResourceError::MissingField("task id".to_string()));
            }
            if !seen.insert(task_id) {
                return Err(ResourceError::DuplicateTask(task_id.to_string()));
            }
            if let Some(agent) = &task.agent {
                if !agent.is_reference() {
                    agent.validate_definition()?;
                }
            }
            if let Some(tool) = &task.tool {
                tool.validate()?;
            }
        }

        for task in &self.tasks {
            for target in task.transitions() {
                if !seen.contains(target) {
                    return Err(ResourceError::UnknownTransition {
                        task: task.id.trim().to_string(),
                        target: target.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn into_value(self) -> ResourceValue {
        ResourceValue::Workflow(self)
    }

    fn from_value(value: ResourceValue) -> Option<Self> {
        match value {
            ResourceValue::Workflow(config) => Some(config),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn two_step() -> WorkflowConfig {
        WorkflowConfig::new("wf")
            .with_task(
                TaskConfig::new("step-start")
                    .with_agent(AgentConfig::reference("agent-x"))
                    .on_success("step-final"),
            )
            .with_task(TaskConfig::new("step-final").with_tool(ToolConfig::reference("tool-y")))
    }

    #[test]
    fn test_valid_workflow() {
        assert!(two_step().validate().is_ok());
    }

    #[test]
    fn test_workflow_requires_tasks() {
        let err = WorkflowConfig::new("wf").validate().unwrap_err();
        assert_eq!(err.to_string(), "tasks is required");
    }

    #[test]
    fn test_duplicate_task_id_rejected() {
        let wf = WorkflowConfig::new("wf")
            .with_task(TaskConfig::new("a"))
            .with_task(TaskConfig::new("a"));
        assert_eq!(wf.validate().unwrap_err(), ResourceError::DuplicateTask("a".into()));
    }

    #[test]
    fn test_unknown_transition_rejected() {
        let wf = WorkflowConfig::new("wf").with_task(TaskConfig::new("a").on_error("missing"));
        assert!(matches!(
            wf.validate(),
            Err(ResourceError::UnknownTransition { .. })
        ));
    }

    #[test]
    fn test_called_workflows_single_and_batch() {
        let single = TaskConfig::call_workflow("delegate", "summarize");
        assert_eq!(single.called_workflows(), vec!["summarize".to_string()]);

        let batch = TaskConfig::new("fan-out")
            .with_tool(ToolConfig::reference(CALL_WORKFLOWS_TOOL))
            .with_input(
                "workflows",
                json!([{ "workflow_id": "a" }, { "workflow_id": " " }, { "workflow_id": "b" }]),
            );
        assert_eq!(batch.called_workflows(), vec!["a".to_string(), "b".to_string()]);

        let plain = TaskConfig::new("x").with_tool(ToolConfig::reference("search"));
        assert!(plain.called_workflows().is_empty());
    }

    #[test]
    fn test_call_input_falls_back_to_tool_with() {
        let mut tool = ToolConfig::reference(CALL_WORKFLOW_TOOL);
        tool.with = Some(Input::from([("workflow_id".to_string(), json!("child"))]));
        let task = TaskConfig::new("delegate").with_tool(tool);
        assert_eq!(task.called_workflows(), vec!["child".to_string()]);
    }
}
