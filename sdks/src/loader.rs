// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! YAML loading on the engine.
//!
//! `load_<kind>(path)` parses one file and registers it with provenance
//! source `yaml`; `load_<kind>s_from_dir(dir)` does the same for every YAML
//! file under `dir`, in path order, stopping at the first failure.

use serde::de::DeserializeOwned;
use std::path::Path;

use agentflow_core::domain::agent::AgentConfig;
use agentflow_core::domain::knowledge::KnowledgeBaseConfig;
use agentflow_core::domain::mcp::McpConfig;
use agentflow_core::domain::memory::MemoryConfig;
use agentflow_core::domain::model::ModelConfig;
use agentflow_core::domain::project::ProjectConfig;
use agentflow_core::domain::resource::{MetaSource, Resource};
use agentflow_core::domain::schedule::ScheduleConfig;
use agentflow_core::domain::schema::SchemaConfig;
use agentflow_core::domain::tool::ToolConfig;
use agentflow_core::domain::webhook::WebhookConfig;
use agentflow_core::domain::workflow::WorkflowConfig;
use agentflow_core::infrastructure::resource_loader::{load_resource, load_resources_from_dir};

use crate::engine::Engine;
use crate::error::EngineError;

macro_rules! yaml_loaders {
    ($($single:ident, $many:ident => $config:ty;)+) => {
        impl Engine {
            $(
                pub async fn $single(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
                    self.load_file::<$config>(path.as_ref()).await
                }

                /// Returns the number of resources registered.
                pub async fn $many(&self, dir: impl AsRef<Path>) -> Result<usize, EngineError> {
                    self.load_dir::<$config>(dir.as_ref()).await
                }
            )+
        }
    };
}

yaml_loaders! {
    load_project, load_projects_from_dir => ProjectConfig;
    load_workflow, load_workflows_from_dir => WorkflowConfig;
    load_agent, load_agents_from_dir => AgentConfig;
    load_tool, load_tools_from_dir => ToolConfig;
    load_knowledge_base, load_knowledge_bases_from_dir => KnowledgeBaseConfig;
    load_memory, load_memories_from_dir => MemoryConfig;
    load_mcp, load_mcps_from_dir => McpConfig;
    load_schema, load_schemas_from_dir => SchemaConfig;
    load_model, load_models_from_dir => ModelConfig;
    load_schedule, load_schedules_from_dir => ScheduleConfig;
    load_webhook, load_webhooks_from_dir => WebhookConfig;
}

impl Engine {
    async fn load_file<T>(&self, path: &Path) -> Result<(), EngineError>
    where
        T: Resource + DeserializeOwned,
    {
        let config = load_resource::<T>(path).map_err(|e| load_error::<T>(path, e))?;
        self.register(config, MetaSource::Yaml).await
    }

    async fn load_dir<T>(&self, dir: &Path) -> Result<usize, EngineError>
    where
        T: Resource + DeserializeOwned,
    {
        let loaded = load_resources_from_dir::<T>(dir).map_err(|e| load_error::<T>(dir, e))?;
        let count = loaded.len();
        for (_, config) in loaded {
            self.register(config, MetaSource::Yaml).await?;
        }
        Ok(count)
    }
}

fn load_error<T: Resource>(path: &Path, err: anyhow::Error) -> EngineError {
    EngineError::Load {
        kind: T::KIND.label(),
        path: path.display().to_string(),
        reason: format!("{:#}", err),
    }
}
