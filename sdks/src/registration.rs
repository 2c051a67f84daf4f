// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Resource registration on the engine.
//!
//! Every `register_<kind>` call runs the same pipeline:
//!
//! 1. trimmed id must be non-empty, then structural validation
//! 2. non-project kinds need a registered project
//! 3. in-process duplicate check
//! 4. with a store attached (the running one, or one supplied up front):
//!    store duplicate check, value write, provenance write; without one the
//!    resource is queued and seeded on start. A call made while start is
//!    running waits for it to finish.
//! 5. append to the in-process collections
//!
//! A failure at any step leaves the in-process state untouched. A failed
//! provenance write leaves the value in the store.

use tracing::{debug, info};

use agentflow_core::application::{PendingRegistration, RegistrationError, ResourceRegistrar};
use agentflow_core::domain::agent::AgentConfig;
use agentflow_core::domain::knowledge::KnowledgeBaseConfig;
use agentflow_core::domain::mcp::McpConfig;
use agentflow_core::domain::memory::MemoryConfig;
use agentflow_core::domain::model::ModelConfig;
use agentflow_core::domain::project::ProjectConfig;
use agentflow_core::domain::resource::{MetaSource, Resource, ResourceType};
use agentflow_core::domain::schedule::ScheduleConfig;
use agentflow_core::domain::schema::SchemaConfig;
use agentflow_core::domain::tool::ToolConfig;
use agentflow_core::domain::webhook::WebhookConfig;
use agentflow_core::domain::workflow::WorkflowConfig;

use crate::engine::Engine;
use crate::error::EngineError;

impl Engine {
    pub async fn register_project(&self, config: ProjectConfig) -> Result<(), EngineError> {
        self.register(config, MetaSource::Sdk).await
    }

    pub async fn register_workflow(&self, config: WorkflowConfig) -> Result<(), EngineError> {
        self.register(config, MetaSource::Sdk).await
    }

    pub async fn register_agent(&self, config: AgentConfig) -> Result<(), EngineError> {
        self.register(config, MetaSource::Sdk).await
    }

    pub async fn register_tool(&self, config: ToolConfig) -> Result<(), EngineError> {
        self.register(config, MetaSource::Sdk).await
    }

    pub async fn register_knowledge_base(
        &self,
        config: KnowledgeBaseConfig,
    ) -> Result<(), EngineError> {
        self.register(config, MetaSource::Sdk).await
    }

    pub async fn register_memory(&self, config: MemoryConfig) -> Result<(), EngineError> {
        self.register(config, MetaSource::Sdk).await
    }

    pub async fn register_mcp(&self, config: McpConfig) -> Result<(), EngineError> {
        self.register(config, MetaSource::Sdk).await
    }

    pub async fn register_schema(&self, config: SchemaConfig) -> Result<(), EngineError> {
        self.register(config, MetaSource::Sdk).await
    }

    pub async fn register_model(&self, config: ModelConfig) -> Result<(), EngineError> {
        self.register(config, MetaSource::Sdk).await
    }

    pub async fn register_schedule(&self, config: ScheduleConfig) -> Result<(), EngineError> {
        self.register(config, MetaSource::Sdk).await
    }

    pub async fn register_webhook(&self, config: WebhookConfig) -> Result<(), EngineError> {
        self.register(config, MetaSource::Sdk).await
    }

    pub(crate) async fn register<T: Resource>(
        &self,
        config: T,
        source: MetaSource,
    ) -> Result<(), EngineError> {
        let kind = T::KIND;
        let id = ResourceRegistrar::prepare(&config)?;
        let value = config.into_value();

        // A start in progress has already drained the queue but not yet
        // published its store. Waiting for it means the resource is either
        // queued before seeding or written to the store start publishes.
        let unpublished = self.external_store.is_none() && self.state.read().store.is_none();
        let _start = if unpublished {
            Some(self.start_lock.lock().await)
        } else {
            None
        };

        // Without a store the check, insert and queue happen under one lock.
        let (project, store) = {
            let mut state = self.state.write();
            let project = owning_project(&state.registry, kind, &id)?;
            if state.registry.contains(kind, &id) {
                return Err(RegistrationError::duplicate(kind, &id).into());
            }
            match state.store.clone().or_else(|| self.external_store.clone()) {
                Some(store) => (project, store),
                None => {
                    state.registry.insert(&id, value.clone())?;
                    state.registry.push_pending(&id, value, source);
                    debug!(kind = kind.as_str(), id = %id, "Resource queued until start");
                    return Ok(());
                }
            }
        };

        ResourceRegistrar::new(store)
            .persist(&project, &id, value.clone(), source)
            .await?;
        {
            let mut state = self.state.write();
            state.registry.insert(&id, value.clone())?;
            if self.external_store.is_none() {
                if state.store.is_some() {
                    state.written.push(PendingRegistration { id: id.clone(), value, source });
                } else {
                    // Stopped while the write was in flight
                    state.registry.push_pending(&id, value, source);
                }
            }
        }
        info!(
            kind = kind.as_str(),
            id = %id,
            project = %project,
            source = %source,
            "Resource registered"
        );
        Ok(())
    }
}

/// Project a resource of `kind` is stored under: its own name for the project
/// itself, otherwise the registered project.
fn owning_project(
    registry: &agentflow_core::application::ResourceRegistry,
    kind: ResourceType,
    id: &str,
) -> Result<String, RegistrationError> {
    if kind == ResourceType::Project {
        return Ok(id.to_string());
    }
    registry
        .project_name()
        .ok_or(RegistrationError::MissingProject(kind.label()))
}
