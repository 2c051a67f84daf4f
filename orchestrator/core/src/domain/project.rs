// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Project definition.
//!
//! The project is the namespace of every other resource: its name is the
//! `project` component of each [`ResourceKey`](crate::domain::resource::ResourceKey).
//! Project-scoped tools, memories and knowledge infrastructure are declared here.

use serde::{Deserialize, Serialize};

use crate::domain::knowledge::{
    EmbedderConfig, KnowledgeBaseConfig, KnowledgeBinding, VectorDbConfig,
};
use crate::domain::memory::MemoryConfig;
use crate::domain::resource::{Resource, ResourceError, ResourceType, ResourceValue};
use crate::domain::tool::ToolConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub memories: Vec<MemoryConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub knowledge_bases: Vec<KnowledgeBaseConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedders: Vec<EmbedderConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vector_dbs: Vec<VectorDbConfig>,

    /// Knowledge bases attached to every workflow of the project.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub knowledge: Vec<KnowledgeBinding>,
}

impl ProjectConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl Resource for ProjectConfig {
    const KIND: ResourceType = ResourceType::Project;

    fn resource_id(&self) -> String {
        self.name.trim().to_string()
    }

    fn validate(&self) -> Result<(), ResourceError> {
        if let Some(version) = &self.version {
            if version.trim().is_empty() {
                return Err(ResourceError::invalid("version", "cannot be blank"));
            }
        }
        for embedder in &self.embedders {
            if embedder.id.trim().is_empty() {
                return Err(ResourceError::MissingField("embedders[].id".to_string()));
            }
            if embedder.provider.trim().is_empty() || embedder.model.trim().is_empty() {
                return Err(ResourceError::invalid(
                    "embedders",
                    format!("embedder {} needs provider and model", embedder.id),
                ));
            }
        }
        for vector_db in &self.vector_dbs {
            if vector_db.id.trim().is_empty() {
                return Err(ResourceError::MissingField("vector_dbs[].id".to_string()));
            }
        }
        for kb in &self.knowledge_bases {
            kb.validate()?;
        }
        for memory in &self.memories {
            memory.validate()?;
        }
        Ok(())
    }

    fn into_value(self) -> ResourceValue {
        ResourceValue::Project(self)
    }

    fn from_value(value: ResourceValue) -> Option<Self> {
        match value {
            ResourceValue::Project(config) => Some(config),
            _ => None,
        }
    }
}
