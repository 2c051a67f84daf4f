// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Knowledge bases and the embedders / vector databases they depend on.

use serde::{Deserialize, Serialize};

use crate::domain::resource::{Resource, ResourceError, ResourceType, ResourceValue};

/// When the documents of a knowledge base are ingested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestMode {
    #[default]
    Manual,
    OnStart,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseConfig {
    pub id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Id of the embedder used to vectorise documents.
    #[serde(default)]
    pub embedder: String,

    /// Id of the vector database holding the embeddings.
    #[serde(default)]
    pub vector_db: String,

    #[serde(default)]
    pub ingest: IngestMode,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<KnowledgeSource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSource {
    #[serde(rename = "type")]
    pub source_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Attachment of a knowledge base to a project, workflow, task or agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBinding {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

impl KnowledgeBinding {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            top_k: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedderConfig {
    pub id: String,
    pub provider: String,
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorDbConfig {
    pub id: String,

    #[serde(rename = "type")]
    pub db_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dsn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<u32>,
}

impl KnowledgeBaseConfig {
    pub fn new(
        id: impl Into<String>,
        embedder: impl Into<String>,
        vector_db: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            embedder: embedder.into(),
            vector_db: vector_db.into(),
            ..Default::default()
        }
    }
}

impl Resource for KnowledgeBaseConfig {
    const KIND: ResourceType = ResourceType::KnowledgeBase;

    fn resource_id(&self) -> String {
        self.id.trim().to_string()
    }

    fn validate(&self) -> Result<(), ResourceError> {
        if self.embedder.trim().is_empty() {
            return Err(ResourceError::MissingField("embedder".to_string()));
        }
        if self.vector_db.trim().is_empty() {
            return Err(ResourceError::MissingField("vector_db".to_string()));
        }
        for source in &self.sources {
            if source.path.is_none() && source.url.is_none() {
                return Err(ResourceError::invalid(
                    "sources",
                    format!("{} source needs a path or url", source.source_type),
                ));
            }
        }
        Ok(())
    }

    fn into_value(self) -> ResourceValue {
        ResourceValue::KnowledgeBase(self)
    }

    fn from_value(value: ResourceValue) -> Option<Self> {
        match value {
            ResourceValue::KnowledgeBase(config) => Some(config),
            _ => None,
        }
    }
}
