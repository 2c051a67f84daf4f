// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Resource Model
//!
//! Identity, versioning and provenance types shared by every resource kind
//! the engine can register, validate and persist.
//!
//! # Architecture
//!
//! - **Layer:** Domain
//! - **Purpose:** Closed set of resource kinds plus a typed value union
//! - **Related:** [`crate::domain::repository::ResourceStore`] persists
//!   [`ResourceValue`]s under [`ResourceKey`]s
//!
//! Store values are never untyped maps: every kind has a concrete config type
//! and a matching [`ResourceValue`] variant, so adding a kind forces every
//! `match` over the union to be revisited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::agent::AgentConfig;
use crate::domain::knowledge::{EmbedderConfig, KnowledgeBaseConfig, VectorDbConfig};
use crate::domain::mcp::McpConfig;
use crate::domain::memory::MemoryConfig;
use crate::domain::model::ModelConfig;
use crate::domain::project::ProjectConfig;
use crate::domain::schedule::ScheduleConfig;
use crate::domain::schema::SchemaConfig;
use crate::domain::tool::ToolConfig;
use crate::domain::webhook::WebhookConfig;
use crate::domain::workflow::WorkflowConfig;

/// Every kind of resource the store can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Project,
    Workflow,
    Agent,
    Tool,
    KnowledgeBase,
    Memory,
    Mcp,
    Schema,
    Model,
    Schedule,
    Webhook,
    Meta,
    Embedder,
    VectorDb,
}

impl ResourceType {
    pub const ALL: [ResourceType; 14] = [
        ResourceType::Project,
        ResourceType::Workflow,
        ResourceType::Agent,
        ResourceType::Tool,
        ResourceType::KnowledgeBase,
        ResourceType::Memory,
        ResourceType::Mcp,
        ResourceType::Schema,
        ResourceType::Model,
        ResourceType::Schedule,
        ResourceType::Webhook,
        ResourceType::Meta,
        ResourceType::Embedder,
        ResourceType::VectorDb,
    ];

    /// Stable wire name used in store keys and YAML.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Project => "project",
            ResourceType::Workflow => "workflow",
            ResourceType::Agent => "agent",
            ResourceType::Tool => "tool",
            ResourceType::KnowledgeBase => "knowledge_base",
            ResourceType::Memory => "memory",
            ResourceType::Mcp => "mcp",
            ResourceType::Schema => "schema",
            ResourceType::Model => "model",
            ResourceType::Schedule => "schedule",
            ResourceType::Webhook => "webhook",
            ResourceType::Meta => "meta",
            ResourceType::Embedder => "embedder",
            ResourceType::VectorDb => "vector_db",
        }
    }

    /// Human readable label used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            ResourceType::KnowledgeBase => "knowledge base",
            ResourceType::VectorDb => "vector db",
            other => other.as_str(),
        }
    }

    /// Prefix used for dependency graph node ids (`agent:writer`).
    pub fn node_prefix(&self) -> &'static str {
        match self {
            ResourceType::KnowledgeBase => "knowledge",
            other => other.as_str(),
        }
    }

    /// Inverse of [`ResourceType::node_prefix`].
    pub fn from_node_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.node_prefix() == prefix)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ResourceError::InvalidField {
                field: "type".to_string(),
                reason: format!("unknown resource type '{}'", s),
            })
    }
}

/// Composite identity of a stored resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKey {
    pub project: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub id: String,
}

impl ResourceKey {
    pub fn new(
        project: impl Into<String>,
        resource_type: ResourceType,
        id: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            resource_type,
            id: id.into(),
        }
    }

    /// Key under which provenance metadata for `self` is stored.
    pub fn meta_key(&self) -> ResourceKey {
        ResourceKey::new(
            self.project.clone(),
            ResourceType::Meta,
            format!("{}:{}", self.resource_type, self.id),
        )
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.project, self.resource_type, self.id)
    }
}

/// Opaque version token used for optimistic concurrency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ETag(String);

impl ETag {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// SHA-256 over the canonical JSON encoding of `value`.
    pub fn compute(value: &ResourceValue) -> Result<Self, serde_json::Error> {
        let bytes = serde_json::to_vec(value)?;
        let digest = Sha256::digest(&bytes);
        Ok(Self(hex::encode(digest)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Structured `with` input attached to tasks, tools and agents.
pub type Input = BTreeMap<String, serde_json::Value>;

/// Where a resource definition came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetaSource {
    Sdk,
    Yaml,
}

impl MetaSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetaSource::Sdk => "sdk",
            MetaSource::Yaml => "yaml",
        }
    }
}

impl fmt::Display for MetaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance record stored next to every registered resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceMeta {
    pub source: MetaSource,
    pub actor: String,
    pub updated_at: DateTime<Utc>,
}

/// Typed union of everything the resource store can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "spec", rename_all = "snake_case")]
pub enum ResourceValue {
    Project(ProjectConfig),
    Workflow(WorkflowConfig),
    Agent(AgentConfig),
    Tool(ToolConfig),
    KnowledgeBase(KnowledgeBaseConfig),
    Memory(MemoryConfig),
    Mcp(McpConfig),
    Schema(SchemaConfig),
    Model(ModelConfig),
    Schedule(ScheduleConfig),
    Webhook(WebhookConfig),
    Meta(ResourceMeta),
    Embedder(EmbedderConfig),
    VectorDb(VectorDbConfig),
}

impl ResourceValue {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            ResourceValue::Project(_) => ResourceType::Project,
            ResourceValue::Workflow(_) => ResourceType::Workflow,
            ResourceValue::Agent(_) => ResourceType::Agent,
            ResourceValue::Tool(_) => ResourceType::Tool,
            ResourceValue::KnowledgeBase(_) => ResourceType::KnowledgeBase,
            ResourceValue::Memory(_) => ResourceType::Memory,
            ResourceValue::Mcp(_) => ResourceType::Mcp,
            ResourceValue::Schema(_) => ResourceType::Schema,
            ResourceValue::Model(_) => ResourceType::Model,
            ResourceValue::Schedule(_) => ResourceType::Schedule,
            ResourceValue::Webhook(_) => ResourceType::Webhook,
            ResourceValue::Meta(_) => ResourceType::Meta,
            ResourceValue::Embedder(_) => ResourceType::Embedder,
            ResourceValue::VectorDb(_) => ResourceType::VectorDb,
        }
    }
}

/// A value read back from the store together with its identity and version.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredItem {
    pub key: ResourceKey,
    pub value: ResourceValue,
    pub etag: ETag,
}

/// Structural validation failure of a single resource definition.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResourceError {
    #[error("{0} is required")]
    MissingField(String),

    #[error("invalid {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("duplicate task id {0}")]
    DuplicateTask(String),

    #[error("task {task} transitions to unknown task {target}")]
    UnknownTransition { task: String, target: String },
}

impl ResourceError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ResourceError::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Behaviour shared by every registrable resource config.
pub trait Resource: Clone + Send + Sync + 'static {
    const KIND: ResourceType;

    /// Trimmed identifier; empty when the definition has none.
    fn resource_id(&self) -> String;

    /// Kind-specific structural checks.
    fn validate(&self) -> Result<(), ResourceError>;

    fn into_value(self) -> ResourceValue;

    fn from_value(value: ResourceValue) -> Option<Self>;
}

macro_rules! impl_resource_value {
    ($config:ty, $variant:ident) => {
        impl From<$config> for ResourceValue {
            fn from(config: $config) -> Self {
                ResourceValue::$variant(config)
            }
        }
    };
}

impl_resource_value!(ProjectConfig, Project);
impl_resource_value!(WorkflowConfig, Workflow);
impl_resource_value!(AgentConfig, Agent);
impl_resource_value!(ToolConfig, Tool);
impl_resource_value!(KnowledgeBaseConfig, KnowledgeBase);
impl_resource_value!(MemoryConfig, Memory);
impl_resource_value!(McpConfig, Mcp);
impl_resource_value!(SchemaConfig, Schema);
impl_resource_value!(ModelConfig, Model);
impl_resource_value!(ScheduleConfig, Schedule);
impl_resource_value!(WebhookConfig, Webhook);
impl_resource_value!(ResourceMeta, Meta);
impl_resource_value!(EmbedderConfig, Embedder);
impl_resource_value!(VectorDbConfig, VectorDb);
