// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Resource Store Interface
//!
//! Persistence contract for registered resources. The interface lives in the
//! domain layer; implementations live in `crate::infrastructure::repositories`.
//!
//! | Implementation | Backing | Selected by |
//! |----------------|---------|-------------|
//! | `MemoryResourceStore` | process memory | standalone mode (default) |
//! | provider-supplied store | Redis | distributed mode, `redis.standalone` |
//!
//! Every value is addressed by a [`ResourceKey`] and versioned by an [`ETag`].
//! `get`, `put` and `delete` must be safe for concurrent use; `put_if_match`
//! is the only compare-and-swap primitive.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::domain::resource::{ETag, ResourceKey, ResourceType, ResourceValue, StoredItem};

/// Storage backend selected at engine start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Redis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreEventType {
    Put,
    Delete,
}

/// Change notification emitted by [`ResourceStore::watch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreEvent {
    pub event_type: StoreEventType,
    pub key: ResourceKey,
    pub etag: ETag,
    pub at: DateTime<Utc>,
}

pub type StoreEventStream = BoxStream<'static, StoreEvent>;

/// Page of values returned by [`ResourceStore::list_with_values_page`].
#[derive(Debug, Clone, PartialEq)]
pub struct StorePage {
    pub items: Vec<StoredItem>,
    /// Number of items matching the query across all pages.
    pub total: usize,
}

#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Fetch a value and its current etag. Fails with [`StoreError::NotFound`].
    async fn get(&self, key: &ResourceKey) -> Result<(ResourceValue, ETag), StoreError>;

    /// Unconditional create-or-replace.
    async fn put(&self, key: &ResourceKey, value: ResourceValue) -> Result<ETag, StoreError>;

    /// Replace only when the stored etag equals `expected`. An empty
    /// `expected` means create-if-absent.
    async fn put_if_match(
        &self,
        key: &ResourceKey,
        value: ResourceValue,
        expected: &ETag,
    ) -> Result<ETag, StoreError>;

    async fn delete(&self, key: &ResourceKey) -> Result<(), StoreError>;

    /// Keys of one kind within a project, sorted by id.
    async fn list(
        &self,
        project: &str,
        resource_type: ResourceType,
    ) -> Result<Vec<ResourceKey>, StoreError>;

    async fn list_with_values(
        &self,
        project: &str,
        resource_type: ResourceType,
    ) -> Result<Vec<StoredItem>, StoreError>;

    async fn list_with_values_page(
        &self,
        project: &str,
        resource_type: ResourceType,
        offset: usize,
        limit: usize,
    ) -> Result<StorePage, StoreError>;

    /// Change feed for one kind within a project. The stream first replays a
    /// `Put` for every item already stored.
    async fn watch(
        &self,
        project: &str,
        resource_type: ResourceType,
    ) -> Result<StoreEventStream, StoreError>;

    /// Release backend resources. Subsequent calls fail with [`StoreError::Closed`].
    async fn close(&self) -> Result<(), StoreError>;
}

/// Resource store errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("resource not found: {0}")]
    NotFound(ResourceKey),

    #[error("etag mismatch for {key}: expected {expected}, found {actual}")]
    ETagMismatch {
        key: ResourceKey,
        expected: ETag,
        actual: ETag,
    },

    #[error("store is closed")]
    Closed,

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
