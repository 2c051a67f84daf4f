// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-Memory Resource Store
//!
//! Process-local [`ResourceStore`] used in standalone mode and in tests.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** HashMap-backed storage with etag versioning and a broadcast
//!   change feed
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! Watchers subscribe to the broadcast channel before the snapshot is taken,
//! so no write between the two is lost; a write racing the snapshot may be
//! delivered twice. Closing the store drops the sender, which ends every open
//! watch stream.

use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

use crate::domain::repository::{
    ResourceStore, StoreError, StoreEvent, StoreEventStream, StoreEventType, StorePage,
};
use crate::domain::resource::{ETag, ResourceKey, ResourceType, ResourceValue, StoredItem};

const DEFAULT_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
struct Entry {
    value: ResourceValue,
    etag: ETag,
}

#[derive(Clone)]
pub struct MemoryResourceStore {
    items: Arc<RwLock<HashMap<ResourceKey, Entry>>>,
    events: Arc<Mutex<Option<broadcast::Sender<StoreEvent>>>>,
    closed: Arc<AtomicBool>,
}

impl Default for MemoryResourceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryResourceStore {
    pub fn new() -> Self {
        Self::with_event_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Capacity bounds how far a slow watcher may lag before events are dropped.
    pub fn with_event_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            items: Arc::new(RwLock::new(HashMap::new())),
            events: Arc::new(Mutex::new(Some(sender))),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    fn publish(&self, event_type: StoreEventType, key: &ResourceKey, etag: &ETag) {
        let guard = self.events.lock();
        let Some(sender) = guard.as_ref() else {
            return;
        };
        let event = StoreEvent {
            event_type,
            key: key.clone(),
            etag: etag.clone(),
            at: Utc::now(),
        };
        if sender.send(event).is_err() {
            debug!(key = %key, "No watchers for store event");
        }
    }

    fn snapshot(&self, project: &str, resource_type: ResourceType) -> Vec<StoredItem> {
        let items = self.items.read();
        let mut out: Vec<StoredItem> = items
            .iter()
            .filter(|(k, _)| k.project == project && k.resource_type == resource_type)
            .map(|(k, e)| StoredItem {
                key: k.clone(),
                value: e.value.clone(),
                etag: e.etag.clone(),
            })
            .collect();
        out.sort_by(|a, b| a.key.id.cmp(&b.key.id));
        out
    }
}

#[async_trait]
impl ResourceStore for MemoryResourceStore {
    async fn get(&self, key: &ResourceKey) -> Result<(ResourceValue, ETag), StoreError> {
        self.ensure_open()?;
        let items = self.items.read();
        items
            .get(key)
            .map(|e| (e.value.clone(), e.etag.clone()))
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    async fn put(&self, key: &ResourceKey, value: ResourceValue) -> Result<ETag, StoreError> {
        self.ensure_open()?;
        let etag = ETag::compute(&value)?;
        self.items.write().insert(
            key.clone(),
            Entry {
                value,
                etag: etag.clone(),
            },
        );
        self.publish(StoreEventType::Put, key, &etag);
        Ok(etag)
    }

    async fn put_if_match(
        &self,
        key: &ResourceKey,
        value: ResourceValue,
        expected: &ETag,
    ) -> Result<ETag, StoreError> {
        self.ensure_open()?;
        let etag = ETag::compute(&value)?;
        {
            let mut items = self.items.write();
            match items.get(key) {
                Some(current) if expected.is_empty() || current.etag != *expected => {
                    return Err(StoreError::ETagMismatch {
                        key: key.clone(),
                        expected: expected.clone(),
                        actual: current.etag.clone(),
                    });
                }
                None if !expected.is_empty() => return Err(StoreError::NotFound(key.clone())),
                _ => {}
            }
            items.insert(
                key.clone(),
                Entry {
                    value,
                    etag: etag.clone(),
                },
            );
        }
        self.publish(StoreEventType::Put, key, &etag);
        Ok(etag)
    }

    async fn delete(&self, key: &ResourceKey) -> Result<(), StoreError> {
        self.ensure_open()?;
        let removed = self.items.write().remove(key);
        if let Some(entry) = removed {
            self.publish(StoreEventType::Delete, key, &entry.etag);
        }
        Ok(())
    }

    async fn list(
        &self,
        project: &str,
        resource_type: ResourceType,
    ) -> Result<Vec<ResourceKey>, StoreError> {
        self.ensure_open()?;
        Ok(self
            .snapshot(project, resource_type)
            .into_iter()
            .map(|item| item.key)
            .collect())
    }

    async fn list_with_values(
        &self,
        project: &str,
        resource_type: ResourceType,
    ) -> Result<Vec<StoredItem>, StoreError> {
        self.ensure_open()?;
        Ok(self.snapshot(project, resource_type))
    }

    async fn list_with_values_page(
        &self,
        project: &str,
        resource_type: ResourceType,
        offset: usize,
        limit: usize,
    ) -> Result<StorePage, StoreError> {
        self.ensure_open()?;
        let all = self.snapshot(project, resource_type);
        let total = all.len();
        // A zero limit returns everything after `offset`.
        let take = if limit == 0 { usize::MAX } else { limit };
        let items = all.into_iter().skip(offset).take(take).collect();
        Ok(StorePage { items, total })
    }

    async fn watch(
        &self,
        project: &str,
        resource_type: ResourceType,
    ) -> Result<StoreEventStream, StoreError> {
        self.ensure_open()?;
        let receiver = match self.events.lock().as_ref() {
            Some(sender) => sender.subscribe(),
            None => return Err(StoreError::Closed),
        };

        let now = Utc::now();
        let primed: Vec<StoreEvent> = self
            .snapshot(project, resource_type)
            .into_iter()
            .map(|item| StoreEvent {
                event_type: StoreEventType::Put,
                key: item.key,
                etag: item.etag,
                at: now,
            })
            .collect();

        let project = project.to_string();
        let live = BroadcastStream::new(receiver).filter_map(move |event| {
            let event = match event {
                Ok(event)
                    if event.key.project == project && event.key.resource_type == resource_type =>
                {
                    Some(event)
                }
                Ok(_) => None,
                Err(e) => {
                    warn!("Store watcher lagged: {}", e);
                    None
                }
            };
            futures::future::ready(event)
        });

        Ok(futures::stream::iter(primed).chain(live).boxed())
    }

    async fn close(&self) -> Result<(), StoreError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.events.lock().take();
        debug!("Memory resource store closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::AgentConfig;
    use crate::domain::tool::ToolConfig;
    use std::time::Duration;

    fn agent_key(id: &str) -> ResourceKey {
        ResourceKey::new("demo", ResourceType::Agent, id)
    }

    fn agent(id: &str, instructions: &str) -> ResourceValue {
        AgentConfig::new(id, instructions).into()
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = MemoryResourceStore::new();
        let err = store.get(&agent_key("nobody")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_put_returns_stable_etag() {
        let store = MemoryResourceStore::new();
        let first = store.put(&agent_key("a"), agent("a", "x")).await.unwrap();
        let again = store.put(&agent_key("a"), agent("a", "x")).await.unwrap();
        let changed = store.put(&agent_key("a"), agent("a", "y")).await.unwrap();

        assert_eq!(first, again);
        assert_ne!(first, changed);
        let (_, etag) = store.get(&agent_key("a")).await.unwrap();
        assert_eq!(etag, changed);
    }

    #[tokio::test]
    async fn test_put_if_match_semantics() {
        let store = MemoryResourceStore::new();
        let key = agent_key("a");

        // Empty etag creates only when absent
        let created = store.put_if_match(&key, agent("a", "x"), &ETag::default()).await.unwrap();
        let dup = store.put_if_match(&key, agent("a", "y"), &ETag::default()).await;
        assert!(matches!(dup, Err(StoreError::ETagMismatch { .. })));

        let stale = store.put_if_match(&key, agent("a", "y"), &ETag::new("stale")).await;
        assert!(matches!(stale, Err(StoreError::ETagMismatch { .. })));

        let updated = store.put_if_match(&key, agent("a", "y"), &created).await.unwrap();
        assert_ne!(updated, created);

        let missing = store
            .put_if_match(&agent_key("b"), agent("b", "x"), &created)
            .await;
        assert!(matches!(missing, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_is_scoped_and_paginated() {
        let store = MemoryResourceStore::new();
        for id in ["c", "a", "b"] {
            store.put(&agent_key(id), agent(id, "x")).await.unwrap();
        }
        store
            .put(
                &ResourceKey::new("other", ResourceType::Agent, "z"),
                agent("z", "x"),
            )
            .await
            .unwrap();
        store
            .put(
                &ResourceKey::new("demo", ResourceType::Tool, "t"),
                ToolConfig::reference("t").into(),
            )
            .await
            .unwrap();

        let keys = store.list("demo", ResourceType::Agent).await.unwrap();
        let ids: Vec<&str> = keys.iter().map(|k| k.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let page = store
            .list_with_values_page("demo", ResourceType::Agent, 1, 1)
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].key.id, "b");

        let tail = store
            .list_with_values_page("demo", ResourceType::Agent, 2, 0)
            .await
            .unwrap();
        assert_eq!(tail.items.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryResourceStore::new();
        store.put(&agent_key("a"), agent("a", "x")).await.unwrap();
        store.delete(&agent_key("a")).await.unwrap();
        store.delete(&agent_key("a")).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_watch_primes_then_streams() {
        let store = MemoryResourceStore::new();
        store.put(&agent_key("a"), agent("a", "x")).await.unwrap();

        let mut events = store.watch("demo", ResourceType::Agent).await.unwrap();
        let primed = events.next().await.unwrap();
        assert_eq!(primed.event_type, StoreEventType::Put);
        assert_eq!(primed.key.id, "a");

        // Other kinds are filtered out
        store
            .put(
                &ResourceKey::new("demo", ResourceType::Tool, "t"),
                ToolConfig::reference("t").into(),
            )
            .await
            .unwrap();
        store.delete(&agent_key("a")).await.unwrap();

        let next = tokio::time::timeout(Duration::from_secs(1), events.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(next.event_type, StoreEventType::Delete);
        assert_eq!(next.key.id, "a");
    }

    #[tokio::test]
    async fn test_close_rejects_operations_and_ends_watchers() {
        let store = MemoryResourceStore::new();
        let mut events = store.watch("demo", ResourceType::Agent).await.unwrap();

        store.close().await.unwrap();
        store.close().await.unwrap();

        let err = store.get(&agent_key("a")).await.unwrap_err();
        assert_eq!(err.to_string(), "store is closed");
        assert!(store.put(&agent_key("a"), agent("a", "x")).await.is_err());

        let end = tokio::time::timeout(Duration::from_secs(1), events.next())
            .await
            .unwrap();
        assert!(end.is_none());
    }
}
