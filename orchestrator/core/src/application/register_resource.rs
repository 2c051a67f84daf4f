// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Register Resource Use Case
//!
//! Application service that persists a validated resource and its provenance
//! record.
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Responsibility:** Identity check, structural validation, duplicate
//!   detection and persistence of one resource
//! - **Collaborators:**
//!   - Domain: [`Resource`] configs (validation), [`ResourceStore`]
//!   - Infrastructure: [`write_meta`]
//!
//! # Flow
//!
//! 1. [`ResourceRegistrar::prepare`]: trimmed id must be non-empty, then the
//!    kind's structural validation runs
//! 2. `get` the key: `NotFound` proceeds, a hit is a duplicate, anything else
//!    is fatal
//! 3. `put` the value
//! 4. write provenance metadata
//!
//! Steps 3 and 4 are two separate writes. If the metadata write fails the
//! value stays stored without provenance; the caller sees the error and the
//! value is not rolled back.
//!
//! The existence check in step 2 is a plain `get`, so two concurrent
//! registrations of the same key can both pass it. `put_if_match` is not used
//! here.

use std::sync::Arc;
use tracing::debug;

use crate::domain::repository::{ResourceStore, StoreError};
use crate::domain::resource::{
    ETag, MetaSource, Resource, ResourceError, ResourceKey, ResourceType, ResourceValue,
};
use crate::infrastructure::meta::write_meta;

/// Why a registration was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistrationError {
    #[error("{0} id is required")]
    MissingId(&'static str),

    #[error("project is required for {0} registration")]
    MissingProject(&'static str),

    #[error("{kind} {id} validation failed: {source}")]
    Validation {
        kind: &'static str,
        id: String,
        source: ResourceError,
    },

    #[error("{kind} {id} already registered")]
    Duplicate { kind: &'static str, id: String },

    #[error("inspect {kind} {id} registration state: {source}")]
    Inspect {
        kind: &'static str,
        id: String,
        source: StoreError,
    },

    #[error("store {kind} {id}: {source}")]
    Store {
        kind: &'static str,
        id: String,
        source: StoreError,
    },

    #[error("write {kind} {id} metadata: {source}")]
    Metadata {
        kind: &'static str,
        id: String,
        source: StoreError,
    },
}

impl RegistrationError {
    pub fn duplicate(resource_type: ResourceType, id: impl Into<String>) -> Self {
        RegistrationError::Duplicate {
            kind: resource_type.label(),
            id: id.into(),
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, RegistrationError::Duplicate { .. })
    }
}

pub struct ResourceRegistrar {
    store: Arc<dyn ResourceStore>,
}

impl ResourceRegistrar {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self { store }
    }

    /// Identity and structural checks. Returns the trimmed id.
    pub fn prepare<T: Resource>(config: &T) -> Result<String, RegistrationError> {
        let kind = T::KIND.label();
        let id = config.resource_id();
        if id.is_empty() {
            return Err(RegistrationError::MissingId(kind));
        }
        config
            .validate()
            .map_err(|source| RegistrationError::Validation {
                kind,
                id: id.clone(),
                source,
            })?;
        Ok(id)
    }

    /// Create-only write of `value` under `(project, type, id)` plus its
    /// provenance record.
    ///
    /// The two writes are not atomic: when the provenance write fails the
    /// value stays in the store and [`RegistrationError::Metadata`] is
    /// returned.
    pub async fn persist(
        &self,
        project: &str,
        id: &str,
        value: ResourceValue,
        source: MetaSource,
    ) -> Result<ETag, RegistrationError> {
        let resource_type = value.resource_type();
        let kind = resource_type.label();
        let key = ResourceKey::new(project, resource_type, id);

        match self.store.get(&key).await {
            Ok(_) => return Err(RegistrationError::duplicate(resource_type, id)),
            Err(StoreError::NotFound(_)) => {}
            Err(source) => {
                return Err(RegistrationError::Inspect {
                    kind,
                    id: id.to_string(),
                    source,
                });
            }
        }

        let etag = self
            .store
            .put(&key, value)
            .await
            .map_err(|source| RegistrationError::Store {
                kind,
                id: id.to_string(),
                source,
            })?;

        write_meta(self.store.as_ref(), project, resource_type, id, source, source.as_str())
            .await
            .map_err(|source| RegistrationError::Metadata {
                kind,
                id: id.to_string(),
                source,
            })?;

        debug!(key = %key, etag = %etag, source = %source, "Resource persisted");
        Ok(etag)
    }
}
