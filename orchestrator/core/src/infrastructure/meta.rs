// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Provenance metadata writer.

use chrono::Utc;

use crate::domain::repository::{ResourceStore, StoreError};
use crate::domain::resource::{ETag, MetaSource, ResourceKey, ResourceMeta, ResourceType};

/// Records where `(project, resource_type, id)` came from and who wrote it.
///
/// The record lives under [`ResourceKey::meta_key`] and is overwritten on
/// every call.
pub async fn write_meta(
    store: &dyn ResourceStore,
    project: &str,
    resource_type: ResourceType,
    id: &str,
    source: MetaSource,
    actor: &str,
) -> Result<ETag, StoreError> {
    let meta = ResourceMeta {
        source,
        actor: actor.to_string(),
        updated_at: Utc::now(),
    };
    let key = ResourceKey::new(project, resource_type, id).meta_key();
    store.put(&key, meta.into()).await
}
