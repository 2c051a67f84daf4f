// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Mode Bootstrap
//!
//! Builds the resource store for the configured [`Mode`] and records every
//! embedded service it launches on a [`TeardownList`].
//!
//! # Modes
//!
//! - **standalone**: in-memory store by default. `redis.standalone` embeds a
//!   Redis-compatible server and switches to a Redis-backed store;
//!   `temporal.standalone` embeds a Temporal dev server.
//! - **distributed**: requires `temporal.host_port` and a Redis connection
//!   (URL or host/port). Both are checked before any network call, then the
//!   Temporal frontend is probed and the Redis store is opened.
//!
//! Embedded servers and Redis stores come from a [`ServiceProvider`]. The
//! [`DefaultServiceProvider`] only knows the in-memory store and the Temporal
//! TCP probe and reports the rest as unsupported.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use agentflow_core::domain::config::{
    AppConfig, Mode, RedisStandaloneConfig, TemporalConfig, TemporalStandaloneConfig,
};
use agentflow_core::domain::repository::ResourceStore;
use agentflow_core::infrastructure::{MemoryResourceStore, TemporalProbe};

use crate::error::EngineError;

/// Something that must be shut down when the engine stops.
#[async_trait]
pub trait Disposer: Send + Sync {
    fn name(&self) -> &str;

    async fn close(&self) -> Result<()>;
}

/// Cleanup stack run in reverse registration order.
#[derive(Default)]
pub struct TeardownList {
    items: Vec<Box<dyn Disposer>>,
}

impl TeardownList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, disposer: Box<dyn Disposer>) {
        debug!(name = disposer.name(), "Registered cleanup");
        self.items.push(disposer);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Runs every disposer, last registered first. Failures are collected and
    /// never stop the remaining disposers.
    pub async fn run(self) -> Vec<String> {
        let mut errors = Vec::new();
        for disposer in self.items.into_iter().rev() {
            match disposer.close().await {
                Ok(()) => debug!(name = disposer.name(), "Cleanup finished"),
                Err(e) => {
                    warn!(name = disposer.name(), "Cleanup failed: {:#}", e);
                    errors.push(format!("cleanup mode resources: {}: {:#}", disposer.name(), e));
                }
            }
        }
        errors
    }
}

/// An embedded server started by a [`ServiceProvider`].
pub struct EmbeddedService {
    /// `host:port` clients should connect to.
    pub address: String,
    pub disposer: Box<dyn Disposer>,
}

/// Factory for the services a mode needs beyond the in-memory store.
#[async_trait]
pub trait ServiceProvider: Send + Sync {
    async fn start_embedded_redis(&self, config: &RedisStandaloneConfig) -> Result<EmbeddedService>;

    async fn start_embedded_temporal(
        &self,
        config: &TemporalStandaloneConfig,
        temporal: &TemporalConfig,
    ) -> Result<EmbeddedService>;

    async fn redis_store(&self, url: &str) -> Result<Arc<dyn ResourceStore>>;

    /// Reachability check for the Temporal frontend at `temporal.host_port`.
    async fn check_temporal(&self, temporal: &TemporalConfig) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultServiceProvider;

#[async_trait]
impl ServiceProvider for DefaultServiceProvider {
    async fn start_embedded_redis(
        &self,
        _config: &RedisStandaloneConfig,
    ) -> Result<EmbeddedService> {
        anyhow::bail!("embedded redis is not supported by the default service provider")
    }

    async fn start_embedded_temporal(
        &self,
        _config: &TemporalStandaloneConfig,
        _temporal: &TemporalConfig,
    ) -> Result<EmbeddedService> {
        anyhow::bail!("embedded temporal is not supported by the default service provider")
    }

    async fn redis_store(&self, _url: &str) -> Result<Arc<dyn ResourceStore>> {
        anyhow::bail!("redis resource store is not supported by the default service provider")
    }

    async fn check_temporal(&self, temporal: &TemporalConfig) -> Result<()> {
        TemporalProbe::new(&temporal.host_port, temporal.connect_timeout)
            .check()
            .await
    }
}

/// Builds the store for `config.mode`, pushing a disposer for every embedded
/// service onto `teardown` as soon as it is running.
///
/// On error, whatever was pushed before the failure is left on `teardown`
/// for the caller to unwind.
pub async fn bootstrap(
    config: &AppConfig,
    provider: &dyn ServiceProvider,
    teardown: &mut TeardownList,
) -> Result<Arc<dyn ResourceStore>, EngineError> {
    match config.mode {
        Mode::Distributed => bootstrap_distributed(config, provider).await,
        Mode::Standalone => bootstrap_standalone(config, provider, teardown).await,
    }
}

async fn bootstrap_distributed(
    config: &AppConfig,
    provider: &dyn ServiceProvider,
) -> Result<Arc<dyn ResourceStore>, EngineError> {
    let fail = |reason: String| EngineError::Bootstrap {
        mode: Mode::Distributed.as_str(),
        reason,
    };

    if config.temporal.host_port.trim().is_empty() {
        return Err(fail("temporal.host_port is required".to_string()));
    }
    let redis_url = config
        .redis
        .connection_url()
        .ok_or_else(|| fail("redis.url or redis.host/port is required".to_string()))?;

    provider
        .check_temporal(&config.temporal)
        .await
        .map_err(|e| fail(format!("connect temporal at {}: {:#}", config.temporal.host_port, e)))?;

    let store = provider
        .redis_store(&redis_url)
        .await
        .map_err(|e| fail(format!("connect redis: {:#}", e)))?;

    info!(temporal = %config.temporal.host_port, "Distributed mode ready");
    Ok(store)
}

async fn bootstrap_standalone(
    config: &AppConfig,
    provider: &dyn ServiceProvider,
    teardown: &mut TeardownList,
) -> Result<Arc<dyn ResourceStore>, EngineError> {
    let fail = |reason: String| EngineError::Bootstrap {
        mode: Mode::Standalone.as_str(),
        reason,
    };

    let store: Arc<dyn ResourceStore> = match &config.redis.standalone {
        Some(redis) => {
            let service = provider
                .start_embedded_redis(redis)
                .await
                .map_err(|e| fail(format!("start embedded redis: {:#}", e)))?;
            let address = service.address.clone();
            teardown.push(service.disposer);
            info!(address = %address, "Embedded redis started");

            provider
                .redis_store(&format!("redis://{}", address))
                .await
                .map_err(|e| fail(format!("connect embedded redis: {:#}", e)))?
        }
        None => Arc::new(MemoryResourceStore::new()),
    };

    if let Some(temporal) = &config.temporal.standalone {
        let service = provider
            .start_embedded_temporal(temporal, &config.temporal)
            .await
            .map_err(|e| fail(format!("start embedded temporal: {:#}", e)))?;
        info!(address = %service.address, "Embedded temporal started");
        teardown.push(service.disposer);
    }

    Ok(store)
}
