// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Engine
//!
//! The embeddable AgentFlow engine: owns the registered resources, the
//! resource store, the HTTP listener and the cleanup stack for the current
//! mode.
//!
//! # Architecture
//!
//! - **Layer:** SDK surface
//! - **Purpose:** Single entry point tying registration, validation and
//!   lifecycle together
//!
//! # Locking
//!
//! - engine state: one `parking_lot::RwLock`, never held across an await
//! - start/stop/server error slots: a separate `parking_lot::Mutex` so hot
//!   reads never wait on error bookkeeping
//! - `start` and `stop` each hold a dedicated `tokio::sync::Mutex`, so
//!   overlapping calls serialize
//!
//! The operations themselves live in [`crate::registration`],
//! [`crate::loader`], [`crate::validation`] and [`crate::lifecycle`].

use parking_lot::{Mutex, RwLock};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use agentflow_core::application::{PendingRegistration, ResourceRegistry};
use agentflow_core::domain::config::{AppConfig, Mode};
use agentflow_core::domain::repository::ResourceStore;
use agentflow_core::infrastructure::InlineToolManager;
use axum::Router;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::client::EngineClient;
use crate::error::EngineError;
use crate::mode::{DefaultServiceProvider, ServiceProvider, TeardownList};

/// Construction options. Everything is optional; [`Engine::start`] fails with
/// [`EngineError::ConfigUnavailable`] when no config was supplied.
#[derive(Clone, Default)]
pub struct EngineOptions {
    pub(crate) config: Option<AppConfig>,
    pub(crate) host: Option<String>,
    pub(crate) port: Option<u16>,
    pub(crate) store: Option<Arc<dyn ResourceStore>>,
    pub(crate) provider: Option<Arc<dyn ServiceProvider>>,
}

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Bind host; takes precedence over `server.host`.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Bind port; takes precedence over `server.port`. 0 picks an ephemeral
    /// port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Use this store instead of the one the mode would build.
    pub fn with_resource_store(mut self, store: Arc<dyn ResourceStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_service_provider(mut self, provider: Arc<dyn ServiceProvider>) -> Self {
        self.provider = Some(provider);
        self
    }
}

/// Listener address and the URL clients should use for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub local_addr: SocketAddr,
    pub base_url: String,
}

/// Running HTTP server.
pub(crate) struct ServerHandle {
    pub(crate) info: ServerInfo,
    pub(crate) router: Router,
    pub(crate) cancel: CancellationToken,
    pub(crate) tracker: TaskTracker,
}

#[derive(Default)]
pub(crate) struct EngineState {
    pub(crate) registry: ResourceRegistry,
    pub(crate) config: Option<AppConfig>,
    pub(crate) store: Option<Arc<dyn ResourceStore>>,
    pub(crate) server: Option<ServerHandle>,
    pub(crate) client: Option<EngineClient>,
    pub(crate) inline_tools: Option<InlineToolManager>,
    pub(crate) teardown: TeardownList,
    /// Everything written to a store built at start. Queued again on stop so
    /// the next start seeds its fresh store.
    pub(crate) written: Vec<PendingRegistration>,
    /// `runtime.entrypoint_path` as configured, before start pointed it at
    /// the generated inline entrypoint.
    pub(crate) user_entrypoint: Option<PathBuf>,
    pub(crate) started: bool,
}

#[derive(Debug, Default)]
pub(crate) struct ErrorSlots {
    pub(crate) start: Option<EngineError>,
    pub(crate) stop: Option<EngineError>,
    /// Failure reported by the serve task after start returned.
    pub(crate) server: Option<String>,
}

pub struct Engine {
    pub(crate) host: Option<String>,
    pub(crate) port: Option<u16>,
    pub(crate) external_store: Option<Arc<dyn ResourceStore>>,
    pub(crate) provider: Arc<dyn ServiceProvider>,
    pub(crate) state: RwLock<EngineState>,
    pub(crate) errors: Arc<Mutex<ErrorSlots>>,
    pub(crate) start_lock: tokio::sync::Mutex<()>,
    pub(crate) stop_lock: tokio::sync::Mutex<()>,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        let EngineOptions {
            config,
            host,
            port,
            store,
            provider,
        } = options;

        Self {
            host,
            port,
            external_store: store,
            provider: provider.unwrap_or_else(|| Arc::new(DefaultServiceProvider)),
            state: RwLock::new(EngineState {
                config,
                ..Default::default()
            }),
            errors: Arc::new(Mutex::new(ErrorSlots::default())),
            start_lock: tokio::sync::Mutex::new(()),
            stop_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Engine with `config` and every other option at its default.
    pub fn with_config(config: AppConfig) -> Self {
        Self::new(EngineOptions::new().with_config(config))
    }

    /// Snapshot of the process configuration. After start this reflects
    /// rewrites made by the engine, such as the inline tool entrypoint.
    pub fn config(&self) -> Option<AppConfig> {
        self.state.read().config.clone()
    }

    pub fn mode(&self) -> Mode {
        self.state
            .read()
            .config
            .as_ref()
            .map(|c| c.mode)
            .unwrap_or_default()
    }

    pub fn is_started(&self) -> bool {
        self.state.read().started
    }

    /// Store in use while started, or the externally supplied one.
    pub fn resource_store(&self) -> Option<Arc<dyn ResourceStore>> {
        self.state
            .read()
            .store
            .clone()
            .or_else(|| self.external_store.clone())
    }

    pub fn server(&self) -> Option<ServerInfo> {
        self.state.read().server.as_ref().map(|s| s.info.clone())
    }

    /// Router served by the listener.
    pub fn router(&self) -> Option<Router> {
        self.state.read().server.as_ref().map(|s| s.router.clone())
    }

    pub fn base_url(&self) -> Option<String> {
        self.server().map(|s| s.base_url)
    }

    pub fn client(&self) -> Option<EngineClient> {
        self.state.read().client.clone()
    }

    /// Error from the most recent failed start, cleared by a successful one.
    pub fn start_error(&self) -> Option<EngineError> {
        self.errors.lock().start.clone()
    }

    /// Registered workflow ids in their current order. Start reorders them
    /// so called workflows come before their callers.
    pub fn workflow_ids(&self) -> Vec<String> {
        self.state.read().registry.workflow_order().to_vec()
    }

    /// Number of registered resources across all kinds.
    pub fn resource_count(&self) -> usize {
        self.state.read().registry.len()
    }
}
