// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Engine Lifecycle
//!
//! Start/stop state machine.
//!
//! # Start
//!
//! 1. require a process config
//! 2. bootstrap the resource store for the mode (or take the supplied one)
//! 3. seed registrations queued before start, validate references, order
//!    workflows with callees first
//! 4. bind the listener and launch the HTTP server on a tracked task
//! 5. build the client for the bound address
//! 6. start the inline tool manager when a project is registered
//!
//! Any failure unwinds everything created so far in reverse order; unwind
//! failures are joined to the original error. Handles are published under
//! one lock only once every step succeeded.
//!
//! # Stop
//!
//! Detaches the live handles under the lock, so the engine reads as idle
//! immediately, then tears them down on a spawned task so teardown runs to
//! completion even if the caller stops polling. Errors are collected, never
//! short-circuited, and the result is cached for later calls.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use agentflow_core::application::{workflow_order, PendingRegistration, ResourceRegistrar};
use agentflow_core::domain::config::AppConfig;
use agentflow_core::domain::repository::{ResourceStore, StoreError};
use agentflow_core::infrastructure::InlineToolManager;
use agentflow_core::presentation::health_router;

use crate::client::{base_url, EngineClient};
use crate::engine::{Engine, ServerHandle, ServerInfo};
use crate::error::EngineError;
use crate::mode::{bootstrap, TeardownList};
use crate::server::{self, ConnectionLimits};

const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
const LOOPBACK_HOST: &str = "localhost";

/// Handles owned by a running engine, or by a start still in progress.
#[derive(Default)]
struct LiveResources {
    store: Option<Arc<dyn ResourceStore>>,
    teardown: TeardownList,
    server: Option<ServerHandle>,
    client: Option<EngineClient>,
    inline_tools: Option<InlineToolManager>,
    /// Queued registrations written to the store during this start. They are
    /// queued again if the start unwinds.
    seeded: Vec<PendingRegistration>,
}

impl LiveResources {
    fn is_empty(&self) -> bool {
        self.store.is_none()
            && self.server.is_none()
            && self.inline_tools.is_none()
            && self.teardown.is_empty()
    }

    /// Reverse-order teardown: inline tools, HTTP server, store, then mode
    /// cleanups LIFO.
    async fn shutdown(self, deadline: Duration) -> Vec<String> {
        let mut errors = Vec::new();

        if let Some(manager) = self.inline_tools {
            manager.close().await;
        }

        if let Some(server) = self.server {
            server.cancel.cancel();
            server.tracker.close();
            if tokio::time::timeout(deadline, server.tracker.wait()).await.is_err() {
                errors.push(format!("shutdown http server: timed out after {:?}", deadline));
            }
        }

        if let Some(store) = self.store {
            match store.close().await {
                Ok(()) | Err(StoreError::Closed) => {}
                Err(e) => errors.push(format!("close resource store: {}", e)),
            }
        }

        errors.extend(self.teardown.run().await);
        errors
    }
}

impl Engine {
    pub async fn start(&self) -> Result<(), EngineError> {
        let _start = self.start_lock.lock().await;
        if self.is_started() {
            return Err(EngineError::AlreadyStarted);
        }
        let Some(mut config) = self.config() else {
            return Err(EngineError::ConfigUnavailable);
        };
        info!(mode = %config.mode, "Starting engine");

        let user_entrypoint = config.runtime.entrypoint_path.clone();
        let mut live = LiveResources::default();
        if let Err(err) = self.launch(&mut config, &mut live).await {
            // The store they were written to is about to be discarded
            let seeded = std::mem::take(&mut live.seeded);
            if !seeded.is_empty() {
                self.state.write().registry.restore_pending(seeded);
            }
            let unwind_errors = tokio::spawn(live.shutdown(DEFAULT_SHUTDOWN_TIMEOUT))
                .await
                .unwrap_or_else(|e| vec![format!("unwind task: {}", e)]);
            let err = err.join(unwind_errors);
            error!("Engine start failed: {}", err);
            self.errors.lock().start = Some(err.clone());
            return Err(err);
        }

        let base_url = live.server.as_ref().map(|s| s.info.base_url.clone());
        {
            let mut state = self.state.write();
            state.store = live.store;
            state.server = live.server;
            state.client = live.client;
            state.inline_tools = live.inline_tools;
            state.teardown = live.teardown;
            state.written = live.seeded;
            state.user_entrypoint = user_entrypoint;
            state.config = Some(config);
            state.started = true;
        }
        {
            let mut errors = self.errors.lock();
            errors.start = None;
            errors.stop = None;
        }
        metrics::gauge!("agentflow_engine_started").set(1.0);
        info!(base_url = ?base_url, "Engine started");
        Ok(())
    }

    /// Steps 2 through 6 of start. Everything created is recorded on `live`
    /// as soon as it exists so the caller can unwind it.
    async fn launch(
        &self,
        config: &mut AppConfig,
        live: &mut LiveResources,
    ) -> Result<(), EngineError> {
        config
            .validate()
            .map_err(|e| EngineError::InvalidConfig(format!("{:#}", e)))?;

        let store = match &self.external_store {
            Some(store) => {
                debug!("Using supplied resource store");
                Arc::clone(store)
            }
            None => bootstrap(config, self.provider.as_ref(), &mut live.teardown).await?,
        };
        live.store = Some(Arc::clone(&store));

        self.seed_pending(&store, live).await?;
        self.check_references(&store).await?;

        let (host, port) = self.listen_address(config)?;
        let listener = TcpListener::bind((host.as_str(), port))
            .await
            .map_err(|e| EngineError::Lifecycle(format!("listen on {}:{}: {}", host, port, e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| EngineError::Lifecycle(format!("resolve listener address: {}", e)))?;

        let info = ServerInfo {
            local_addr,
            base_url: base_url(&host, local_addr.port()),
        };
        live.server = Some(self.serve(listener, info.clone(), config));
        live.client = Some(EngineClient::for_listener(&host, local_addr.port()));
        info!(address = %local_addr, base_url = %info.base_url, "HTTP listener bound");

        live.inline_tools = self.start_inline_tools(config, &store).await?;
        Ok(())
    }

    async fn seed_pending(
        &self,
        store: &Arc<dyn ResourceStore>,
        live: &mut LiveResources,
    ) -> Result<(), EngineError> {
        let (project, pending) = {
            let mut state = self.state.write();
            (state.registry.project_name(), state.registry.take_pending())
        };
        if pending.is_empty() {
            return Ok(());
        }
        let Some(project) = project else {
            self.state.write().registry.restore_pending(pending);
            return Err(EngineError::Lifecycle("seed resources: no project registered".to_string()));
        };

        let registrar = ResourceRegistrar::new(Arc::clone(store));
        let mut failure = None;
        for item in &pending {
            if let Err(err) = registrar
                .persist(&project, &item.id, item.value.clone(), item.source)
                .await
            {
                failure = Some(err);
                break;
            }
        }
        if let Some(err) = failure {
            self.state.write().registry.restore_pending(pending);
            return Err(err.into());
        }
        debug!(count = pending.len(), "Seeded queued registrations");
        live.seeded = pending;
        Ok(())
    }

    async fn check_references(&self, store: &Arc<dyn ResourceStore>) -> Result<(), EngineError> {
        let report = self.report_against(Some(store)).await?;
        for warning in &report.warnings {
            warn!(
                resource_type = %warning.resource_type,
                resource_id = %warning.resource_id,
                "{}", warning.message
            );
        }

        let mut state = self.state.write();
        let order = workflow_order(&report, state.registry.workflow_order());
        let report = report.into_result().map_err(|errors| {
            metrics::counter!("agentflow_validation_failures_total").increment(1);
            EngineError::Aggregate(errors)
        })?;
        if let Some(order) = order {
            state.registry.set_workflow_order(order);
        }
        debug!(resources = report.resource_count, "References validated");
        Ok(())
    }

    /// Option, then config, then loopback. Port 0 asks for an ephemeral port.
    fn listen_address(&self, config: &AppConfig) -> Result<(String, u16), EngineError> {
        let host = self
            .host
            .clone()
            .filter(|h| !h.trim().is_empty())
            .or_else(|| Some(config.server.host.trim().to_string()).filter(|h| !h.is_empty()))
            .unwrap_or_else(|| LOOPBACK_HOST.to_string());
        let port = match self.port {
            Some(port) => port,
            None => u16::try_from(config.server.port).map_err(|_| {
                EngineError::InvalidConfig(format!(
                    "server.port {} is out of range",
                    config.server.port
                ))
            })?,
        };
        Ok((host, port))
    }

    fn serve(&self, listener: TcpListener, info: ServerInfo, config: &AppConfig) -> ServerHandle {
        let timeouts = &config.server.timeouts;
        let router = health_router(timeouts);
        let limits = ConnectionLimits::from(timeouts);
        let cancel = CancellationToken::new();
        let tracker = TaskTracker::new();

        let accept = server::serve(
            listener,
            router.clone(),
            limits,
            cancel.clone(),
            tracker.clone(),
        );
        let errors = Arc::clone(&self.errors);
        let address = info.local_addr;
        tracker.spawn(async move {
            debug!(address = %address, "Starting HTTP server");
            if let Err(e) = accept.await {
                error!("HTTP server failed: {}", e);
                errors.lock().server = Some(format!("http server failure: {}", e));
            }
        });
        tracker.close();

        ServerHandle {
            info,
            router,
            cancel,
            tracker,
        }
    }

    async fn start_inline_tools(
        &self,
        config: &mut AppConfig,
        store: &Arc<dyn ResourceStore>,
    ) -> Result<Option<InlineToolManager>, EngineError> {
        let Some(project) = self.state.read().registry.project_name() else {
            return Ok(None);
        };
        let root = match config.cli.cwd.clone().filter(|p| !p.as_os_str().is_empty()) {
            Some(root) => root,
            None => std::env::current_dir()
                .map_err(|e| EngineError::Lifecycle(format!("resolve project root: {}", e)))?,
        };
        let user_entrypoint = config
            .runtime
            .entrypoint_path
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());

        let manager = InlineToolManager::new(&project, root, Arc::clone(store), user_entrypoint)
            .map_err(|e| EngineError::Lifecycle(format!("inline tools: {:#}", e)))?;
        if let Err(e) = manager.start().await {
            manager.close().await;
            return Err(EngineError::Lifecycle(format!("inline tools: {:#}", e)));
        }
        config.runtime.entrypoint_path = Some(PathBuf::from(manager.entrypoint_path()));
        Ok(Some(manager))
    }

    /// Stops the engine with the configured shutdown bound, or
    /// [`DEFAULT_SHUTDOWN_TIMEOUT`] when none is set.
    pub async fn stop(&self) -> Result<(), EngineError> {
        self.stop_with_timeout(DEFAULT_SHUTDOWN_TIMEOUT).await
    }

    /// Like [`Engine::stop`], with `fallback` bounding the HTTP shutdown when
    /// `server.timeouts.server_shutdown` is unset.
    pub async fn stop_with_timeout(&self, fallback: Duration) -> Result<(), EngineError> {
        let _stop = self.stop_lock.lock().await;

        let (live, deadline) = {
            let mut state = self.state.write();
            let live = LiveResources {
                store: state.store.take(),
                teardown: std::mem::take(&mut state.teardown),
                server: state.server.take(),
                client: state.client.take(),
                inline_tools: state.inline_tools.take(),
                seeded: Vec::new(),
            };
            let written = std::mem::take(&mut state.written);
            if !written.is_empty() {
                state.registry.restore_pending(written);
            }
            if state.started {
                let user_entrypoint = state.user_entrypoint.take();
                if let Some(config) = state.config.as_mut() {
                    config.runtime.entrypoint_path = user_entrypoint;
                }
            }
            state.started = false;
            let deadline = state
                .config
                .as_ref()
                .and_then(|c| c.server.timeouts.server_shutdown)
                .filter(|d| !d.is_zero())
                .unwrap_or(fallback);
            (live, deadline)
        };

        if live.is_empty() {
            return match self.errors.lock().stop.clone() {
                Some(err) => Err(err),
                None => Ok(()),
            };
        }
        info!("Stopping engine");
        metrics::gauge!("agentflow_engine_started").set(0.0);

        let mut errors = tokio::spawn(live.shutdown(deadline))
            .await
            .unwrap_or_else(|e| vec![format!("teardown task: {}", e)]);

        let mut slots = self.errors.lock();
        if let Some(server_error) = slots.server.take() {
            errors.push(server_error);
        }
        match EngineError::from_messages(errors) {
            Some(err) => {
                error!("Engine stopped with errors: {}", err);
                slots.stop = Some(err.clone());
                Err(err)
            }
            None => {
                slots.stop = None;
                info!("Engine stopped");
                Ok(())
            }
        }
    }

    /// Waits until the HTTP server task has finished. Returns immediately
    /// when the engine is not serving.
    pub async fn wait(&self) -> Result<(), EngineError> {
        let tracker = self.state.read().server.as_ref().map(|s| s.tracker.clone());
        if let Some(tracker) = tracker {
            tracker.wait().await;
        }
        match self.errors.lock().server.clone() {
            Some(message) => Err(EngineError::Lifecycle(message)),
            None => Ok(()),
        }
    }
}
