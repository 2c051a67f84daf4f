// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `agentflow serve`: load a project, start the engine and run until a
//! shutdown signal arrives or the HTTP server exits.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

use agentflow_core::domain::config::AppConfig;
use agentflow_sdk::{Engine, EngineOptions};

use crate::project::{load_project, resolve_root};

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Project directory (default: cli.cwd, then the current directory)
    #[arg(long, value_name = "DIR")]
    pub project: Option<PathBuf>,

    /// Bind host, overrides server.host
    #[arg(long, env = "AGENTFLOW_HOST")]
    pub host: Option<String>,

    /// Bind port, overrides server.port
    #[arg(long, env = "AGENTFLOW_PORT")]
    pub port: Option<u16>,

    /// Upper bound on graceful shutdown when server.timeouts.server_shutdown
    /// is unset, e.g. `10s`
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub shutdown_timeout: Option<Duration>,
}

pub async fn execute(args: ServeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut config =
        AppConfig::load_or_default(config_path).context("Failed to load configuration")?;
    let root = resolve_root(args.project, config.cli.cwd.as_deref())?;
    config.cli.cwd = Some(root.clone());

    let mut options = EngineOptions::new().with_config(config);
    if let Some(host) = args.host {
        options = options.with_host(host);
    }
    if let Some(port) = args.port {
        options = options.with_port(port);
    }
    let engine = Engine::new(options);

    let summary = load_project(&engine, &root).await?;
    info!(resources = summary.total(), root = %root.display(), "Project loaded");

    engine.start().await.context("Failed to start engine")?;
    if let Some(base_url) = engine.base_url() {
        println!("{} {}", "✓ AgentFlow engine listening on".green(), base_url.bold());
    }

    let served = tokio::select! {
        _ = shutdown_signal() => Ok(()),
        result = engine.wait() => result,
    };
    if let Err(e) = &served {
        warn!("HTTP server exited: {}", e);
    }

    let stopped = match args.shutdown_timeout {
        Some(timeout) => engine.stop_with_timeout(timeout).await,
        None => engine.stop().await,
    };
    stopped.context("Engine shutdown failed")?;
    served.context("HTTP server failed")?;

    println!("{}", "✓ AgentFlow engine stopped".green());
    Ok(())
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    humantime_serde::re::humantime::parse_duration(s.trim()).map_err(|e| e.to_string())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C signal"),
        _ = terminate => info!("Received SIGTERM signal"),
    }
}
