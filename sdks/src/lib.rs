// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! AgentFlow Rust SDK
//!
//! Embed the AgentFlow engine: register projects, workflows, agents, tools
//! and the rest in code or from YAML, validate the references between them
//! and run the engine in standalone or distributed mode.
//!
//! ```no_run
//! use agentflow_sdk::{Engine, EngineOptions};
//! use agentflow_sdk::agentflow_core::domain::config::AppConfig;
//!
//! # async fn run() -> Result<(), agentflow_sdk::EngineError> {
//! let engine = Engine::new(EngineOptions::new().with_config(AppConfig::default()).with_port(0));
//! engine.load_project("agentflow.yaml").await?;
//! engine.load_workflows_from_dir("workflows").await?;
//! engine.start().await?;
//! engine.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod loader;
pub mod mode;
pub mod registration;
mod server;
pub mod validation;

pub use agentflow_core;
pub use client::{EngineClient, HealthStatus};
pub use engine::{Engine, EngineOptions, ServerInfo};
pub use error::EngineError;
pub use mode::{DefaultServiceProvider, Disposer, EmbeddedService, ServiceProvider, TeardownList};
