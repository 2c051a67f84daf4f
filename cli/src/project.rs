// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Project directory layout
//!
//! ```text
//! <root>/
//!   project.yaml
//!   workflows/  agents/  tools/  knowledge/  memories/
//!   mcps/  schemas/  models/  schedules/  webhooks/
//! ```
//!
//! `project.yaml` is required; every directory is optional. Resources are
//! registered project first, then the dependency kinds, then workflows and
//! their triggers.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use agentflow_sdk::Engine;

pub const PROJECT_FILE: &str = "project.yaml";

/// Number of resources registered per directory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub counts: Vec<(&'static str, usize)>,
}

impl LoadSummary {
    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, n)| n).sum()
    }
}

/// Registers everything under `root` with `engine`.
pub async fn load_project(engine: &Engine, root: &Path) -> Result<LoadSummary> {
    let project_file = root.join(PROJECT_FILE);
    if !project_file.is_file() {
        anyhow::bail!("No {} found in {}", PROJECT_FILE, root.display());
    }
    engine
        .load_project(&project_file)
        .await
        .context("Failed to load project")?;

    let mut summary = LoadSummary::default();
    summary.counts.push(("project", 1));

    macro_rules! load_dir {
        ($dir:literal, $method:ident) => {
            let dir = root.join($dir);
            if dir.is_dir() {
                let count = engine
                    .$method(&dir)
                    .await
                    .with_context(|| format!("Failed to load {}", dir.display()))?;
                debug!(dir = %dir.display(), count, "Loaded resource directory");
                summary.counts.push(($dir, count));
            }
        };
    }

    load_dir!("models", load_models_from_dir);
    load_dir!("schemas", load_schemas_from_dir);
    load_dir!("tools", load_tools_from_dir);
    load_dir!("mcps", load_mcps_from_dir);
    load_dir!("memories", load_memories_from_dir);
    load_dir!("knowledge", load_knowledge_bases_from_dir);
    load_dir!("agents", load_agents_from_dir);
    load_dir!("workflows", load_workflows_from_dir);
    load_dir!("schedules", load_schedules_from_dir);
    load_dir!("webhooks", load_webhooks_from_dir);

    Ok(summary)
}

/// `--project` if given, else the configured `cli.cwd`, else the current
/// directory.
pub fn resolve_root(flag: Option<PathBuf>, configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(root) = flag {
        return Ok(root);
    }
    if let Some(root) = configured.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(root.to_path_buf());
    }
    std::env::current_dir().context("Failed to resolve current directory")
}
