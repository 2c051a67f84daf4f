// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `agentflow validate`: load a project and check every reference without
//! starting the engine.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use agentflow_core::domain::config::AppConfig;
use agentflow_core::domain::validation::ValidationReport;
use agentflow_sdk::Engine;

use crate::project::{load_project, resolve_root};

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Project directory (default: cli.cwd, then the current directory)
    #[arg(long, value_name = "DIR")]
    pub project: Option<PathBuf>,

    /// Print the full report as JSON
    #[arg(long)]
    pub json: bool,

    /// Treat unused-resource warnings as failures
    #[arg(long)]
    pub strict: bool,
}

pub async fn execute(args: ValidateArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load_or_default(config_path).context("Failed to load configuration")?;
    let root = resolve_root(args.project, config.cli.cwd.as_deref())?;

    let engine = Engine::with_config(config);
    load_project(&engine, &root).await?;
    let report = engine
        .reference_report()
        .await
        .context("Failed to build reference report")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
    } else {
        print_report(&report);
    }

    if !report.valid {
        anyhow::bail!("{} reference problem(s) found", report.failures().len());
    }
    if args.strict && !report.warnings.is_empty() {
        anyhow::bail!("{} warning(s) found in strict mode", report.warnings.len());
    }
    Ok(())
}

fn print_report(report: &ValidationReport) {
    println!("{}", "Reference validation:".bold());
    println!("  Resources: {}", report.resource_count);
    println!("  Dependencies: {}", report.dependency_graph.len());
    println!();

    let failures = report.failures();
    if !failures.is_empty() {
        println!("{}", "Errors:".red().bold());
        for failure in &failures {
            println!("  ✗ {}", failure.red());
        }
        println!();
    }

    if !report.warnings.is_empty() {
        println!("{}", "Warnings:".yellow().bold());
        for warning in &report.warnings {
            println!("  ! {}", warning.message.yellow());
        }
        println!();
    }

    if report.valid {
        println!("{}", "✓ All references resolve".green());
    }
}
