// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use agentflow_core::domain::config::AppConfig;

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Write the default configuration as YAML
    Generate {
        #[arg(short, long, default_value = "./agentflow.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
        ConfigCommand::Generate { output, force } => generate(output, force),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        match &config_override {
            Some(path) => println!("  1. --config flag: {}", path.display()),
            None => println!("  1. --config flag: {}", "(not set)".dimmed()),
        }
        println!(
            "  2. AGENTFLOW_CONFIG_PATH: {}",
            std::env::var("AGENTFLOW_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./agentflow.yaml");
        println!("  4. ~/.agentflow/config.yaml");
        println!();
    }

    let config =
        AppConfig::load_or_default(config_override).context("Failed to load configuration")?;

    println!("{}", "Current configuration:".bold());
    println!("  Mode: {}", config.mode.to_string().bold());
    println!("  Server: {}:{}", config.server.host, config.server.port);
    if let Some(timeout) = config.server.timeouts.server_shutdown {
        println!("  Shutdown timeout: {:?}", timeout);
    }
    println!(
        "  Temporal: {}",
        if config.temporal.host_port.is_empty() {
            "(not set)".dimmed().to_string()
        } else {
            config.temporal.host_port.clone()
        }
    );
    println!(
        "  Redis: {}",
        config
            .redis
            .connection_url()
            .map(|url| redact_password(&url))
            .unwrap_or_else(|| "(not set)".dimmed().to_string())
    );

    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = AppConfig::load_or_default(config_path).context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());
    Ok(())
}

fn generate(output: PathBuf, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", output.display());
    }
    let sample = AppConfig::default().to_yaml_string()?;
    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!("{}", format!("✓ Configuration generated: {}", output.display()).green());
    Ok(())
}

/// `redis://:secret@host` becomes `redis://:***@host`.
fn redact_password(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    match rest.split_once('@') {
        Some((credentials, host)) => {
            let user = credentials.split(':').next().unwrap_or_default();
            format!("{}://{}:***@{}", scheme, user, host)
        }
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_password() {
        assert_eq!(redact_password("redis://:secret@cache:6379/0"), "redis://:***@cache:6379/0");
        assert_eq!(redact_password("redis://cache:6379"), "redis://cache:6379");
    }

    #[test]
    fn test_generate_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("agentflow.yaml");

        generate(output.clone(), false).unwrap();
        let written = AppConfig::from_yaml_file(&output).unwrap();
        assert_eq!(written.server, AppConfig::default().server);
        assert!(written.validate().is_ok());

        let err = generate(output.clone(), false).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        generate(output, true).unwrap();
    }
}
