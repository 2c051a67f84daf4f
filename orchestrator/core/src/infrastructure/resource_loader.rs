// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Resource YAML Loader
//!
//! Reads resource definitions from YAML files into their typed configs.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Parse external YAML → Domain configs
//!
//! Each file holds exactly one resource whose top-level keys are the fields of
//! the config type:
//!
//! ```yaml
//! id: researcher
//! instructions: Find primary sources and summarize them.
//! tools:
//!   - id: web-search
//! ```
//!
//! Directory loading walks recursively, picks `.yaml`/`.yml` files, skips
//! hidden entries, and returns results in path order.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::domain::resource::Resource;

/// Parse a single resource file.
pub fn load_resource<T>(path: impl AsRef<Path>) -> Result<T>
where
    T: Resource + DeserializeOwned,
{
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} file {:?}", T::KIND.label(), path))?;
    parse_resource(&content)
        .with_context(|| format!("Failed to parse {} file {:?}", T::KIND.label(), path))
}

pub fn parse_resource<T>(yaml: &str) -> Result<T>
where
    T: Resource + DeserializeOwned,
{
    let config: T = serde_yaml::from_str(yaml)?;
    Ok(config)
}

/// Parse every YAML file under `dir`.
pub fn load_resources_from_dir<T>(dir: impl AsRef<Path>) -> Result<Vec<(PathBuf, T)>>
where
    T: Resource + DeserializeOwned,
{
    let dir = dir.as_ref();
    if !dir.is_dir() {
        anyhow::bail!("{:?} is not a directory", dir);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
    {
        let entry = entry.context("Failed to read directory entry")?;
        if entry.file_type().is_file() && is_yaml(entry.path()) {
            files.push(entry.into_path());
        }
    }

    let mut loaded = Vec::with_capacity(files.len());
    for path in files {
        let config = load_resource::<T>(&path)?;
        loaded.push((path, config));
    }
    Ok(loaded)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_str().is_some_and(|name| name.starts_with('.'))
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}
