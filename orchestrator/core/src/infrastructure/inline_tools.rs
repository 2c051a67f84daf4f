// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Inline Tool Manager
//!
//! Mirrors the source code of inline tools from the resource store onto disk
//! so a worker runtime can import them.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Keep `<root>/.agentflow/runtime/inline` in sync with the
//!   store's tool resources
//! - **Integration:** Resource store watch feed → module files + entrypoint
//!
//! # Layout
//!
//! ```text
//! <root>/.agentflow/runtime/inline/
//!   __inline_entrypoint.ts      re-exports every module (and the user entrypoint)
//!   summarize_3f2a9c1b0d4e.ts   <sanitized id>_<sha256[..12]>.ts
//! ```
//!
//! Files are replaced atomically (write to a temp name, then rename). A module
//! is rewritten only when its checksum changes; modules whose tool disappeared
//! are removed.

use anyhow::{Context, Result};
use futures::StreamExt;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::domain::repository::ResourceStore;
use crate::domain::resource::{ResourceType, ResourceValue};
use crate::domain::tool::ToolConfig;

pub const ENTRYPOINT_FILE_NAME: &str = "__inline_entrypoint.ts";
const MODULE_EXT: &str = "ts";
const MODULE_ALIAS_PREFIX: &str = "inline";

/// Directory holding generated inline modules for a project rooted at `root`.
pub fn inline_dir(root: &Path) -> PathBuf {
    root.join(".agentflow").join("runtime").join("inline")
}

#[derive(Debug, Clone, PartialEq)]
struct ModuleState {
    file_name: String,
    checksum: String,
}

#[derive(Debug, Clone)]
struct ModuleSpec {
    id: String,
    code: String,
    file_name: String,
    checksum: String,
}

#[derive(Default)]
struct SyncState {
    modules: HashMap<String, ModuleState>,
    entrypoint_hash: Option<String>,
}

struct Inner {
    project: String,
    root: PathBuf,
    store: Arc<dyn ResourceStore>,
    user_entrypoint: Option<String>,
    inline_dir: PathBuf,
    entrypoint_path: PathBuf,
    state: Mutex<SyncState>,
}

pub struct InlineToolManager {
    inner: Arc<Inner>,
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl InlineToolManager {
    pub fn new(
        project: &str,
        root: impl Into<PathBuf>,
        store: Arc<dyn ResourceStore>,
        user_entrypoint: Option<String>,
    ) -> Result<Self> {
        let project = project.trim();
        if project.is_empty() {
            anyhow::bail!("project name is required");
        }
        let root = root.into();
        if root.as_os_str().is_empty() {
            anyhow::bail!("project root is required");
        }
        let inline_dir = inline_dir(&root);
        let entrypoint_path = inline_dir.join(ENTRYPOINT_FILE_NAME);
        Ok(Self {
            inner: Arc::new(Inner {
                project: project.to_string(),
                root,
                store,
                user_entrypoint: user_entrypoint
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty()),
                inline_dir,
                entrypoint_path,
                state: Mutex::new(SyncState::default()),
            }),
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
        })
    }

    pub fn entrypoint_path(&self) -> &Path {
        &self.inner.entrypoint_path
    }

    /// Path of the generated module for `tool_id`, if one has been written.
    pub fn module_path(&self, tool_id: &str) -> Option<PathBuf> {
        let state = self.inner.state.lock();
        state
            .modules
            .get(tool_id)
            .map(|m| self.inner.inline_dir.join(&m.file_name))
    }

    /// Initial sync, then re-sync on every tool change in the store.
    pub async fn start(&self) -> Result<()> {
        fs::create_dir_all(&self.inner.inline_dir)
            .with_context(|| {
                format!("Failed to create inline directory {:?}", self.inner.inline_dir)
            })?;
        self.inner.sync().await?;

        let mut events = self
            .inner
            .store
            .watch(&self.inner.project, ResourceType::Tool)
            .await
            .context("Failed to watch tool resources")?;

        let inner = Arc::clone(&self.inner);
        let cancel = self.cancel.clone();
        self.tracker.spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = events.next() => match event {
                        Some(event) => {
                            debug!(tool = %event.key.id, "Tool changed, syncing inline modules");
                            if let Err(e) = inner.sync().await {
                                warn!("Inline tool sync failed: {:#}", e);
                            }
                        }
                        None => break,
                    },
                }
            }
        });

        info!(
            project = %self.inner.project,
            dir = ?self.inner.inline_dir,
            "Inline tool manager started"
        );
        Ok(())
    }

    pub async fn sync(&self) -> Result<()> {
        self.inner.sync().await
    }

    /// Stops the watcher and waits for it. Safe to call more than once.
    pub async fn close(&self) {
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}

impl Inner {
    async fn sync(&self) -> Result<()> {
        fs::create_dir_all(&self.inline_dir)
            .with_context(|| format!("Failed to create inline directory {:?}", self.inline_dir))?;
        let modules = self.collect_modules().await?;

        let mut state = self.state.lock();
        self.apply_module_diff(&mut state, &modules)?;
        self.write_entrypoint(&mut state, &modules)
    }

    async fn collect_modules(&self) -> Result<Vec<ModuleSpec>> {
        let items = self
            .store
            .list_with_values(&self.project, ResourceType::Tool)
            .await
            .context("Failed to list inline tools")?;

        let mut modules: Vec<ModuleSpec> = items
            .into_iter()
            .filter_map(|item| match item.value {
                ResourceValue::Tool(tool) => Some(tool),
                other => {
                    warn!(
                        tool_id = %item.key.id,
                        kind = %other.resource_type(),
                        "Skipping non-tool value during inline sync"
                    );
                    None
                }
            })
            .filter(ToolConfig::has_inline_code)
            .map(|tool| {
                let code = ensure_trailing_newline(&tool.code);
                let checksum = content_hash(&code);
                let file_name = format!(
                    "{}_{}.{}",
                    sanitize_tool_id(&tool.id),
                    &checksum[..12],
                    MODULE_EXT
                );
                ModuleSpec {
                    id: tool.id,
                    code,
                    file_name,
                    checksum,
                }
            })
            .collect();
        modules.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(modules)
    }

    fn apply_module_diff(&self, state: &mut SyncState, modules: &[ModuleSpec]) -> Result<()> {
        let mut next = HashMap::with_capacity(modules.len());
        for spec in modules {
            let current = state.modules.get(&spec.id);
            if let Some(current) = current {
                if current.checksum == spec.checksum && current.file_name == spec.file_name {
                    next.insert(spec.id.clone(), current.clone());
                    continue;
                }
            }
            write_file_atomic(&self.inline_dir, &spec.file_name, spec.code.as_bytes())
                .with_context(|| format!("Failed to write inline module {}", spec.id))?;
            if let Some(current) = current {
                if current.file_name != spec.file_name {
                    let _ = fs::remove_file(self.inline_dir.join(&current.file_name));
                }
            }
            next.insert(
                spec.id.clone(),
                ModuleState {
                    file_name: spec.file_name.clone(),
                    checksum: spec.checksum.clone(),
                },
            );
        }

        for (tool_id, stale) in &state.modules {
            if next.contains_key(tool_id) {
                continue;
            }
            match fs::remove_file(self.inline_dir.join(&stale.file_name)) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to remove stale inline module {}", tool_id)
                    });
                }
            }
        }
        state.modules = next;
        Ok(())
    }

    fn write_entrypoint(&self, state: &mut SyncState, modules: &[ModuleSpec]) -> Result<()> {
        let content = self.build_entrypoint(modules);
        let hash = content_hash(&content);
        if state.entrypoint_hash.as_deref() == Some(hash.as_str()) {
            return Ok(());
        }
        write_file_atomic(&self.inline_dir, ENTRYPOINT_FILE_NAME, content.as_bytes())
            .context("Failed to write inline entrypoint")?;
        state.entrypoint_hash = Some(hash);
        Ok(())
    }

    fn build_entrypoint(&self, modules: &[ModuleSpec]) -> String {
        let mut out =
            String::from("// Generated by the agentflow inline tool manager. DO NOT EDIT.\n");
        match self.user_import() {
            Some(import) => out.push_str(&format!("import * as userExports from {:?};\n", import)),
            None => out.push_str("const userExports = {};\n"),
        }
        for (idx, spec) in modules.iter().enumerate() {
            out.push_str(&format!(
                "import {}{} from \"./{}\";\n",
                MODULE_ALIAS_PREFIX, idx, spec.file_name
            ));
        }
        out.push_str("const baseExports = userExports?.default ?? userExports ?? {};\n");
        out.push_str("const inlineExports = {\n");
        for (idx, spec) in modules.iter().enumerate() {
            out.push_str(&format!("  {:?}: {}{},\n", spec.id, MODULE_ALIAS_PREFIX, idx));
        }
        out.push_str("};\n");
        out.push_str("export default {\n  ...baseExports,\n");
        if !modules.is_empty() {
            out.push_str("  ...inlineExports,\n");
        }
        out.push_str("};\n");
        out
    }

    /// Import specifier for the user entrypoint as seen from the inline dir.
    /// Bare specifiers pass through; paths become `./` or `../` relative.
    fn user_import(&self) -> Option<String> {
        let path = self.user_entrypoint.as_deref()?;
        if is_bare_specifier(path) {
            return Some(path.to_string());
        }
        let target = normalize(&self.root.join(path));
        let Some(rel) = pathdiff::diff_paths(&target, normalize(&self.inline_dir)) else {
            return Some(to_slash(Path::new(path)));
        };
        let rel = to_slash(&rel);
        if rel.starts_with("../") || rel.starts_with("./") {
            Some(rel)
        } else {
            Some(format!("./{}", rel))
        }
    }
}

/// Lexically resolves `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last = out.components().next_back();
                let can_pop = matches!(last, Some(Component::Normal(_)));
                let at_root = matches!(last, Some(Component::RootDir) | Some(Component::Prefix(_)));
                if can_pop {
                    out.pop();
                } else if !at_root {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::CurDir => None,
            other => Some(other.as_os_str().to_string_lossy().into_owned()),
        })
        .collect::<Vec<_>>()
        .join("/")
        .replace("//", "/")
}

fn is_bare_specifier(path: &str) -> bool {
    !path.is_empty() && !path.starts_with('.') && !path.contains(['/', '\\'])
}

/// Lowercase `[a-z0-9_-]` slug of a tool id; `tool` when nothing survives.
pub fn sanitize_tool_id(id: &str) -> String {
    let slug: String = id
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '-' | '_' => c,
            _ => '-',
        })
        .collect();
    let slug = slug.trim_matches(|c| c == '-' || c == '_');
    if slug.is_empty() {
        "tool".to_string()
    } else {
        slug.to_string()
    }
}

fn content_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

fn ensure_trailing_newline(code: &str) -> String {
    if code.ends_with('\n') {
        code.to_string()
    } else {
        format!("{}\n", code)
    }
}

fn write_file_atomic(dir: &Path, name: &str, data: &[u8]) -> std::io::Result<()> {
    let tmp = dir.join(format!(".{}.tmp", name));
    fs::write(&tmp, data)?;
    if let Err(e) = fs::rename(&tmp, dir.join(name)) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::resource::ResourceKey;
    use crate::infrastructure::repositories::MemoryResourceStore;
    use std::time::Duration;

    fn tool_key(id: &str) -> ResourceKey {
        ResourceKey::new("demo", ResourceType::Tool, id)
    }

    #[test]
    fn test_sanitize_tool_id() {
        assert_eq!(sanitize_tool_id("Fetch Weather!"), "fetch-weather");
        assert_eq!(sanitize_tool_id("__"), "tool");
        assert_eq!(sanitize_tool_id("a_b-c"), "a_b-c");
    }

    #[test]
    fn test_user_import_specifiers() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("project");
        let import = |entry: &str| {
            let store = Arc::new(MemoryResourceStore::new());
            InlineToolManager::new("demo", root.clone(), store, Some(entry.to_string()))
                .unwrap()
                .inner
                .user_import()
                .unwrap()
        };

        assert_eq!(import("tools.ts"), "tools.ts");
        assert_eq!(import("./tools.ts"), "../../../tools.ts");
        assert_eq!(import("src/../lib/tools.ts"), "../../../lib/tools.ts");

        let outside = dir.path().join("shared").join("tools.ts");
        assert_eq!(import(outside.to_str().unwrap()), "../../../../shared/tools.ts");
        let inside = root.join(".agentflow").join("runtime").join("inline").join("extra.ts");
        assert_eq!(import(inside.to_str().unwrap()), "./extra.ts");
    }

    #[tokio::test]
    async fn test_sync_writes_modules_and_entrypoint() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryResourceStore::new());
        store
            .put(
                &tool_key("greet"),
                ToolConfig::inline("greet", "bun", "export default () => 'hi'").into(),
            )
            .await
            .unwrap();
        store
            .put(&tool_key("remote"), ToolConfig::reference("remote").into())
            .await
            .unwrap();

        let manager =
            InlineToolManager::new("demo", dir.path(), store.clone(), Some("./tools.ts".into()))
                .unwrap();
        manager.sync().await.unwrap();

        let module = manager.module_path("greet").unwrap();
        let name = module.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("greet_") && name.ends_with(".ts"));
        assert_eq!(fs::read_to_string(&module).unwrap(), "export default () => 'hi'\n");
        assert!(manager.module_path("remote").is_none());

        let entry = fs::read_to_string(manager.entrypoint_path()).unwrap();
        assert!(entry.contains(&format!("import inline0 from \"./{}\";", name)));
        assert!(entry.contains("import * as userExports from \"../../../tools.ts\";"));
        assert!(entry.contains("\"greet\": inline0,"));
    }

    #[tokio::test]
    async fn test_removed_tool_deletes_module() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryResourceStore::new());
        store
            .put(&tool_key("greet"), ToolConfig::inline("greet", "bun", "x").into())
            .await
            .unwrap();

        let manager = InlineToolManager::new("demo", dir.path(), store.clone(), None).unwrap();
        manager.sync().await.unwrap();
        let module = manager.module_path("greet").unwrap();
        assert!(module.exists());

        store.delete(&tool_key("greet")).await.unwrap();
        manager.sync().await.unwrap();
        assert!(!module.exists());
        let entry = fs::read_to_string(manager.entrypoint_path()).unwrap();
        assert!(!entry.contains("inlineExports,"));
    }

    #[tokio::test]
    async fn test_watch_resyncs_on_tool_change() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryResourceStore::new());
        let manager = InlineToolManager::new("demo", dir.path(), store.clone(), None).unwrap();
        manager.start().await.unwrap();

        store
            .put(&tool_key("late"), ToolConfig::inline("late", "bun", "y").into())
            .await
            .unwrap();

        let mut found = false;
        for _ in 0..50 {
            if manager.module_path("late").is_some() {
                found = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        manager.close().await;
        assert!(found, "watcher did not sync the new tool");
    }
}
