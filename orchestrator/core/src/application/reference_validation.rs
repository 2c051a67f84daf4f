// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Reference Validation Service
//!
//! Builds the dependency graph over every registered, workflow-scoped and
//! project-scoped resource, resolves each reference and reports what is
//! missing, unused or cyclic.
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Responsibility:** Graph construction and reference resolution
//! - **Collaborators:**
//!   - Domain: [`DependencyGraph`], [`ValidationReport`]
//!   - Domain: [`ResourceStore`] (hybrid lookups, prefetched)
//!
//! # Resolution
//!
//! A reference resolves against, in order:
//!
//! 1. resources declared in process (registered, workflow- or project-scoped,
//!    or declared inline at the use site)
//! 2. ids present in the store ([`ExternalResources`]), e.g. indexed from YAML
//!    without going through the engine
//!
//! Store hits are external and never reported as unused. The scan is
//! best-effort: every miss is recorded and scanning continues. The
//! workflow-call sub-graph is then checked for a cycle, stopping at the first
//! one found.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

use crate::application::registry::ResourceRegistry;
use crate::domain::agent::AgentConfig;
use crate::domain::graph::{parse_node, DependencyGraph, NodeId};
use crate::domain::knowledge::KnowledgeBaseConfig;
use crate::domain::repository::{ResourceStore, StoreError};
use crate::domain::resource::{Input, ResourceType, ResourceValue};
use crate::domain::tool::{is_builtin_tool, workflow_call_targets, ToolConfig};
use crate::domain::validation::{
    MissingReference, ValidationIssue, ValidationReport, ValidationWarning,
};
use crate::domain::workflow::{TaskConfig, WorkflowConfig};

/// Kinds that can be the target of a reference and are looked up in the
/// store.
const REFERENCE_KINDS: [ResourceType; 7] = [
    ResourceType::Workflow,
    ResourceType::Agent,
    ResourceType::Tool,
    ResourceType::KnowledgeBase,
    ResourceType::Memory,
    ResourceType::Embedder,
    ResourceType::VectorDb,
];

/// Kinds reported when declared but never referenced. Workflows are entry
/// points and are never unused.
const UNUSED_KINDS: [ResourceType; 6] = [
    ResourceType::Agent,
    ResourceType::Tool,
    ResourceType::KnowledgeBase,
    ResourceType::Memory,
    ResourceType::Embedder,
    ResourceType::VectorDb,
];

/// Registered resource kinds other than project and workflow, in scan order.
const REGISTERED_KINDS: [ResourceType; 11] = [
    ResourceType::Agent,
    ResourceType::Tool,
    ResourceType::KnowledgeBase,
    ResourceType::Memory,
    ResourceType::Mcp,
    ResourceType::Schema,
    ResourceType::Model,
    ResourceType::Schedule,
    ResourceType::Webhook,
    ResourceType::Embedder,
    ResourceType::VectorDb,
];

/// Resource ids found in the store for one project.
#[derive(Debug, Clone, Default)]
pub struct ExternalResources {
    known: HashSet<(ResourceType, String)>,
}

impl ExternalResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lists every referenceable kind for `project`.
    pub async fn collect(store: &dyn ResourceStore, project: &str) -> Result<Self, StoreError> {
        let mut external = Self::new();
        for kind in REFERENCE_KINDS {
            for key in store.list(project, kind).await? {
                external.insert(kind, key.id);
            }
        }
        debug!(project = %project, count = external.len(), "Collected store-resident resources");
        Ok(external)
    }

    pub fn insert(&mut self, resource_type: ResourceType, id: impl Into<String>) {
        self.known.insert((resource_type, id.into()));
    }

    pub fn contains(&self, resource_type: ResourceType, id: &str) -> bool {
        self.known.contains(&(resource_type, id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

pub struct ReferenceValidator<'a> {
    registry: &'a ResourceRegistry,
    external: &'a ExternalResources,
}

impl<'a> ReferenceValidator<'a> {
    pub fn new(registry: &'a ResourceRegistry, external: &'a ExternalResources) -> Self {
        Self { registry, external }
    }

    pub fn validate(&self) -> ValidationReport {
        let mut scan = Scan::new(self.external);
        self.declare_project(&mut scan);
        for workflow in self.registry.workflows() {
            declare_workflow(&mut scan, workflow);
        }
        self.declare_registered(&mut scan);

        self.link_project(&mut scan);
        self.link_registered(&mut scan);
        for workflow in self.registry.workflows() {
            link_workflow(&mut scan, workflow);
        }

        let report = scan.finish();
        debug!(
            valid = report.valid,
            resources = report.resource_count,
            missing = report.missing_refs.len(),
            warnings = report.warnings.len(),
            "Reference validation finished"
        );
        report
    }

    fn declare_project(&self, scan: &mut Scan<'_>) {
        let Some(project) = self.registry.project() else {
            return;
        };
        scan.add_node(NodeId::project(project.name.trim()));

        let scoped = project
            .tools
            .iter()
            .filter(|t| !t.is_reference())
            .map(|t| (ResourceType::Tool, t.id.as_str()))
            .chain(project.memories.iter().map(|m| (ResourceType::Memory, m.id.as_str())))
            .chain(
                project
                    .knowledge_bases
                    .iter()
                    .map(|kb| (ResourceType::KnowledgeBase, kb.id.as_str())),
            )
            .chain(project.embedders.iter().map(|e| (ResourceType::Embedder, e.id.as_str())))
            .chain(project.vector_dbs.iter().map(|v| (ResourceType::VectorDb, v.id.as_str())));

        for (kind, id) in scoped {
            if id.trim().is_empty() {
                scan.warn(kind, "", "resource with empty id ignored");
                continue;
            }
            scan.declare(kind, id, format!("project.{}", kind.as_str()));
        }
    }

    fn declare_registered(&self, scan: &mut Scan<'_>) {
        for kind in REGISTERED_KINDS {
            for (id, _) in self.registry.resources(kind) {
                if id.trim().is_empty() {
                    scan.warn(kind, "", "resource with empty id ignored");
                    continue;
                }
                scan.declare(kind, id, format!("{}.{}", kind.as_str(), id));
            }
        }
    }

    fn link_project(&self, scan: &mut Scan<'_>) {
        let Some(project) = self.registry.project() else {
            return;
        };
        let node = NodeId::project(project.name.trim());

        for binding in &project.knowledge {
            scan.reference(&node, ResourceType::KnowledgeBase, &binding.id, "project.knowledge");
        }
        for kb in &project.knowledge_bases {
            link_knowledge_base(scan, kb, &format!("project.knowledge_base.{}", kb.id.trim()));
        }
        for tool in project.tools.iter().filter(|t| t.is_reference()) {
            scan.tool(&node, None, tool, None, "project.tool");
        }
    }

    fn link_registered(&self, scan: &mut Scan<'_>) {
        for kind in REGISTERED_KINDS {
            for (id, value) in self.registry.resources(kind) {
                let node = NodeId::resource(kind, id);
                match value {
                    ResourceValue::Agent(agent) => {
                        link_agent(scan, &node, agent, &format!("agent.{}", id), None);
                    }
                    ResourceValue::KnowledgeBase(kb) => {
                        link_knowledge_base(scan, kb, &format!("knowledge_base.{}", id));
                    }
                    ResourceValue::Schedule(schedule) => {
                        scan.reference(
                            &node,
                            ResourceType::Workflow,
                            &schedule.workflow_id,
                            &format!("schedule.{}.workflow_id", id),
                        );
                    }
                    ResourceValue::Webhook(webhook) => {
                        for event in &webhook.events {
                            scan.reference(
                                &node,
                                ResourceType::Workflow,
                                &event.workflow_id,
                                &format!("webhook.{}.events.{}.workflow_id", id, event.name.trim()),
                            );
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}

fn declare_workflow(scan: &mut Scan<'_>, workflow: &WorkflowConfig) {
    let wf = workflow.id.trim();
    scan.declare(ResourceType::Workflow, wf, format!("workflow.{}", wf));

    for agent in workflow.agents.iter().filter(|a| !a.is_reference()) {
        if agent.id.trim().is_empty() {
            scan.warn(ResourceType::Agent, "", "workflow agent with empty id ignored");
            continue;
        }
        scan.declare(
            ResourceType::Agent,
            &agent.id,
            format!("workflow.{}.agent.{}", wf, agent.id.trim()),
        );
    }
    for tool in workflow.tools.iter().filter(|t| !t.is_reference()) {
        if tool.id.trim().is_empty() {
            scan.warn(ResourceType::Tool, "", "workflow tool with empty id ignored");
            continue;
        }
        scan.declare(
            ResourceType::Tool,
            &tool.id,
            format!("workflow.{}.tool.{}", wf, tool.id.trim()),
        );
    }
    for kb in &workflow.knowledge_bases {
        if kb.id.trim().is_empty() {
            scan.warn(
                ResourceType::KnowledgeBase,
                "",
                "workflow knowledge base with empty id ignored",
            );
            continue;
        }
        scan.declare(
            ResourceType::KnowledgeBase,
            &kb.id,
            format!("workflow.{}.knowledge_base.{}", wf, kb.id.trim()),
        );
    }
}

fn link_workflow(scan: &mut Scan<'_>, workflow: &WorkflowConfig) {
    let wf = workflow.id.trim();
    let wf_node = NodeId::workflow(wf);
    let base = format!("workflow.{}", wf);

    for binding in &workflow.knowledge {
        scan.reference(
            &wf_node,
            ResourceType::KnowledgeBase,
            &binding.id,
            &format!("{}.knowledge", base),
        );
    }
    for kb in workflow.knowledge_bases.iter().filter(|kb| !kb.id.trim().is_empty()) {
        link_knowledge_base(scan, kb, &format!("{}.knowledge_base.{}", base, kb.id.trim()));
    }
    for agent in &workflow.agents {
        let id = agent.id.trim();
        if agent.is_reference() {
            scan.reference(&wf_node, ResourceType::Agent, id, &format!("{}.agent", base));
        } else if !id.is_empty() {
            let node = NodeId::resource(ResourceType::Agent, id);
            link_agent(scan, &node, agent, &format!("{}.agent.{}", base, id), Some(&wf_node));
        }
    }
    for tool in workflow.tools.iter().filter(|t| t.is_reference()) {
        scan.tool(&wf_node, Some(&wf_node), tool, None, &format!("{}.tool", base));
    }

    // Task nodes first so transitions can be checked in any order.
    let mut task_ids = HashSet::new();
    for task in &workflow.tasks {
        let id = task.id.trim();
        if id.is_empty() {
            scan.error(ResourceType::Workflow, wf, "task id is required".to_string());
            continue;
        }
        if !task_ids.insert(id) {
            scan.error(ResourceType::Workflow, wf, format!("duplicate task id {}", id));
            continue;
        }
        let node = NodeId::task(wf, id);
        scan.add_node(node.clone());
        scan.graph.add_edge(wf_node.clone(), node);
    }

    for (index, task) in workflow.tasks.iter().enumerate() {
        link_task(scan, &wf_node, wf, index, task, &task_ids);
    }
}

fn link_task(
    scan: &mut Scan<'_>,
    wf_node: &NodeId,
    wf: &str,
    index: usize,
    task: &TaskConfig,
    task_ids: &HashSet<&str>,
) {
    let id = task.id.trim();
    let (path, from) = if id.is_empty() {
        (format!("workflow.{}.tasks[{}]", wf, index), wf_node.clone())
    } else {
        (format!("workflow.{}.tasks.{}", wf, id), NodeId::task(wf, id))
    };

    if let Some(agent) = &task.agent {
        let agent_path = format!("{}.agent", path);
        if !agent.is_reference() && !agent.id.trim().is_empty() {
            scan.declare(ResourceType::Agent, &agent.id, agent_path.clone());
            let node = NodeId::resource(ResourceType::Agent, agent.id.trim());
            link_agent(scan, &node, agent, &agent_path, Some(wf_node));
        }
        scan.reference(&from, ResourceType::Agent, &agent.id, &agent_path);
    }
    if let Some(tool) = &task.tool {
        scan.tool(&from, Some(wf_node), tool, task.with.as_ref(), &format!("{}.tool", path));
    }
    for binding in &task.knowledge {
        scan.reference(
            &from,
            ResourceType::KnowledgeBase,
            &binding.id,
            &format!("{}.knowledge", path),
        );
    }
    if let Some(memory) = &task.memory_ref {
        scan.reference(&from, ResourceType::Memory, memory, &format!("{}.memory_ref", path));
    }

    let transitions = [("on_success", &task.on_success), ("on_error", &task.on_error)];
    for (field, transition) in transitions {
        let Some(target) = transition.as_ref().and_then(|t| t.target()) else {
            continue;
        };
        let to = NodeId::task(wf, target);
        scan.graph.add_edge(from.clone(), to.clone());
        if !task_ids.contains(target) {
            scan.missing.push(MissingReference::new(&to, format!("{}.{}", path, field)));
        }
    }
}

fn link_agent(
    scan: &mut Scan<'_>,
    node: &NodeId,
    agent: &AgentConfig,
    base: &str,
    workflow: Option<&NodeId>,
) {
    for binding in &agent.knowledge {
        scan.reference(
            node,
            ResourceType::KnowledgeBase,
            &binding.id,
            &format!("{}.knowledge", base),
        );
    }
    for memory in &agent.memory {
        scan.reference(node, ResourceType::Memory, &memory.id, &format!("{}.memory", base));
    }
    for tool in &agent.tools {
        scan.tool(node, workflow, tool, agent.with.as_ref(), &format!("{}.tool", base));
    }
    for action in &agent.actions {
        let path = format!("{}.action.{}.tool", base, action.id.trim());
        for tool in &action.tools {
            scan.tool(node, workflow, tool, action.with.as_ref(), &path);
        }
    }
}

fn link_knowledge_base(scan: &mut Scan<'_>, kb: &KnowledgeBaseConfig, base: &str) {
    let node = NodeId::resource(ResourceType::KnowledgeBase, kb.id.trim());
    scan.reference(&node, ResourceType::Embedder, &kb.embedder, &format!("{}.embedder", base));
    scan.reference(&node, ResourceType::VectorDb, &kb.vector_db, &format!("{}.vector_db", base));
}

#[derive(Debug)]
struct IndexEntry {
    source: String,
    referenced: bool,
    external: bool,
}

/// Mutable state of one validation pass.
struct Scan<'a> {
    external: &'a ExternalResources,
    index: BTreeMap<(ResourceType, String), IndexEntry>,
    graph: DependencyGraph,
    nodes: BTreeSet<NodeId>,
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationWarning>,
    missing: Vec<MissingReference>,
}

impl<'a> Scan<'a> {
    fn new(external: &'a ExternalResources) -> Self {
        Self {
            external,
            index: BTreeMap::new(),
            graph: DependencyGraph::new(),
            nodes: BTreeSet::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            missing: Vec::new(),
        }
    }

    fn add_node(&mut self, node: NodeId) {
        self.graph.add_node(node.clone());
        self.nodes.insert(node);
    }

    /// Records an in-process declaration. The first declaration of an id wins.
    fn declare(&mut self, kind: ResourceType, id: &str, source: String) {
        let id = id.trim();
        if id.is_empty() {
            return;
        }
        self.index.entry((kind, id.to_string())).or_insert(IndexEntry {
            source,
            referenced: false,
            external: false,
        });
        self.add_node(NodeId::resource(kind, id));
    }

    fn resolve(&mut self, kind: ResourceType, id: &str) -> bool {
        if let Some(entry) = self.index.get_mut(&(kind, id.to_string())) {
            entry.referenced = true;
            return true;
        }
        if self.external.contains(kind, id) {
            self.index.insert(
                (kind, id.to_string()),
                IndexEntry {
                    source: "store".to_string(),
                    referenced: true,
                    external: true,
                },
            );
            self.add_node(NodeId::resource(kind, id));
            return true;
        }
        false
    }

    /// Adds `from -> kind:id` and records a miss when the target does not
    /// resolve. Blank ids are skipped.
    fn reference(&mut self, from: &NodeId, kind: ResourceType, id: &str, path: &str) {
        let id = id.trim();
        if id.is_empty() {
            return;
        }
        let to = NodeId::resource(kind, id);
        self.graph.add_edge(from.clone(), to.clone());
        if !self.resolve(kind, id) {
            self.missing.push(MissingReference::new(&to, path));
        }
    }

    /// Tool use site. Built-in call-workflow tools add workflow edges from the
    /// enclosing workflow instead of a tool edge; inline definitions are
    /// declared where they are used.
    fn tool(
        &mut self,
        from: &NodeId,
        workflow: Option<&NodeId>,
        tool: &ToolConfig,
        input: Option<&Input>,
        path: &str,
    ) {
        let id = tool.id.trim();
        if id.is_empty() {
            return;
        }
        if is_builtin_tool(id) {
            let caller = workflow.unwrap_or(from);
            if let Some(input) = input.or(tool.with.as_ref()) {
                for target in workflow_call_targets(id, input) {
                    self.reference(caller, ResourceType::Workflow, &target, path);
                }
            }
            return;
        }
        if !tool.is_reference() {
            self.declare(ResourceType::Tool, id, path.to_string());
        }
        self.reference(from, ResourceType::Tool, id, path);
    }

    fn warn(&mut self, kind: ResourceType, id: &str, message: &str) {
        self.warnings.push(ValidationWarning::new(kind.as_str(), id, message));
    }

    fn error(&mut self, kind: ResourceType, id: &str, message: String) {
        self.errors.push(ValidationIssue {
            resource_type: kind.as_str().to_string(),
            resource_id: id.to_string(),
            message,
        });
    }

    fn finish(mut self) -> ValidationReport {
        let unused: Vec<ValidationWarning> = self
            .index
            .iter()
            .filter(|((kind, _), entry)| {
                UNUSED_KINDS.contains(kind) && !entry.referenced && !entry.external
            })
            .map(|((kind, id), entry)| {
                ValidationWarning::new(
                    kind.as_str(),
                    id.as_str(),
                    format!(
                        "{} \"{}\" declared at {} is never referenced",
                        kind.label(),
                        id,
                        entry.source
                    ),
                )
            })
            .collect();
        self.warnings.extend(unused);

        let circular_deps: Vec<Vec<String>> = self
            .graph
            .restricted_to(ResourceType::Workflow.node_prefix())
            .find_cycle()
            .map(|cycle| vec![cycle.iter().map(NodeId::to_string).collect()])
            .unwrap_or_default();

        let valid = self.errors.is_empty() && self.missing.is_empty() && circular_deps.is_empty();
        ValidationReport {
            valid,
            errors: self.errors,
            warnings: self.warnings,
            circular_deps,
            missing_refs: self.missing,
            dependency_graph: self.graph.to_map(),
            resource_count: self.nodes.len(),
        }
    }
}

/// Topological order of `registered` workflows with callees first, ties
/// broken by the given order. `None` when the workflow-call edges in
/// `report` form a cycle.
pub fn workflow_order(report: &ValidationReport, registered: &[String]) -> Option<Vec<String>> {
    let known: HashSet<&str> = registered.iter().map(String::as_str).collect();
    let workflow_prefix = ResourceType::Workflow.node_prefix();

    let mut graph = DependencyGraph::new();
    for id in registered {
        graph.add_node(NodeId::workflow(id));
    }
    for (node, deps) in &report.dependency_graph {
        let (kind, id) = parse_node(node);
        if kind != workflow_prefix || !known.contains(id) {
            continue;
        }
        for dep in deps {
            let (dep_kind, dep_id) = parse_node(dep);
            if dep_kind == workflow_prefix && known.contains(dep_id) {
                graph.add_edge(NodeId::workflow(id), NodeId::workflow(dep_id));
            }
        }
    }

    let preferred: Vec<NodeId> = registered.iter().map(|id| NodeId::workflow(id)).collect();
    graph
        .topological_order(&preferred)
        .map(|order| order.iter().map(|node| node.parts().1.to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::MemoryReference;
    use crate::domain::knowledge::{EmbedderConfig, KnowledgeBinding, VectorDbConfig};
    use crate::domain::project::ProjectConfig;
    use crate::domain::resource::{MetaSource, ResourceKey};
    use crate::domain::schedule::ScheduleConfig;
    use crate::domain::tool::CALL_WORKFLOWS_TOOL;
    use crate::infrastructure::repositories::MemoryResourceStore;
    use serde_json::json;

    fn registry_with(values: Vec<ResourceValue>) -> ResourceRegistry {
        let mut registry = ResourceRegistry::new();
        registry
            .insert("demo", ProjectConfig::new("demo").into())
            .unwrap();
        for value in values {
            let id = match &value {
                ResourceValue::Workflow(w) => w.id.clone(),
                ResourceValue::Agent(a) => a.id.clone(),
                ResourceValue::Tool(t) => t.id.clone(),
                ResourceValue::KnowledgeBase(kb) => kb.id.clone(),
                ResourceValue::Memory(m) => m.id.clone(),
                ResourceValue::Schedule(s) => s.id.clone(),
                other => panic!("unexpected test value {:?}", other.resource_type()),
            };
            registry.insert(&id, value).unwrap();
        }
        registry
    }

    fn validate(registry: &ResourceRegistry) -> ValidationReport {
        ReferenceValidator::new(registry, &ExternalResources::new()).validate()
    }

    fn calls(id: &str, target: &str) -> ResourceValue {
        WorkflowConfig::new(id)
            .with_task(TaskConfig::call_workflow("call", target))
            .into()
    }

    #[test]
    fn test_missing_agent_reference_is_reported_with_path() {
        let registry = registry_with(vec![WorkflowConfig::new("wf")
            .with_task(TaskConfig::new("step-start").with_agent(AgentConfig::reference("ghost")))
            .into()]);

        let report = validate(&registry);
        assert!(!report.valid);
        assert_eq!(report.missing_refs.len(), 1);
        assert_eq!(report.missing_refs[0].reference, "agent:ghost");
        assert_eq!(report.missing_refs[0].source, "workflow.wf.tasks.step-start.agent");
        assert_eq!(
            report.missing_refs[0].to_string(),
            "workflow.wf.tasks.step-start.agent references missing agent \"ghost\""
        );
    }

    #[test]
    fn test_scan_continues_after_first_miss() {
        let registry = registry_with(vec![WorkflowConfig::new("wf")
            .with_task(
                TaskConfig::new("a")
                    .with_agent(AgentConfig::reference("ghost"))
                    .with_tool(ToolConfig::reference("nope")),
            )
            .with_task(TaskConfig {
                memory_ref: Some("lost".into()),
                ..TaskConfig::new("b")
            })
            .into()]);

        let report = validate(&registry);
        let sources: Vec<&str> = report.missing_refs.iter().map(|m| m.source.as_str()).collect();
        assert_eq!(
            sources,
            vec![
                "workflow.wf.tasks.a.agent",
                "workflow.wf.tasks.a.tool",
                "workflow.wf.tasks.b.memory_ref",
            ]
        );
        let err = report.into_result().unwrap_err();
        assert!(err.to_string().starts_with("3 errors occurred:"));
    }

    #[test]
    fn test_registered_reference_resolves_and_edges_recorded() {
        let mut writer = AgentConfig::new("writer", "Write.");
        writer.memory.push(MemoryReference {
            id: "history".into(),
            key: None,
        });
        let registry = registry_with(vec![
            writer.into(),
            crate::domain::memory::MemoryConfig::new("history").into(),
            WorkflowConfig::new("wf")
                .with_task(TaskConfig::new("t").with_agent(AgentConfig::reference("writer")))
                .into(),
        ]);

        let report = validate(&registry);
        assert!(report.valid, "{:?}", report.failures());
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
        assert_eq!(report.dependency_graph["workflow:wf"], vec!["task:wf/t".to_string()]);
        assert_eq!(report.dependency_graph["task:wf/t"], vec!["agent:writer".to_string()]);
        assert_eq!(report.dependency_graph["agent:writer"], vec!["memory:history".to_string()]);
        // project, workflow, task, agent, memory
        assert_eq!(report.resource_count, 5);
    }

    #[tokio::test]
    async fn test_store_resident_agent_resolves_as_external() {
        let store = MemoryResourceStore::new();
        store
            .put(
                &ResourceKey::new("demo", ResourceType::Agent, "indexed"),
                AgentConfig::new("indexed", "From YAML.").into(),
            )
            .await
            .unwrap();
        store
            .put(
                &ResourceKey::new("demo", ResourceType::Tool, "unused-in-store"),
                ToolConfig::inline("unused-in-store", "bun", "x").into(),
            )
            .await
            .unwrap();

        let registry = registry_with(vec![WorkflowConfig::new("wf")
            .with_task(TaskConfig::new("t").with_agent(AgentConfig::reference("indexed")))
            .into()]);
        let external = ExternalResources::collect(&store, "demo").await.unwrap();
        let report = ReferenceValidator::new(&registry, &external).validate();

        assert!(report.valid, "{:?}", report.failures());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_unused_resources_are_warnings_only() {
        let registry = registry_with(vec![
            ToolConfig::inline("formatter", "bun", "export default () => 1").into(),
            WorkflowConfig::new("wf").with_task(TaskConfig::new("t")).into(),
        ]);

        let report = validate(&registry);
        assert!(report.valid);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].resource_type, "tool");
        assert_eq!(report.warnings[0].resource_id, "formatter");
    }

    #[test]
    fn test_call_workflow_cycle_detected() {
        let registry = registry_with(vec![calls("alpha", "beta"), calls("beta", "alpha")]);

        let report = validate(&registry);
        assert!(!report.valid);
        assert!(report.missing_refs.is_empty());
        assert_eq!(
            report.circular_deps,
            vec![vec![
                "workflow:alpha".to_string(),
                "workflow:beta".to_string(),
                "workflow:alpha".to_string()
            ]]
        );
        let message = report.into_result().unwrap_err().to_string();
        assert!(message.contains("workflow dependency cycle"));
        assert!(message.contains("alpha") && message.contains("beta"));
    }

    #[test]
    fn test_call_workflows_targets_and_builtin_not_missing() {
        let fan_out = TaskConfig::new("fan")
            .with_tool(ToolConfig::reference(CALL_WORKFLOWS_TOOL))
            .with_input(
                "workflows",
                json!([{ "workflow_id": "child" }, { "workflow_id": "absent" }]),
            );
        let registry = registry_with(vec![
            WorkflowConfig::new("parent").with_task(fan_out).into(),
            WorkflowConfig::new("child").with_task(TaskConfig::new("t")).into(),
        ]);

        let report = validate(&registry);
        assert_eq!(report.missing_refs.len(), 1);
        assert_eq!(report.missing_refs[0].reference, "workflow:absent");
        assert_eq!(report.missing_refs[0].source, "workflow.parent.tasks.fan.tool");
        assert!(report.dependency_graph["workflow:parent"].contains(&"workflow:child".to_string()));
    }

    #[test]
    fn test_structural_task_errors_and_index_paths() {
        let registry = registry_with(vec![WorkflowConfig::new("wf")
            .with_task(TaskConfig::new("").with_agent(AgentConfig::reference("ghost")))
            .with_task(TaskConfig::new("dup"))
            .with_task(TaskConfig::new("dup"))
            .into()]);

        let report = validate(&registry);
        assert!(!report.valid);
        let messages: Vec<&str> = report.errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["task id is required", "duplicate task id dup"]);
        assert_eq!(report.missing_refs[0].source, "workflow.wf.tasks[0].agent");
    }

    #[test]
    fn test_knowledge_base_dependencies_and_project_scope() {
        let mut project = ProjectConfig::new("demo");
        project
            .knowledge_bases
            .push(KnowledgeBaseConfig::new("docs", "ada", "pg"));
        project.embedders.push(EmbedderConfig {
            id: "ada".into(),
            provider: "openai".into(),
            model: "text-embedding-3-small".into(),
            dimension: None,
        });
        project.knowledge.push(KnowledgeBinding::new("docs"));
        let mut registry = ResourceRegistry::new();
        registry.insert("demo", project.into()).unwrap();

        let report = validate(&registry);
        assert_eq!(report.missing_refs.len(), 1);
        assert_eq!(report.missing_refs[0].source, "project.knowledge_base.docs.vector_db");
        assert_eq!(report.missing_refs[0].reference, "vector_db:pg");
        assert_eq!(
            report.dependency_graph["knowledge:docs"],
            vec!["embedder:ada".to_string(), "vector_db:pg".to_string()]
        );
    }

    #[test]
    fn test_unused_project_vector_db_warns() {
        let mut project = ProjectConfig::new("demo");
        project.vector_dbs.push(VectorDbConfig {
            id: "spare".into(),
            ..Default::default()
        });
        let mut registry = ResourceRegistry::new();
        registry.insert("demo", project.into()).unwrap();

        let report = validate(&registry);
        assert!(report.valid);
        assert_eq!(report.warnings[0].resource_type, "vector_db");
        assert!(report.warnings[0].message.contains("project.vector_db"));
    }

    #[test]
    fn test_workflow_scoped_empty_ids_warn() {
        let mut workflow = WorkflowConfig::new("wf").with_task(TaskConfig::new("t"));
        workflow.agents.push(AgentConfig::new("", "No id."));
        workflow.tools.push(ToolConfig::inline("", "bun", "x"));
        workflow.knowledge_bases.push(KnowledgeBaseConfig::new("", "", ""));
        let registry = registry_with(vec![workflow.into()]);

        let report = validate(&registry);
        assert!(report.valid);
        let messages: Vec<&str> = report.warnings.iter().map(|w| w.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "workflow agent with empty id ignored",
                "workflow tool with empty id ignored",
                "workflow knowledge base with empty id ignored",
            ]
        );
    }

    #[test]
    fn test_schedule_target_checked() {
        let registry =
            registry_with(vec![ScheduleConfig::new("nightly", "report", "0 0 * * *").into()]);
        let report = validate(&registry);
        assert_eq!(report.missing_refs[0].source, "schedule.nightly.workflow_id");
    }

    #[test]
    fn test_workflow_order_puts_callees_first() {
        let registry = registry_with(vec![
            calls("parent", "child"),
            WorkflowConfig::new("other").with_task(TaskConfig::new("t")).into(),
            WorkflowConfig::new("child").with_task(TaskConfig::new("t")).into(),
        ]);
        let report = validate(&registry);
        assert!(report.valid);

        let order = workflow_order(&report, registry.workflow_order()).unwrap();
        assert_eq!(order, vec!["other".to_string(), "child".to_string(), "parent".to_string()]);
    }

    #[test]
    fn test_pending_source_is_irrelevant_to_validation() {
        let mut registry = registry_with(vec![]);
        registry.push_pending("a", AgentConfig::new("a", "x").into(), MetaSource::Sdk);
        let report = validate(&registry);
        assert!(report.valid);
        assert_eq!(report.resource_count, 1);
    }
}
