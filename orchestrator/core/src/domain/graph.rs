// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Dependency Graph
//!
//! Typed node ids, the adjacency map built by reference validation, and the
//! cycle detector run over the workflow-call sub-graph.
//!
//! # Architecture
//!
//! - **Layer:** Domain
//! - **Purpose:** Graph primitives with no knowledge of storage
//! - **Related:** [`crate::application::reference_validation`] populates the graph
//!
//! Node ids take the form `type:id`, with tasks addressed as
//! `task:<workflow>/<task>`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

use crate::domain::resource::ResourceType;

/// Identifier of a node in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn resource(resource_type: ResourceType, id: &str) -> Self {
        Self(format!("{}:{}", resource_type.node_prefix(), id))
    }

    pub fn project(name: &str) -> Self {
        Self::resource(ResourceType::Project, name)
    }

    pub fn workflow(id: &str) -> Self {
        Self::resource(ResourceType::Workflow, id)
    }

    pub fn task(workflow_id: &str, task_id: &str) -> Self {
        Self(format!("task:{}/{}", workflow_id, task_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `(type, id)` split of this node, see [`parse_node`].
    pub fn parts(&self) -> (&str, &str) {
        parse_node(&self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Splits a node id on its first `':'`.
///
/// Without a colon the whole input is returned as the type and the id is
/// empty; malformed ids are not treated as errors.
pub fn parse_node(node: &str) -> (&str, &str) {
    match node.split_once(':') {
        Some((node_type, id)) => (node_type, id),
        None => (node, ""),
    }
}

/// Closes the cycle that reached `target` while `path` was being explored.
///
/// Returns `path[last index of target..]` followed by `target`, or just
/// `[target]` when `target` is not on the path.
pub fn extract_cycle<T: Clone + PartialEq>(path: &[T], target: &T) -> Vec<T> {
    match path.iter().rposition(|node| node == target) {
        Some(idx) => {
            let mut cycle = path[idx..].to_vec();
            cycle.push(target.clone());
            cycle
        }
        None => vec![target.clone()],
    }
}

/// Adjacency map from a node to the nodes it depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    edges: BTreeMap<NodeId, BTreeSet<NodeId>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensures `node` exists even when it has no outgoing edges.
    pub fn add_node(&mut self, node: NodeId) {
        self.edges.entry(node).or_default();
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId) {
        if from.as_str().is_empty() || to.as_str().is_empty() {
            return;
        }
        self.edges.entry(from).or_default().insert(to);
    }

    pub fn dependencies(&self, node: &NodeId) -> impl Iterator<Item = &NodeId> {
        self.edges.get(node).into_iter().flatten()
    }

    pub fn contains_edge(&self, from: &NodeId, to: &NodeId) -> bool {
        self.edges.get(from).is_some_and(|deps| deps.contains(to))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.edges.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Sub-graph restricted to edges whose endpoints are both of `node_type`.
    pub fn restricted_to(&self, node_type: &str) -> DependencyGraph {
        let mut sub = DependencyGraph::new();
        for (from, deps) in &self.edges {
            if from.parts().0 != node_type {
                continue;
            }
            sub.add_node(from.clone());
            for dep in deps.iter().filter(|d| d.parts().0 == node_type) {
                sub.add_edge(from.clone(), dep.clone());
            }
        }
        sub
    }

    /// Sorted `node -> [deps]` view for reports.
    pub fn to_map(&self) -> BTreeMap<String, Vec<String>> {
        self.edges
            .iter()
            .filter(|(_, deps)| !deps.is_empty())
            .map(|(node, deps)| {
                (
                    node.to_string(),
                    deps.iter().map(NodeId::to_string).collect(),
                )
            })
            .collect()
    }

    /// Depth-first search for the first cycle.
    ///
    /// Roots and neighbours are visited in sorted order, so the reported
    /// chain is deterministic for a given graph.
    pub fn find_cycle(&self) -> Option<Vec<NodeId>> {
        let mut visitor = CycleVisitor {
            graph: self,
            visited: HashSet::new(),
            on_stack: HashSet::new(),
            path: Vec::new(),
        };
        for root in self.edges.keys() {
            if visitor.visited.contains(root) {
                continue;
            }
            if let Some(cycle) = visitor.visit(root) {
                return Some(cycle);
            }
        }
        None
    }

    /// Topological order with dependencies first.
    ///
    /// Among nodes that are ready at the same time, the one with the lowest
    /// index in `preferred` wins; nodes absent from `preferred` come after, in
    /// sorted order. Returns `None` when the graph has a cycle.
    pub fn topological_order(&self, preferred: &[NodeId]) -> Option<Vec<NodeId>> {
        let rank: HashMap<&NodeId, usize> =
            preferred.iter().enumerate().map(|(i, n)| (n, i)).collect();
        let mut nodes: BTreeSet<&NodeId> = self.edges.keys().collect();
        for deps in self.edges.values() {
            nodes.extend(deps.iter());
        }

        let mut pending: HashMap<&NodeId, usize> = HashMap::new();
        let mut dependents: HashMap<&NodeId, Vec<&NodeId>> = HashMap::new();
        for node in &nodes {
            let deps = self.edges.get(*node).map(BTreeSet::len).unwrap_or(0);
            pending.insert(*node, deps);
            for dep in self.dependencies(node) {
                dependents.entry(dep).or_default().push(*node);
            }
        }

        let sort_key = |node: &&NodeId| {
            (rank.get(*node).copied().unwrap_or(usize::MAX), (*node).clone())
        };
        let mut ready: Vec<&NodeId> = nodes.iter().copied().filter(|n| pending[n] == 0).collect();
        let mut order = Vec::with_capacity(nodes.len());

        while !ready.is_empty() {
            ready.sort_by_key(sort_key);
            let node = ready.remove(0);
            order.push(node.clone());
            for dependent in dependents.get(node).into_iter().flatten() {
                if let Some(count) = pending.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.push(*dependent);
                    }
                }
            }
        }

        (order.len() == nodes.len()).then_some(order)
    }
}

struct CycleVisitor<'a> {
    graph: &'a DependencyGraph,
    visited: HashSet<NodeId>,
    on_stack: HashSet<NodeId>,
    path: Vec<NodeId>,
}

impl CycleVisitor<'_> {
    fn visit(&mut self, node: &NodeId) -> Option<Vec<NodeId>> {
        self.visited.insert(node.clone());
        self.on_stack.insert(node.clone());
        self.path.push(node.clone());

        let graph = self.graph;
        for dep in graph.dependencies(node) {
            if self.on_stack.contains(dep) {
                return Some(extract_cycle(&self.path, dep));
            }
            if !self.visited.contains(dep) {
                if let Some(cycle) = self.visit(dep) {
                    return Some(cycle);
                }
            }
        }

        self.on_stack.remove(node);
        self.path.pop();
        None
    }
}

/// Renders a workflow cycle as `workflow dependency cycle: a -> b -> a`.
pub fn describe_workflow_cycle(cycle: &[NodeId]) -> String {
    let chain: Vec<&str> = cycle.iter().map(|node| node.parts().1).collect();
    format!("workflow dependency cycle: {}", chain.join(" -> "))
}
