// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Reference Validation Results
//!
//! Output of a reference-validation pass over every registered and
//! store-resident resource. The pass is best-effort: a report collects every
//! missing reference and structural problem it sees instead of stopping at
//! the first one.
//!
//! | Type | Description |
//! |------|-------------|
//! | `ValidationReport` | Graph, findings and overall verdict |
//! | `MissingReference` | Dangling edge and the qualified path that holds it |
//! | `ValidationWarning` | Non-fatal finding (unused resource, empty id) |
//! | `ErrorList` | Aggregate error naming one failure or a numbered list |
//!
//! A report becomes an error through [`ValidationReport::into_result`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::graph::{describe_workflow_cycle, parse_node, NodeId};
use crate::domain::resource::ResourceType;

/// A reference whose target could not be resolved in memory or in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingReference {
    /// Node id of the missing target, e.g. `agent:ghost`.
    pub reference: String,
    /// Qualified path of the field holding the reference,
    /// e.g. `workflow.wf.tasks.step-start.agent`.
    pub source: String,
}

impl MissingReference {
    pub fn new(reference: &NodeId, source: impl Into<String>) -> Self {
        Self {
            reference: reference.to_string(),
            source: source.into(),
        }
    }

    /// Kind label and bare id of the missing target.
    fn target(&self) -> (String, &str) {
        let (prefix, id) = parse_node(&self.reference);
        let label = ResourceType::from_node_prefix(prefix)
            .map(|t| t.label().to_string())
            .unwrap_or_else(|| prefix.to_string());
        (label, id)
    }
}

impl fmt::Display for MissingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (kind, id) = self.target();
        write!(f, "{} references missing {} \"{}\"", self.source, kind, id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub resource_type: String,
    pub resource_id: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
            message: message.into(),
        }
    }
}

/// Structural problem found while walking a definition (empty or duplicate
/// task ids).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub resource_type: String,
    pub resource_id: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.resource_type, self.resource_id, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<ValidationIssue>,
    #[serde(default)]
    pub warnings: Vec<ValidationWarning>,
    /// Workflow cycles as node chains, first node repeated at the end.
    #[serde(default)]
    pub circular_deps: Vec<Vec<String>>,
    #[serde(default)]
    pub missing_refs: Vec<MissingReference>,
    #[serde(default)]
    pub dependency_graph: BTreeMap<String, Vec<String>>,
    pub resource_count: usize,
}

impl ValidationReport {
    /// Every failure in reporting order: structural errors, missing
    /// references, then cycles.
    pub fn failures(&self) -> Vec<String> {
        let mut out: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        out.extend(self.missing_refs.iter().map(ToString::to_string));
        out.extend(self.circular_deps.iter().map(|chain| {
            let nodes: Vec<NodeId> = chain.iter().map(|n| NodeId::new(n.as_str())).collect();
            describe_workflow_cycle(&nodes)
        }));
        out
    }

    /// `Ok(self)` when the report is valid, otherwise the aggregated failures.
    pub fn into_result(self) -> Result<ValidationReport, ErrorList> {
        if self.valid {
            return Ok(self);
        }
        let failures = self.failures();
        if failures.is_empty() {
            return Err(ErrorList::single("reference validation failed"));
        }
        Err(ErrorList::new(failures))
    }
}

/// One or more failure messages reported as a single error value.
///
/// A single entry displays as itself; several display as a numbered list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorList {
    errors: Vec<String>,
}

impl ErrorList {
    pub fn new(errors: Vec<String>) -> Self {
        Self { errors }
    }

    pub fn single(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// `Ok(())` when nothing was collected.
    pub fn into_result(self) -> Result<(), ErrorList> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [] => f.write_str("no errors"),
            [only] => f.write_str(only),
            many => {
                write!(f, "{} errors occurred:", many.len())?;
                for (i, message) in many.iter().enumerate() {
                    write!(f, "\n  {}. {}", i + 1, message)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ErrorList {}
