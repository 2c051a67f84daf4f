// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-process resource registry.
//!
//! Holds every resource registered through the engine, keyed by kind and id,
//! plus the workflow order list. Resources registered before a store exists
//! are also queued as pending so engine start can seed them.

use std::collections::{BTreeMap, HashMap};

use crate::application::register_resource::RegistrationError;
use crate::domain::project::ProjectConfig;
use crate::domain::resource::{MetaSource, ResourceType, ResourceValue};
use crate::domain::workflow::WorkflowConfig;

/// Registration waiting for a store.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRegistration {
    pub id: String,
    pub value: ResourceValue,
    pub source: MetaSource,
}

#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    project: Option<ProjectConfig>,
    workflows: HashMap<String, WorkflowConfig>,
    workflow_order: Vec<String>,
    resources: BTreeMap<ResourceType, BTreeMap<String, ResourceValue>>,
    pending: Vec<PendingRegistration>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project(&self) -> Option<&ProjectConfig> {
        self.project.as_ref()
    }

    pub fn project_name(&self) -> Option<String> {
        self.project.as_ref().map(|p| p.name.trim().to_string())
    }

    pub fn contains(&self, resource_type: ResourceType, id: &str) -> bool {
        match resource_type {
            ResourceType::Project => self.project.is_some(),
            ResourceType::Workflow => self.workflows.contains_key(id),
            other => self
                .resources
                .get(&other)
                .is_some_and(|bucket| bucket.contains_key(id)),
        }
    }

    /// Adds a resource that already passed identity and validation checks.
    pub fn insert(&mut self, id: &str, value: ResourceValue) -> Result<(), RegistrationError> {
        let resource_type = value.resource_type();
        if self.contains(resource_type, id) {
            return Err(RegistrationError::duplicate(resource_type, id));
        }
        match value {
            ResourceValue::Project(project) => self.project = Some(project),
            ResourceValue::Workflow(workflow) => {
                self.workflows.insert(id.to_string(), workflow);
                self.workflow_order.push(id.to_string());
            }
            other => {
                self.resources
                    .entry(resource_type)
                    .or_default()
                    .insert(id.to_string(), other);
            }
        }
        metrics::counter!(
            "agentflow_resources_registered_total",
            "kind" => resource_type.as_str()
        )
        .increment(1);
        Ok(())
    }

    pub fn push_pending(&mut self, id: &str, value: ResourceValue, source: MetaSource) {
        self.pending.push(PendingRegistration {
            id: id.to_string(),
            value,
            source,
        });
    }

    pub fn take_pending(&mut self) -> Vec<PendingRegistration> {
        std::mem::take(&mut self.pending)
    }

    /// Puts back registrations that could not be seeded, ahead of any queued
    /// since.
    pub fn restore_pending(&mut self, mut pending: Vec<PendingRegistration>) {
        pending.append(&mut self.pending);
        self.pending = pending;
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn workflow(&self, id: &str) -> Option<&WorkflowConfig> {
        self.workflows.get(id)
    }

    /// Workflows in the current order.
    pub fn workflows(&self) -> impl Iterator<Item = &WorkflowConfig> {
        self.workflow_order.iter().filter_map(|id| self.workflows.get(id))
    }

    pub fn workflow_order(&self) -> &[String] {
        &self.workflow_order
    }

    /// Replaces the order list. Ids must be a permutation of the registered
    /// workflow ids; anything else is ignored.
    pub fn set_workflow_order(&mut self, order: Vec<String>) -> bool {
        if order.len() != self.workflows.len()
            || !order.iter().all(|id| self.workflows.contains_key(id))
        {
            return false;
        }
        self.workflow_order = order;
        true
    }

    /// Registered resources of one kind other than project and workflow,
    /// sorted by id.
    pub fn resources(
        &self,
        resource_type: ResourceType,
    ) -> impl Iterator<Item = (&String, &ResourceValue)> {
        self.resources.get(&resource_type).into_iter().flatten()
    }

    /// Number of registered resources across all kinds.
    pub fn len(&self) -> usize {
        usize::from(self.project.is_some())
            + self.workflows.len()
            + self.resources.values().map(BTreeMap::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
