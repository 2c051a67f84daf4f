// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::sync::Arc;

use agentflow_core::application::{
    workflow_order, ExternalResources, ReferenceValidator, ResourceRegistrar, ResourceRegistry,
};
use agentflow_core::domain::agent::AgentConfig;
use agentflow_core::domain::project::ProjectConfig;
use agentflow_core::domain::repository::ResourceStore;
use agentflow_core::domain::resource::{MetaSource, ResourceKey, ResourceType, ResourceValue};
use agentflow_core::domain::workflow::{TaskConfig, WorkflowConfig};
use agentflow_core::infrastructure::repositories::MemoryResourceStore;
use agentflow_core::infrastructure::resource_loader::parse_resource;

async fn register(
    registry: &mut ResourceRegistry,
    registrar: &ResourceRegistrar,
    project: &str,
    value: ResourceValue,
    id: &str,
) {
    registrar
        .persist(project, id, value.clone(), MetaSource::Sdk)
        .await
        .unwrap();
    registry.insert(id, value).unwrap();
}

#[tokio::test]
async fn test_yaml_indexed_workflow_satisfies_call_reference() {
    let store = Arc::new(MemoryResourceStore::new());
    let registrar = ResourceRegistrar::new(store.clone());
    let mut registry = ResourceRegistry::new();
    registry
        .insert("demo", ProjectConfig::new("demo").into())
        .unwrap();

    // Indexed straight into the store, bypassing the registry
    let child: WorkflowConfig = parse_resource("id: child\ntasks:\n  - id: only\n").unwrap();
    store
        .put(&ResourceKey::new("demo", ResourceType::Workflow, "child"), child.into())
        .await
        .unwrap();

    let parent =
        WorkflowConfig::new("parent").with_task(TaskConfig::call_workflow("invoke", "child"));
    register(&mut registry, &registrar, "demo", parent.into(), "parent").await;

    let external = tokio_test::assert_ok!(ExternalResources::collect(store.as_ref(), "demo").await);
    let report = ReferenceValidator::new(&registry, &external).validate();
    assert!(report.valid, "{:?}", report.failures());
    assert!(report.dependency_graph["workflow:parent"].contains(&"workflow:child".to_string()));
}

#[tokio::test]
async fn test_full_scan_reports_every_problem() {
    let mut registry = ResourceRegistry::new();
    registry
        .insert("demo", ProjectConfig::new("demo").into())
        .unwrap();
    registry
        .insert(
            "alpha",
            WorkflowConfig::new("alpha")
                .with_task(TaskConfig::call_workflow("to-beta", "beta"))
                .with_task(
                    TaskConfig::new("think").with_agent(AgentConfig::reference("missing-agent")),
                )
                .into(),
        )
        .unwrap();
    registry
        .insert(
            "beta",
            WorkflowConfig::new("beta")
                .with_task(TaskConfig::call_workflow("to-alpha", "alpha"))
                .into(),
        )
        .unwrap();

    let report = ReferenceValidator::new(&registry, &ExternalResources::new()).validate();
    assert!(!report.valid);
    assert_eq!(report.missing_refs.len(), 1);
    assert_eq!(report.circular_deps.len(), 1);
    assert!(workflow_order(&report, registry.workflow_order()).is_none());

    let err = report.into_result().unwrap_err();
    assert_eq!(err.len(), 2);
    let rendered = err.to_string();
    assert!(rendered.contains(
        "1. workflow.alpha.tasks.think.agent references missing agent \"missing-agent\""
    ));
    assert!(rendered.contains("2. workflow dependency cycle: alpha -> beta -> alpha"));
}

#[tokio::test]
async fn test_registration_writes_provenance_for_each_resource() {
    let store = Arc::new(MemoryResourceStore::new());
    let registrar = ResourceRegistrar::new(store.clone());
    let mut registry = ResourceRegistry::new();

    register(
        &mut registry,
        &registrar,
        "demo",
        AgentConfig::new("writer", "Write.").into(),
        "writer",
    )
    .await;

    let meta_keys = store.list("demo", ResourceType::Meta).await.unwrap();
    assert_eq!(meta_keys.len(), 1);
    assert_eq!(meta_keys[0].id, "agent:writer");
    assert_eq!(registry.len(), 1);
}
