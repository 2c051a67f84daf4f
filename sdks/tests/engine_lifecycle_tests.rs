// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Notify;

use agentflow_sdk::agentflow_core::domain::agent::AgentConfig;
use agentflow_sdk::agentflow_core::domain::config::{
    AppConfig, Mode, RedisStandaloneConfig, TemporalConfig, TemporalStandaloneConfig,
};
use agentflow_sdk::agentflow_core::domain::knowledge::KnowledgeBaseConfig;
use agentflow_sdk::agentflow_core::domain::mcp::McpConfig;
use agentflow_sdk::agentflow_core::domain::memory::MemoryConfig;
use agentflow_sdk::agentflow_core::domain::model::ModelConfig;
use agentflow_sdk::agentflow_core::domain::project::ProjectConfig;
use agentflow_sdk::agentflow_core::domain::repository::{
    ResourceStore, StoreError, StoreEventStream, StorePage,
};
use agentflow_sdk::agentflow_core::domain::resource::{
    ETag, Resource, ResourceKey, ResourceType, ResourceValue, StoredItem,
};
use agentflow_sdk::agentflow_core::domain::schedule::ScheduleConfig;
use agentflow_sdk::agentflow_core::domain::schema::SchemaConfig;
use agentflow_sdk::agentflow_core::domain::tool::ToolConfig;
use agentflow_sdk::agentflow_core::domain::webhook::WebhookConfig;
use agentflow_sdk::agentflow_core::domain::workflow::{TaskConfig, WorkflowConfig};
use agentflow_sdk::agentflow_core::infrastructure::MemoryResourceStore;
use agentflow_sdk::{Disposer, EmbeddedService, Engine, EngineError, EngineOptions, ServiceProvider};

fn test_config(dir: &tempfile::TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.cli.cwd = Some(dir.path().to_path_buf());
    config
}

fn engine(dir: &tempfile::TempDir) -> Engine {
    Engine::with_config(test_config(dir))
}

struct Recorder {
    name: String,
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Disposer for Recorder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn close(&self) -> Result<()> {
        self.log.lock().push(self.name.clone());
        Ok(())
    }
}

/// Embedded services that only record their shutdown.
struct RecordingProvider {
    log: Arc<Mutex<Vec<String>>>,
    store: Arc<dyn ResourceStore>,
}

impl RecordingProvider {
    fn service(&self, name: &str, address: &str) -> EmbeddedService {
        EmbeddedService {
            address: address.to_string(),
            disposer: Box::new(Recorder {
                name: name.to_string(),
                log: Arc::clone(&self.log),
            }),
        }
    }
}

#[async_trait]
impl ServiceProvider for RecordingProvider {
    async fn start_embedded_redis(
        &self,
        _config: &RedisStandaloneConfig,
    ) -> Result<EmbeddedService> {
        Ok(self.service("redis", "127.0.0.1:6379"))
    }

    async fn start_embedded_temporal(
        &self,
        _config: &TemporalStandaloneConfig,
        _temporal: &TemporalConfig,
    ) -> Result<EmbeddedService> {
        Ok(self.service("temporal", "127.0.0.1:7233"))
    }

    async fn redis_store(&self, _url: &str) -> Result<Arc<dyn ResourceStore>> {
        Ok(self.store.clone())
    }

    async fn check_temporal(&self, _temporal: &TemporalConfig) -> Result<()> {
        self.log.lock().push("check_temporal".to_string());
        Ok(())
    }
}

fn engine_with_provider(
    config: AppConfig,
    log: &Arc<Mutex<Vec<String>>>,
    store: Arc<dyn ResourceStore>,
) -> Engine {
    let provider = RecordingProvider {
        log: Arc::clone(log),
        store,
    };
    Engine::new(
        EngineOptions::new()
            .with_config(config)
            .with_service_provider(Arc::new(provider)),
    )
}

async fn register_demo_project(engine: &Engine) {
    engine.register_project(ProjectConfig::new("demo")).await.unwrap();
}

#[tokio::test]
async fn test_start_validates_and_builds_graph() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(&dir);
    register_demo_project(&engine).await;

    let workflow = WorkflowConfig::new("wf")
        .with_task(
            TaskConfig::new("step-start")
                .with_agent(AgentConfig::reference("agent-x"))
                .on_success("step-final"),
        )
        .with_task(TaskConfig::new("step-final").with_tool(ToolConfig::reference("tool-y")));
    engine.register_workflow(workflow).await.unwrap();
    engine
        .register_agent(AgentConfig::new("agent-x", "Answer the question."))
        .await
        .unwrap();
    engine.register_tool(ToolConfig::reference("tool-y")).await.unwrap();

    let report = engine.validate_references().await.unwrap();
    assert!(report.valid);
    assert!(report.resource_count >= 4);
    let start_edges = &report.dependency_graph["task:wf/step-start"];
    assert!(start_edges.contains(&"agent:agent-x".to_string()), "{:?}", start_edges);
    assert!(start_edges.contains(&"task:wf/step-final".to_string()), "{:?}", start_edges);
    let final_edges = &report.dependency_graph["task:wf/step-final"];
    assert!(final_edges.contains(&"tool:tool-y".to_string()), "{:?}", final_edges);
    let workflow_edges = &report.dependency_graph["workflow:wf"];
    assert!(workflow_edges.contains(&"task:wf/step-start".to_string()), "{:?}", workflow_edges);

    engine.start().await.unwrap();
    assert!(engine.is_started());
    assert!(engine.start_error().is_none());

    // Queued registrations land in the store on start
    let store = engine.resource_store().unwrap();
    let (value, _) = store
        .get(&ResourceKey::new("demo", ResourceType::Agent, "agent-x"))
        .await
        .unwrap();
    assert!(matches!(value, ResourceValue::Agent(_)));

    let status = engine.client().unwrap().health().await.unwrap();
    assert_eq!(status.status, "ok");

    engine.stop().await.unwrap();
    assert!(!engine.is_started());
    assert!(engine.server().is_none());
}

#[tokio::test]
async fn test_start_rejects_missing_agent() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(&dir);
    register_demo_project(&engine).await;
    engine
        .register_workflow(
            WorkflowConfig::new("wf")
                .with_task(TaskConfig::new("think").with_agent(AgentConfig::reference("ghost"))),
        )
        .await
        .unwrap();

    let err = engine.start().await.unwrap_err();
    assert!(err.to_string().contains("missing agent \"ghost\""), "{}", err);
    assert!(!engine.is_started());
    assert!(engine.server().is_none());
    assert!(engine.start_error().is_some());
}

#[tokio::test]
async fn test_workflow_cycle_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(&dir);
    register_demo_project(&engine).await;
    engine
        .register_workflow(
            WorkflowConfig::new("alpha").with_task(TaskConfig::call_workflow("next", "beta")),
        )
        .await
        .unwrap();
    engine
        .register_workflow(
            WorkflowConfig::new("beta").with_task(TaskConfig::call_workflow("back", "alpha")),
        )
        .await
        .unwrap();

    let report = engine.reference_report().await.unwrap();
    assert!(!report.valid);
    assert_eq!(report.circular_deps.len(), 1);

    let err = engine.validate_references().await.unwrap_err();
    assert!(err.to_string().contains("workflow dependency cycle"), "{}", err);
}

#[tokio::test]
async fn test_start_orders_called_workflows_first() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(&dir);
    register_demo_project(&engine).await;
    engine
        .register_workflow(
            WorkflowConfig::new("parent")
                .with_task(TaskConfig::call_workflow("run-child", "child")),
        )
        .await
        .unwrap();
    engine
        .register_workflow(WorkflowConfig::new("child").with_task(TaskConfig::new("only")))
        .await
        .unwrap();

    engine.start().await.unwrap();
    let order = engine.workflow_ids();
    let child = order.iter().position(|id| id == "child").unwrap();
    let parent = order.iter().position(|id| id == "parent").unwrap();
    assert!(child < parent, "{:?}", order);
    engine.stop().await.unwrap();
}

#[tokio::test]
async fn test_registration_requires_id_and_project() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(&dir);

    let err = engine.register_agent(AgentConfig::new("writer", "Write.")).await.unwrap_err();
    assert!(err.to_string().contains("project is required"), "{}", err);

    register_demo_project(&engine).await;
    let err = engine.register_agent(AgentConfig::new("   ", "Write.")).await.unwrap_err();
    assert_eq!(err.to_string(), "agent id is required");
    assert_eq!(engine.resource_count(), 1);
}

#[tokio::test]
async fn test_duplicate_registration_keeps_first_value() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryResourceStore::new());
    let engine = Engine::new(
        EngineOptions::new()
            .with_config(test_config(&dir))
            .with_resource_store(store.clone()),
    );
    register_demo_project(&engine).await;
    engine
        .register_agent(AgentConfig::new("writer", "First."))
        .await
        .unwrap();

    let err = engine
        .register_agent(AgentConfig::new("writer", "Second."))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("already registered"), "{}", err);

    let (value, _) = store
        .get(&ResourceKey::new("demo", ResourceType::Agent, "writer"))
        .await
        .unwrap();
    match value {
        ResourceValue::Agent(agent) => assert_eq!(agent.instructions, "First."),
        other => panic!("unexpected value {:?}", other),
    }
}

#[tokio::test]
async fn test_start_twice_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir);
    config.redis.standalone = Some(RedisStandaloneConfig::default());
    config.temporal.standalone = Some(TemporalStandaloneConfig::default());

    let log = Arc::new(Mutex::new(Vec::new()));
    let engine = engine_with_provider(config, &log, Arc::new(MemoryResourceStore::new()));
    engine.start().await.unwrap();
    let first = engine.server().unwrap();

    let err = engine.start().await.unwrap_err();
    assert!(err.is_already_started());
    assert!(engine.is_started());
    assert_eq!(engine.server().unwrap().local_addr, first.local_addr);
    assert!(log.lock().is_empty());

    // One set of embedded services, torn down once
    engine.stop().await.unwrap();
    assert_eq!(*log.lock(), vec!["temporal".to_string(), "redis".to_string()]);
}

#[tokio::test]
async fn test_start_without_config() {
    let engine = Engine::new(EngineOptions::new());
    let err = tokio_test::assert_err!(engine.start().await);
    assert!(matches!(err, EngineError::ConfigUnavailable));
}

#[tokio::test]
async fn test_stop_before_start_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(&dir);
    tokio_test::assert_ok!(engine.stop().await);
    tokio_test::assert_ok!(engine.stop().await);
}

#[tokio::test]
async fn test_restart_reseeds_fresh_store() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(&dir);
    register_demo_project(&engine).await;
    engine.start().await.unwrap();
    engine
        .register_agent(AgentConfig::new("writer", "Write."))
        .await
        .unwrap();
    engine.stop().await.unwrap();

    engine.start().await.unwrap();
    assert!(engine.base_url().is_some());
    let store = engine.resource_store().unwrap();
    for (kind, id) in [(ResourceType::Project, "demo"), (ResourceType::Agent, "writer")] {
        assert!(store.get(&ResourceKey::new("demo", kind, id)).await.is_ok(), "{} {}", kind, id);
    }
    engine.stop().await.unwrap();
}

#[tokio::test]
async fn test_bind_failure_unwinds_embedded_services_in_reverse() {
    let dir = tempfile::tempdir().unwrap();
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = occupied.local_addr().unwrap().port();

    let mut config = test_config(&dir);
    config.redis.standalone = Some(RedisStandaloneConfig::default());
    config.temporal.standalone = Some(TemporalStandaloneConfig::default());

    let log = Arc::new(Mutex::new(Vec::new()));
    let provider = Arc::new(RecordingProvider {
        log: Arc::clone(&log),
        store: Arc::new(MemoryResourceStore::new()),
    });
    let engine = Engine::new(
        EngineOptions::new()
            .with_config(config)
            .with_port(port)
            .with_service_provider(provider),
    );

    let err = engine.start().await.unwrap_err();
    assert!(err.to_string().contains(&format!("listen on 127.0.0.1:{}", port)), "{}", err);
    assert_eq!(*log.lock(), vec!["temporal".to_string(), "redis".to_string()]);
    assert!(!engine.is_started());

    // Nothing left to tear down
    engine.stop().await.unwrap();
    assert_eq!(log.lock().len(), 2);
}

#[tokio::test]
async fn test_stop_runs_mode_cleanup_in_reverse() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir);
    config.redis.standalone = Some(RedisStandaloneConfig::default());
    config.temporal.standalone = Some(TemporalStandaloneConfig::default());

    let log = Arc::new(Mutex::new(Vec::new()));
    let engine = engine_with_provider(config, &log, Arc::new(MemoryResourceStore::new()));

    engine.start().await.unwrap();
    assert!(log.lock().is_empty());
    engine.stop().await.unwrap();
    assert_eq!(*log.lock(), vec!["temporal".to_string(), "redis".to_string()]);
}

#[tokio::test]
async fn test_distributed_mode_requires_settings() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir);
    config.mode = Mode::Distributed;

    let log = Arc::new(Mutex::new(Vec::new()));
    let engine = engine_with_provider(config, &log, Arc::new(MemoryResourceStore::new()));

    let err = engine.start().await.unwrap_err();
    assert!(err.to_string().contains("temporal.host_port is required"), "{}", err);
    assert!(log.lock().is_empty());
}

#[tokio::test]
async fn test_distributed_mode_uses_provider_store() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir);
    config.mode = Mode::Distributed;
    config.temporal.host_port = "127.0.0.1:7233".to_string();
    config.redis.url = "redis://127.0.0.1:6379".to_string();

    let log = Arc::new(Mutex::new(Vec::new()));
    let store = Arc::new(MemoryResourceStore::new());
    let engine = engine_with_provider(config, &log, store.clone());
    register_demo_project(&engine).await;

    engine.start().await.unwrap();
    assert_eq!(*log.lock(), vec!["check_temporal".to_string()]);
    assert!(store
        .get(&ResourceKey::new("demo", ResourceType::Project, "demo"))
        .await
        .is_ok());
    engine.stop().await.unwrap();
}

#[tokio::test]
async fn test_http_endpoints_after_start() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine(&dir);
    engine.start().await.unwrap();

    let server = engine.server().unwrap();
    assert_ne!(server.local_addr.port(), 0);
    assert!(server.base_url.starts_with("http://127.0.0.1:"));

    let client = engine.client().unwrap();
    assert_eq!(client.health().await.unwrap().status, "ok");
    assert_eq!(client.ready().await.unwrap().status, "ready");

    engine.stop().await.unwrap();
}

async fn read_until_closed(stream: &mut TcpStream) -> String {
    let mut received = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => received.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8_lossy(&received).into_owned()
}

#[tokio::test]
async fn test_idle_connection_is_closed() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir);
    config.server.timeouts.http_idle = Some(Duration::from_millis(200));
    let engine = Engine::with_config(config);
    engine.start().await.unwrap();

    let mut stream = TcpStream::connect(engine.server().unwrap().local_addr).await.unwrap();
    stream
        .write_all(b"GET /healthz HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    let response = tokio::time::timeout(Duration::from_secs(5), read_until_closed(&mut stream))
        .await
        .expect("keep-alive connection should close once idle");
    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);

    engine.stop().await.unwrap();
}

#[tokio::test]
async fn test_slow_request_header_is_cut_off() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir);
    config.server.timeouts.http_read_header = Some(Duration::from_millis(200));
    let engine = Engine::with_config(config);
    engine.start().await.unwrap();

    let mut stream = TcpStream::connect(engine.server().unwrap().local_addr).await.unwrap();
    stream
        .write_all(b"GET /healthz HTTP/1.1\r\nHost: localhost\r\n")
        .await
        .unwrap();
    let response = tokio::time::timeout(Duration::from_secs(5), read_until_closed(&mut stream))
        .await
        .expect("incomplete header should time out");
    assert!(!response.contains("200 OK"), "{}", response);

    engine.stop().await.unwrap();
}

/// Holds the first `list` call until released.
#[derive(Default)]
struct ListGate {
    armed: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl ListGate {
    fn armed() -> Arc<Self> {
        let gate = Self::default();
        gate.armed.store(true, Ordering::SeqCst);
        Arc::new(gate)
    }
}

/// In-memory store with an optional gate on `list` and an optional failing
/// `close`.
#[derive(Default)]
struct ScriptedStore {
    inner: MemoryResourceStore,
    gate: Option<Arc<ListGate>>,
    fail_close: bool,
}

#[async_trait]
impl ResourceStore for ScriptedStore {
    async fn get(&self, key: &ResourceKey) -> Result<(ResourceValue, ETag), StoreError> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &ResourceKey, value: ResourceValue) -> Result<ETag, StoreError> {
        self.inner.put(key, value).await
    }

    async fn put_if_match(
        &self,
        key: &ResourceKey,
        value: ResourceValue,
        expected: &ETag,
    ) -> Result<ETag, StoreError> {
        self.inner.put_if_match(key, value, expected).await
    }

    async fn delete(&self, key: &ResourceKey) -> Result<(), StoreError> {
        self.inner.delete(key).await
    }

    async fn list(
        &self,
        project: &str,
        resource_type: ResourceType,
    ) -> Result<Vec<ResourceKey>, StoreError> {
        if let Some(gate) = &self.gate {
            if gate.armed.swap(false, Ordering::SeqCst) {
                gate.entered.notify_one();
                gate.release.notified().await;
            }
        }
        self.inner.list(project, resource_type).await
    }

    async fn list_with_values(
        &self,
        project: &str,
        resource_type: ResourceType,
    ) -> Result<Vec<StoredItem>, StoreError> {
        self.inner.list_with_values(project, resource_type).await
    }

    async fn list_with_values_page(
        &self,
        project: &str,
        resource_type: ResourceType,
        offset: usize,
        limit: usize,
    ) -> Result<StorePage, StoreError> {
        self.inner
            .list_with_values_page(project, resource_type, offset, limit)
            .await
    }

    async fn watch(
        &self,
        project: &str,
        resource_type: ResourceType,
    ) -> Result<StoreEventStream, StoreError> {
        self.inner.watch(project, resource_type).await
    }

    async fn close(&self) -> Result<(), StoreError> {
        if self.fail_close {
            return Err(StoreError::Backend("disk unplugged".to_string()));
        }
        self.inner.close().await
    }
}

#[tokio::test]
async fn test_failed_stop_is_cached() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(ScriptedStore {
        fail_close: true,
        ..Default::default()
    });
    let engine = Engine::new(
        EngineOptions::new()
            .with_config(test_config(&dir))
            .with_resource_store(store),
    );
    engine.start().await.unwrap();

    let err = engine.stop().await.unwrap_err();
    assert!(
        err.to_string()
            .contains("close resource store: backend error: disk unplugged"),
        "{}",
        err
    );
    assert!(!engine.is_started());

    let cached = engine.stop().await.unwrap_err();
    assert_eq!(cached.to_string(), err.to_string());
}

#[tokio::test]
async fn test_registration_during_start_reaches_running_store() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir);
    config.mode = Mode::Distributed;
    config.temporal.host_port = "127.0.0.1:7233".to_string();
    config.redis.url = "redis://127.0.0.1:6379".to_string();

    let gate = ListGate::armed();
    let store = Arc::new(ScriptedStore {
        gate: Some(Arc::clone(&gate)),
        ..Default::default()
    });
    let log = Arc::new(Mutex::new(Vec::new()));
    let engine = Arc::new(engine_with_provider(config, &log, store.clone()));
    register_demo_project(&engine).await;

    let starting = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.start().await }
    });
    // Start has seeded the queue and is listing stored resources
    gate.entered.notified().await;

    let registering = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.register_agent(AgentConfig::new("late", "Arrive late.")).await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!registering.is_finished());
    gate.release.notify_one();

    starting.await.unwrap().unwrap();
    registering.await.unwrap().unwrap();

    let running = engine.resource_store().unwrap();
    let (value, _) = running
        .get(&ResourceKey::new("demo", ResourceType::Agent, "late"))
        .await
        .unwrap();
    assert!(matches!(value, ResourceValue::Agent(_)));
    engine.stop().await.unwrap();
}

#[derive(Clone)]
enum AnyResource {
    Project(ProjectConfig),
    Workflow(WorkflowConfig),
    Agent(AgentConfig),
    Tool(ToolConfig),
    KnowledgeBase(KnowledgeBaseConfig),
    Memory(MemoryConfig),
    Mcp(McpConfig),
    Schema(SchemaConfig),
    Model(ModelConfig),
    Schedule(ScheduleConfig),
    Webhook(WebhookConfig),
}

impl AnyResource {
    async fn register(self, engine: &Engine) -> Result<(), EngineError> {
        match self {
            AnyResource::Project(c) => engine.register_project(c).await,
            AnyResource::Workflow(c) => engine.register_workflow(c).await,
            AnyResource::Agent(c) => engine.register_agent(c).await,
            AnyResource::Tool(c) => engine.register_tool(c).await,
            AnyResource::KnowledgeBase(c) => engine.register_knowledge_base(c).await,
            AnyResource::Memory(c) => engine.register_memory(c).await,
            AnyResource::Mcp(c) => engine.register_mcp(c).await,
            AnyResource::Schema(c) => engine.register_schema(c).await,
            AnyResource::Model(c) => engine.register_model(c).await,
            AnyResource::Schedule(c) => engine.register_schedule(c).await,
            AnyResource::Webhook(c) => engine.register_webhook(c).await,
        }
    }

    fn into_value(self) -> ResourceValue {
        match self {
            AnyResource::Project(c) => c.into_value(),
            AnyResource::Workflow(c) => c.into_value(),
            AnyResource::Agent(c) => c.into_value(),
            AnyResource::Tool(c) => c.into_value(),
            AnyResource::KnowledgeBase(c) => c.into_value(),
            AnyResource::Memory(c) => c.into_value(),
            AnyResource::Mcp(c) => c.into_value(),
            AnyResource::Schema(c) => c.into_value(),
            AnyResource::Model(c) => c.into_value(),
            AnyResource::Schedule(c) => c.into_value(),
            AnyResource::Webhook(c) => c.into_value(),
        }
    }
}

struct RegistrationCase {
    kind: ResourceType,
    id: &'static str,
    first: AnyResource,
    second: AnyResource,
    blank: AnyResource,
}

/// One case per kind, project first. `second` shares the id of `first` with
/// a different body.
fn registration_cases() -> Vec<RegistrationCase> {
    let task = || TaskConfig::new("only");
    vec![
        RegistrationCase {
            kind: ResourceType::Project,
            id: "demo",
            first: AnyResource::Project(ProjectConfig::new("demo")),
            second: AnyResource::Project(ProjectConfig {
                description: "Second.".to_string(),
                ..ProjectConfig::new("demo")
            }),
            blank: AnyResource::Project(ProjectConfig::new("  ")),
        },
        RegistrationCase {
            kind: ResourceType::Workflow,
            id: "wf",
            first: AnyResource::Workflow(WorkflowConfig::new("wf").with_task(task())),
            second: AnyResource::Workflow(WorkflowConfig {
                description: "Second.".to_string(),
                ..WorkflowConfig::new("wf").with_task(task())
            }),
            blank: AnyResource::Workflow(WorkflowConfig::new(" ").with_task(task())),
        },
        RegistrationCase {
            kind: ResourceType::Agent,
            id: "writer",
            first: AnyResource::Agent(AgentConfig::new("writer", "First.")),
            second: AnyResource::Agent(AgentConfig::new("writer", "Second.")),
            blank: AnyResource::Agent(AgentConfig::new(" ", "First.")),
        },
        RegistrationCase {
            kind: ResourceType::Tool,
            id: "fmt",
            first: AnyResource::Tool(ToolConfig::reference("fmt")),
            second: AnyResource::Tool(ToolConfig {
                description: "Second.".to_string(),
                ..ToolConfig::reference("fmt")
            }),
            blank: AnyResource::Tool(ToolConfig::reference(" ")),
        },
        RegistrationCase {
            kind: ResourceType::KnowledgeBase,
            id: "docs",
            first: AnyResource::KnowledgeBase(KnowledgeBaseConfig::new(
                "docs", "embedder", "vectors",
            )),
            second: AnyResource::KnowledgeBase(KnowledgeBaseConfig::new(
                "docs",
                "other-embedder",
                "vectors",
            )),
            blank: AnyResource::KnowledgeBase(KnowledgeBaseConfig::new(" ", "embedder", "vectors")),
        },
        RegistrationCase {
            kind: ResourceType::Memory,
            id: "chat",
            first: AnyResource::Memory(MemoryConfig::new("chat")),
            second: AnyResource::Memory(MemoryConfig {
                max_tokens: Some(512),
                ..MemoryConfig::new("chat")
            }),
            blank: AnyResource::Memory(MemoryConfig::new(" ")),
        },
        RegistrationCase {
            kind: ResourceType::Mcp,
            id: "search",
            first: AnyResource::Mcp(McpConfig::remote("search", "http://localhost:9000/mcp")),
            second: AnyResource::Mcp(McpConfig::remote("search", "http://localhost:9001/mcp")),
            blank: AnyResource::Mcp(McpConfig::remote(" ", "http://localhost:9000/mcp")),
        },
        RegistrationCase {
            kind: ResourceType::Schema,
            id: "input",
            first: AnyResource::Schema(SchemaConfig::new("input", json!({ "type": "object" }))),
            second: AnyResource::Schema(SchemaConfig::new("input", json!({ "type": "string" }))),
            blank: AnyResource::Schema(SchemaConfig::new(" ", json!({ "type": "object" }))),
        },
        RegistrationCase {
            kind: ResourceType::Model,
            id: "openai:gpt-4o",
            first: AnyResource::Model(ModelConfig::new("openai", "gpt-4o")),
            second: AnyResource::Model(ModelConfig {
                api_url: Some("http://localhost:8080".to_string()),
                ..ModelConfig::new("openai", "gpt-4o")
            }),
            blank: AnyResource::Model(ModelConfig::new(" ", " ")),
        },
        RegistrationCase {
            kind: ResourceType::Schedule,
            id: "nightly",
            first: AnyResource::Schedule(ScheduleConfig::new("nightly", "wf", "0 0 * * *")),
            second: AnyResource::Schedule(ScheduleConfig::new("nightly", "wf", "0 6 * * *")),
            blank: AnyResource::Schedule(ScheduleConfig::new(" ", "wf", "0 0 * * *")),
        },
        RegistrationCase {
            kind: ResourceType::Webhook,
            id: "github",
            first: AnyResource::Webhook(WebhookConfig::new("github")),
            second: AnyResource::Webhook(WebhookConfig::new("github").with_event("push", "wf")),
            blank: AnyResource::Webhook(WebhookConfig::new(" ")),
        },
    ]
}

#[tokio::test]
async fn test_every_kind_requires_id_and_keeps_first_value() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryResourceStore::new());
    let engine = Engine::new(
        EngineOptions::new()
            .with_config(test_config(&dir))
            .with_resource_store(store.clone()),
    );

    let cases = registration_cases();
    assert_eq!(cases.len(), 11);
    for (registered, case) in cases.into_iter().enumerate() {
        let label = case.kind.label();

        let err = case.blank.register(&engine).await.unwrap_err();
        assert_eq!(err.to_string(), format!("{} id is required", label));
        assert_eq!(engine.resource_count(), registered, "{}", label);

        case.first.clone().register(&engine).await.unwrap();
        assert_eq!(engine.resource_count(), registered + 1, "{}", label);

        let err = case.second.register(&engine).await.unwrap_err();
        assert!(err.to_string().contains("already registered"), "{}: {}", label, err);
        assert_eq!(engine.resource_count(), registered + 1, "{}", label);

        let (stored, _) = store
            .get(&ResourceKey::new("demo", case.kind, case.id))
            .await
            .unwrap();
        assert_eq!(stored, case.first.into_value(), "{}", label);
    }
}
