//! End-to-end research runs against an in-process gateway.

use std::sync::Arc;

use tempfile::TempDir;

use scout::capability::{
    CapabilityOrigin, CapabilityRegistry, CollisionPolicy, local_capabilities,
    optional_remote_capabilities, remote_capabilities,
};
use scout::gateway::{GatewayError, with_session};
use scout::research::{
    ErrorKind, PipelineConfig, PipelineRun, ResearchPipeline, ResearchPlan, ResearchRequest,
    RunStage,
};
use scout::store::{ArtifactStage, ArtifactStore, FileArtifactStore, INDEX_FILE};

mod common;
use common::{CallBehavior, MockGateway, fast_timeouts};

const ENDPOINT: &str = "http://gateway.test/sse";

async fn run_against(gateway: &MockGateway, dir: &TempDir, topic: &str) -> PipelineRun {
    let store: Arc<dyn ArtifactStore> = Arc::new(FileArtifactStore::new(dir.path()));
    let files = dir.path().join("files");

    with_session(gateway, ENDPOINT, fast_timeouts(), |session| async move {
        let remote = remote_capabilities(&session).await.unwrap();
        let local = local_capabilities(store.clone(), files);
        let registry = CapabilityRegistry::merge(remote, local, CollisionPolicy::Override).unwrap();

        ResearchPipeline::new(Arc::new(registry), store, PipelineConfig::default())
            .run(&ResearchRequest::new(topic, vec![]))
            .await
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn research_run_writes_plan_report_and_index() {
    let dir = TempDir::new().unwrap();
    let gateway = MockGateway::new(&["search"], CallBehavior::Answer);

    let run = run_against(&gateway, &dir, "Quantum Computing").await;

    assert_eq!(run.stage, RunStage::Complete, "{}", run.summary());
    assert!(run.failure.is_none());
    assert_eq!(gateway.traffic.calls(), 4);
    assert_eq!(gateway.traffic.closes(), 1);

    // Plan: latest-only, exactly four queries and objectives.
    let store = FileArtifactStore::new(dir.path());
    let plan_path = dir.path().join("plans").join("Quantum Computing.json");
    let plan: ResearchPlan =
        serde_json::from_value(store.load_json(&plan_path).await.unwrap()).unwrap();
    assert_eq!(plan.search_queries.len(), 4);
    assert_eq!(plan.objectives.len(), 4);

    // Report plus its metadata sibling.
    let report_path = run.report_path.clone().unwrap();
    let report_name = report_path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(report_name.starts_with("Quantum Computing_comprehensive_"));
    assert!(report_name.ends_with(".md"));
    let report = std::fs::read_to_string(&report_path).unwrap();
    assert!(report.contains("Quantum Computing overview is an active research field."));

    let metadata_path = report_path.with_file_name(report_name.replace(".md", "_metadata.json"));
    let metadata = store.load_json(&metadata_path).await.unwrap();
    assert_eq!(metadata["report_type"], "comprehensive");
    assert_eq!(metadata["content_length"], report.len());

    // Index lists the plan and the report, not the metadata.
    let index = std::fs::read_to_string(dir.path().join(INDEX_FILE)).unwrap();
    assert!(index.contains("Total artifacts: 2"));
    assert!(!index.contains("_metadata.json"));

    let stages: Vec<_> = run.artifacts.iter().map(|a| a.stage).collect();
    assert_eq!(
        stages,
        vec![
            ArtifactStage::Plan,
            ArtifactStage::Report,
            ArtifactStage::Report,
            ArtifactStage::Index,
        ]
    );
}

#[tokio::test]
async fn search_timeout_fails_run_and_keeps_plan() {
    let dir = TempDir::new().unwrap();
    let gateway = MockGateway::new(&["search"], CallBehavior::Hang);

    let run = run_against(&gateway, &dir, "Quantum Computing").await;

    assert_eq!(run.stage, RunStage::Failed);
    let failure = run.failure.clone().unwrap();
    assert_eq!(failure.stage, RunStage::Search);
    assert_eq!(failure.kind, ErrorKind::CapabilityInvocationFailure);
    assert!(failure.message.contains("timed out"));

    // No retries after the first timeout.
    assert_eq!(gateway.traffic.calls(), 1);
    assert_eq!(gateway.traffic.closes(), 1);

    assert!(dir.path().join("plans").join("Quantum Computing.json").exists());
    assert!(!dir.path().join("reports").exists());
    assert!(!dir.path().join(INDEX_FILE).exists());
    assert!(run.report_path.is_none());
}

#[tokio::test]
async fn repeated_runs_keep_every_report() {
    let dir = TempDir::new().unwrap();
    let gateway = MockGateway::new(&["search"], CallBehavior::Answer);

    let first = run_against(&gateway, &dir, "Rust").await;
    let second = run_against(&gateway, &dir, "Rust").await;

    assert!(first.is_complete() && second.is_complete());
    assert_ne!(first.report_path, second.report_path);
    assert!(first.report_path.unwrap().exists());

    let index = std::fs::read_to_string(dir.path().join(INDEX_FILE)).unwrap();
    // One plan, overwritten; two reports.
    assert!(index.contains("Total artifacts: 3"));
}

#[tokio::test]
async fn local_capability_wins_name_collision() {
    let dir = TempDir::new().unwrap();
    let gateway = MockGateway::new(&["search", "simple_search"], CallBehavior::Answer);
    let store: Arc<dyn ArtifactStore> = Arc::new(FileArtifactStore::new(dir.path()));
    let files = dir.path().join("files");

    let (names, origin) = with_session(&gateway, ENDPOINT, fast_timeouts(), |session| async move {
        let remote = remote_capabilities(&session).await.unwrap();
        let local = local_capabilities(store, files);
        let registry = CapabilityRegistry::merge(remote, local, CollisionPolicy::Override).unwrap();
        let origin = registry.get("simple_search").unwrap().origin;
        let names: Vec<String> = registry.names().into_iter().map(String::from).collect();
        (names, origin)
    })
    .await
    .unwrap();

    assert_eq!(origin, CapabilityOrigin::Local);
    assert_eq!(
        names,
        vec!["search", "simple_search", "save_definition", "save_file"]
    );
    assert_eq!(gateway.traffic.closes(), 1);
}

#[tokio::test]
async fn optional_gateway_discovery_failure_falls_back_to_local() {
    let dir = TempDir::new().unwrap();
    let gateway = MockGateway::new(&["search"], CallBehavior::Answer).failing_discovery();
    let store: Arc<dyn ArtifactStore> = Arc::new(FileArtifactStore::new(dir.path()));
    let files = dir.path().join("files");

    let names = with_session(&gateway, ENDPOINT, fast_timeouts(), |session| async move {
        let remote = optional_remote_capabilities(Some(&session), false).await.unwrap();
        assert!(remote.is_empty());
        let local = local_capabilities(store, files);
        let registry = CapabilityRegistry::merge(remote, local, CollisionPolicy::Override).unwrap();
        registry.names().into_iter().map(String::from).collect::<Vec<_>>()
    })
    .await
    .unwrap();

    assert_eq!(names, vec!["simple_search", "save_definition", "save_file"]);
    assert_eq!(gateway.traffic.closes(), 1);
}

#[tokio::test]
async fn required_gateway_discovery_failure_is_an_error() {
    let gateway = MockGateway::new(&["search"], CallBehavior::Answer).failing_discovery();

    let result = with_session(&gateway, ENDPOINT, fast_timeouts(), |session| async move {
        optional_remote_capabilities(Some(&session), true).await
    })
    .await
    .unwrap();

    assert!(matches!(result, Err(GatewayError::Rpc { .. })));
    assert_eq!(gateway.traffic.closes(), 1);
}

#[tokio::test]
async fn no_session_means_no_remote_capabilities() {
    let remote = optional_remote_capabilities(None, true).await.unwrap();
    assert!(remote.is_empty());
}
