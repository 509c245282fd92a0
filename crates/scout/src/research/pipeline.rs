//! The five-stage research workflow.
//!
//! A run advances strictly forward through PLAN, SEARCH, ANALYZE, REPORT and
//! INDEX and ends in COMPLETE or FAILED. A failing stage stops the run; no
//! stage is retried or skipped, and artifacts already written are kept.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};
use ulid::Ulid;

use super::analyze::{Analysis, AnalysisFocus, SearchResult, analyze};
use super::error::{ErrorKind, PipelineError};
use super::index::build_index;
use super::plan::ResearchPlan;
use super::report::{ReportMetadata, ReportType, render};
use crate::capability::CapabilityRegistry;
use crate::config::ResearchConfig;
use crate::store::{Artifact, ArtifactFormat, ArtifactStage, ArtifactStore, StorageError};

// ============================================================================
// Run State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStage {
    Plan,
    Search,
    Analyze,
    Report,
    Index,
    Complete,
    Failed,
}

impl RunStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStage::Complete | RunStage::Failed)
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStage::Plan => "PLAN",
            RunStage::Search => "SEARCH",
            RunStage::Analyze => "ANALYZE",
            RunStage::Report => "REPORT",
            RunStage::Index => "INDEX",
            RunStage::Complete => "COMPLETE",
            RunStage::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Where and why a run failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunFailure {
    pub stage: RunStage,
    pub kind: ErrorKind,
    pub message: String,
}

/// One execution of the pipeline for a topic.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    pub run_id: String,
    pub topic: String,
    pub stage: RunStage,
    pub artifacts: Vec<Artifact>,
    pub report_path: Option<PathBuf>,
    pub failure: Option<RunFailure>,
}

impl PipelineRun {
    fn new(topic: &str) -> Self {
        Self {
            run_id: Ulid::new().to_string(),
            topic: topic.to_string(),
            stage: RunStage::Plan,
            artifacts: Vec::new(),
            report_path: None,
            failure: None,
        }
    }

    fn advance(&mut self, next: RunStage) {
        debug_assert!(
            next > self.stage && !self.stage.is_terminal(),
            "run stages only move forward"
        );
        self.stage = next;
        if !next.is_terminal() {
            info!(run_id = %self.run_id, stage = %next, "Entering stage");
        }
    }

    fn fail(&mut self, error: &PipelineError) {
        self.failure = Some(RunFailure {
            stage: self.stage,
            kind: error.kind(),
            message: error.to_string(),
        });
        self.stage = RunStage::Failed;
    }

    fn record(&mut self, artifact: Artifact) {
        self.artifacts.push(artifact);
    }

    pub fn is_complete(&self) -> bool {
        self.stage == RunStage::Complete
    }

    /// Human-readable outcome: terminal stage, report and written artifacts.
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "Research run {} for '{}': {}",
            self.run_id, self.topic, self.stage
        )];

        if let Some(failure) = &self.failure {
            lines.push(format!(
                "Failed at {} ({}): {}",
                failure.stage, failure.kind, failure.message
            ));
        }
        if let Some(report) = &self.report_path {
            lines.push(format!("Report: {}", report.display()));
        }
        if self.artifacts.is_empty() {
            lines.push("No artifacts written.".to_string());
        } else {
            lines.push("Artifacts:".to_string());
            for artifact in &self.artifacts {
                lines.push(format!("  - [{}] {}", artifact.stage, artifact.path.display()));
            }
        }
        lines.join("\n")
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Research options, extracted from [`ResearchConfig`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub analysis_focus: AnalysisFocus,
    pub report_type: ReportType,
    pub search_capability: String,
    pub persist_analysis: bool,
}

impl From<&ResearchConfig> for PipelineConfig {
    fn from(config: &ResearchConfig) -> Self {
        Self {
            analysis_focus: config.analysis_focus,
            report_type: config.report_type,
            search_capability: config.search_capability.clone(),
            persist_analysis: config.persist_analysis,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from(&ResearchConfig::default())
    }
}

/// A topic to research.
#[derive(Debug, Clone)]
pub struct ResearchRequest {
    pub topic: String,
    pub focus_areas: Vec<String>,
}

impl ResearchRequest {
    pub fn new(topic: impl Into<String>, focus_areas: Vec<String>) -> Self {
        Self {
            topic: topic.into(),
            focus_areas,
        }
    }
}

pub struct ResearchPipeline {
    registry: Arc<CapabilityRegistry>,
    store: Arc<dyn ArtifactStore>,
    config: PipelineConfig,
}

impl ResearchPipeline {
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        store: Arc<dyn ArtifactStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            registry,
            store,
            config,
        }
    }

    /// Run every stage for `request`. Never returns an error; failures are
    /// recorded on the returned run.
    pub async fn run(&self, request: &ResearchRequest) -> PipelineRun {
        let mut run = PipelineRun::new(&request.topic);
        info!(
            run_id = %run.run_id,
            topic = %request.topic,
            focus_areas = ?request.focus_areas,
            "Starting research run"
        );

        match self.execute(&mut run, request).await {
            Ok(()) => {
                run.advance(RunStage::Complete);
                info!(
                    run_id = %run.run_id,
                    artifacts = run.artifacts.len(),
                    "Research run complete"
                );
            }
            Err(e) => {
                error!(
                    run_id = %run.run_id,
                    stage = %run.stage,
                    kind = %e.kind(),
                    error = %e,
                    "Research stage failed"
                );
                run.fail(&e);
            }
        }

        run
    }

    async fn execute(
        &self,
        run: &mut PipelineRun,
        request: &ResearchRequest,
    ) -> Result<(), PipelineError> {
        let plan = self.plan(run, request).await?;

        run.advance(RunStage::Search);
        let results = self.search(&plan).await?;

        run.advance(RunStage::Analyze);
        let analysis = analyze(&plan.topic, &results, self.config.analysis_focus);
        if self.config.persist_analysis {
            let value = to_value(&analysis)?;
            let artifact = self
                .store
                .save_json(
                    &plan.topic,
                    ArtifactStage::Analysis,
                    Some(analysis.focus.as_str()),
                    &value,
                )
                .await?;
            run.record(artifact);
        }

        run.advance(RunStage::Report);
        self.report(run, &plan, &analysis).await?;

        run.advance(RunStage::Index);
        let index = build_index(self.store.as_ref(), Utc::now()).await?;
        let artifact = self
            .store
            .save(
                &plan.topic,
                ArtifactStage::Index,
                None,
                &index.content,
                ArtifactFormat::Text,
            )
            .await?;
        info!(indexed = index.entries.len(), path = %artifact.path.display(), "Index written");
        run.record(artifact);

        Ok(())
    }

    async fn plan(
        &self,
        run: &mut PipelineRun,
        request: &ResearchRequest,
    ) -> Result<ResearchPlan, PipelineError> {
        let plan = ResearchPlan::new(&request.topic, &request.focus_areas, Utc::now());
        let value = to_value(&plan)?;
        let artifact = self
            .store
            .save_json(&plan.topic, ArtifactStage::Plan, None, &value)
            .await?;

        info!(
            queries = plan.search_queries.len(),
            objectives = plan.objectives.len(),
            path = %artifact.path.display(),
            "Plan written"
        );
        run.record(artifact);
        Ok(plan)
    }

    /// One capability call per query, in order. Output is passed on as is.
    async fn search(&self, plan: &ResearchPlan) -> Result<Vec<SearchResult>, PipelineError> {
        let mut results = Vec::with_capacity(plan.search_queries.len());

        for query in &plan.search_queries {
            let content = self
                .registry
                .invoke(&self.config.search_capability, json!({ "query": query }))
                .await?;
            info!(query = %query, bytes = content.len(), "Search returned");
            results.push(SearchResult {
                query: query.clone(),
                content,
            });
        }

        Ok(results)
    }

    async fn report(
        &self,
        run: &mut PipelineRun,
        plan: &ResearchPlan,
        analysis: &Analysis,
    ) -> Result<(), PipelineError> {
        let report_type = self.config.report_type;
        let generated_at = Utc::now();
        let content = render(plan, analysis, report_type, generated_at);

        let report = self
            .store
            .save(
                &plan.topic,
                ArtifactStage::Report,
                Some(report_type.as_str()),
                &content,
                ArtifactFormat::Text,
            )
            .await?;

        let metadata = ReportMetadata {
            topic: plan.topic.clone(),
            report_type,
            generated_at,
            content_length: content.len(),
            report_path: report.path.clone(),
        };
        let metadata = self
            .store
            .save_sibling_json(&report, "metadata", &to_value(&metadata)?)
            .await?;

        info!(path = %report.path.display(), report_type = %report_type, "Report written");
        run.report_path = Some(report.path.clone());
        run.record(report);
        run.record(metadata);
        Ok(())
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<serde_json::Value, PipelineError> {
    serde_json::to_value(value).map_err(|e| StorageError::serialization(e.to_string()).into())
}
