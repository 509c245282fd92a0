//! `scout research` - run the research pipeline for one topic.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::info;

use scout::gateway::{SessionTimeouts, SseConnector, with_optional_session};
use scout::research::{
    AnalysisFocus, ErrorKind, PipelineConfig, ReportType, ResearchPipeline, ResearchRequest,
    parse_focus_areas,
};
use scout::store::{ArtifactStore, FileArtifactStore};

use super::Overrides;

#[derive(Debug, Clone, Default)]
pub struct ResearchArgs {
    pub topic: Option<String>,
    pub focus: Option<String>,
    pub report_type: Option<ReportType>,
    pub analysis: Option<AnalysisFocus>,
}

pub async fn run(overrides: Overrides, args: ResearchArgs) -> Result<()> {
    let mut config = super::load_config(&overrides).await?;

    if let Some(report_type) = args.report_type {
        config.research.report_type = report_type;
    }
    if let Some(analysis) = args.analysis {
        config.research.analysis_focus = analysis;
    }
    if let Some(focus) = &args.focus {
        config.research.focus_areas = parse_focus_areas(focus);
    }

    let Some(topic) = args
        .topic
        .or_else(|| config.research.topic.clone())
        .filter(|t| !t.trim().is_empty())
    else {
        bail!("No research topic given. Pass --topic or set research.topic in the config file.");
    };
    let request = ResearchRequest::new(topic, config.research.focus_areas.clone());

    let backend = super::resolve_backend(&config).await;
    info!(backend = %backend.kind(), model = %backend.model(), "Backend selected");

    let store: Arc<dyn ArtifactStore> = Arc::new(FileArtifactStore::new(&config.artifacts.root));
    let connector = SseConnector::default();
    let config = &config;

    let run = with_optional_session(
        &connector,
        config.gateway.url.as_deref(),
        config.gateway.required,
        SessionTimeouts::from(&config.gateway),
        |session| async move {
            let registry = super::build_registry(session.as_ref(), store.clone(), config).await?;
            let pipeline = ResearchPipeline::new(
                Arc::new(registry),
                store,
                PipelineConfig::from(&config.research),
            );
            anyhow::Ok(pipeline.run(&request).await)
        },
    )
    .await
    .with_context(|| ErrorKind::GatewayUnavailable.to_string())??;

    println!("{}", run.summary());

    if let Some(failure) = &run.failure {
        bail!(
            "Research run {} failed at {} ({})",
            run.run_id,
            failure.stage,
            failure.kind
        );
    }
    Ok(())
}
