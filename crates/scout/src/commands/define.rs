//! `scout define` - search for a term and save its definition.

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::info;

use scout::capability::local::SIMPLE_SEARCH;
use scout::define::DefineWorkflow;
use scout::gateway::{SessionTimeouts, SseConnector, with_optional_session};
use scout::llm::OpenAICompatibleModel;
use scout::research::ErrorKind;
use scout::store::{ArtifactStore, FileArtifactStore};

use super::Overrides;

pub async fn run(overrides: Overrides, term: &str) -> Result<()> {
    let config = super::load_config(&overrides).await?;

    let backend = super::resolve_backend(&config).await;
    let model = OpenAICompatibleModel::new(Client::new(), backend);

    let store: Arc<dyn ArtifactStore> = Arc::new(FileArtifactStore::new(&config.artifacts.root));
    let connector = SseConnector::default();
    let config = &config;
    let model = &model;

    let outcome = with_optional_session(
        &connector,
        config.gateway.url.as_deref(),
        config.gateway.required,
        SessionTimeouts::from(&config.gateway),
        |session| async move {
            let registry = super::build_registry(session.as_ref(), store, config).await?;

            // Without the configured search tool, fall back to the offline one.
            let search = if registry.contains(&config.research.search_capability) {
                config.research.search_capability.as_str()
            } else {
                info!(
                    configured = %config.research.search_capability,
                    fallback = SIMPLE_SEARCH,
                    "Search capability not registered, using fallback"
                );
                SIMPLE_SEARCH
            };

            let outcome = DefineWorkflow::new(&registry, model, search).run(term).await?;
            anyhow::Ok(outcome)
        },
    )
    .await
    .with_context(|| ErrorKind::GatewayUnavailable.to_string())??;

    println!("{}", outcome.message);
    Ok(())
}
