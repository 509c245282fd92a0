//! `scout capabilities` - list the merged capability registry.

use std::sync::Arc;

use anyhow::{Context, Result};

use scout::gateway::{SessionTimeouts, SseConnector, with_optional_session};
use scout::research::ErrorKind;
use scout::store::{ArtifactStore, FileArtifactStore};

use super::Overrides;

pub async fn run(overrides: Overrides) -> Result<()> {
    let config = super::load_config(&overrides).await?;
    let store: Arc<dyn ArtifactStore> = Arc::new(FileArtifactStore::new(&config.artifacts.root));
    let connector = SseConnector::default();
    let config = &config;

    let listing = with_optional_session(
        &connector,
        config.gateway.url.as_deref(),
        config.gateway.required,
        SessionTimeouts::from(&config.gateway),
        |session| async move {
            let connected = session.is_some();
            let registry = super::build_registry(session.as_ref(), store, config).await?;
            anyhow::Ok((connected, registry.describe()))
        },
    )
    .await
    .with_context(|| ErrorKind::GatewayUnavailable.to_string())??;

    let (connected, description) = listing;
    if !connected {
        println!("(gateway not connected, local capabilities only)");
    }
    println!("{description}");
    Ok(())
}
