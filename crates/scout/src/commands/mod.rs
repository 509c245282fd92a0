//! CLI command implementations.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use scout::auth::{CredentialResolver, ResolverConfig};
use scout::capability::{CapabilityRegistry, local_capabilities, optional_remote_capabilities};
use scout::config::Config;
use scout::gateway::GatewaySession;
use scout::llm::BackendDescriptor;
use scout::research::ErrorKind;
use scout::store::ArtifactStore;

pub mod capabilities;
pub mod define;
pub mod research;

/// Directory under the artifact root that `save_file` writes to.
const FILES_DIR: &str = "files";

/// Configuration flags shared by all commands.
#[derive(Debug, Clone)]
pub struct Overrides {
    pub config: String,
    pub gateway_url: Option<String>,
    pub no_gateway: bool,
    pub output: Option<PathBuf>,
}

/// Load the config file and apply command-line overrides.
pub async fn load_config(overrides: &Overrides) -> Result<Config> {
    let mut config = Config::load(&overrides.config)
        .await
        .with_context(|| format!("failed to load config '{}'", overrides.config))?;

    if overrides.no_gateway {
        config.gateway.url = None;
    } else if let Some(url) = &overrides.gateway_url {
        config.gateway.url = Some(url.clone());
    }
    if let Some(output) = &overrides.output {
        config.artifacts.root = output.clone();
    }

    Ok(config)
}

/// Pick the model backend from the credential chain.
pub async fn resolve_backend(config: &Config) -> BackendDescriptor {
    CredentialResolver::new(ResolverConfig::from(config))
        .resolve()
        .await
}

/// Merge the gateway's capabilities, if any, with the local set.
pub async fn build_registry(
    session: Option<&Arc<GatewaySession>>,
    store: Arc<dyn ArtifactStore>,
    config: &Config,
) -> Result<CapabilityRegistry> {
    let remote = optional_remote_capabilities(session, config.gateway.required)
        .await
        .with_context(|| ErrorKind::GatewayUnavailable.to_string())?;
    let local = local_capabilities(store, config.artifacts.root.join(FILES_DIR));

    let registry = CapabilityRegistry::merge(remote, local, config.capabilities.collision_policy)?;
    info!(
        capabilities = registry.len(),
        policy = ?config.capabilities.collision_policy,
        "Capability registry ready"
    );
    Ok(registry)
}
