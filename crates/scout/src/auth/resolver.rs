//! Credential resolution and backend selection.
//!
//! Walks the configured source chain in order. The first genuine value selects
//! the remote backend; if every source is absent the local backend is used.
//! Resolution never fails and nothing is cached between calls.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::fs;
use tracing::{debug, info};

use super::credentials::{CredentialLookup, CredentialSource, SourceKind, UnavailableReason};
use crate::config::{BackendConfig, Config};
use crate::llm::BackendDescriptor;

/// Environment variable lookup, injectable for tests.
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Everything the resolver needs, extracted from [`Config`].
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub secrets_dir: PathBuf,
    pub sources: Vec<CredentialSource>,
    pub placeholders: Vec<String>,
    pub backend: BackendConfig,
}

impl From<&Config> for ResolverConfig {
    fn from(config: &Config) -> Self {
        Self {
            secrets_dir: config.credentials.secrets_dir.clone(),
            sources: config.credentials.sources.clone(),
            placeholders: config.credentials.placeholders.clone(),
            backend: config.backend.clone(),
        }
    }
}

pub struct CredentialResolver {
    config: ResolverConfig,
    env: EnvLookup,
}

impl CredentialResolver {
    /// Create a resolver reading the process environment.
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            env: Arc::new(|name| std::env::var(name).ok()),
        }
    }

    /// Replace the environment lookup.
    #[must_use]
    pub fn with_env<F>(mut self, env: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(env);
        self
    }

    /// Read a single source.
    pub async fn lookup(&self, source: &CredentialSource) -> CredentialLookup {
        let raw = match source.kind {
            SourceKind::Environment => match (self.env)(&source.identifier) {
                Some(value) => value,
                None => return CredentialLookup::Unavailable(UnavailableReason::Missing),
            },
            SourceKind::SecretStore => {
                let path = self.config.secrets_dir.join(&source.identifier);
                match fs::read_to_string(&path).await {
                    Ok(value) => value,
                    Err(e) if e.kind() == ErrorKind::NotFound => {
                        return CredentialLookup::Unavailable(UnavailableReason::Missing);
                    }
                    Err(e) => {
                        debug!(path = %path.display(), error = %e, "Secret file unreadable");
                        return CredentialLookup::Unavailable(UnavailableReason::Unreadable);
                    }
                }
            }
        };

        let placeholders: Vec<&str> = self
            .config
            .placeholders
            .iter()
            .chain(source.placeholders.iter())
            .map(String::as_str)
            .collect();
        CredentialLookup::classify(&raw, &placeholders)
    }

    /// Resolve the backend to use.
    pub async fn resolve(&self) -> BackendDescriptor {
        let backend = &self.config.backend;

        for source in &self.config.sources {
            match self.lookup(source).await {
                CredentialLookup::Found(credential) => {
                    info!(source = %source, model = %backend.remote_model, "Using remote backend");
                    return BackendDescriptor::remote(
                        &backend.remote_endpoint,
                        &backend.remote_model,
                        credential,
                    );
                }
                CredentialLookup::Unavailable(reason) => {
                    debug!(source = %source, reason = %reason, "Credential source unavailable");
                }
            }
        }

        info!(
            endpoint = %backend.local_endpoint,
            model = %backend.local_model,
            "No credential found, using local backend"
        );
        BackendDescriptor::local(&backend.local_endpoint, &backend.local_model)
            .with_sampling(backend.local_temperature, backend.local_max_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::DEFAULT_PLACEHOLDERS;
    use crate::llm::BackendKind;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn config(secrets_dir: PathBuf, sources: Vec<CredentialSource>) -> ResolverConfig {
        ResolverConfig {
            secrets_dir,
            sources,
            placeholders: DEFAULT_PLACEHOLDERS.iter().map(|s| s.to_string()).collect(),
            backend: BackendConfig::default(),
        }
    }

    fn default_chain() -> Vec<CredentialSource> {
        vec![
            CredentialSource::secret_store("openai_api_key"),
            CredentialSource::environment("OPENAI_API_KEY"),
        ]
    }

    fn env_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + Send + Sync + 'static {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[tokio::test]
    async fn placeholder_secret_and_missing_env_fall_back_to_local() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("openai_api_key"),
            "sk-test-dummy-key-for-learning\n",
        )
        .unwrap();

        let resolver = CredentialResolver::new(config(dir.path().to_path_buf(), default_chain()))
            .with_env(env_from(&[]));
        let backend = resolver.resolve().await;

        assert_eq!(backend.kind(), BackendKind::Local);
        assert!(backend.credential().is_none());
        assert_eq!(backend.model(), "ai/qwen3");
        assert_eq!(backend.temperature(), Some(0.0));
    }

    #[tokio::test]
    async fn first_genuine_source_wins_and_later_sources_are_not_read() {
        let dir = TempDir::new().unwrap();
        let consulted = Arc::new(Mutex::new(Vec::new()));
        let seen = consulted.clone();

        let sources = vec![
            CredentialSource::environment("PRIMARY_KEY"),
            CredentialSource::environment("SECONDARY_KEY"),
        ];
        let resolver = CredentialResolver::new(config(dir.path().to_path_buf(), sources))
            .with_env(move |name| {
                seen.lock().unwrap().push(name.to_string());
                match name {
                    "PRIMARY_KEY" => Some("sk-primary".to_string()),
                    "SECONDARY_KEY" => Some("sk-secondary".to_string()),
                    _ => None,
                }
            });

        let backend = resolver.resolve().await;

        assert_eq!(backend.kind(), BackendKind::Remote);
        assert_eq!(backend.credential(), Some("sk-primary"));
        assert_eq!(backend.model(), "gpt-4o-mini");
        assert_eq!(*consulted.lock().unwrap(), vec!["PRIMARY_KEY"]);
    }

    #[tokio::test]
    async fn secret_file_value_is_trimmed() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("openai_api_key"), "sk-from-file\n").unwrap();

        let resolver = CredentialResolver::new(config(dir.path().to_path_buf(), default_chain()))
            .with_env(env_from(&[("OPENAI_API_KEY", "sk-from-env")]));
        let backend = resolver.resolve().await;

        assert_eq!(backend.credential(), Some("sk-from-file"));
    }

    #[tokio::test]
    async fn env_used_when_secret_missing() {
        let dir = TempDir::new().unwrap();
        let resolver = CredentialResolver::new(config(dir.path().to_path_buf(), default_chain()))
            .with_env(env_from(&[("OPENAI_API_KEY", "sk-from-env")]));

        let backend = resolver.resolve().await;

        assert_eq!(backend.kind(), BackendKind::Remote);
        assert_eq!(backend.credential(), Some("sk-from-env"));
    }

    #[tokio::test]
    async fn lookup_reports_reason() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("as_dir")).unwrap();

        let mut source = CredentialSource::environment("KEY");
        source.placeholders.push("changeme".to_string());
        let resolver = CredentialResolver::new(config(dir.path().to_path_buf(), vec![]))
            .with_env(env_from(&[("KEY", "changeme"), ("BLANK", "")]));

        assert_eq!(
            resolver.lookup(&source).await,
            CredentialLookup::Unavailable(UnavailableReason::Placeholder)
        );
        assert_eq!(
            resolver
                .lookup(&CredentialSource::environment("BLANK"))
                .await,
            CredentialLookup::Unavailable(UnavailableReason::Empty)
        );
        assert_eq!(
            resolver
                .lookup(&CredentialSource::secret_store("nope"))
                .await,
            CredentialLookup::Unavailable(UnavailableReason::Missing)
        );
        assert_eq!(
            resolver
                .lookup(&CredentialSource::secret_store("as_dir"))
                .await,
            CredentialLookup::Unavailable(UnavailableReason::Unreadable)
        );
    }

    #[tokio::test]
    async fn each_resolution_reads_fresh() {
        let dir = TempDir::new().unwrap();
        let secret = dir.path().join("openai_api_key");
        let resolver = CredentialResolver::new(config(dir.path().to_path_buf(), default_chain()))
            .with_env(env_from(&[]));

        assert_eq!(resolver.resolve().await.kind(), BackendKind::Local);
        std::fs::write(&secret, "sk-rotated").unwrap();
        assert_eq!(resolver.resolve().await.credential(), Some("sk-rotated"));
    }
}
