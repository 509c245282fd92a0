//! Configuration loaded from `scout.yaml`.
//!
//! Every option the core recognizes lives here and is passed explicitly into
//! the resolver, gateway, and pipeline. A missing file yields defaults.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tokio::fs;

use crate::auth::{CredentialSource, DEFAULT_PLACEHOLDERS};
use crate::capability::CollisionPolicy;
use crate::llm::defaults;
use crate::research::{AnalysisFocus, ReportType};

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub capabilities: CapabilitiesConfig,
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub research: ResearchConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),

    #[error("environment variable '{0}' is not set")]
    MissingEnvVar(String),

    #[error("unclosed variable reference '${{' (missing '}}')")]
    UnclosedVarReference,
}

impl Config {
    /// Load configuration from a YAML file, expanding `${VAR}` references.
    ///
    /// Relative paths inside the file are resolved against the file's directory.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };
        let mut config = Self::parse(&contents)?;
        config.artifacts.root = resolve_path(path, &config.artifacts.root);
        config.credentials.secrets_dir = resolve_path(path, &config.credentials.secrets_dir);
        Ok(config)
    }

    /// Parse configuration from YAML text using the process environment.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents, |name| std::env::var(name).ok())?;
        Ok(serde_saphyr::from_str(&expanded)?)
    }
}

/// Resolve a path relative to the config file directory.
///
/// Absolute paths are returned unchanged.
pub fn resolve_path(config_path: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }

    let config_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    config_dir.join(path)
}

// ============================================================================
// Default Paths
// ============================================================================

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "scout.yaml";
/// Default artifact root directory.
pub const DEFAULT_ARTIFACTS_ROOT: &str = "research_output";
/// Default directory holding one file per mounted secret.
pub const DEFAULT_SECRETS_DIR: &str = "/run/secrets";
/// Default gateway SSE endpoint.
pub const DEFAULT_GATEWAY_URL: &str = "http://mcp-gateway:8811/sse";

// ============================================================================
// BackendConfig
// ============================================================================

/// Model backend endpoints for both branches of credential resolution.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub local_endpoint: String,
    pub local_model: String,
    pub local_temperature: f32,
    pub local_max_tokens: u32,
    pub remote_endpoint: String,
    pub remote_model: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            local_endpoint: defaults::LOCAL_ENDPOINT.to_string(),
            local_model: defaults::LOCAL_MODEL.to_string(),
            local_temperature: defaults::LOCAL_TEMPERATURE,
            local_max_tokens: defaults::LOCAL_MAX_TOKENS,
            remote_endpoint: defaults::REMOTE_ENDPOINT.to_string(),
            remote_model: defaults::REMOTE_MODEL.to_string(),
        }
    }
}

// ============================================================================
// CredentialsConfig
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub secrets_dir: PathBuf,
    /// Ordered lookup chain; the first genuine value wins.
    pub sources: Vec<CredentialSource>,
    /// Values never accepted as a real credential.
    pub placeholders: Vec<String>,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            secrets_dir: PathBuf::from(DEFAULT_SECRETS_DIR),
            sources: vec![
                CredentialSource::secret_store("openai_api_key"),
                CredentialSource::environment("OPENAI_API_KEY"),
            ],
            placeholders: DEFAULT_PLACEHOLDERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

// ============================================================================
// GatewayConfig
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// SSE endpoint of the gateway. `None` runs with local capabilities only.
    pub url: Option<String>,
    /// Whether a gateway connection failure aborts the run.
    pub required: bool,
    pub connect_timeout_seconds: u64,
    pub discovery_timeout_seconds: u64,
    pub call_timeout_seconds: u64,
}

impl GatewayConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_seconds)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_seconds)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: Some(DEFAULT_GATEWAY_URL.to_string()),
            required: true,
            connect_timeout_seconds: 10,
            discovery_timeout_seconds: 30,
            call_timeout_seconds: 60,
        }
    }
}

// ============================================================================
// CapabilitiesConfig / ArtifactsConfig
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CapabilitiesConfig {
    pub collision_policy: CollisionPolicy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    pub root: PathBuf,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ARTIFACTS_ROOT),
        }
    }
}

// ============================================================================
// ResearchConfig
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    pub topic: Option<String>,
    pub focus_areas: Vec<String>,
    pub analysis_focus: AnalysisFocus,
    pub report_type: ReportType,
    /// Registry name of the capability used by the SEARCH stage.
    pub search_capability: String,
    /// Also write the ANALYSIS stage output as an artifact.
    pub persist_analysis: bool,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            topic: None,
            focus_areas: Vec::new(),
            analysis_focus: AnalysisFocus::default(),
            report_type: ReportType::default(),
            search_capability: "search".to_string(),
            persist_analysis: false,
        }
    }
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand `${VAR}`, `${VAR:-default}` and `$$` in `input`.
///
/// `lookup` resolves variable names. A required variable that is not set is an
/// error; a plain `$` not followed by `{` is kept as-is. Nested references are
/// not supported.
fn expand_env_vars<F>(input: &str, lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        result.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            result.push('$');
            rest = tail;
        } else if let Some(tail) = after.strip_prefix('{') {
            let end = tail.find('}').ok_or(ConfigError::UnclosedVarReference)?;
            result.push_str(&resolve_reference(&tail[..end], &lookup)?);
            rest = &tail[end + 1..];
        } else {
            result.push('$');
            rest = after;
        }
    }

    result.push_str(rest);
    Ok(result)
}

/// Resolve the body of a `${...}` reference.
fn resolve_reference<F>(reference: &str, lookup: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let (name, default) = match reference.split_once(":-") {
        Some((name, default)) => (name, Some(default)),
        None => (reference, None),
    };

    match (lookup(name), default) {
        (Some(value), _) => Ok(value),
        (None, Some(default)) => Ok(default.to_string()),
        (None, None) => Err(ConfigError::MissingEnvVar(name.to_string())),
    }
}

// ============================================================================
// Tests
// ============================================================================
