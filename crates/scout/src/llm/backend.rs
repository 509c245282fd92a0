//! Backend descriptor produced by credential resolution.

use std::fmt;

/// Default endpoints and sampling parameters for each backend kind.
pub mod defaults {
    pub const LOCAL_ENDPOINT: &str = "http://model-runner.docker.internal/engines/llama.cpp/v1";
    pub const LOCAL_MODEL: &str = "ai/qwen3";
    pub const LOCAL_TEMPERATURE: f32 = 0.0;
    pub const LOCAL_MAX_TOKENS: u32 = 512;
    pub const REMOTE_ENDPOINT: &str = "https://api.openai.com/v1";
    pub const REMOTE_MODEL: &str = "gpt-4o-mini";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Cloud inference, authenticated with a resolved credential.
    Remote,
    /// Local inference, no credential.
    Local,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Remote => f.write_str("remote"),
            BackendKind::Local => f.write_str("local"),
        }
    }
}

/// Which model backend to use and how to reach it.
///
/// Built once per resolution and never modified afterwards. A `Remote`
/// descriptor always carries a credential; a `Local` one never does.
#[derive(Clone, PartialEq)]
pub struct BackendDescriptor {
    kind: BackendKind,
    endpoint: String,
    model: String,
    credential: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl BackendDescriptor {
    pub fn remote(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            kind: BackendKind::Remote,
            endpoint: endpoint.into(),
            model: model.into(),
            credential: Some(credential.into()),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn local(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            kind: BackendKind::Local,
            endpoint: endpoint.into(),
            model: model.into(),
            credential: None,
            temperature: None,
            max_tokens: None,
        }
    }

    #[must_use]
    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = Some(temperature);
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    pub fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }
}

impl fmt::Debug for BackendDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendDescriptor")
            .field("kind", &self.kind)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}
