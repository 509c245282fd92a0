//! Credential sources and the typed outcome of reading one.

use serde::Deserialize;

/// Values that look like keys but are known stand-ins, never real credentials.
pub const DEFAULT_PLACEHOLDERS: &[&str] = &["sk-insecure", "sk-test-dummy-key-for-learning"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// A file named after the identifier inside the secrets directory.
    SecretStore,
    /// A process environment variable.
    Environment,
}

/// One entry of the ordered credential lookup chain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CredentialSource {
    pub kind: SourceKind,
    pub identifier: String,
    /// Extra placeholder values rejected for this source only.
    #[serde(default)]
    pub placeholders: Vec<String>,
}

impl CredentialSource {
    pub fn secret_store(identifier: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::SecretStore,
            identifier: identifier.into(),
            placeholders: Vec::new(),
        }
    }

    pub fn environment(identifier: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::Environment,
            identifier: identifier.into(),
            placeholders: Vec::new(),
        }
    }
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            SourceKind::SecretStore => write!(f, "secret:{}", self.identifier),
            SourceKind::Environment => write!(f, "env:{}", self.identifier),
        }
    }
}

/// Why a source did not yield a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    Missing,
    Empty,
    Placeholder,
    Unreadable,
}

impl std::fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UnavailableReason::Missing => "missing",
            UnavailableReason::Empty => "empty",
            UnavailableReason::Placeholder => "placeholder",
            UnavailableReason::Unreadable => "unreadable",
        };
        f.write_str(s)
    }
}

/// Result of reading a single credential source.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialLookup {
    Found(String),
    Unavailable(UnavailableReason),
}

impl CredentialLookup {
    /// Classify a raw value read from a source.
    ///
    /// Surrounding whitespace is trimmed before the empty and placeholder
    /// checks.
    pub fn classify<S: AsRef<str>>(raw: &str, placeholders: &[S]) -> Self {
        let value = raw.trim();
        if value.is_empty() {
            CredentialLookup::Unavailable(UnavailableReason::Empty)
        } else if placeholders.iter().any(|p| p.as_ref() == value) {
            CredentialLookup::Unavailable(UnavailableReason::Placeholder)
        } else {
            CredentialLookup::Found(value.to_string())
        }
    }
}

impl std::fmt::Debug for CredentialLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialLookup::Found(_) => f.write_str("Found(<redacted>)"),
            CredentialLookup::Unavailable(reason) => write!(f, "Unavailable({reason})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_trims_and_accepts() {
        let lookup = CredentialLookup::classify("  sk-real\n", DEFAULT_PLACEHOLDERS);
        assert_eq!(lookup, CredentialLookup::Found("sk-real".to_string()));
    }

    #[test]
    fn classify_rejects_placeholder_and_empty() {
        assert_eq!(
            CredentialLookup::classify("sk-insecure\n", DEFAULT_PLACEHOLDERS),
            CredentialLookup::Unavailable(UnavailableReason::Placeholder)
        );
        assert_eq!(
            CredentialLookup::classify("   ", DEFAULT_PLACEHOLDERS),
            CredentialLookup::Unavailable(UnavailableReason::Empty)
        );
    }

    #[test]
    fn debug_never_prints_value() {
        let lookup = CredentialLookup::Found("sk-secret".to_string());
        assert_eq!(format!("{lookup:?}"), "Found(<redacted>)");
    }

    #[test]
    fn source_deserializes_from_yaml() {
        let source: CredentialSource =
            serde_saphyr::from_str("kind: secret_store\nidentifier: openai_api_key\n").unwrap();
        assert_eq!(source, CredentialSource::secret_store("openai_api_key"));
        assert_eq!(source.to_string(), "secret:openai_api_key");
    }
}
