//! Capabilities defined in-process.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;

use super::error::CapabilityError;
use super::{CapabilityDescriptor, CapabilityOrigin, SharedCapability, required_str};
use crate::store::{ArtifactFormat, ArtifactStage, ArtifactStore, sanitize};

pub const SIMPLE_SEARCH: &str = "simple_search";
pub const SAVE_DEFINITION: &str = "save_definition";
pub const SAVE_FILE: &str = "save_file";

/// Offline stand-in for a web search.
pub struct SimpleSearch;

#[async_trait]
impl super::Capability for SimpleSearch {
    async fn invoke(&self, arguments: Value) -> Result<String, CapabilityError> {
        let query = required_str(SIMPLE_SEARCH, &arguments, "query")?;
        Ok(format!(
            "Here is information about {query}: This is a mock search result for demonstration."
        ))
    }
}

/// Saves a term definition as a `definitions/` artifact.
pub struct SaveDefinition {
    store: Arc<dyn ArtifactStore>,
}

impl SaveDefinition {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl super::Capability for SaveDefinition {
    async fn invoke(&self, arguments: Value) -> Result<String, CapabilityError> {
        let word = required_str(SAVE_DEFINITION, &arguments, "word")?;
        let definition = required_str(SAVE_DEFINITION, &arguments, "definition")?;

        let rule = "=".repeat(word.chars().count() + 15);
        let content = format!("Definition of '{word}':\n{rule}\n\n{}\n", definition.trim());
        let artifact = self
            .store
            .save(
                word,
                ArtifactStage::Definition,
                None,
                &content,
                ArtifactFormat::Text,
            )
            .await
            .map_err(|e| CapabilityError::invocation_failed(SAVE_DEFINITION, e))?;

        Ok(format!(
            "The definition for '{word}' has been found and saved to {}.",
            artifact.path.display()
        ))
    }
}

/// Writes arbitrary text to a file in a fixed directory.
pub struct SaveFile {
    dir: PathBuf,
}

impl SaveFile {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Safe file name: sanitized stem plus an alphanumeric extension.
    fn file_name(requested: &str) -> String {
        let requested = Path::new(requested)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (stem, ext) = match requested.rsplit_once('.') {
            Some((stem, ext)) if !ext.is_empty() && ext.chars().all(char::is_alphanumeric) => {
                (stem, Some(ext))
            }
            _ => (requested.as_str(), None),
        };

        let stem = sanitize(stem);
        match ext {
            Some(ext) => format!("{stem}.{ext}"),
            None => format!("{stem}.txt"),
        }
    }
}

#[async_trait]
impl super::Capability for SaveFile {
    async fn invoke(&self, arguments: Value) -> Result<String, CapabilityError> {
        let filename = required_str(SAVE_FILE, &arguments, "filename")?;
        let content = required_str(SAVE_FILE, &arguments, "content")?;

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CapabilityError::invocation_failed(SAVE_FILE, e))?;

        let path = self.dir.join(Self::file_name(filename));
        crate::store::file::write_atomic(&path, content.as_bytes())
            .await
            .map_err(|e| CapabilityError::invocation_failed(SAVE_FILE, e))?;

        tracing::debug!(path = %path.display(), "Saved file");
        Ok(format!("Saved {}", path.display()))
    }
}

/// The statically defined capability set.
///
/// `save_file` writes next to the definitions under the store root.
pub fn local_capabilities(
    store: Arc<dyn ArtifactStore>,
    files_dir: impl Into<PathBuf>,
) -> Vec<CapabilityDescriptor> {
    let search: SharedCapability = Arc::new(SimpleSearch);
    let save_definition: SharedCapability = Arc::new(SaveDefinition::new(store));
    let save_file: SharedCapability = Arc::new(SaveFile::new(files_dir));

    vec![
        CapabilityDescriptor::new(
            SIMPLE_SEARCH,
            CapabilityOrigin::Local,
            "Offline mock search. Arguments: {\"query\": string}",
            search,
        ),
        CapabilityDescriptor::new(
            SAVE_DEFINITION,
            CapabilityOrigin::Local,
            "Save a term definition. Arguments: {\"word\": string, \"definition\": string}",
            save_definition,
        ),
        CapabilityDescriptor::new(
            SAVE_FILE,
            CapabilityOrigin::Local,
            "Save text to a file. Arguments: {\"filename\": string, \"content\": string}",
            save_file,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Capability;
    use crate::store::FileArtifactStore;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn simple_search_echoes_query() {
        let out = SimpleSearch
            .invoke(json!({"query": "rust ownership"}))
            .await
            .unwrap();
        assert!(out.starts_with("Here is information about rust ownership:"));
    }

    #[tokio::test]
    async fn simple_search_requires_query() {
        let err = SimpleSearch.invoke(json!({})).await.unwrap_err();
        assert!(matches!(err, CapabilityError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn save_definition_writes_trimmed_text() {
        let dir = TempDir::new().unwrap();
        let store: Arc<dyn ArtifactStore> = Arc::new(FileArtifactStore::new(dir.path()));

        let message = SaveDefinition::new(store)
            .invoke(json!({"word": "Entropy?", "definition": "  A measure of disorder.  "}))
            .await
            .unwrap();

        let path = dir.path().join("definitions").join("Entropy.txt");
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            format!(
                "Definition of 'Entropy?':\n{}\n\nA measure of disorder.\n",
                "=".repeat(23)
            )
        );
        assert!(message.contains("'Entropy?'"));
    }

    #[tokio::test]
    async fn save_file_sanitizes_name() {
        let dir = TempDir::new().unwrap();
        let capability = SaveFile::new(dir.path().join("definitions"));

        capability
            .invoke(json!({"filename": "../../notes: draft!.md", "content": "hello"}))
            .await
            .unwrap();

        let written = dir.path().join("definitions").join("notes draft.md");
        assert_eq!(std::fs::read_to_string(written).unwrap(), "hello");
    }

    #[test]
    fn file_name_defaults_extension() {
        assert_eq!(SaveFile::file_name("summary"), "summary.txt");
        assert_eq!(SaveFile::file_name("a.b.json"), "ab.json");
    }

    #[test]
    fn local_set_is_stable() {
        let dir = TempDir::new().unwrap();
        let store: Arc<dyn ArtifactStore> = Arc::new(FileArtifactStore::new(dir.path()));
        let names: Vec<_> = local_capabilities(store, dir.path())
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec![SIMPLE_SEARCH, SAVE_DEFINITION, SAVE_FILE]);
    }
}
