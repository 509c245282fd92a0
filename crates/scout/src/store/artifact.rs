//! Artifact storage trait and the records it produces.
//!
//! Defines the interface for persisting workflow documents.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::error::{StorageError, StorageResult};

/// Storage interface for workflow artifacts.
///
/// Implementations must never expose a partially written artifact under its
/// final name.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist `content` for `topic` at `stage`.
    ///
    /// `label` is appended to the slug of timestamped stages, e.g. the report
    /// type. Timestamped stages never overwrite an existing artifact.
    async fn save(
        &self,
        topic: &str,
        stage: ArtifactStage,
        label: Option<&str>,
        content: &str,
        format: ArtifactFormat,
    ) -> StorageResult<Artifact>;

    /// Persist a sibling of `artifact` named `<stem>_<suffix>.json`.
    async fn save_sibling_json(
        &self,
        artifact: &Artifact,
        suffix: &str,
        value: &Value,
    ) -> StorageResult<Artifact>;

    /// Read a JSON artifact back.
    async fn load_json(&self, path: &Path) -> StorageResult<Value>;

    /// Enumerate the files of a stage, sorted by file name.
    async fn list(&self, stage: ArtifactStage) -> StorageResult<Vec<ArtifactEntry>>;

    /// Persist a JSON document with stable key ordering.
    async fn save_json(
        &self,
        topic: &str,
        stage: ArtifactStage,
        label: Option<&str>,
        value: &Value,
    ) -> StorageResult<Artifact> {
        let content = to_stable_json(value)?;
        self.save(topic, stage, label, &content, ArtifactFormat::Json)
            .await
    }
}

/// Pretty-print JSON with object keys in sorted order, at every depth.
///
/// `serde_json` may be built with `preserve_order`, so objects are sorted
/// explicitly rather than relying on the map type.
pub fn to_stable_json(value: &Value) -> StorageResult<String> {
    let mut sorted = value.clone();
    sorted.sort_all_objects();
    serde_json::to_string_pretty(&sorted).map_err(|e| StorageError::serialization(e.to_string()))
}

/// Workflow stage that produced an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStage {
    Plan,
    Analysis,
    Report,
    Index,
    Definition,
}

impl ArtifactStage {
    /// Directory under the store root, or `None` for files at the root.
    pub fn dir_name(self) -> Option<&'static str> {
        match self {
            ArtifactStage::Plan => Some("plans"),
            ArtifactStage::Analysis => Some("analyses"),
            ArtifactStage::Report => Some("reports"),
            ArtifactStage::Definition => Some("definitions"),
            ArtifactStage::Index => None,
        }
    }

    /// Whether file names carry a timestamp token.
    ///
    /// Latest-only stages overwrite the previous artifact for the same topic.
    pub fn is_timestamped(self) -> bool {
        matches!(self, ArtifactStage::Analysis | ArtifactStage::Report)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactStage::Plan => "plan",
            ArtifactStage::Analysis => "analysis",
            ArtifactStage::Report => "report",
            ArtifactStage::Index => "index",
            ArtifactStage::Definition => "definition",
        }
    }
}

impl std::fmt::Display for ArtifactStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactFormat {
    Json,
    Text,
}

impl ArtifactFormat {
    /// File extension for content of this format written at `stage`.
    pub fn extension(self, stage: ArtifactStage) -> &'static str {
        match (self, stage) {
            (ArtifactFormat::Json, _) => "json",
            (ArtifactFormat::Text, ArtifactStage::Definition) => "txt",
            (ArtifactFormat::Text, _) => "md",
        }
    }
}

/// A persisted document. Never modified after it is written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Artifact {
    pub topic: String,
    pub stage: ArtifactStage,
    pub format: ArtifactFormat,
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
}

/// A file found when listing a stage directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactEntry {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

impl ArtifactEntry {
    /// Metadata siblings written next to reports.
    pub fn is_metadata(&self) -> bool {
        self.file_name.ends_with(METADATA_SUFFIX)
    }
}

/// File name suffix of report metadata siblings.
pub const METADATA_SUFFIX: &str = "_metadata.json";

/// Name of the index document at the store root.
pub const INDEX_FILE: &str = "research_index.md";
