//! File-based artifact storage implementation.
//!
//! Layout under the store root:
//! - `plans/{slug}.json` (latest only)
//! - `analyses/{slug}_{label}_{timestamp}.json`
//! - `reports/{slug}_{label}_{timestamp}.md` plus `_metadata.json` sibling
//! - `definitions/{slug}.txt` (latest only)
//! - `research_index.md`

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::fs;

use crate::store::artifact::{
    Artifact, ArtifactEntry, ArtifactFormat, ArtifactStage, ArtifactStore, INDEX_FILE,
    to_stable_json,
};
use crate::store::error::{StorageError, StorageResult};
use crate::store::slug::sanitize;

use super::TEMP_EXTENSION;

/// Timestamp token embedded in timestamped file names (UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// File-based implementation of `ArtifactStore`.
#[derive(Debug, Clone)]
pub struct FileArtifactStore {
    root: PathBuf,
}

impl FileArtifactStore {
    /// Create a new file artifact store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn stage_dir(&self, stage: ArtifactStage) -> PathBuf {
        match stage.dir_name() {
            Some(dir) => self.root.join(dir),
            None => self.root.clone(),
        }
    }

    async fn ensure_dir(dir: &Path) -> StorageResult<()> {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| StorageError::file_io(dir, e))
    }

    /// File stem for a new artifact, before collision handling.
    fn stem(
        slug: &str,
        stage: ArtifactStage,
        label: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> String {
        if !stage.is_timestamped() {
            return slug.to_string();
        }

        let timestamp = created_at.format(TIMESTAMP_FORMAT);
        match label.map(sanitize) {
            Some(label) => format!("{slug}_{label}_{timestamp}"),
            None => format!("{slug}_{timestamp}"),
        }
    }

    /// First free path for `stem.ext`, appending `_1`, `_2`, ... if taken.
    async fn unused_path(dir: &Path, stem: &str, ext: &str) -> StorageResult<PathBuf> {
        let mut candidate = dir.join(format!("{stem}.{ext}"));
        let mut n = 0u32;
        while fs::try_exists(&candidate)
            .await
            .map_err(|e| StorageError::file_io(&candidate, e))?
        {
            n += 1;
            candidate = dir.join(format!("{stem}_{n}.{ext}"));
        }
        Ok(candidate)
    }
}

#[async_trait]
impl ArtifactStore for FileArtifactStore {
    async fn save(
        &self,
        topic: &str,
        stage: ArtifactStage,
        label: Option<&str>,
        content: &str,
        format: ArtifactFormat,
    ) -> StorageResult<Artifact> {
        let dir = self.stage_dir(stage);
        Self::ensure_dir(&dir).await?;

        let created_at = Utc::now();
        let path = if stage == ArtifactStage::Index {
            dir.join(INDEX_FILE)
        } else {
            let stem = Self::stem(&sanitize(topic), stage, label, created_at);
            let ext = format.extension(stage);
            if stage.is_timestamped() {
                Self::unused_path(&dir, &stem, ext).await?
            } else {
                dir.join(format!("{stem}.{ext}"))
            }
        };

        super::write_atomic(&path, content.as_bytes()).await?;

        tracing::debug!(
            stage = %stage,
            path = %path.display(),
            bytes = content.len(),
            "Saved artifact"
        );

        Ok(Artifact {
            topic: topic.to_string(),
            stage,
            format,
            path,
            created_at,
        })
    }

    async fn save_sibling_json(
        &self,
        artifact: &Artifact,
        suffix: &str,
        value: &Value,
    ) -> StorageResult<Artifact> {
        let dir = artifact
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        let stem = artifact
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let path = dir.join(format!("{stem}_{suffix}.json"));

        let content = to_stable_json(value)?;
        super::write_atomic(&path, content.as_bytes()).await?;

        tracing::debug!(path = %path.display(), "Saved artifact sibling");

        Ok(Artifact {
            topic: artifact.topic.clone(),
            stage: artifact.stage,
            format: ArtifactFormat::Json,
            path,
            created_at: Utc::now(),
        })
    }

    async fn load_json(&self, path: &Path) -> StorageResult<Value> {
        let content = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(StorageError::file_io(path, e)),
        };

        serde_json::from_str(&content)
            .map_err(|e| StorageError::file_deserialization(path, e.to_string()))
    }

    async fn list(&self, stage: ArtifactStage) -> StorageResult<Vec<ArtifactEntry>> {
        let dir = self.stage_dir(stage);
        let mut artifacts = Vec::new();

        let mut entries = match fs::read_dir(&dir).await {
            Ok(e) => e,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::file_io(&dir, e)),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::file_io(&dir, e))?
        {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();
            if file_name.starts_with('.') || path.extension().is_some_and(|e| e == TEMP_EXTENSION)
            {
                continue;
            }

            let metadata = entry
                .metadata()
                .await
                .map_err(|e| StorageError::file_io(&path, e))?;
            if !metadata.is_file() {
                continue;
            }
            if stage == ArtifactStage::Index && file_name != INDEX_FILE {
                continue;
            }

            let modified = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .map_err(|e| StorageError::file_io(&path, e))?;

            artifacts.push(ArtifactEntry {
                path,
                file_name,
                size: metadata.len(),
                modified,
            });
        }

        artifacts.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(artifacts)
    }
}
