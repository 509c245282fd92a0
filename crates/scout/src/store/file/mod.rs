//! File-based storage implementations.
//!
//! Artifacts are stored on the local filesystem under one directory per
//! stage. All writes use atomic operations (temp file + fsync + rename).

mod artifact;

use std::path::Path;

use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::store::error::{StorageError, StorageResult};

pub use artifact::FileArtifactStore;

/// Extension of in-flight temp files. Listings skip them.
pub(crate) const TEMP_EXTENSION: &str = "tmp";

/// Write `content` to `path` atomically through a uniquely named temp file
/// next to it.
pub(crate) async fn write_atomic(path: &Path, content: &[u8]) -> StorageResult<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(
        ".{file_name}.{}.{TEMP_EXTENSION}",
        ulid::Ulid::new()
    ));
    atomic_write_file(&temp_path, path, content).await
}

/// Write `content` to `path` atomically via `temp_path`.
///
/// `temp_path` must live in the same directory as `path` so the rename stays on
/// one filesystem. The temp file is removed if any step fails.
pub(crate) async fn atomic_write_file(
    temp_path: &Path,
    path: &Path,
    content: &[u8],
) -> StorageResult<()> {
    let result = write_and_rename(temp_path, path, content).await;
    if result.is_err() {
        let _ = fs::remove_file(temp_path).await;
    }
    result
}

async fn write_and_rename(temp_path: &Path, path: &Path, content: &[u8]) -> StorageResult<()> {
    let mut file = fs::File::create(temp_path)
        .await
        .map_err(|e| StorageError::file_io(temp_path, e))?;
    file.write_all(content)
        .await
        .map_err(|e| StorageError::file_io(temp_path, e))?;
    file.sync_all()
        .await
        .map_err(|e| StorageError::file_io(temp_path, e))?;
    drop(file);

    fs::rename(temp_path, path)
        .await
        .map_err(|e| StorageError::file_io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn atomic_write_replaces_target_and_removes_temp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plan.json");
        let temp = dir.path().join(".plan.json.tmp");
        std::fs::write(&path, "old").unwrap();

        atomic_write_file(&temp, &path, b"new").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
        assert!(!temp.exists());
    }

    #[tokio::test]
    async fn atomic_write_failure_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let missing_dir = dir.path().join("missing");
        let path = missing_dir.join("plan.json");
        let temp = missing_dir.join(".plan.json.tmp");

        let err = atomic_write_file(&temp, &path, b"data").await.unwrap_err();

        assert!(matches!(err, StorageError::FileIo { .. }));
        assert!(!path.exists());
        assert!(!temp.exists());
    }
}
