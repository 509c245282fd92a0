//! Artifact persistence.

pub mod artifact;
pub mod error;
pub mod file;
pub mod slug;

pub use artifact::{
    Artifact, ArtifactEntry, ArtifactFormat, ArtifactStage, ArtifactStore, INDEX_FILE,
    METADATA_SUFFIX,
};
pub use error::{StorageError, StorageResult};
pub use file::FileArtifactStore;
pub use slug::sanitize;
