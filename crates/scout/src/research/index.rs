//! Aggregate index of stored research artifacts.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::store::{ArtifactEntry, ArtifactStage, ArtifactStore, StorageResult};

/// Stages catalogued by the index, in document order.
const INDEXED_STAGES: &[(ArtifactStage, &str)] = &[
    (ArtifactStage::Plan, "Plans"),
    (ArtifactStage::Analysis, "Analyses"),
    (ArtifactStage::Report, "Reports"),
];

/// A rendered index and the artifacts it lists.
#[derive(Debug, Clone)]
pub struct ResearchIndex {
    pub content: String,
    pub entries: Vec<ArtifactEntry>,
}

/// Scan the store and render the index document.
///
/// Report metadata siblings are not listed.
pub async fn build_index(
    store: &dyn ArtifactStore,
    generated_at: DateTime<Utc>,
) -> StorageResult<ResearchIndex> {
    let mut content = String::new();
    let mut entries = Vec::new();

    let _ = writeln!(content, "# Research Index");
    let _ = writeln!(content);
    let _ = writeln!(
        content,
        "Generated: {}",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    for &(stage, title) in INDEXED_STAGES {
        let listed: Vec<ArtifactEntry> = store
            .list(stage)
            .await?
            .into_iter()
            .filter(|e| !e.is_metadata())
            .collect();

        let _ = writeln!(content);
        let _ = writeln!(content, "## {title} ({})", listed.len());
        let _ = writeln!(content);

        if listed.is_empty() {
            let _ = writeln!(content, "_No artifacts._");
            continue;
        }

        let dir = stage.dir_name().unwrap_or(".");
        let _ = writeln!(content, "| File | Size (bytes) | Modified |");
        let _ = writeln!(content, "|------|--------------|----------|");
        for entry in &listed {
            let _ = writeln!(
                content,
                "| [{name}]({dir}/{link}) | {size} | {modified} |",
                name = entry.file_name,
                link = entry.file_name.replace(' ', "%20"),
                size = entry.size,
                modified = entry.modified.format("%Y-%m-%d %H:%M:%S"),
            );
        }
        entries.extend(listed);
    }

    let _ = writeln!(content);
    let _ = writeln!(content, "Total artifacts: {}", entries.len());

    Ok(ResearchIndex { content, entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ArtifactFormat, FileArtifactStore};
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn lists_plans_and_reports_without_metadata() {
        let dir = TempDir::new().unwrap();
        let store = FileArtifactStore::new(dir.path());

        store
            .save_json("AI Safety", ArtifactStage::Plan, None, &json!({}))
            .await
            .unwrap();
        let report = store
            .save(
                "AI Safety",
                ArtifactStage::Report,
                Some("summary"),
                "# r",
                ArtifactFormat::Text,
            )
            .await
            .unwrap();
        store
            .save_sibling_json(&report, "metadata", &json!({}))
            .await
            .unwrap();

        let index = build_index(&store, Utc::now()).await.unwrap();

        assert_eq!(index.entries.len(), 2);
        assert!(index.content.contains("[AI Safety.json](plans/AI%20Safety.json)"));
        assert!(index.content.contains("## Analyses (0)"));
        assert!(index.content.contains("_No artifacts._"));
        assert!(!index.content.contains("_metadata.json"));
        assert!(index.content.ends_with("Total artifacts: 2\n"));
    }

    #[tokio::test]
    async fn empty_store_renders_empty_sections() {
        let dir = TempDir::new().unwrap();
        let store = FileArtifactStore::new(dir.path());

        let index = build_index(&store, Utc::now()).await.unwrap();

        assert!(index.entries.is_empty());
        assert_eq!(index.content.matches("_No artifacts._").count(), 3);
    }
}
