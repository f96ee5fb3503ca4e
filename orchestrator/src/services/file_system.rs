//! Local directory artifact store
//!
//! Used for dry runs with `--output-dir`. Artifacts are written to a
//! temporary file, synced, then renamed into place so a reader never sees a
//! partial `<id>.json`.

use std::path::{Path, PathBuf};
use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use shared::{artifact_key, doc_debug, EnrichmentArtifact, ImageRecord};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::IdempotencyStore;

pub struct LocalArtifactStore {
    base_dir: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path of the artifact for a document
    pub fn artifact_path(&self, id: &str) -> PathBuf {
        self.base_dir.join(artifact_key(id))
    }
}

#[async_trait]
impl IdempotencyStore for LocalArtifactStore {
    async fn exists(&self, id: &str) -> OrchestratorResult<bool> {
        let path = self.artifact_path(id);
        fs::try_exists(&path)
            .await
            .map_err(|e| OrchestratorError::io("exists", &path, e))
    }

    async fn put(&self, record: &ImageRecord) -> OrchestratorResult<()> {
        fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|e| OrchestratorError::io("create_dir", &self.base_dir, e))?;

        let content = serde_json::to_vec_pretty(&EnrichmentArtifact::from(record))?;
        let path = self.artifact_path(&record.id);
        let tmp_path = path.with_extension("json.tmp");

        let mut file = fs::File::create(&tmp_path)
            .await
            .map_err(|e| OrchestratorError::io("create", &tmp_path, e))?;
        file.write_all(&content)
            .await
            .map_err(|e| OrchestratorError::io("write", &tmp_path, e))?;
        file.sync_all()
            .await
            .map_err(|e| OrchestratorError::io("sync", &tmp_path, e))?;
        drop(file);

        fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| OrchestratorError::io("rename", &path, e))?;

        doc_debug!(record.id, path = %path.display(), "📁 Artifact written");
        Ok(())
    }
}
