use std::path::PathBuf;

use crate::domain::ports::FileStorage;
use crate::error::AppError;
use async_trait::async_trait;
use tracing::{error, info};

/// Writes uploads below `root`; they are served back under `/uploads`.
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn save(&self, folder: &str, file_name: &str, data: &[u8]) -> Result<String, AppError> {
        let bad_segment = |p: &str| p.is_empty() || p == "." || p == ".." || p.contains('\\');
        if folder.split('/').any(bad_segment) || bad_segment(file_name) || file_name.contains('/') {
            return Err(AppError::Validation("Invalid upload path".into()));
        }

        let dir = self.root.join(folder);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            error!("Failed to create upload dir {:?}: {}", dir, e);
            AppError::Internal
        })?;

        let path = dir.join(file_name);
        tokio::fs::write(&path, data).await.map_err(|e| {
            error!("Failed to write upload {:?}: {}", path, e);
            AppError::Internal
        })?;

        info!("Stored upload {:?} ({} bytes)", path, data.len());
        Ok(format!("/uploads/{}/{}", folder, file_name))
    }
}
