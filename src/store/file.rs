//! File-system object store for generated artifacts

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

use super::traits::ObjectStore;
use crate::error::{AppError, Result};

pub struct FileObjectStore {
    base_path: PathBuf,
}

impl FileObjectStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    async fn ensure_base_dir(&self) -> Result<()> {
        if !self.base_path.exists() {
            fs::create_dir_all(&self.base_path)
                .await
                .map_err(AppError::Io)?;
            debug!(path = ?self.base_path, "created artifact directory");
        }
        Ok(())
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }
}

#[async_trait]
impl ObjectStore for FileObjectStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.ensure_base_dir().await?;

        let path = self.base_path.join(key);
        fs::write(&path, bytes).await.map_err(AppError::Io)?;

        debug!(path = ?path, size = bytes.len(), "stored artifact");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        fs::read(self.base_path.join(key))
            .await
            .map_err(AppError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileObjectStore::new(dir.path().join("artifacts"));

        store.put("a.png", &[1, 2, 3]).await.unwrap();
        assert_eq!(store.get("a.png").await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn get_missing_key_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileObjectStore::new(dir.path());
        assert!(store.get("missing.png").await.is_err());
    }
}
