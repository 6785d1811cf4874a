use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::error;

use crate::domain::ports::BlobStore;
use crate::error::AppError;

/// Filesystem-backed blob storage rooted at `config.data_dir`. The object
/// store the original deployment used sits behind the same port; keys keep
/// the `uploads/...` and `transcripts/...` layout.
pub struct FsBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: String) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Keys must stay inside the root: no absolute paths, no `..`.
    fn resolve(&self, key: &str) -> Result<PathBuf, AppError> {
        let path = Path::new(key);
        let safe = !key.is_empty()
            && path.components().all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(AppError::Validation(format!("Invalid storage key: {key}")));
        }
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, bytes: &[u8], _content_type: &str) -> Result<(), AppError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::InternalWithMsg(format!("Blob dir create failed for {key}: {e}")))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::InternalWithMsg(format!("Blob write failed for {key}: {e}")))
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::InternalWithMsg(format!("Blob read failed for {key}: {e}"))),
        }
    }

    async fn delete_many(&self, keys: &[String]) -> Result<(), AppError> {
        let mut first_failure: Option<String> = None;

        for key in keys {
            let path = match self.resolve(key) {
                Ok(p) => p,
                Err(_) => continue,
            };
            match tokio::fs::remove_file(&path).await {
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    error!("Blob delete failed for {}: {}", key, e);
                    if first_failure.is_none() {
                        first_failure = Some(format!("{key}: {e}"));
                    }
                }
            }
        }

        match first_failure {
            None => Ok(()),
            Some(detail) => Err(AppError::InternalWithMsg(format!("Blob deletion failed: {detail}"))),
        }
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/files/{}", self.public_base_url, key)
    }
}
