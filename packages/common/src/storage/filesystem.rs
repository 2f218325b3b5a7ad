use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::warn;

use super::error::StorageError;
use super::key::{key_from_url, object_key};
use super::kind::{BlobCategory, MediaKind};
use super::traits::{BlobStore, StoredBlob};

/// Filesystem-backed blob store.
///
/// Blobs are stored at `{base_path}/{category}/{uuid}.{ext}` and addressed as
/// `{public_url}/{category}/{uuid}.{ext}`.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    public_url: String,
    max_size: u64,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store.
    pub async fn new(
        base_path: PathBuf,
        public_url: String,
        max_size: u64,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            public_url: public_url.trim_end_matches('/').to_string(),
            max_size,
        })
    }

    /// Filesystem path for an object key.
    fn blob_path(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn upload(
        &self,
        data: &[u8],
        mime_type: &str,
        category: BlobCategory,
    ) -> Result<StoredBlob, StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let key = object_key(category, mime_type);
        let blob_path = self.blob_path(&key);

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Some(parent) = blob_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &blob_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(StoredBlob {
            url: format!("{}/{}", self.public_url, key),
            kind: MediaKind::from_mime(mime_type),
        })
    }

    async fn delete(&self, url: &str) -> Result<bool, StorageError> {
        let Some(key) = key_from_url(&self.public_url, url) else {
            warn!(url, "Ignoring delete for a URL outside this blob store");
            return Ok(false);
        };

        match fs::remove_file(self.blob_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
