use async_trait::async_trait;

use super::error::StorageError;
use super::kind::{BlobCategory, MediaKind};

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// Stable public URL of the blob.
    pub url: String,
    /// Kind detected from the upload's MIME type.
    pub kind: MediaKind,
}

/// URL-addressed blob storage for uploaded attachments.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under a fresh key in `category` and return its public URL.
    async fn upload(
        &self,
        data: &[u8],
        mime_type: &str,
        category: BlobCategory,
    ) -> Result<StoredBlob, StorageError>;

    /// Delete the blob behind `url`.
    ///
    /// Returns `true` if a blob was deleted, `false` if it did not exist or
    /// the URL does not point into this store. Only genuine backend failures
    /// are errors.
    async fn delete(&self, url: &str) -> Result<bool, StorageError>;
}
