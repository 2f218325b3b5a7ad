mod error;
mod key;
mod kind;
mod traits;

pub mod filesystem;
#[cfg(feature = "object-storage")]
pub mod s3;

use std::sync::Arc;

pub use error::StorageError;
pub use key::{key_from_url, object_key};
pub use kind::{BlobCategory, MediaKind};
pub use traits::{BlobStore, StoredBlob};

use crate::config::{StorageAppConfig, StorageBackend};

/// Build the blob store selected by `config`.
pub async fn open(config: &StorageAppConfig) -> Result<Arc<dyn BlobStore>, StorageError> {
    match config.backend {
        StorageBackend::Filesystem => {
            let store = filesystem::FilesystemBlobStore::new(
                config.base_path.clone(),
                config.public_url.clone(),
                config.max_blob_size,
            )
            .await?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "object-storage")]
        StorageBackend::S3 => {
            let s3_config = config
                .s3
                .as_ref()
                .ok_or_else(|| StorageError::Backend("storage.s3 section is missing".into()))?;
            let store =
                s3::S3BlobStore::new(s3_config, config.public_url.clone(), config.max_blob_size)?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "object-storage"))]
        StorageBackend::S3 => Err(StorageError::Backend(
            "built without the object-storage feature".into(),
        )),
    }
}
