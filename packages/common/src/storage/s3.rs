use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use tracing::warn;

use super::error::StorageError;
use super::key::{key_from_url, object_key};
use super::kind::{BlobCategory, MediaKind};
use super::traits::{BlobStore, StoredBlob};
use crate::config::S3Config;

/// Blob store backed by an S3-compatible bucket.
pub struct S3BlobStore {
    bucket: Box<Bucket>,
    public_url: String,
    max_size: u64,
}

impl S3BlobStore {
    pub fn new(config: &S3Config, public_url: String, max_size: u64) -> Result<Self, StorageError> {
        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .parse()
                .map_err(|e| StorageError::Backend(format!("invalid region: {e}")))?,
        };

        let credentials = Credentials::new(
            config.access_key.as_deref(),
            config.secret_key.as_deref(),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Backend(format!("invalid credentials: {e}")))?;

        let mut bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        if config.path_style {
            bucket = bucket.with_path_style();
        }

        Ok(Self {
            bucket,
            public_url: public_url.trim_end_matches('/').to_string(),
            max_size,
        })
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
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
        let response = self
            .bucket
            .put_object_with_content_type(&key, data, mime_type)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(StorageError::Backend(format!(
                "upload of {key} failed with status {status}"
            )));
        }

        Ok(StoredBlob {
            url: format!("{}/{}", self.public_url, key),
            kind: MediaKind::from_mime(mime_type),
        })
    }

    async fn delete(&self, url: &str) -> Result<bool, StorageError> {
        let Some(key) = key_from_url(&self.public_url, url) else {
            warn!(url, "Ignoring delete for a URL outside this bucket");
            return Ok(false);
        };

        let response = self
            .bucket
            .delete_object(key)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        match response.status_code() {
            200..=299 => Ok(true),
            404 => Ok(false),
            status => Err(StorageError::Backend(format!(
                "delete of {key} failed with status {status}"
            ))),
        }
    }
}
