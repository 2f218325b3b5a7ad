use std::path::PathBuf;

use serde::Deserialize;

/// Which blob storage implementation backs uploaded attachments.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Filesystem,
    S3,
}

/// Connection settings for an S3-compatible object store.
#[derive(Debug, Deserialize, Clone)]
pub struct S3Config {
    pub bucket: String,
    /// Region name. For custom endpoints (MinIO, R2) any label works.
    #[serde(default = "default_s3_region")]
    pub region: String,
    /// Custom endpoint URL. When absent the AWS endpoint for `region` is used.
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// Use path-style bucket addressing (required by most self-hosted stores).
    #[serde(default)]
    pub path_style: bool,
}

/// App-level blob storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageAppConfig {
    /// Storage backend. Default: filesystem.
    #[serde(default)]
    pub backend: StorageBackend,
    /// Root directory for the filesystem backend. Default: "./data/uploads".
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,
    /// Prefix prepended to object keys to form public URLs. Default: "/uploads".
    ///
    /// A relative prefix (starting with `/`) is served by the server itself when
    /// the filesystem backend is active.
    #[serde(default = "default_public_url")]
    pub public_url: String,
    /// Largest accepted upload in bytes. Default: 100 MiB.
    #[serde(default = "default_max_blob_size")]
    pub max_blob_size: u64,
    #[serde(default)]
    pub s3: Option<S3Config>,
}

fn default_s3_region() -> String {
    "us-east-1".into()
}
fn default_base_path() -> PathBuf {
    PathBuf::from("./data/uploads")
}
fn default_public_url() -> String {
    "/uploads".into()
}
fn default_max_blob_size() -> u64 {
    100 * 1024 * 1024
}

impl Default for StorageAppConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            base_path: default_base_path(),
            public_url: default_public_url(),
            max_blob_size: default_max_blob_size(),
            s3: None,
        }
    }
}
