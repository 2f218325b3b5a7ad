/// Errors raised by a blob store backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The upload is larger than the configured per-blob limit.
    #[error("blob exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },
    /// The remote object store rejected or failed the request.
    #[error("object store error: {0}")]
    Backend(String),
}
