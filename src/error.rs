use thiserror::Error;

/// Failure modes of a storage provider.
///
/// `Connection` is raised while constructing a provider and is fatal to the run.
/// Everything else comes out of a `contents` call and is recoverable by the caller.
#[derive(Debug, Error)]
pub enum StorageError {
  #[error("{provider}: could not establish connection: {message}")]
  Connection { provider: &'static str, message: String },

  #[error("{provider}: bucket `{bucket}` not found: {message}")]
  BucketNotFound { provider: &'static str, bucket: String, message: String },

  #[error("{provider}: {message}")]
  Backend { provider: &'static str, message: String },

  #[error("operation cancelled")]
  Cancelled,
}

impl StorageError {
  pub fn connection(provider: &'static str, message: impl Into<String>) -> Self {
    StorageError::Connection { provider, message: message.into() }
  }

  pub fn bucket_not_found(provider: &'static str, bucket: &str, message: impl Into<String>) -> Self {
    StorageError::BucketNotFound { provider, bucket: bucket.to_string(), message: message.into() }
  }

  pub fn backend(provider: &'static str, message: impl Into<String>) -> Self {
    StorageError::Backend { provider, message: message.into() }
  }

  pub fn is_cancelled(&self) -> bool {
    matches!(self, StorageError::Cancelled)
  }

  pub fn is_bucket_not_found(&self) -> bool {
    matches!(self, StorageError::BucketNotFound { .. })
  }
}
