use std::num::NonZeroUsize;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::error::StorageError;

pub mod aws_s3;
pub mod factory;
pub mod gcs;
mod retrieve;

/// An object's key together with its full content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileContent {
  name: String,
  content: Bytes,
}

impl FileContent {
  pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
    FileContent { name: name.into(), content: content.into() }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn content(&self) -> &Bytes {
    &self.content
  }

  pub fn into_parts(self) -> (String, Bytes) {
    (self.name, self.content)
  }
}

/// One page of a bucket listing.
///
/// `next_page_token` is `None` once the listing is exhausted.
#[derive(Clone, Debug, Default)]
pub struct ObjectPage {
  pub keys: Vec<String>,
  pub next_page_token: Option<String>,
}

#[derive(Clone, Copy, Debug)]
pub struct RetrievalOptions {
  /// Upper bound on object downloads in flight during one `contents` call.
  pub max_concurrent_fetches: NonZeroUsize,
}

impl Default for RetrievalOptions {
  fn default() -> Self {
    RetrievalOptions { max_concurrent_fetches: NonZeroUsize::MIN }
  }
}

#[async_trait::async_trait]
pub trait StorageProvider: Send + Sync {
  /// Lists one page of object keys, continuing from `page_token` when given.
  async fn list_objects(&self, bucket: &str, page_token: Option<String>) -> Result<ObjectPage, StorageError>;

  async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError>;

  fn provider_name(&self) -> &'static str;

  /// Reads every object in `bucket` into memory, in listing order.
  ///
  /// The first listing or download error aborts the call and no partial result is returned.
  /// Firing `cancel` aborts the in-flight request with [`StorageError::Cancelled`].
  async fn contents(
    &self,
    cancel: &CancellationToken,
    bucket: &str,
    options: &RetrievalOptions,
  ) -> Result<Vec<FileContent>, StorageError> {
    retrieve::contents(self, cancel, bucket, options).await
  }
}

pub use aws_s3::AwsS3Provider;
pub use factory::{create_backends, create_storage_provider, Backend};
pub use gcs::GcsProvider;
