use std::fmt;
use std::sync::Arc;

use super::{AwsS3Provider, GcsProvider, StorageProvider};
use crate::config::{ListerConfig, ProviderKind};
use crate::error::StorageError;

/// A connected provider paired with the bucket it should read.
#[derive(Clone)]
pub struct Backend {
  pub kind: ProviderKind,
  pub bucket: String,
  pub provider: Arc<dyn StorageProvider>,
}

impl fmt::Debug for Backend {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Backend")
      .field("kind", &self.kind)
      .field("bucket", &self.bucket)
      .field("provider", &self.provider.provider_name())
      .finish()
  }
}

pub async fn create_storage_provider(
  kind: ProviderKind,
  config: &ListerConfig,
) -> Result<Arc<dyn StorageProvider>, StorageError> {
  match kind {
    ProviderKind::Aws => {
      tracing::info!("Initializing AWS S3 storage provider with region: {}", config.aws_region);
      Ok(Arc::new(AwsS3Provider::connect(&config.s3_settings()).await?))
    }
    ProviderKind::Gcs => {
      tracing::info!("Initializing GCS storage provider");
      Ok(Arc::new(GcsProvider::connect(&config.gcs_settings()).await?))
    }
  }
}

/// Connects every configured provider in order. The first construction failure aborts.
pub async fn create_backends(config: &ListerConfig) -> Result<Vec<Backend>, StorageError> {
  let mut backends = Vec::with_capacity(config.providers.len());
  for &kind in &config.providers {
    let provider = create_storage_provider(kind, config).await?;
    backends.push(Backend { kind, bucket: config.bucket_name(kind).to_string(), provider });
  }
  Ok(backends)
}
