use std::num::NonZeroUsize;
use std::time::Duration;

use clap::{Args, ValueEnum};
use derive_more::Display;

use crate::storage::RetrievalOptions;
use crate::storage::aws_s3::S3Settings;
use crate::storage::gcs::GcsSettings;

#[derive(Clone, Debug, Args)]
pub struct ListerConfig {
  /// Storage providers to read from, in order.
  #[clap(long, env = "STORAGE_PROVIDERS", value_delimiter = ',', default_values_t = [ProviderKind::Aws, ProviderKind::Gcs])]
  pub providers: Vec<ProviderKind>,
  /// Name of the S3 bucket to read
  #[clap(long, env = "S3_BUCKET_NAME", default_value = "")]
  pub s3_bucket_name: String,
  /// Name of the GCS bucket to read
  #[clap(long, env = "GCS_BUCKET_NAME", default_value = "")]
  pub gcs_bucket_name: String,
  /// AWS region (for AWS S3)
  #[clap(long, env = "AWS_REGION", default_value = "ap-south-1")]
  pub aws_region: String,
  /// Shared credentials profile (for AWS S3)
  #[clap(long, env = "AWS_PROFILE")]
  pub aws_profile: Option<String>,
  /// Endpoint of an S3-compatible store
  #[clap(long, env = "S3_ENDPOINT_URL")]
  pub s3_endpoint_url: Option<String>,
  /// Address buckets as `endpoint/bucket` instead of `bucket.endpoint`
  #[clap(long, env = "S3_FORCE_PATH_STYLE")]
  pub s3_force_path_style: bool,
  /// GCS endpoint override, e.g. an emulator
  #[clap(long, env = "GCS_ENDPOINT")]
  pub gcs_endpoint: Option<String>,
  /// GCS service account key path (optional)
  #[clap(long, env = "GCS_SERVICE_ACCOUNT_KEY_PATH")]
  pub gcs_service_account_key_path: Option<String>,
  /// Talk to GCS without credentials
  #[clap(long, env = "GCS_ANONYMOUS", conflicts_with = "gcs_service_account_key_path")]
  pub gcs_anonymous: bool,
  /// Maximum number of object downloads in flight per bucket
  #[clap(long, env = "MAX_CONCURRENT_FETCHES", default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..=64))]
  pub max_concurrent_fetches: u16,
  /// Cancel all outstanding work after this many seconds
  #[clap(long, env = "CONTENTS_DEADLINE_SECS")]
  pub deadline_secs: Option<u64>,
}

impl ListerConfig {
  pub fn bucket_name(&self, kind: ProviderKind) -> &str {
    match kind {
      ProviderKind::Aws => &self.s3_bucket_name,
      ProviderKind::Gcs => &self.gcs_bucket_name,
    }
  }

  pub fn s3_settings(&self) -> S3Settings {
    S3Settings {
      region: self.aws_region.clone(),
      profile: self.aws_profile.clone(),
      endpoint_url: self.s3_endpoint_url.clone(),
      force_path_style: self.s3_force_path_style,
    }
  }

  pub fn gcs_settings(&self) -> GcsSettings {
    GcsSettings {
      endpoint: self.gcs_endpoint.clone(),
      service_account_key_path: self.gcs_service_account_key_path.clone(),
      anonymous: self.gcs_anonymous,
    }
  }

  pub fn retrieval_options(&self) -> RetrievalOptions {
    let max_concurrent_fetches = NonZeroUsize::new(usize::from(self.max_concurrent_fetches)).unwrap_or(NonZeroUsize::MIN);
    RetrievalOptions { max_concurrent_fetches }
  }

  pub fn deadline(&self) -> Option<Duration> {
    self.deadline_secs.map(Duration::from_secs)
  }
}

#[derive(Clone, Copy, ValueEnum, Debug, Display, PartialEq, Eq)]
pub enum ProviderKind {
  #[display("aws")]
  Aws,
  #[display("gcs")]
  Gcs,
}
