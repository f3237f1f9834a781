use std::error::Error;
use std::fmt::Debug;

use async_trait::async_trait;
use aws_sdk_s3::{
  Client,
  config::{Builder, ProvideCredentials, Region},
  error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
};
use bytes::Bytes;

use super::{ObjectPage, StorageProvider};
use crate::error::StorageError;

const PROVIDER_NAME: &str = "AWS S3";
const NO_SUCH_BUCKET: &str = "NoSuchBucket";

/// Connection settings for [`AwsS3Provider::connect`].
#[derive(Clone, Debug, Default)]
pub struct S3Settings {
  pub region: String,
  pub profile: Option<String>,
  pub endpoint_url: Option<String>,
  pub force_path_style: bool,
}

pub struct AwsS3Provider {
  client: Client,
}

impl AwsS3Provider {
  /// Loads the shared AWS configuration and resolves credentials once up front,
  /// so a missing or broken credential chain fails here instead of on the first request.
  pub async fn connect(settings: &S3Settings) -> Result<Self, StorageError> {
    let mut loader =
      aws_config::defaults(aws_config::BehaviorVersion::latest()).region(Region::new(settings.region.clone()));
    if let Some(profile) = &settings.profile {
      loader = loader.profile_name(profile);
    }
    let sdk_config = loader.load().await;

    let credentials = sdk_config
      .credentials_provider()
      .ok_or_else(|| StorageError::connection(PROVIDER_NAME, "no credentials provider configured"))?;
    credentials
      .provide_credentials()
      .await
      .map_err(|e| StorageError::connection(PROVIDER_NAME, DisplayErrorContext(&e).to_string()))?;

    let mut builder = Builder::from(&sdk_config).force_path_style(settings.force_path_style);
    if let Some(endpoint_url) = &settings.endpoint_url {
      builder = builder.endpoint_url(endpoint_url);
    }

    tracing::info!("Connected to AWS S3 in region: {}", settings.region);
    Ok(Self::from_conf(builder.build()))
  }

  pub fn from_conf(config: aws_sdk_s3::Config) -> Self {
    AwsS3Provider { client: Client::from_conf(config) }
  }
}

#[async_trait]
impl StorageProvider for AwsS3Provider {
  async fn list_objects(&self, bucket: &str, page_token: Option<String>) -> Result<ObjectPage, StorageError> {
    let response = self
      .client
      .list_objects_v2()
      .bucket(bucket)
      .set_continuation_token(page_token)
      .send()
      .await
      .map_err(|e| map_sdk_error(bucket, e))?;

    let next_page_token =
      if response.is_truncated().unwrap_or(false) { response.next_continuation_token().map(str::to_string) } else { None };
    let keys = response.contents.unwrap_or_default().into_iter().filter_map(|obj| obj.key).collect();

    Ok(ObjectPage { keys, next_page_token })
  }

  async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
    let response =
      self.client.get_object().bucket(bucket).key(key).send().await.map_err(|e| map_sdk_error(bucket, e))?;

    let bytes = response
      .body
      .collect()
      .await
      .map_err(|e| StorageError::backend(PROVIDER_NAME, format!("failed to read `{key}`: {}", DisplayErrorContext(&e))))?
      .into_bytes();
    Ok(bytes)
  }

  fn provider_name(&self) -> &'static str {
    PROVIDER_NAME
  }
}

fn map_sdk_error<E, R>(bucket: &str, err: SdkError<E, R>) -> StorageError
where
  E: ProvideErrorMetadata + Error + 'static,
  R: Debug,
{
  let code = err.as_service_error().and_then(|e| e.code());
  let message = DisplayErrorContext(&err).to_string();
  if code == Some(NO_SUCH_BUCKET) {
    StorageError::bucket_not_found(PROVIDER_NAME, bucket, message)
  } else {
    StorageError::backend(PROVIDER_NAME, message)
  }
}
