use std::fmt::Display;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::{Stream, TryStreamExt};
use google_cloud_auth::credentials::CredentialsFile;
use google_cloud_storage::client::{Client, ClientConfig};
use google_cloud_storage::http::Error;
use google_cloud_storage::http::objects::download::Range;
use google_cloud_storage::http::objects::get::GetObjectRequest;
use google_cloud_storage::http::objects::list::ListObjectsRequest;

use super::{ObjectPage, StorageProvider};
use crate::error::StorageError;

const PROVIDER_NAME: &str = "Google Cloud Storage";
const NOT_FOUND: u16 = 404;

/// Connection settings for [`GcsProvider::connect`].
#[derive(Clone, Debug, Default)]
pub struct GcsSettings {
  /// Overrides `https://storage.googleapis.com`, e.g. for an emulator.
  pub endpoint: Option<String>,
  pub service_account_key_path: Option<String>,
  pub anonymous: bool,
}

pub struct GcsProvider {
  client: Client,
}

impl GcsProvider {
  pub async fn connect(settings: &GcsSettings) -> Result<Self, StorageError> {
    let mut config = ClientConfig::default();
    if let Some(endpoint) = &settings.endpoint {
      config.storage_endpoint = endpoint.trim_end_matches('/').to_string();
    }

    let config = if settings.anonymous {
      config.anonymous()
    } else if let Some(path) = &settings.service_account_key_path {
      let credentials = CredentialsFile::new_from_file(path.clone()).await.map_err(connection_error)?;
      config.with_credentials(credentials).await.map_err(connection_error)?
    } else {
      config.with_auth().await.map_err(connection_error)?
    };

    tracing::info!("Connected to Google Cloud Storage at endpoint: {}", config.storage_endpoint);
    Ok(Self::from_client(Client::new(config)))
  }

  pub fn from_client(client: Client) -> Self {
    GcsProvider { client }
  }
}

#[async_trait]
impl StorageProvider for GcsProvider {
  async fn list_objects(&self, bucket: &str, page_token: Option<String>) -> Result<ObjectPage, StorageError> {
    let request = ListObjectsRequest { bucket: bucket.to_string(), page_token, ..Default::default() };

    let response = self.client.list_objects(&request).await.map_err(|e| map_listing_error(bucket, e))?;
    let keys = response.items.unwrap_or_default().into_iter().map(|obj| obj.name).collect();

    Ok(ObjectPage { keys, next_page_token: response.next_page_token })
  }

  async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
    let request = GetObjectRequest { bucket: bucket.to_string(), object: key.to_string(), ..Default::default() };

    let stream = self
      .client
      .download_streamed_object(&request, &Range::default())
      .await
      .map_err(|e| StorageError::backend(PROVIDER_NAME, format!("failed to open `{key}`: {e}")))?;

    read_to_end(stream).await.map_err(|e| StorageError::backend(PROVIDER_NAME, format!("failed to read `{key}`: {e}")))
  }

  fn provider_name(&self) -> &'static str {
    PROVIDER_NAME
  }
}

/// Drains a download stream into one buffer.
///
/// The stream is owned by this call, so the underlying response is released on every exit path,
/// including when the caller drops the future mid-read.
async fn read_to_end<S, E>(stream: S) -> Result<Bytes, E>
where
  S: Stream<Item = Result<Bytes, E>>,
{
  let mut stream = std::pin::pin!(stream);
  let mut content = BytesMut::new();
  while let Some(chunk) = stream.try_next().await? {
    content.extend_from_slice(&chunk);
  }
  Ok(content.freeze())
}

/// A 404 on the listing call means the bucket is missing, whether or not the body was a JSON error.
fn map_listing_error(bucket: &str, err: Error) -> StorageError {
  match &err {
    Error::Response(response) if response.code == NOT_FOUND => {
      StorageError::bucket_not_found(PROVIDER_NAME, bucket, response.message.clone())
    }
    Error::HttpClient(e) | Error::RawResponse(e, _) if e.status().is_some_and(|s| s.as_u16() == NOT_FOUND) => {
      StorageError::bucket_not_found(PROVIDER_NAME, bucket, e.to_string())
    }
    _ => StorageError::backend(PROVIDER_NAME, err.to_string()),
  }
}

fn connection_error(err: impl Display) -> StorageError {
  StorageError::connection(PROVIDER_NAME, err.to_string())
}

#[cfg(test)]
mod tests {
  use std::pin::Pin;
  use std::sync::Arc;
  use std::sync::atomic::{AtomicBool, Ordering};
  use std::task::{Context, Poll};

  use futures_util::stream;
  use google_cloud_storage::http::error::ErrorResponse;

  use super::*;

  /// Wraps a stream and records when it is dropped.
  struct TrackedStream<S> {
    inner: S,
    released: Arc<AtomicBool>,
  }

  impl<S: Stream + Unpin> Stream for TrackedStream<S> {
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
      Pin::new(&mut self.inner).poll_next(cx)
    }
  }

  impl<S> Drop for TrackedStream<S> {
    fn drop(&mut self) {
      self.released.store(true, Ordering::SeqCst);
    }
  }

  fn tracked<S>(inner: S) -> (TrackedStream<S>, Arc<AtomicBool>) {
    let released = Arc::new(AtomicBool::new(false));
    (TrackedStream { inner, released: released.clone() }, released)
  }

  #[tokio::test]
  async fn reads_all_chunks_and_releases_stream() {
    let chunks = vec![Ok::<_, String>(Bytes::from_static(b"hel")), Ok(Bytes::from_static(b"lo"))];
    let (stream, released) = tracked(stream::iter(chunks));

    let content = read_to_end(stream).await;

    assert_eq!(content, Ok(Bytes::from_static(b"hello")));
    assert!(released.load(Ordering::SeqCst));
  }

  #[tokio::test]
  async fn read_error_mid_stream_still_releases_stream() {
    let chunks =
      vec![Ok(Bytes::from_static(b"partial")), Err("connection reset".to_string()), Ok(Bytes::from_static(b"never"))];
    let (stream, released) = tracked(stream::iter(chunks));

    let content = read_to_end(stream).await;

    assert_eq!(content, Err("connection reset".to_string()));
    assert!(released.load(Ordering::SeqCst));
  }

  #[tokio::test]
  async fn dropping_the_read_releases_stream() {
    let (stream, released) = tracked(stream::pending::<Result<Bytes, String>>());

    let read = tokio::time::timeout(std::time::Duration::from_millis(10), read_to_end(stream)).await;

    assert!(read.is_err());
    assert!(released.load(Ordering::SeqCst));
  }

  #[test]
  fn missing_bucket_on_listing_is_bucket_not_found() {
    let err = Error::Response(ErrorResponse {
      code: 404,
      errors: vec![],
      message: "The specified bucket does not exist.".to_string(),
    });

    let mapped = map_listing_error("missing-bucket", err);

    assert!(mapped.is_bucket_not_found());
    assert!(mapped.to_string().contains("missing-bucket"));
  }

  #[test]
  fn other_listing_failures_are_backend_errors() {
    let err = Error::Response(ErrorResponse { code: 403, errors: vec![], message: "Access denied.".to_string() });

    let mapped = map_listing_error("private-bucket", err);

    assert!(matches!(mapped, StorageError::Backend { message, .. } if message == "Access denied."));
  }
}
