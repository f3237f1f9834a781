use std::collections::HashSet;
use std::future::Future;

use futures_util::{future, stream, Stream, TryStreamExt};
use tokio_util::sync::CancellationToken;

use super::{FileContent, RetrievalOptions, StorageProvider};
use crate::error::StorageError;

enum Cursor {
  Start,
  Next(String),
  Done,
}

pub(super) async fn contents<P>(
  provider: &P,
  cancel: &CancellationToken,
  bucket: &str,
  options: &RetrievalOptions,
) -> Result<Vec<FileContent>, StorageError>
where
  P: StorageProvider + ?Sized,
{
  let files: Vec<FileContent> = list_keys(provider, cancel, bucket)
    .map_ok(|key| fetch(provider, cancel, bucket, key))
    .try_buffered(options.max_concurrent_fetches.get())
    .try_collect()
    .await?;

  tracing::debug!(provider = provider.provider_name(), bucket, objects = files.len(), "bucket contents retrieved");
  Ok(files)
}

/// Lazily walks every listing page, yielding each distinct key once in listing order.
fn list_keys<'a, P>(
  provider: &'a P,
  cancel: &'a CancellationToken,
  bucket: &'a str,
) -> impl Stream<Item = Result<String, StorageError>> + Send + 'a
where
  P: StorageProvider + ?Sized,
{
  let pages = stream::try_unfold(Cursor::Start, move |cursor| async move {
    let page_token = match cursor {
      Cursor::Start => None,
      Cursor::Next(token) => Some(token),
      Cursor::Done => return Ok(None),
    };

    let page = cancellable(cancel, provider.list_objects(bucket, page_token)).await?;
    tracing::debug!(
      provider = provider.provider_name(),
      bucket,
      keys = page.keys.len(),
      more = page.next_page_token.is_some(),
      "listed page"
    );

    let next = match page.next_page_token {
      Some(token) if !token.is_empty() => Cursor::Next(token),
      _ => Cursor::Done,
    };
    Ok::<_, StorageError>(Some((page.keys, next)))
  });

  let mut seen = HashSet::new();
  pages
    .map_ok(|keys| stream::iter(keys.into_iter().map(Ok::<_, StorageError>)))
    .try_flatten()
    .try_filter(move |key| future::ready(seen.insert(key.clone())))
}

async fn fetch<P>(provider: &P, cancel: &CancellationToken, bucket: &str, key: String) -> Result<FileContent, StorageError>
where
  P: StorageProvider + ?Sized,
{
  let content = cancellable(cancel, provider.get_object(bucket, &key)).await?;
  tracing::debug!(provider = provider.provider_name(), key = %key, bytes = content.len(), "fetched object");
  Ok(FileContent::new(key, content))
}

/// Races `operation` against `cancel`. A token that has already fired wins without polling `operation`.
async fn cancellable<T, F>(cancel: &CancellationToken, operation: F) -> Result<T, StorageError>
where
  F: Future<Output = Result<T, StorageError>>,
{
  tokio::select! {
    biased;
    _ = cancel.cancelled() => Err(StorageError::Cancelled),
    result = operation => result,
  }
}
