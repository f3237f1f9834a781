#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bucket_contents::{ObjectPage, StorageError, StorageProvider};
use bytes::Bytes;

/// In-memory provider. Each bucket is a list of listing pages; page tokens are page indices.
#[derive(Default)]
pub struct MemoryProvider {
  name: &'static str,
  buckets: HashMap<String, Vec<Vec<(String, Bytes)>>>,
  failing_pages: HashSet<(String, usize)>,
  failing_objects: HashSet<String>,
  stalled_objects: HashSet<String>,
  delays: HashMap<String, Duration>,
  fetched: Mutex<Vec<String>>,
  list_calls: AtomicUsize,
  in_flight: AtomicUsize,
  max_in_flight: AtomicUsize,
}

impl MemoryProvider {
  pub fn new(name: &'static str) -> Self {
    MemoryProvider { name, ..Default::default() }
  }

  pub fn with_bucket(self, bucket: &str, objects: &[(&str, &str)]) -> Self {
    self.with_paged_bucket(bucket, &[objects])
  }

  pub fn with_paged_bucket(mut self, bucket: &str, pages: &[&[(&str, &str)]]) -> Self {
    let pages = pages
      .iter()
      .map(|page| {
        page.iter().map(|(key, content)| (key.to_string(), Bytes::copy_from_slice(content.as_bytes()))).collect()
      })
      .collect();
    self.buckets.insert(bucket.to_string(), pages);
    self
  }

  pub fn fail_listing_page(mut self, bucket: &str, page: usize) -> Self {
    self.failing_pages.insert((bucket.to_string(), page));
    self
  }

  pub fn fail_fetch(mut self, key: &str) -> Self {
    self.failing_objects.insert(key.to_string());
    self
  }

  /// Fetching `key` never completes.
  pub fn stall_fetch(mut self, key: &str) -> Self {
    self.stalled_objects.insert(key.to_string());
    self
  }

  pub fn delay_fetch(mut self, key: &str, delay: Duration) -> Self {
    self.delays.insert(key.to_string(), delay);
    self
  }

  /// Keys whose fetch was started, in order.
  pub fn fetched(&self) -> Vec<String> {
    self.fetched.lock().unwrap().clone()
  }

  pub fn list_calls(&self) -> usize {
    self.list_calls.load(Ordering::SeqCst)
  }

  pub fn max_in_flight(&self) -> usize {
    self.max_in_flight.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl StorageProvider for MemoryProvider {
  async fn list_objects(&self, bucket: &str, page_token: Option<String>) -> Result<ObjectPage, StorageError> {
    self.list_calls.fetch_add(1, Ordering::SeqCst);
    let pages = self
      .buckets
      .get(bucket)
      .ok_or_else(|| StorageError::bucket_not_found(self.name, bucket, "The specified bucket does not exist"))?;

    let index = page_token.map(|token| token.parse::<usize>().unwrap()).unwrap_or(0);
    if self.failing_pages.contains(&(bucket.to_string(), index)) {
      return Err(StorageError::backend(self.name, format!("listing page {index} failed")));
    }

    let keys = pages.get(index).map(|page| page.iter().map(|(key, _)| key.clone()).collect()).unwrap_or_default();
    let next_page_token = (index + 1 < pages.len()).then(|| (index + 1).to_string());
    Ok(ObjectPage { keys, next_page_token })
  }

  async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
    self.fetched.lock().unwrap().push(key.to_string());
    let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

    if let Some(delay) = self.delays.get(key) {
      tokio::time::sleep(*delay).await;
    }
    if self.stalled_objects.contains(key) {
      std::future::pending::<()>().await;
    }

    self.in_flight.fetch_sub(1, Ordering::SeqCst);
    if self.failing_objects.contains(key) {
      return Err(StorageError::backend(self.name, format!("failed to read `{key}`")));
    }

    self
      .buckets
      .get(bucket)
      .and_then(|pages| pages.iter().flatten().find(|(name, _)| name == key))
      .map(|(_, content)| content.clone())
      .ok_or_else(|| StorageError::backend(self.name, format!("no such key `{key}`")))
  }

  fn provider_name(&self) -> &'static str {
    self.name
  }
}
