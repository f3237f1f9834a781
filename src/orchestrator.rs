use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::ProviderKind;
use crate::error::StorageError;
use crate::storage::{Backend, FileContent, RetrievalOptions};
use crate::util::track;

/// Outcome of reading one backend's bucket.
#[derive(Debug)]
pub struct BackendReport {
  pub kind: ProviderKind,
  pub provider: &'static str,
  pub bucket: String,
  pub elapsed: Duration,
  pub outcome: Result<Vec<FileContent>, StorageError>,
}

impl BackendReport {
  pub fn object_names(&self) -> Vec<&str> {
    self.outcome.as_ref().map(|files| files.iter().map(FileContent::name).collect()).unwrap_or_default()
  }
}

/// Reads each backend's bucket in turn. A failing backend is logged and does not stop the others.
pub struct Orchestrator {
  backends: Vec<Backend>,
  options: RetrievalOptions,
  cancel: CancellationToken,
}

impl Orchestrator {
  pub fn new(backends: Vec<Backend>, options: RetrievalOptions, cancel: CancellationToken) -> Self {
    Orchestrator { backends, options, cancel }
  }

  pub async fn run(&self) -> Vec<BackendReport> {
    let mut reports = Vec::with_capacity(self.backends.len());
    for backend in &self.backends {
      reports.push(self.run_backend(backend).await);
    }
    reports
  }

  async fn run_backend(&self, backend: &Backend) -> BackendReport {
    let (outcome, elapsed) = track(backend.provider.contents(&self.cancel, &backend.bucket, &self.options)).await;

    tracing::info!("{}: elapsed time {:?}", backend.kind, elapsed);
    match &outcome {
      Ok(files) => {
        for file in files {
          tracing::info!("{}: {}", backend.kind, file.name());
        }
        let bytes: usize = files.iter().map(|file| file.content().len()).sum();
        tracing::debug!(provider = %backend.kind, bucket = %backend.bucket, objects = files.len(), bytes, "bucket read");
      }
      Err(err) => tracing::error!("{}: {}", backend.kind, err),
    }

    BackendReport {
      kind: backend.kind,
      provider: backend.provider.provider_name(),
      bucket: backend.bucket.clone(),
      elapsed,
      outcome,
    }
  }
}
