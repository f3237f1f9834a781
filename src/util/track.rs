use std::future::Future;
use std::time::{Duration, Instant};

/// Awaits `operation` and returns its output with the wall-clock time it took.
pub async fn track<F: Future>(operation: F) -> (F::Output, Duration) {
  let start = Instant::now();
  let output = operation.await;
  (output, start.elapsed())
}
