use anyhow::{Context, Result};
use bucket_contents::{ListerConfig, Orchestrator, storage::create_backends, util::shutdown_signal};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bucket-contents", version, about = "Reads every object of an S3 and a GCS bucket into memory")]
struct Cli {
  #[clap(flatten)]
  config: ListerConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
  dotenv::dotenv().ok();
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let Cli { config } = Cli::parse();

  let backends = create_backends(&config).await.context("failed to initialize storage providers")?;

  let cancel = CancellationToken::new();
  tokio::spawn({
    let cancel = cancel.clone();
    async move {
      shutdown_signal().await;
      cancel.cancel();
    }
  });
  if let Some(deadline) = config.deadline() {
    let cancel = cancel.clone();
    tokio::spawn(async move {
      tokio::time::sleep(deadline).await;
      tracing::warn!("Deadline of {:?} reached, cancelling outstanding work", deadline);
      cancel.cancel();
    });
  }

  Orchestrator::new(backends, config.retrieval_options(), cancel).run().await;
  Ok(())
}
