//! Runner entry point.
//!
//! Scrapes the career-portal event listing once (or on a timer when
//! `RUN_INTERVAL_SECS` is set), posts a Slack message for every event not
//! seen in the previous run, and stores this run's events for next time.
//! Any failure in a single run exits non-zero.

use tracing::info;
use tracing_subscriber::EnvFilter;

use jobcannon_db::{BlobStore, DragonflyBlobStore, FsBlobStore, SnapshotStore};
use jobcannon_runner::config::{JobCannonConfig, SnapshotBackend};
use jobcannon_runner::{JobRunner, Notifier};

/// Application entry point.
///
/// Initializes logging, loads configuration from environment variables,
/// connects the snapshot backend and notifier, then runs the pipeline.
///
/// # Errors
///
/// Returns an error if initialization or the run fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("jobcannon-runner starting");

    // Load configuration from environment
    let config = JobCannonConfig::from_env()?;
    info!(
        login_url = config.portal.login_url,
        listing_url = config.portal.listing_url,
        snapshot_backend = ?config.snapshot.backend,
        snapshot_bucket = config.snapshot.bucket,
        snapshot_key = config.snapshot.key,
        run_interval_secs = config.run_interval.map(|d| d.as_secs()),
        "configuration loaded"
    );

    // Snapshot backend
    let blobs = match config.snapshot.backend {
        SnapshotBackend::Fs => {
            let store = FsBlobStore::new(&config.snapshot.dir);
            info!(root = %store.root().display(), "using filesystem snapshot store");
            BlobStore::Fs(store)
        }
        SnapshotBackend::Dragonfly => {
            let store = DragonflyBlobStore::connect(&config.snapshot.dragonfly_url).await?;
            BlobStore::Dragonfly(store)
        }
    };
    let snapshots = SnapshotStore::new(blobs, &config.snapshot.bucket, &config.snapshot.key);

    let notifier = Notifier::from_config(&config.notifier);
    info!(notifier = notifier.name(), "notifier configured");

    let runner = JobRunner::new(config.portal, snapshots, notifier)?;

    match config.run_interval {
        Some(period) => runner.run_every(period).await,
        None => {
            runner.run_once().await?;
        }
    }

    Ok(())
}
