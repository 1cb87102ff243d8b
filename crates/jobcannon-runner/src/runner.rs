//! Run orchestration: the single forward pass from login to snapshot.
//!
//! One run performs, in order:
//! 1. Log in through the SSO handshake
//! 2. Load the previous snapshot
//! 3. Fetch and parse the authenticated event listing
//! 4. Announce every event not in the snapshot
//! 5. Close the portal session
//! 6. Overwrite the snapshot with this run's events
//!
//! There are no retries. Any error aborts the run before the steps after
//! it, so a failed notification leaves the old snapshot in place.
//!
//! [`JobRunner::run_every`] adds an outer timer that repeats full runs;
//! each run is still independent and stateless.

use std::time::Duration;

use tracing::{error, info, Instrument};
use uuid::Uuid;

use jobcannon_db::SnapshotStore;

use crate::config::PortalConfig;
use crate::error::RunnerError;
use crate::notify::{notify_new_events, Notifier};
use crate::parse::EventParser;
use crate::session;

/// Counts describing one completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Events on the listing after exclusion and de-duplication.
    pub scraped: usize,
    /// Events in the snapshot the run started from.
    pub previous: usize,
    /// Notifications sent.
    pub notified: usize,
}

/// Owns everything a run needs.
pub struct JobRunner {
    portal: PortalConfig,
    snapshots: SnapshotStore,
    notifier: Notifier,
    parser: EventParser,
}

impl JobRunner {
    /// Create a runner.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Parse`] if the listing selectors fail to compile.
    pub fn new(
        portal: PortalConfig,
        snapshots: SnapshotStore,
        notifier: Notifier,
    ) -> Result<Self, RunnerError> {
        Ok(Self {
            portal,
            snapshots,
            notifier,
            parser: EventParser::new()?,
        })
    }

    /// Execute one full scrape-diff-notify-save pass.
    ///
    /// # Errors
    ///
    /// Returns the first [`RunnerError`] raised by any step.
    pub async fn run_once(&self) -> Result<RunSummary, RunnerError> {
        let run_id = Uuid::new_v4();
        self.run_pipeline()
            .instrument(tracing::info_span!("run", %run_id))
            .await
    }

    async fn run_pipeline(&self) -> Result<RunSummary, RunnerError> {
        info!(
            listing_url = %self.portal.listing_url,
            notifier = self.notifier.name(),
            snapshot_bucket = self.snapshots.bucket(),
            snapshot_key = self.snapshots.key(),
            "run starting"
        );

        let session = session::login(
            &self.portal.login_url,
            &self.portal.identity,
            &self.portal.secret,
        )
        .await?;

        let previous = self.snapshots.load().await?;

        info!("start scraping events");
        let html = session.fetch_page(&self.portal.listing_url).await?;
        let current = self.parser.parse(&html);

        let sent = notify_new_events(&current, &previous, &self.notifier).await?;

        session.close();

        self.snapshots.save(&current).await?;

        let summary = RunSummary {
            scraped: current.len(),
            previous: previous.len(),
            notified: sent.len(),
        };
        info!(
            scraped = summary.scraped,
            previous = summary.previous,
            notified = summary.notified,
            "done scraping and messaging"
        );
        Ok(summary)
    }

    /// Run repeatedly, pausing `period` after each run, until Ctrl-C.
    ///
    /// A failed run is logged and does not stop the loop.
    pub async fn run_every(&self, period: Duration) {
        info!(period_secs = period.as_secs(), "scheduled mode");

        loop {
            match self.run_once().await {
                Ok(summary) => info!(notified = summary.notified, "scheduled run complete"),
                Err(e) => error!(error = %e, "scheduled run failed"),
            }

            tokio::select! {
                () = tokio::time::sleep(period) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown requested, stopping scheduler");
                    return;
                }
            }
        }
    }
}
