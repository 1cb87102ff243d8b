//! Configuration types for the runner.
//!
//! All configuration is loaded from environment variables once, in `main`,
//! and handed to the pipeline as plain values. The core never reads the
//! environment itself.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use jobcannon_db::DEFAULT_SNAPSHOT_KEY;

use crate::error::RunnerError;

/// Career-portal login page; redirects into the university SSO.
pub const DEFAULT_LOGIN_URL: &str = "https://mba-mccombs-utexas-csm.symplicity.com/students/index.php?s=event&ss=is&_ksl=1&mode=list";

/// Event listing page, sized to show up to 250 rows.
pub const DEFAULT_LISTING_URL: &str = "https://mba-mccombs-utexas-csm.symplicity.com/students/index.php?_so_list_aate8fda65cf087d7272eb3273475b8ad24=250";

/// Slack Web API base URL.
pub const DEFAULT_SLACK_API_URL: &str = "https://slack.com/api";

/// Complete runner configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct JobCannonConfig {
    /// Where and as whom to log in and scrape.
    pub portal: PortalConfig,
    /// Where new-event messages go.
    pub notifier: NotifierConfig,
    /// Where the previous run's events are kept.
    pub snapshot: SnapshotConfig,
    /// When set, run repeatedly with this pause between runs.
    pub run_interval: Option<Duration>,
}

/// Career-portal endpoints and SSO credentials.
#[derive(Clone)]
pub struct PortalConfig {
    /// Login page that starts the SSO handshake.
    pub login_url: String,
    /// Authenticated event listing page.
    pub listing_url: String,
    /// SSO identity (EID).
    pub identity: String,
    /// SSO password.
    pub secret: String,
}

impl fmt::Debug for PortalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalConfig")
            .field("login_url", &self.login_url)
            .field("listing_url", &self.listing_url)
            .field("identity", &self.identity)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// How notifications are delivered.
#[derive(Debug, Clone)]
pub enum NotifierConfig {
    /// Post to a Slack channel.
    Slack(SlackConfig),
    /// Log messages instead of sending them.
    DryRun,
}

/// Slack bot settings.
#[derive(Clone)]
pub struct SlackConfig {
    /// Web API base URL (e.g. `https://slack.com/api`).
    pub api_url: String,
    /// Bot token (`xoxb-...`).
    pub bot_token: String,
    /// Channel name or ID to post into.
    pub channel: String,
    /// Display name the bot posts under.
    pub bot_name: String,
    /// Emoji used as the bot's avatar (e.g. `:cannon:`).
    pub icon_emoji: String,
}

impl fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackConfig")
            .field("api_url", &self.api_url)
            .field("bot_token", &"<redacted>")
            .field("channel", &self.channel)
            .field("bot_name", &self.bot_name)
            .field("icon_emoji", &self.icon_emoji)
            .finish()
    }
}

/// Snapshot location.
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    /// Which blob backend to use.
    pub backend: SnapshotBackend,
    /// Bucket holding the snapshot object.
    pub bucket: String,
    /// Snapshot object key.
    pub key: String,
    /// Root directory for the filesystem backend.
    pub dir: PathBuf,
    /// Connection URL for the `Dragonfly` backend.
    pub dragonfly_url: String,
}

/// Supported blob backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotBackend {
    /// Local directory tree.
    Fs,
    /// `Dragonfly`/Redis server.
    Dragonfly,
}

impl JobCannonConfig {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `PORTAL_EID` -- SSO identity
    /// - `PORTAL_PASSWORD` -- SSO password
    /// - `SNAPSHOT_BUCKET` -- bucket holding the snapshot
    /// - `SLACK_BOT_TOKEN`, `SLACK_CHANNEL` -- unless `DRY_RUN` is `true`
    ///
    /// Optional variables:
    /// - `LOGIN_URL` -- SSO entry page (default: the portal login page)
    /// - `LISTING_URL` -- event listing page (default: the portal listing)
    /// - `BOT_NAME` -- Slack display name (default `JobCannon`)
    /// - `BOT_ICON_EMOJI` -- Slack avatar emoji (default `:cannon:`)
    /// - `SLACK_API_URL` -- Slack Web API base (default `https://slack.com/api`)
    /// - `SNAPSHOT_KEY` -- snapshot object key (default `previous_results.json`)
    /// - `SNAPSHOT_BACKEND` -- `fs` or `dragonfly` (default `fs`)
    /// - `SNAPSHOT_DIR` -- filesystem backend root (default `.snapshots`)
    /// - `DRAGONFLY_URL` -- `Dragonfly` URL (default `redis://localhost:6379`)
    /// - `DRY_RUN` -- log messages instead of posting (default `false`)
    /// - `RUN_INTERVAL_SECS` -- run repeatedly with this pause (default: run once)
    pub fn from_env() -> Result<Self, RunnerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RunnerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let portal = PortalConfig {
            login_url: vars.or("LOGIN_URL", DEFAULT_LOGIN_URL),
            listing_url: vars.or("LISTING_URL", DEFAULT_LISTING_URL),
            identity: vars.required("PORTAL_EID")?,
            secret: vars.required("PORTAL_PASSWORD")?,
        };

        let dry_run: bool = vars
            .or("DRY_RUN", "false")
            .parse()
            .map_err(|e| RunnerError::Config(format!("invalid DRY_RUN: {e}")))?;

        let notifier = if dry_run {
            NotifierConfig::DryRun
        } else {
            NotifierConfig::Slack(SlackConfig {
                api_url: vars.or("SLACK_API_URL", DEFAULT_SLACK_API_URL),
                bot_token: vars.required("SLACK_BOT_TOKEN")?,
                channel: vars.required("SLACK_CHANNEL")?,
                bot_name: vars.or("BOT_NAME", "JobCannon"),
                icon_emoji: vars.or("BOT_ICON_EMOJI", ":cannon:"),
            })
        };

        let backend = match vars.or("SNAPSHOT_BACKEND", "fs").to_lowercase().as_str() {
            "fs" | "file" => SnapshotBackend::Fs,
            "dragonfly" | "redis" => SnapshotBackend::Dragonfly,
            other => {
                return Err(RunnerError::Config(format!(
                    "unknown snapshot backend: {other}"
                )))
            }
        };

        let snapshot = SnapshotConfig {
            backend,
            bucket: vars.required("SNAPSHOT_BUCKET")?,
            key: vars.or("SNAPSHOT_KEY", DEFAULT_SNAPSHOT_KEY),
            dir: PathBuf::from(vars.or("SNAPSHOT_DIR", ".snapshots")),
            dragonfly_url: vars.or("DRAGONFLY_URL", "redis://localhost:6379"),
        };

        let run_interval = vars
            .optional("RUN_INTERVAL_SECS")
            .map(|raw| {
                raw.parse::<u64>()
                    .map_err(|e| RunnerError::Config(format!("invalid RUN_INTERVAL_SECS: {e}")))
            })
            .transpose()?
            .map(|secs| {
                if secs == 0 {
                    Err(RunnerError::Config(
                        "RUN_INTERVAL_SECS must be greater than zero".to_owned(),
                    ))
                } else {
                    Ok(Duration::from_secs(secs))
                }
            })
            .transpose()?;

        Ok(Self {
            portal,
            notifier,
            snapshot,
            run_interval,
        })
    }
}

/// Variable lookup with the required/defaulted helpers used above.
struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, name: &str) -> Option<String> {
        (self.0)(name).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, name: &str) -> Result<String, RunnerError> {
        self.optional(name)
            .ok_or_else(|| RunnerError::Config(format!("missing required env var {name}")))
    }

    fn or(&self, name: &str, default: &str) -> String {
        self.optional(name).unwrap_or_else(|| default.to_owned())
    }
}
