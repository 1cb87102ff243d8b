//! New-event notifications.
//!
//! [`notify_new_events`] diffs the fresh scrape against the previous
//! snapshot and sends one message per unseen record, in scrape order.
//! Delivery goes through a [`Notifier`], using enum dispatch like the blob
//! store since async methods are not dyn-compatible.
//!
//! A failed delivery stops the batch and propagates: later events are not
//! sent and the caller does not save the snapshot, so the next run retries
//! everything not yet announced.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use jobcannon_types::EventSet;

use crate::config::{NotifierConfig, SlackConfig};
use crate::error::RunnerError;

/// A chat notification backend.
pub enum Notifier {
    /// Slack Web API `chat.postMessage`.
    Slack(SlackNotifier),
    /// Log the message and send nothing.
    DryRun,
}

impl Notifier {
    /// Build the notifier described by `config`.
    pub fn from_config(config: &NotifierConfig) -> Self {
        match config {
            NotifierConfig::Slack(slack) => Self::Slack(SlackNotifier::new(slack)),
            NotifierConfig::DryRun => Self::DryRun,
        }
    }

    /// Deliver `text` to the configured channel.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Notify`] if delivery fails.
    pub async fn post_message(&self, text: &str) -> Result<(), RunnerError> {
        match self {
            Self::Slack(slack) => slack.post_message(text).await,
            Self::DryRun => {
                info!(text, "dry run: not sending notification");
                Ok(())
            }
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Slack(_) => "slack",
            Self::DryRun => "dry-run",
        }
    }
}

/// Send one notification per record of `current` missing from `previous`.
///
/// Returns the messages delivered, in the order they were sent.
///
/// # Errors
///
/// Returns the first delivery error; nothing after it is sent.
pub async fn notify_new_events(
    current: &EventSet,
    previous: &EventSet,
    notifier: &Notifier,
) -> Result<Vec<String>, RunnerError> {
    let mut sent = Vec::new();

    for record in current.new_since(previous) {
        let text = record.notification_text();
        debug!(event = %record, notifier = notifier.name(), "announcing new event");
        notifier.post_message(&text).await?;
        sent.push(text);
    }

    info!(
        current = current.len(),
        previous = previous.len(),
        notified = sent.len(),
        "notified new events"
    );
    Ok(sent)
}

// ---------------------------------------------------------------------------
// Slack backend
// ---------------------------------------------------------------------------

/// Posts messages through Slack's `chat.postMessage`.
///
/// Sends to `{api_url}/chat.postMessage` with a bearer bot token. Slack
/// answers HTTP 200 even on failure, so the body's `ok` flag is checked too.
pub struct SlackNotifier {
    client: reqwest::Client,
    api_url: String,
    bot_token: String,
    channel: String,
    username: String,
    icon_emoji: String,
}

/// Request body for `chat.postMessage`.
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    channel: &'a str,
    text: &'a str,
    username: &'a str,
    icon_emoji: &'a str,
}

/// The part of a Slack Web API reply we inspect.
#[derive(Debug, Deserialize)]
struct SlackReply {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl SlackNotifier {
    /// Create a Slack notifier from its configuration.
    pub fn new(config: &SlackConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_owned(),
            bot_token: config.bot_token.clone(),
            channel: config.channel.clone(),
            username: config.bot_name.clone(),
            icon_emoji: config.icon_emoji.clone(),
        }
    }

    /// Post `text` to the configured channel as the configured bot.
    async fn post_message(&self, text: &str) -> Result<(), RunnerError> {
        let url = format!("{}/chat.postMessage", self.api_url);
        let body = ChatMessage {
            channel: &self.channel,
            text,
            username: &self.username,
            icon_emoji: &self.icon_emoji,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.bot_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| RunnerError::Notify(format!("Slack request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(RunnerError::Notify(format!(
                "Slack returned {status}: {error_body}"
            )));
        }

        let reply: SlackReply = response
            .json()
            .await
            .map_err(|e| RunnerError::Notify(format!("Slack response parse failed: {e}")))?;
        check_reply(&reply)?;

        info!(channel = %self.channel, "sent message to Slack");
        Ok(())
    }
}

fn check_reply(reply: &SlackReply) -> Result<(), RunnerError> {
    if reply.ok {
        return Ok(());
    }
    Err(RunnerError::Notify(format!(
        "Slack rejected message: {}",
        reply.error.as_deref().unwrap_or("unknown error")
    )))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use jobcannon_types::EventRecord;

    use super::*;

    fn set(records: &[(&str, &str, &str)]) -> EventSet {
        records
            .iter()
            .map(|(t, e, d)| EventRecord::new(Some(*t), Some(*e), Some(*d)))
            .collect()
    }

    #[tokio::test]
    async fn only_unseen_events_are_announced() {
        let previous = set(&[("A", "Talk", "Mon")]);
        let current = set(&[("A", "Talk", "Mon"), ("B", "Fair", "Tue")]);

        let sent = notify_new_events(&current, &previous, &Notifier::DryRun).await;

        assert_eq!(
            sent.ok(),
            Some(vec!["*New Event*\nB | Fair | Tue".to_owned()])
        );
    }

    #[tokio::test]
    async fn rerun_without_changes_sends_nothing() {
        let previous = set(&[("B", "Fair", "Tue"), ("A", "Talk", "Mon")]);
        let current = set(&[("A", "Talk", "Mon"), ("B", "Fair", "Tue")]);

        let sent = notify_new_events(&current, &previous, &Notifier::DryRun).await;

        assert_eq!(sent.map(|s| s.len()).ok(), Some(0));
    }

    #[tokio::test]
    async fn empty_baseline_announces_everything_in_order() {
        let current = set(&[("B", "Fair", "Tue"), ("A", "Talk", "Mon")]);

        let sent = notify_new_events(&current, &EventSet::new(), &Notifier::DryRun)
            .await
            .unwrap_or_default();

        assert_eq!(
            sent,
            vec![
                "*New Event*\nB | Fair | Tue".to_owned(),
                "*New Event*\nA | Talk | Mon".to_owned(),
            ]
        );
    }

    #[test]
    fn chat_message_body_shape() {
        let body = ChatMessage {
            channel: "#events",
            text: "*New Event*\nB | Fair | Tue",
            username: "JobCannon",
            icon_emoji: ":cannon:",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap_or_default(),
            serde_json::json!({
                "channel": "#events",
                "text": "*New Event*\nB | Fair | Tue",
                "username": "JobCannon",
                "icon_emoji": ":cannon:"
            })
        );
    }

    #[test]
    fn slack_reply_not_ok_is_notify_error() {
        let reply: SlackReply =
            serde_json::from_str(r#"{"ok": false, "error": "channel_not_found"}"#).unwrap();
        let result = check_reply(&reply);
        assert!(
            matches!(result, Err(RunnerError::Notify(msg)) if msg.contains("channel_not_found"))
        );
    }

    #[test]
    fn slack_reply_ok_passes() {
        let reply = SlackReply {
            ok: true,
            error: None,
        };
        assert!(check_reply(&reply).is_ok());
    }

    #[test]
    fn notifier_names() {
        assert_eq!(Notifier::DryRun.name(), "dry-run");
        assert_eq!(Notifier::from_config(&NotifierConfig::DryRun).name(), "dry-run");
    }
}
