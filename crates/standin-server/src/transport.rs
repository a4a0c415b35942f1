//! Notification and calendar transports wired by the server.
//!
//! A chat webhook receives `{"text": ..}` posts. Without one configured,
//! notices are written to the log instead. Calendar invites are always
//! logged; provider sync lives outside this service.

use std::time::Duration;

use reqwest::Client;
use serde_json::json;
use standin_core::notify::{CalendarGateway, CalendarInvite, Notice, Notifier, NotifyError};
use tracing::info;

// ─── Webhook ──────────────────────────────────────────────────────────────────

/// Posts notices to an incoming-webhook URL.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct WebhookNotifier {
  client: Client,
  url:    String,
}

impl WebhookNotifier {
  pub fn new(url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self { client, url: url.into() })
  }
}

impl Notifier for WebhookNotifier {
  async fn notify(&self, notice: Notice) -> Result<(), NotifyError> {
    let resp = self
      .client
      .post(&self.url)
      .json(&json!({ "text": notice.text() }))
      .send()
      .await
      .map_err(|e| NotifyError::Transport(e.to_string()))?;

    if !resp.status().is_success() {
      return Err(NotifyError::Rejected(resp.status().as_u16()));
    }
    Ok(())
  }
}

// ─── Log-only ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
  async fn notify(&self, notice: Notice) -> Result<(), NotifyError> {
    info!(job_id = %notice.job_id, kind = ?notice.kind, "{}", notice.text());
    Ok(())
  }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogCalendar;

impl CalendarGateway for LogCalendar {
  async fn send_invite(&self, invite: CalendarInvite) -> Result<(), NotifyError> {
    info!(
      job_id = %invite.job_id,
      event_id = %invite.event_id,
      attendee = %invite.attendee_email,
      "calendar invite for \"{}\"",
      invite.title
    );
    Ok(())
  }
}

// ─── Selection ────────────────────────────────────────────────────────────────

/// The notifier chosen at startup.
#[derive(Clone)]
pub enum ChatNotifier {
  Webhook(WebhookNotifier),
  Log(LogNotifier),
}

impl ChatNotifier {
  pub fn from_config(url: Option<&str>, timeout: Duration) -> reqwest::Result<Self> {
    match url.filter(|u| !u.trim().is_empty()) {
      Some(url) => Ok(Self::Webhook(WebhookNotifier::new(url, timeout)?)),
      None => Ok(Self::Log(LogNotifier)),
    }
  }
}

impl Notifier for ChatNotifier {
  async fn notify(&self, notice: Notice) -> Result<(), NotifyError> {
    match self {
      ChatNotifier::Webhook(n) => n.notify(notice).await,
      ChatNotifier::Log(n) => n.notify(notice).await,
    }
  }
}
