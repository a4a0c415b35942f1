//! Outbound side effects: chat notifications and calendar invites.
//!
//! Both are best-effort. A failure is logged by the caller and never rolls
//! back the state change that triggered it.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoticeKind {
  JobPosted,
  JobCancelled,
  JobAssigned,
  NoApplicants,
}

/// Payload handed to a [`Notifier`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
  pub kind:          NoticeKind,
  pub job_id:        Uuid,
  pub meeting_title: String,
  pub starts_at:     DateTime<Utc>,
  pub ends_at:       DateTime<Utc>,
  /// Who caused the event (creator, canceller).
  pub actor_name:    Option<String>,
  /// Who got the job, for [`NoticeKind::JobAssigned`].
  pub assignee_name: Option<String>,
}

impl Notice {
  /// One-line human-readable rendering for chat transports.
  pub fn text(&self) -> String {
    let when = self.starts_at.format("%Y-%m-%d %H:%M UTC");
    let title = &self.meeting_title;
    match self.kind {
      NoticeKind::JobPosted => format!(
        "{} is looking for a substitute for \"{title}\" on {when}",
        self.actor_name.as_deref().unwrap_or("Someone")
      ),
      NoticeKind::JobCancelled => format!(
        "The substitute request for \"{title}\" on {when} was cancelled by {}",
        self.actor_name.as_deref().unwrap_or("its owner")
      ),
      NoticeKind::JobAssigned => format!(
        "{} will cover \"{title}\" on {when}",
        self.assignee_name.as_deref().unwrap_or("A substitute")
      ),
      NoticeKind::NoApplicants => {
        format!("Nobody has applied yet to cover \"{title}\" on {when}")
      }
    }
  }
}

#[derive(Debug, Error)]
pub enum NotifyError {
  #[error("transport error: {0}")]
  Transport(String),

  #[error("endpoint rejected the request with status {0}")]
  Rejected(u16),
}

/// Chat-style notification sink.
pub trait Notifier: Send + Sync {
  fn notify(&self, notice: Notice) -> impl Future<Output = Result<(), NotifyError>> + Send + '_;
}

/// Invitation sent to the winner of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarInvite {
  pub job_id:         Uuid,
  pub event_id:       String,
  pub title:          String,
  pub starts_at:      DateTime<Utc>,
  pub ends_at:        DateTime<Utc>,
  pub attendee_name:  String,
  pub attendee_email: String,
}

/// Calendar provider boundary.
pub trait CalendarGateway: Send + Sync {
  fn send_invite(
    &self,
    invite: CalendarInvite,
  ) -> impl Future<Output = Result<(), NotifyError>> + Send + '_;
}
