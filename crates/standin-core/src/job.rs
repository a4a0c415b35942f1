//! Jobs (open requests for a substitute) and their embedded applications.
//!
//! A job owns its applications outright. Once `assigned_to` is set the job is
//! inactive for good; the storage layer guards that transition so it can
//! only ever happen once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::meeting::MeetingSnapshot;

/// A user's bid for a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
  pub user_id:    Uuid,
  pub applied_at: DateTime<Utc>,
}

/// Lifecycle state, derived from the stored fields. Cancelled jobs are
/// deleted and so have no state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
  OpenUnapplied,
  OpenApplied,
  Assigned,
  ClosedExpired,
}

impl JobState {
  pub fn is_terminal(self) -> bool {
    matches!(self, JobState::Assigned | JobState::ClosedExpired)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
  pub job_id:                    Uuid,
  pub active:                    bool,
  pub meeting:                   MeetingSnapshot,
  pub created_by:                Uuid,
  pub created_at:                DateTime<Utc>,
  pub applications:              Vec<Application>,
  pub assigned_to:               Option<Uuid>,
  pub assigned_at:               Option<DateTime<Utc>>,
  /// Set together with creation; the posted notice goes out once.
  pub posted_notice_sent:        bool,
  /// Set the first time a sweep finds the job without applicants.
  pub no_applicants_notice_sent: bool,
}

impl Job {
  /// A fresh, unapplied job for `meeting`.
  pub fn open(meeting: MeetingSnapshot, created_by: Uuid, now: DateTime<Utc>) -> Self {
    Self {
      job_id: Uuid::new_v4(),
      active: true,
      meeting,
      created_by,
      created_at: now,
      applications: Vec::new(),
      assigned_to: None,
      assigned_at: None,
      posted_notice_sent: true,
      no_applicants_notice_sent: false,
    }
  }

  pub fn state(&self) -> JobState {
    match (self.active, self.assigned_to) {
      (_, Some(_)) => JobState::Assigned,
      (false, None) => JobState::ClosedExpired,
      (true, None) if self.applications.is_empty() => JobState::OpenUnapplied,
      (true, None) => JobState::OpenApplied,
    }
  }

  pub fn is_open(&self) -> bool { !self.state().is_terminal() }

  pub fn application_for(&self, user_id: Uuid) -> Option<&Application> {
    self.applications.iter().find(|a| a.user_id == user_id)
  }
}

/// Where a new job takes its meeting snapshot from.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobSource {
  /// A stored meeting record.
  Meeting { meeting_id: Uuid },
  /// A raw calendar event with no meeting record behind it.
  Event { snapshot: MeetingSnapshot },
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewJob {
  pub source:     JobSource,
  pub created_by: Uuid,
}

/// Result of an assignment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResult {
  pub success:     bool,
  pub job_id:      Uuid,
  pub assigned_to: Option<Uuid>,
  pub assigned_at: Option<DateTime<Utc>>,
}

impl AssignmentResult {
  pub fn assigned(job_id: Uuid, user_id: Uuid, at: DateTime<Utc>) -> Self {
    Self { success: true, job_id, assigned_to: Some(user_id), assigned_at: Some(at) }
  }

  pub fn unassigned(job_id: Uuid) -> Self {
    Self { success: false, job_id, assigned_to: None, assigned_at: None }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn job() -> Job {
    let start = Utc.with_ymd_and_hms(2026, 5, 4, 10, 0, 0).unwrap();
    Job::open(
      MeetingSnapshot {
        title:              "Planning".into(),
        event_id:           "evt".into(),
        recurring_event_id: None,
        legacy_event_id:    None,
        starts_at:          start,
        ends_at:            start + chrono::Duration::hours(1),
      },
      Uuid::new_v4(),
      start - chrono::Duration::days(3),
    )
  }

  #[test]
  fn state_follows_fields() {
    let mut j = job();
    assert_eq!(j.state(), JobState::OpenUnapplied);
    assert!(j.posted_notice_sent);

    j.applications.push(Application { user_id: Uuid::new_v4(), applied_at: j.created_at });
    assert_eq!(j.state(), JobState::OpenApplied);

    let mut closed = j.clone();
    closed.active = false;
    assert_eq!(closed.state(), JobState::ClosedExpired);
    assert!(!closed.is_open());

    j.active = false;
    j.assigned_to = Some(Uuid::new_v4());
    assert_eq!(j.state(), JobState::Assigned);
  }
}
