//! Candidate construction.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
  job::{Application, Job},
  user::User,
};

/// Which users a ranking considers.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CandidateMode {
  /// Only users holding an application on the job.
  #[default]
  #[serde(alias = "applicants")]
  ApplicantsOnly,
  /// Every user; non-applicants get a synthetic application.
  #[serde(alias = "all")]
  AllSubjects,
}

/// A user paired with the application they are ranked by.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
  pub user:         User,
  pub application:  Application,
  pub is_applicant: bool,
}

/// Build the scoreable candidates for `job` out of `users`.
///
/// In [`CandidateMode::AllSubjects`] users without an application get one
/// stamped with the job's creation time. Nothing is written anywhere.
pub fn build_candidates(job: &Job, users: &[User], mode: CandidateMode) -> Vec<Candidate> {
  match mode {
    CandidateMode::ApplicantsOnly => job
      .applications
      .iter()
      .filter_map(|application| {
        let user = users.iter().find(|u| u.user_id == application.user_id);
        if user.is_none() {
          debug!(job_id = %job.job_id, user_id = %application.user_id, "applicant has no user record");
        }
        user.map(|user| Candidate {
          user:         user.clone(),
          application:  application.clone(),
          is_applicant: true,
        })
      })
      .collect(),
    CandidateMode::AllSubjects => users
      .iter()
      .map(|user| match job.application_for(user.user_id) {
        Some(application) => Candidate {
          user:         user.clone(),
          application:  application.clone(),
          is_applicant: true,
        },
        None => Candidate {
          user:         user.clone(),
          application:  Application { user_id: user.user_id, applied_at: job.created_at },
          is_applicant: false,
        },
      })
      .collect(),
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone, Utc};
  use uuid::Uuid;

  use super::*;
  use crate::{meeting::MeetingSnapshot, user::UserRole};

  fn user(name: &str) -> User {
    User {
      user_id:     Uuid::new_v4(),
      name:        name.into(),
      email:       format!("{name}@example.com"),
      role:        UserRole::Member,
      created_at:  Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
      attributes:  Default::default(),
      assignments: vec![],
    }
  }

  fn job_with(applicants: &[&User]) -> Job {
    let created = Utc.with_ymd_and_hms(2026, 4, 1, 8, 0, 0).unwrap();
    let mut job = Job::open(
      MeetingSnapshot {
        title:              "Sync".into(),
        event_id:           "e".into(),
        recurring_event_id: None,
        legacy_event_id:    None,
        starts_at:          created + Duration::days(5),
        ends_at:            created + Duration::days(5) + Duration::hours(1),
      },
      Uuid::new_v4(),
      created,
    );
    for (i, u) in applicants.iter().enumerate() {
      job.applications.push(Application {
        user_id:    u.user_id,
        applied_at: created + Duration::hours(i as i64 + 1),
      });
    }
    job
  }

  #[test]
  fn applicants_only_uses_real_applications() {
    let (a, b, c) = (user("a"), user("b"), user("c"));
    let job = job_with(&[&b, &a]);
    let candidates = build_candidates(&job, &[a.clone(), b.clone(), c], CandidateMode::ApplicantsOnly);

    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].user.user_id, b.user_id);
    assert!(candidates.iter().all(|c| c.is_applicant));
    assert_eq!(candidates[1].application, job.applications[1]);
  }

  #[test]
  fn applicants_without_user_record_are_skipped() {
    let (a, ghost) = (user("a"), user("ghost"));
    let job = job_with(&[&a, &ghost]);
    let candidates = build_candidates(&job, &[a], CandidateMode::ApplicantsOnly);
    assert_eq!(candidates.len(), 1);
  }

  #[test]
  fn all_subjects_synthesises_applications() {
    let (a, b) = (user("a"), user("b"));
    let job = job_with(&[&b]);
    let candidates = build_candidates(&job, &[a.clone(), b.clone()], CandidateMode::AllSubjects);

    assert_eq!(candidates.len(), 2);
    assert!(!candidates[0].is_applicant);
    assert_eq!(candidates[0].application.applied_at, job.created_at);
    assert!(candidates[1].is_applicant);
    assert_eq!(candidates[1].application.applied_at, job.applications[0].applied_at);
    assert!(job.application_for(a.user_id).is_none());
  }

  #[test]
  fn mode_accepts_short_aliases() {
    let mode: CandidateMode = serde_json::from_str("\"all\"").unwrap();
    assert_eq!(mode, CandidateMode::AllSubjects);
  }
}
