//! The matching engine.
//!
//! Both the sweep and the dry run go through [`rank_job`], so a preview
//! always ranks exactly the way a real run would.

pub mod candidates;
pub mod ranking;
pub mod report;
pub mod resolver;
pub mod scoring;

use chrono::{DateTime, Utc};

use self::{
  candidates::{CandidateMode, build_candidates},
  ranking::{ScoredCandidate, rank},
  scoring::{ScoringContext, score},
};
use crate::{
  attribute::AttributeRegistry,
  constraint::Constraint,
  job::Job,
  meeting::ResolvedMeeting,
  user::User,
};

/// Everything needed to rank one job, already loaded.
#[derive(Debug, Clone, Copy)]
pub struct MatchInput<'a> {
  pub job:                 &'a Job,
  pub meeting:             &'a ResolvedMeeting,
  pub constraints:         &'a [Constraint],
  pub registry:            &'a AttributeRegistry,
  pub users:               &'a [User],
  /// Applies when the meeting does not set its own window.
  pub default_window_days: Option<u32>,
  pub now:                 DateTime<Utc>,
}

impl MatchInput<'_> {
  /// The meeting's own window wins over the system default.
  pub fn window_days(&self) -> Option<u32> {
    self
      .meeting
      .workload_balance_window_days()
      .or(self.default_window_days)
      .filter(|days| *days > 0)
  }
}

/// Build, score and rank the candidates of a job. Pure.
pub fn rank_job(input: &MatchInput<'_>, mode: CandidateMode) -> Vec<ScoredCandidate> {
  let meeting = input.meeting.context();
  let ctx = ScoringContext {
    constraints:    input.constraints,
    registry:       input.registry,
    meeting:        &meeting,
    window_days:    input.window_days(),
    job_created_at: input.job.created_at,
    now:            input.now,
  };

  let scored = build_candidates(input.job, input.users, mode)
    .into_iter()
    .map(|candidate| {
      let card = score(&candidate, &ctx);
      ScoredCandidate { candidate, card }
    })
    .collect();

  rank(scored)
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};
  use serde_json::json;
  use uuid::Uuid;

  use super::*;
  use crate::{
    constraint::{FieldSource, Operator},
    job::Application,
    meeting::{Meeting, MeetingSnapshot},
    user::{AssignmentRecord, UserRole},
  };

  fn created() -> DateTime<Utc> { Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap() }

  fn meeting(window: Option<u32>) -> Meeting {
    Meeting {
      meeting_id:                   Uuid::new_v4(),
      title:                        "Standup".into(),
      event_id:                     "evt-standup".into(),
      recurring_event_id:           None,
      legacy_event_id:              None,
      starts_at:                    created() + Duration::days(20),
      ends_at:                      created() + Duration::days(20) + Duration::minutes(30),
      constraint_group_ids:         vec![],
      workload_balance_window_days: window,
      fields:                       Default::default(),
    }
  }

  fn user(name: &str, role: UserRole, hosted_days_ago: &[i64]) -> User {
    User {
      user_id:     Uuid::new_v4(),
      name:        name.into(),
      email:       format!("{name}@example.com"),
      role,
      created_at:  created() - Duration::days(365),
      attributes:  Default::default(),
      assignments: hosted_days_ago
        .iter()
        .map(|d| AssignmentRecord {
          job_id:        Uuid::new_v4(),
          meeting_title: "older".into(),
          assigned_at:   created() - Duration::days(*d),
        })
        .collect(),
    }
  }

  fn job_for(m: &Meeting, applicants: &[(&User, i64)]) -> Job {
    let mut job = Job::open(m.snapshot(), Uuid::new_v4(), created());
    for (u, day) in applicants {
      job.applications.push(Application {
        user_id:    u.user_id,
        applied_at: created() + Duration::days(*day),
      });
    }
    job
  }

  fn names(ranked: &[ScoredCandidate]) -> Vec<&str> {
    ranked.iter().map(|s| s.candidate.user.name.as_str()).collect()
  }

  #[test]
  fn required_constraint_beats_raw_score() {
    let m = meeting(Some(7));
    // Y is idle and applied first, so its raw composite is higher.
    let history: Vec<i64> = (1..=50).collect();
    let x = user("x", UserRole::Host, &history);
    let y = user("y", UserRole::Member, &[]);
    let job = job_for(&m, &[(&y, 0), (&x, 12)]);
    let constraints = vec![Constraint {
      constraint_id: Uuid::new_v4(),
      name:          "role = host".into(),
      description:   None,
      field_source:  FieldSource::User,
      field_key:     "role".into(),
      operator:      Operator::Equals,
      value:         json!("host"),
      required:      true,
      active:        true,
    }];
    let resolved = ResolvedMeeting::Real(m);
    let registry = AttributeRegistry::default();
    let users = [x.clone(), y.clone()];
    let input = MatchInput {
      job:                 &job,
      meeting:             &resolved,
      constraints:         &constraints,
      registry:            &registry,
      users:               &users,
      default_window_days: None,
      now:                 created(),
    };

    let ranked = rank_job(&input, CandidateMode::ApplicantsOnly);
    assert_eq!(names(&ranked), ["x", "y"]);
    assert!(ranked[1].card.composite_score > ranked[0].card.composite_score);
    assert_eq!(ranking::winner(&ranked).map(|w| w.candidate.user.user_id), Some(x.user_id));
  }

  #[test]
  fn no_constraints_earlier_application_wins() {
    let m = meeting(None);
    let a = user("day0", UserRole::Member, &[]);
    let b = user("day10", UserRole::Member, &[]);
    let job = job_for(&m, &[(&b, 10), (&a, 0)]);
    let resolved = ResolvedMeeting::Real(m);
    let registry = AttributeRegistry::default();
    let users = [a, b];
    let input = MatchInput {
      job:                 &job,
      meeting:             &resolved,
      constraints:         &[],
      registry:            &registry,
      users:               &users,
      default_window_days: None,
      now:                 created() + Duration::days(11),
    };

    let ranked = rank_job(&input, CandidateMode::ApplicantsOnly);
    assert_eq!(names(&ranked), ["day0", "day10"]);
    assert!(ranked.iter().all(|s| s.card.constraint_score == 1.0));
  }

  #[test]
  fn window_favours_recently_idle_users() {
    let m = meeting(Some(7));
    let idle = user("idle", UserRole::Member, &[60, 61, 62, 63, 64]);
    let busy = user("busy", UserRole::Member, &[1, 2, 3, 4, 5]);
    let job = job_for(&m, &[(&busy, 0), (&idle, 0)]);
    let resolved = ResolvedMeeting::Real(m);
    let registry = AttributeRegistry::default();
    let users = [busy, idle];
    let input = MatchInput {
      job:                 &job,
      meeting:             &resolved,
      constraints:         &[],
      registry:            &registry,
      users:               &users,
      default_window_days: None,
      now:                 created(),
    };

    let ranked = rank_job(&input, CandidateMode::ApplicantsOnly);
    assert_eq!(names(&ranked), ["idle", "busy"]);
  }

  #[test]
  fn default_window_applies_only_without_meeting_window() {
    let job = job_for(&meeting(None), &[]);
    let registry = AttributeRegistry::default();
    let synthetic = ResolvedMeeting::Synthetic(job.meeting.clone());
    let own = ResolvedMeeting::Real(meeting(Some(14)));
    let zero = ResolvedMeeting::Real(meeting(Some(0)));

    let window = |meeting: &ResolvedMeeting| {
      MatchInput {
        job: &job,
        meeting,
        constraints: &[],
        registry: &registry,
        users: &[],
        default_window_days: Some(30),
        now: created(),
      }
      .window_days()
    };
    assert_eq!(window(&synthetic), Some(30));
    assert_eq!(window(&own), Some(14));
    assert_eq!(window(&zero), None);
  }

  #[test]
  fn synthetic_meeting_makes_everyone_eligible() {
    let job = job_for(&meeting(None), &[]);
    let resolved = ResolvedMeeting::Synthetic(MeetingSnapshot { title: "Orphan".into(), ..job.meeting.clone() });
    let registry = AttributeRegistry::default();
    let users = [user("a", UserRole::Member, &[]), user("b", UserRole::Admin, &[3])];
    let input = MatchInput {
      job:                 &job,
      meeting:             &resolved,
      constraints:         &[],
      registry:            &registry,
      users:               &users,
      default_window_days: None,
      now:                 created(),
    };

    let ranked = rank_job(&input, CandidateMode::AllSubjects);
    assert_eq!(ranked.len(), 2);
    assert!(ranked.iter().all(|s| s.card.eligible() && !s.candidate.is_applicant));
  }
}
