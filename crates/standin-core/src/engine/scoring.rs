//! Per-candidate scoring.
//!
//! The composite score blends four axes with fixed weights:
//!
//! | Axis | Weight |
//! |------|--------|
//! | constraint fit | 0.40 |
//! | workload balance (lifetime hosted meetings) | 0.30 |
//! | recency balance (assignments inside the window) | 0.20 |
//! | application recency | 0.10 |
//!
//! With no workload-balance window the recency-balance axis is 0 and the
//! weights are not renormalised.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;

use super::candidates::Candidate;
use crate::{
  attribute::AttributeRegistry,
  constraint::Constraint,
  evaluate::evaluate,
  meeting::MeetingContext,
  user::User,
};

pub const CONSTRAINT_WEIGHT: f64 = 0.40;
pub const WORKLOAD_WEIGHT: f64 = 0.30;
pub const RECENCY_BALANCE_WEIGHT: f64 = 0.20;
pub const APPLICATION_RECENCY_WEIGHT: f64 = 0.10;

/// Hosted-meeting count at which the workload axis bottoms out.
pub const WORKLOAD_CAP: f64 = 50.0;
/// Floor for the recency-balance cap; otherwise one assignment per week.
pub const MIN_RECENCY_CAP: f64 = 10.0;

const FRESH_APPLICATION_DAYS: f64 = 7.0;
const STALE_APPLICATION_DAYS: f64 = 30.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Everything a candidate is scored against.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
  pub constraints:    &'a [Constraint],
  pub registry:       &'a AttributeRegistry,
  pub meeting:        &'a MeetingContext,
  /// Effective workload-balance window; `None` disables recency balance.
  pub window_days:    Option<u32>,
  pub job_created_at: DateTime<Utc>,
  pub now:            DateTime<Utc>,
}

/// Full score breakdown for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreCard {
  pub matched:                   usize,
  pub total:                     usize,
  pub matched_names:             Vec<String>,
  /// A required constraint failed.
  pub disqualified:              bool,
  pub constraint_score:          f64,
  pub workload_score:            f64,
  pub recency_balance_score:     f64,
  pub application_recency_score: f64,
  /// Raw blend; still populated for disqualified candidates.
  pub composite_score:           f64,
}

impl ScoreCard {
  pub fn eligible(&self) -> bool { !self.disqualified }

  /// The score ranking uses: zero for disqualified candidates.
  pub fn effective_score(&self) -> f64 {
    if self.disqualified { 0.0 } else { self.composite_score }
  }
}

/// Constraint-satisfaction result.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintFit {
  pub matched:       usize,
  pub total:         usize,
  pub matched_names: Vec<String>,
  pub disqualified:  bool,
}

impl ConstraintFit {
  /// `matched / total`, 1.0 with no constraints, 0.0 when disqualified.
  pub fn score(&self) -> f64 {
    if self.disqualified {
      0.0
    } else if self.total == 0 {
      1.0
    } else {
      self.matched as f64 / self.total as f64
    }
  }
}

/// Evaluate every constraint, even after a required one fails, so reports
/// show the complete picture.
pub fn constraint_fit(user: &User, ctx: &ScoringContext<'_>) -> ConstraintFit {
  let mut fit = ConstraintFit {
    matched:       0,
    total:         ctx.constraints.len(),
    matched_names: Vec::new(),
    disqualified:  false,
  };

  for constraint in ctx.constraints {
    let passed = match ctx.registry.type_for(constraint.field_source, &constraint.field_key, ctx.meeting) {
      Some(ty) => {
        let raw = ctx.registry.resolve(
          constraint.field_source,
          &constraint.field_key,
          user,
          ctx.meeting,
        );
        evaluate(constraint, raw.as_ref(), ty)
      }
      None => {
        debug!(
          constraint_id = %constraint.constraint_id,
          field_key = %constraint.field_key,
          "constraint references an unknown attribute"
        );
        false
      }
    };

    if passed {
      fit.matched += 1;
      fit.matched_names.push(constraint.name.clone());
    } else if constraint.required {
      fit.disqualified = true;
    }
  }

  fit
}

/// Fewer lifetime hosted meetings score higher, clipped at [`WORKLOAD_CAP`].
pub fn workload_score(hosted_meetings: usize) -> f64 {
  (WORKLOAD_CAP - hosted_meetings as f64).max(0.0) / WORKLOAD_CAP
}

/// Fewer assignments inside the last `window_days` score higher. Zero when no
/// window is configured.
pub fn recency_balance_score(user: &User, window_days: Option<u32>, now: DateTime<Utc>) -> f64 {
  let Some(days) = window_days.filter(|d| *d > 0) else {
    return 0.0;
  };
  // A window reaching past the representable range covers the whole history.
  let recent = match Duration::try_days(i64::from(days)).and_then(|w| now.checked_sub_signed(w)) {
    Some(since) => user.assignments_since(since),
    None => user.assignments.len(),
  } as f64;
  let cap = MIN_RECENCY_CAP.max(f64::from(days) / 7.0);
  (cap - recent).max(0.0) / cap
}

/// 1.0 within a week of the job opening, linear decay to 0 at day 30.
/// Applications dated before the job existed count as fresh.
pub fn application_recency_score(applied_at: DateTime<Utc>, job_created_at: DateTime<Utc>) -> f64 {
  let days = (applied_at - job_created_at).num_seconds() as f64 / SECONDS_PER_DAY;
  if days <= FRESH_APPLICATION_DAYS {
    1.0
  } else if days >= STALE_APPLICATION_DAYS {
    0.0
  } else {
    (STALE_APPLICATION_DAYS - days) / (STALE_APPLICATION_DAYS - FRESH_APPLICATION_DAYS)
  }
}

pub fn score(candidate: &Candidate, ctx: &ScoringContext<'_>) -> ScoreCard {
  let fit = constraint_fit(&candidate.user, ctx);
  let constraint_score = fit.score();
  let workload_score = workload_score(candidate.user.hosted_meeting_count());
  let recency_balance_score = recency_balance_score(&candidate.user, ctx.window_days, ctx.now);
  let application_recency_score =
    application_recency_score(candidate.application.applied_at, ctx.job_created_at);

  let composite_score = CONSTRAINT_WEIGHT * constraint_score
    + WORKLOAD_WEIGHT * workload_score
    + RECENCY_BALANCE_WEIGHT * recency_balance_score
    + APPLICATION_RECENCY_WEIGHT * application_recency_score;

  ScoreCard {
    matched: fit.matched,
    total: fit.total,
    matched_names: fit.matched_names,
    disqualified: fit.disqualified,
    constraint_score,
    workload_score,
    recency_balance_score,
    application_recency_score,
    composite_score,
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use serde_json::json;
  use uuid::Uuid;

  use super::*;
  use crate::{
    constraint::{FieldSource, Operator},
    job::Application,
    user::{AssignmentRecord, UserRole},
  };

  fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap() }

  fn user(role: UserRole) -> User {
    User {
      user_id:     Uuid::new_v4(),
      name:        "u".into(),
      email:       "u@example.com".into(),
      role,
      created_at:  now() - Duration::days(400),
      attributes:  Default::default(),
      assignments: vec![],
    }
  }

  fn with_assignments(mut u: User, days_ago: &[i64]) -> User {
    for d in days_ago {
      u.assignments.push(AssignmentRecord {
        job_id:        Uuid::new_v4(),
        meeting_title: "m".into(),
        assigned_at:   now() - Duration::days(*d),
      });
    }
    u
  }

  fn rule(name: &str, key: &str, operator: Operator, value: serde_json::Value, required: bool) -> Constraint {
    Constraint {
      constraint_id: Uuid::new_v4(),
      name: name.into(),
      description: None,
      field_source: FieldSource::User,
      field_key: key.into(),
      operator,
      value,
      required,
      active: true,
    }
  }

  fn candidate(u: User) -> Candidate {
    Candidate {
      application:  Application { user_id: u.user_id, applied_at: now() },
      user:         u,
      is_applicant: true,
    }
  }

  #[test]
  fn no_constraints_scores_full_fit() {
    let registry = AttributeRegistry::default();
    let meeting = MeetingContext::default();
    let ctx = ScoringContext {
      constraints: &[],
      registry: &registry,
      meeting: &meeting,
      window_days: None,
      job_created_at: now(),
      now: now(),
    };
    let card = score(&candidate(user(UserRole::Member)), &ctx);

    assert_eq!(card.constraint_score, 1.0);
    assert_eq!(card.recency_balance_score, 0.0);
    assert!((card.composite_score - 0.8).abs() < 1e-9);
  }

  #[test]
  fn required_failure_disqualifies_but_keeps_evaluating() {
    let registry = AttributeRegistry::default();
    let meeting = MeetingContext::default();
    let constraints = vec![
      rule("hosts only", "role", Operator::Equals, json!("host"), true),
      rule("new-ish", "hosted_meeting_count", Operator::LessThan, json!(5), false),
      rule("unknown", "shoe_size", Operator::Equals, json!(9), false),
    ];
    let ctx = ScoringContext {
      constraints: &constraints,
      registry: &registry,
      meeting: &meeting,
      window_days: None,
      job_created_at: now(),
      now: now(),
    };
    let card = score(&candidate(user(UserRole::Member)), &ctx);

    assert!(card.disqualified);
    assert_eq!(card.matched, 1);
    assert_eq!(card.total, 3);
    assert_eq!(card.matched_names, vec!["new-ish".to_owned()]);
    assert_eq!(card.constraint_score, 0.0);
    assert!(card.composite_score > 0.0);
    assert_eq!(card.effective_score(), 0.0);
  }

  #[test]
  fn optional_failures_reduce_fit_proportionally() {
    let registry = AttributeRegistry::default();
    let meeting = MeetingContext::default();
    let constraints = vec![
      rule("host", "role", Operator::Equals, json!("host"), false),
      rule("admin", "role", Operator::Equals, json!("admin"), false),
    ];
    let ctx = ScoringContext {
      constraints: &constraints,
      registry: &registry,
      meeting: &meeting,
      window_days: None,
      job_created_at: now(),
      now: now(),
    };
    let card = score(&candidate(user(UserRole::Host)), &ctx);
    assert!(!card.disqualified);
    assert_eq!(card.constraint_score, 0.5);
  }

  #[test]
  fn workload_is_clipped() {
    assert_eq!(workload_score(0), 1.0);
    assert_eq!(workload_score(25), 0.5);
    assert_eq!(workload_score(80), 0.0);
  }

  #[test]
  fn recency_balance_counts_window_only() {
    let u = with_assignments(user(UserRole::Member), &[1, 2, 3, 4, 5, 40]);
    assert_eq!(recency_balance_score(&u, None, now()), 0.0);
    assert_eq!(recency_balance_score(&u, Some(0), now()), 0.0);
    assert!((recency_balance_score(&u, Some(7), now()) - 0.5).abs() < 1e-9);

    // 140 days → cap of 20 assignments.
    assert!((recency_balance_score(&u, Some(140), now()) - 14.0 / 20.0).abs() < 1e-9);
    assert_eq!(recency_balance_score(&user(UserRole::Member), Some(7), now()), 1.0);
  }

  #[test]
  fn recency_balance_survives_out_of_range_window() {
    let u = with_assignments(user(UserRole::Member), &[1, 2, 3, 400]);
    for window in [90_000_000, 200_000_000, u32::MAX] {
      let cap = f64::from(window) / 7.0;
      let got = recency_balance_score(&u, Some(window), now());
      assert!((got - (cap - 4.0) / cap).abs() < 1e-12, "window {window}");
    }
  }

  #[test]
  fn application_recency_decays_linearly() {
    let created = now();
    assert_eq!(application_recency_score(created - Duration::days(2), created), 1.0);
    assert_eq!(application_recency_score(created + Duration::days(7), created), 1.0);
    let mid = application_recency_score(created + Duration::days(18) + Duration::hours(12), created);
    assert!((mid - 0.5).abs() < 1e-9);
    assert_eq!(application_recency_score(created + Duration::days(30), created), 0.0);
    assert_eq!(application_recency_score(created + Duration::days(90), created), 0.0);
  }
}
