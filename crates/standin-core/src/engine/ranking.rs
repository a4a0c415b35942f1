//! Ordering of scored candidates.

use std::cmp::Ordering;

use super::{candidates::Candidate, scoring::ScoreCard};

/// Composite scores closer than this are treated as tied.
pub const SCORE_TOLERANCE: f64 = 0.001;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
  pub candidate: Candidate,
  pub card:      ScoreCard,
}

impl ScoredCandidate {
  fn by_score(&self, other: &Self) -> Ordering {
    self
      .card
      .disqualified
      .cmp(&other.card.disqualified)
      .then_with(|| other.card.effective_score().total_cmp(&self.card.effective_score()))
      .then_with(|| self.by_application(other))
  }

  fn by_application(&self, other: &Self) -> Ordering {
    self
      .candidate
      .application
      .applied_at
      .cmp(&other.candidate.application.applied_at)
      .then_with(|| self.candidate.user.user_id.cmp(&other.candidate.user.user_id))
  }
}

/// Order candidates best first.
///
/// Eligible candidates always precede disqualified ones. Within each
/// partition candidates are sorted by effective score, then grouped into
/// runs whose scores sit within [`SCORE_TOLERANCE`] of the run's leader, and
/// each run is reordered by earliest application. The user id breaks any
/// remaining tie so the order is total.
pub fn rank(mut scored: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
  scored.sort_by(ScoredCandidate::by_score);

  let mut start = 0;
  while start < scored.len() {
    let leader = &scored[start];
    let leader_score = leader.card.effective_score();
    let leader_disqualified = leader.card.disqualified;

    let mut end = start + 1;
    while end < scored.len()
      && scored[end].card.disqualified == leader_disqualified
      && leader_score - scored[end].card.effective_score() < SCORE_TOLERANCE
    {
      end += 1;
    }

    scored[start..end].sort_by(ScoredCandidate::by_application);
    start = end;
  }

  scored
}

/// The head of a ranked list, if it is eligible.
pub fn winner(ranked: &[ScoredCandidate]) -> Option<&ScoredCandidate> {
  ranked.first().filter(|top| top.card.eligible())
}

#[cfg(test)]
mod tests {
  use chrono::{DateTime, Duration, TimeZone, Utc};
  use uuid::Uuid;

  use super::*;
  use crate::{
    job::Application,
    user::{User, UserRole},
  };

  fn base() -> DateTime<Utc> { Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap() }

  fn scored(name: &str, composite: f64, disqualified: bool, applied_hours: i64) -> ScoredCandidate {
    let user = User {
      user_id:     Uuid::new_v4(),
      name:        name.into(),
      email:       format!("{name}@example.com"),
      role:        UserRole::Member,
      created_at:  base(),
      attributes:  Default::default(),
      assignments: vec![],
    };
    ScoredCandidate {
      candidate: Candidate {
        application:  Application {
          user_id:    user.user_id,
          applied_at: base() + Duration::hours(applied_hours),
        },
        user,
        is_applicant: true,
      },
      card:      ScoreCard {
        matched: 0,
        total: 0,
        matched_names: vec![],
        disqualified,
        constraint_score: 0.0,
        workload_score: 0.0,
        recency_balance_score: 0.0,
        application_recency_score: 0.0,
        composite_score: composite,
      },
    }
  }

  fn names(ranked: &[ScoredCandidate]) -> Vec<&str> {
    ranked.iter().map(|s| s.candidate.user.name.as_str()).collect()
  }

  #[test]
  fn disqualified_always_last() {
    let ranked = rank(vec![
      scored("high-but-out", 0.95, true, 0),
      scored("low", 0.2, false, 5),
    ]);
    assert_eq!(names(&ranked), ["low", "high-but-out"]);
    assert_eq!(winner(&ranked).map(|w| w.candidate.user.name.as_str()), Some("low"));
  }

  #[test]
  fn near_ties_fall_back_to_application_time() {
    let ranked = rank(vec![
      scored("later", 0.8005, false, 10),
      scored("earlier", 0.8, false, 1),
      scored("clear-winner", 0.9, false, 20),
    ]);
    assert_eq!(names(&ranked), ["clear-winner", "earlier", "later"]);
  }

  #[test]
  fn tolerance_is_anchored_on_run_leader() {
    // 0.8009 and 0.8001 are tied, 0.8001 and 0.7993 too, but 0.7993 is not
    // within tolerance of the leader so it starts a new run.
    let ranked = rank(vec![
      scored("c", 0.7993, false, 0),
      scored("b", 0.8001, false, 1),
      scored("a", 0.8009, false, 2),
    ]);
    assert_eq!(names(&ranked), ["b", "a", "c"]);
  }

  #[test]
  fn no_winner_when_everyone_is_disqualified() {
    let ranked = rank(vec![scored("x", 0.5, true, 0), scored("y", 0.6, true, 1)]);
    assert!(winner(&ranked).is_none());
    assert!(winner(&[]).is_none());
  }

  #[test]
  fn ranking_is_deterministic() {
    let input = vec![
      scored("a", 0.5, false, 3),
      scored("b", 0.5, false, 3),
      scored("c", 0.5004, false, 3),
      scored("d", 0.1, true, 0),
    ];
    let mut reversed = input.clone();
    reversed.reverse();
    assert_eq!(names(&rank(input)), names(&rank(reversed)));
  }
}
