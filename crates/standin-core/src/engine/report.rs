//! The read-only report a dry run returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
  candidates::CandidateMode,
  ranking::{ScoredCandidate, winner},
  scoring::ScoreCard,
};
use crate::{
  constraint::{Constraint, FieldSource, Operator},
  job::Job,
  meeting::ResolvedMeeting,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintSummary {
  pub constraint_id: Uuid,
  pub name:          String,
  pub field_source:  FieldSource,
  pub field_key:     String,
  pub operator:      Operator,
  pub value:         serde_json::Value,
  pub required:      bool,
}

impl From<&Constraint> for ConstraintSummary {
  fn from(c: &Constraint) -> Self {
    Self {
      constraint_id: c.constraint_id,
      name:          c.name.clone(),
      field_source:  c.field_source,
      field_key:     c.field_key.clone(),
      operator:      c.operator,
      value:         c.value.clone(),
      required:      c.required,
    }
  }
}

/// Per-axis scores, reported even for disqualified candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
  pub constraint_score:          f64,
  pub workload_score:            f64,
  pub recency_balance_score:     f64,
  pub application_recency_score: f64,
  pub composite_score:           f64,
}

impl From<&ScoreCard> for ScoreBreakdown {
  fn from(card: &ScoreCard) -> Self {
    Self {
      constraint_score:          card.constraint_score,
      workload_score:            card.workload_score,
      recency_balance_score:     card.recency_balance_score,
      application_recency_score: card.application_recency_score,
      composite_score:           card.composite_score,
    }
  }
}

/// One ranked row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantReport {
  pub user_id:             Uuid,
  pub user_name:           String,
  pub is_applicant:        bool,
  pub eligible:            bool,
  pub matched:             usize,
  pub total:               usize,
  /// Effective score used for ranking.
  pub score:               f64,
  pub applied_at:          DateTime<Utc>,
  pub matched_constraints: Vec<String>,
  pub breakdown:           ScoreBreakdown,
}

impl From<&ScoredCandidate> for ApplicantReport {
  fn from(s: &ScoredCandidate) -> Self {
    Self {
      user_id:             s.candidate.user.user_id,
      user_name:           s.candidate.user.name.clone(),
      is_applicant:        s.candidate.is_applicant,
      eligible:            s.card.eligible(),
      matched:             s.card.matched,
      total:               s.card.total,
      score:               s.card.effective_score(),
      applied_at:          s.candidate.application.applied_at,
      matched_constraints: s.card.matched_names.clone(),
      breakdown:           ScoreBreakdown::from(&s.card),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DryRunReport {
  /// `None` when the job has no backing meeting record.
  pub meeting_id:       Option<Uuid>,
  pub job_id:           Uuid,
  pub meeting_title:    String,
  pub mode:             CandidateMode,
  pub constraint_count: usize,
  pub constraints:      Vec<ConstraintSummary>,
  /// Best first.
  pub applicants:       Vec<ApplicantReport>,
  pub message:          String,
}

impl DryRunReport {
  pub fn build(
    job:         &Job,
    meeting:     &ResolvedMeeting,
    constraints: &[Constraint],
    ranked:      &[ScoredCandidate],
    mode:        CandidateMode,
  ) -> Self {
    let message = match (winner(ranked), ranked.is_empty()) {
      (_, true) => match mode {
        CandidateMode::ApplicantsOnly => "No applicants to rank".to_owned(),
        CandidateMode::AllSubjects => "No users to rank".to_owned(),
      },
      (Some(top), false) => format!(
        "{} would be assigned ({} of {} candidates eligible)",
        top.candidate.user.name,
        ranked.iter().filter(|s| s.card.eligible()).count(),
        ranked.len()
      ),
      (None, false) => format!("None of the {} candidates is eligible", ranked.len()),
    };

    Self {
      meeting_id: meeting.meeting_id(),
      job_id: job.job_id,
      meeting_title: meeting.title().to_owned(),
      mode,
      constraint_count: constraints.len(),
      constraints: constraints.iter().map(ConstraintSummary::from).collect(),
      applicants: ranked.iter().map(ApplicantReport::from).collect(),
      message,
    }
  }

  /// The user a real run would assign, if any.
  pub fn winner(&self) -> Option<&ApplicantReport> {
    self.applicants.first().filter(|a| a.eligible)
  }
}
