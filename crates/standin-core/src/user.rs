//! Users: the subjects that apply for jobs and get assigned to them.
//!
//! A user record carries its administrator-defined attribute values and a
//! denormalised assignment history. System attributes (see
//! [`crate::attribute::SystemAttribute`]) are computed from this record on
//! read and never stored.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Coarse permission level of a user.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
  Admin,
  Host,
  #[default]
  Member,
}

impl UserRole {
  pub const ALL: [UserRole; 3] = [UserRole::Admin, UserRole::Host, UserRole::Member];

  pub fn as_str(self) -> &'static str {
    match self {
      UserRole::Admin => "admin",
      UserRole::Host => "host",
      UserRole::Member => "member",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
  }
}

/// One entry in a user's assignment history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRecord {
  pub job_id:        Uuid,
  pub meeting_title: String,
  pub assigned_at:   DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub user_id:     Uuid,
  pub name:        String,
  pub email:       String,
  #[serde(default)]
  pub role:        UserRole,
  #[serde(default = "Utc::now")]
  pub created_at:  DateTime<Utc>,
  /// Custom attribute values keyed by attribute key.
  #[serde(default)]
  pub attributes:  BTreeMap<String, Value>,
  /// Oldest first.
  #[serde(default)]
  pub assignments: Vec<AssignmentRecord>,
}

impl User {
  pub fn is_admin(&self) -> bool { self.role == UserRole::Admin }

  pub fn hosted_meeting_count(&self) -> usize { self.assignments.len() }

  pub fn last_assigned_at(&self) -> Option<DateTime<Utc>> {
    self.assignments.iter().map(|a| a.assigned_at).max()
  }

  /// Number of assignments at or after `since`.
  pub fn assignments_since(&self, since: DateTime<Utc>) -> usize {
    self
      .assignments
      .iter()
      .filter(|a| a.assigned_at >= since)
      .count()
  }
}
