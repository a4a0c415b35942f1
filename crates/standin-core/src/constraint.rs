//! Constraints and constraint groups: the administrator-authored eligibility
//! rules attached to meetings.
//!
//! Both are independently owned entities referenced by id. Deleting a
//! constraint does not remove it from the groups that reference it; the
//! resolver silently drops ids that no longer load.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Where the subject value of a constraint comes from.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FieldSource {
  #[default]
  User,
  Meeting,
}

impl FieldSource {
  pub fn as_str(self) -> &'static str {
    match self {
      FieldSource::User => "user",
      FieldSource::Meeting => "meeting",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "user" => Some(FieldSource::User),
      "meeting" => Some(FieldSource::Meeting),
      _ => None,
    }
  }
}

/// Comparison operator of a constraint.
///
/// Operators read back from storage that this build does not know decode to
/// [`Operator::Unknown`], which always evaluates to `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
  Equals,
  NotEquals,
  GreaterThan,
  GreaterThanOrEqual,
  LessThan,
  LessThanOrEqual,
  Contains,
  NotContains,
  In,
  NotIn,
  Between,
  #[serde(other)]
  Unknown,
}

impl Operator {
  pub fn as_str(self) -> &'static str {
    match self {
      Operator::Equals => "equals",
      Operator::NotEquals => "not_equals",
      Operator::GreaterThan => "greater_than",
      Operator::GreaterThanOrEqual => "greater_than_or_equal",
      Operator::LessThan => "less_than",
      Operator::LessThanOrEqual => "less_than_or_equal",
      Operator::Contains => "contains",
      Operator::NotContains => "not_contains",
      Operator::In => "in",
      Operator::NotIn => "not_in",
      Operator::Between => "between",
      Operator::Unknown => "unknown",
    }
  }

  /// Lenient decode used for stored rows: unrecognised names map to
  /// [`Operator::Unknown`] rather than failing the read.
  pub fn parse(s: &str) -> Self {
    serde_json::from_value(Value::String(s.to_owned())).unwrap_or(Operator::Unknown)
  }

  /// `true` for the negated forms (`not_equals`, `not_contains`, `not_in`).
  pub fn is_negated(self) -> bool {
    matches!(self, Operator::NotEquals | Operator::NotContains | Operator::NotIn)
  }
}

/// A single eligibility rule over one attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
  pub constraint_id: Uuid,
  pub name:          String,
  pub description:   Option<String>,
  #[serde(default)]
  pub field_source:  FieldSource,
  pub field_key:     String,
  pub operator:      Operator,
  /// Scalar, list, or two-element range depending on `operator`.
  pub value:         Value,
  #[serde(default)]
  pub required:      bool,
  #[serde(default = "default_true")]
  pub active:        bool,
}

/// A named, reusable bundle of constraints attached to meetings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintGroup {
  pub group_id:       Uuid,
  pub name:           String,
  #[serde(default)]
  pub constraint_ids: Vec<Uuid>,
}

/// A constraint as authored, before validation and value normalisation.
#[derive(Debug, Clone, Deserialize)]
pub struct ConstraintDraft {
  pub name:         String,
  pub description:  Option<String>,
  #[serde(default)]
  pub field_source: FieldSource,
  pub field_key:    String,
  pub operator:     Operator,
  pub value:        Value,
  #[serde(default)]
  pub required:     bool,
  #[serde(default = "default_true")]
  pub active:       bool,
}

fn default_true() -> bool { true }
