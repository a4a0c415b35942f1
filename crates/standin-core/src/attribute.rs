//! Attribute definitions and the registry that merges built-in (system)
//! attributes with administrator-defined (custom) ones.
//!
//! System attributes are computed from the user record on every read. Custom
//! attributes are stored as key/value pairs on the user. The registry is a
//! plain value rebuilt from the current definitions whenever the engine needs
//! one, so edits to definitions are visible on the next evaluation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
  constraint::FieldSource,
  meeting::MeetingContext,
  user::{User, UserRole},
};

// ─── Types ───────────────────────────────────────────────────────────────────

/// The value type of an attribute; drives coercion during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
  Text,
  Number,
  Boolean,
  Date,
  /// Stored and compared in seconds.
  Duration,
  Enumeration,
}

impl AttributeType {
  pub fn as_str(self) -> &'static str {
    match self {
      AttributeType::Text => "text",
      AttributeType::Number => "number",
      AttributeType::Boolean => "boolean",
      AttributeType::Date => "date",
      AttributeType::Duration => "duration",
      AttributeType::Enumeration => "enumeration",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    serde_json::from_value(Value::String(s.to_owned())).ok()
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AttributeSource {
  System,
  #[default]
  Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDefinition {
  pub key:           String,
  pub label:         String,
  #[serde(rename = "type")]
  pub attr_type:     AttributeType,
  /// Allowed values; only meaningful for [`AttributeType::Enumeration`].
  #[serde(default)]
  pub options:       Vec<String>,
  #[serde(default)]
  pub user_editable: bool,
  #[serde(default)]
  pub source:        AttributeSource,
  #[serde(default = "default_true")]
  pub active:        bool,
}

fn default_true() -> bool { true }

// ─── System attributes ───────────────────────────────────────────────────────

/// Built-in attributes computed from a [`User`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemAttribute {
  Name,
  Email,
  Role,
  HostedMeetingCount,
  LastAssignedAt,
  MemberSince,
}

impl SystemAttribute {
  pub const ALL: [SystemAttribute; 6] = [
    SystemAttribute::Name,
    SystemAttribute::Email,
    SystemAttribute::Role,
    SystemAttribute::HostedMeetingCount,
    SystemAttribute::LastAssignedAt,
    SystemAttribute::MemberSince,
  ];

  pub fn key(self) -> &'static str {
    match self {
      SystemAttribute::Name => "name",
      SystemAttribute::Email => "email",
      SystemAttribute::Role => "role",
      SystemAttribute::HostedMeetingCount => "hosted_meeting_count",
      SystemAttribute::LastAssignedAt => "last_assigned_at",
      SystemAttribute::MemberSince => "member_since",
    }
  }

  pub fn from_key(key: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|a| a.key() == key)
  }

  pub fn definition(self) -> AttributeDefinition {
    let (label, attr_type) = match self {
      SystemAttribute::Name => ("Name", AttributeType::Text),
      SystemAttribute::Email => ("Email", AttributeType::Text),
      SystemAttribute::Role => ("Role", AttributeType::Enumeration),
      SystemAttribute::HostedMeetingCount => ("Hosted meetings", AttributeType::Number),
      SystemAttribute::LastAssignedAt => ("Last assigned", AttributeType::Date),
      SystemAttribute::MemberSince => ("Member since", AttributeType::Date),
    };
    let options = match self {
      SystemAttribute::Role => UserRole::ALL.iter().map(|r| r.as_str().to_owned()).collect(),
      _ => Vec::new(),
    };
    AttributeDefinition {
      key: self.key().to_owned(),
      label: label.to_owned(),
      attr_type,
      options,
      user_editable: false,
      source: AttributeSource::System,
      active: true,
    }
  }

  /// Compute the attribute for `user`. `None` when the user has no value
  /// (e.g. `last_assigned_at` for someone never assigned).
  pub fn compute(self, user: &User) -> Option<Value> {
    match self {
      SystemAttribute::Name => Some(Value::String(user.name.clone())),
      SystemAttribute::Email => Some(Value::String(user.email.clone())),
      SystemAttribute::Role => Some(Value::String(user.role.as_str().to_owned())),
      SystemAttribute::HostedMeetingCount => Some(Value::from(user.hosted_meeting_count())),
      SystemAttribute::LastAssignedAt => {
        user.last_assigned_at().map(|at| Value::String(at.to_rfc3339()))
      }
      SystemAttribute::MemberSince => Some(Value::String(user.created_at.to_rfc3339())),
    }
  }
}

// ─── Registry ────────────────────────────────────────────────────────────────

/// Typed lookup table of every active attribute, keyed by attribute key.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeRegistry {
  definitions: BTreeMap<String, AttributeDefinition>,
}

impl Default for AttributeRegistry {
  fn default() -> Self { Self::build([]) }
}

impl AttributeRegistry {
  /// Merge the system attributes with `custom`. Inactive custom definitions
  /// are dropped, and a custom key that collides with a system key is
  /// ignored.
  pub fn build(custom: impl IntoIterator<Item = AttributeDefinition>) -> Self {
    let mut definitions: BTreeMap<String, AttributeDefinition> = SystemAttribute::ALL
      .into_iter()
      .map(|a| (a.key().to_owned(), a.definition()))
      .collect();

    for mut def in custom {
      if !def.active || SystemAttribute::from_key(&def.key).is_some() {
        continue;
      }
      def.source = AttributeSource::Custom;
      definitions.entry(def.key.clone()).or_insert(def);
    }

    Self { definitions }
  }

  pub fn get(&self, key: &str) -> Option<&AttributeDefinition> { self.definitions.get(key) }

  pub fn attribute_type(&self, key: &str) -> Option<AttributeType> {
    self.get(key).map(|d| d.attr_type)
  }

  pub fn definitions(&self) -> impl Iterator<Item = &AttributeDefinition> {
    self.definitions.values()
  }

  /// Resolve the raw subject value for a constraint field. Absent data is
  /// `None`, which the evaluator treats as a failed constraint.
  pub fn resolve(
    &self,
    source:  FieldSource,
    key:     &str,
    user:    &User,
    meeting: &MeetingContext,
  ) -> Option<Value> {
    match source {
      FieldSource::Meeting => meeting.get(key).cloned(),
      FieldSource::User => match SystemAttribute::from_key(key) {
        Some(system) => system.compute(user),
        None => user.attributes.get(key).filter(|v| !v.is_null()).cloned(),
      },
    }
  }

  /// Type used to coerce the subject value of a constraint field.
  pub fn type_for(
    &self,
    source:  FieldSource,
    key:     &str,
    meeting: &MeetingContext,
  ) -> Option<AttributeType> {
    match source {
      FieldSource::User => self.attribute_type(key),
      FieldSource::Meeting => meeting.attribute_type(key),
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};
  use uuid::Uuid;

  use super::*;
  use crate::user::AssignmentRecord;

  fn custom(key: &str, attr_type: AttributeType, active: bool) -> AttributeDefinition {
    AttributeDefinition {
      key: key.into(),
      label: key.into(),
      attr_type,
      options: vec![],
      user_editable: true,
      source: AttributeSource::Custom,
      active,
    }
  }

  fn user() -> User {
    let mut u = User {
      user_id:     Uuid::new_v4(),
      name:        "Ada".into(),
      email:       "ada@example.com".into(),
      role:        UserRole::Host,
      created_at:  Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
      attributes:  Default::default(),
      assignments: vec![],
    };
    u.attributes.insert("team".into(), Value::from("Platform"));
    u.attributes.insert("cleared".into(), Value::Null);
    u
  }

  #[test]
  fn build_merges_custom_and_drops_inactive() {
    let registry = AttributeRegistry::build([
      custom("team", AttributeType::Text, true),
      custom("retired", AttributeType::Boolean, false),
    ]);

    assert_eq!(registry.attribute_type("team"), Some(AttributeType::Text));
    assert!(registry.get("retired").is_none());
    assert_eq!(registry.get("role").map(|d| d.source), Some(AttributeSource::System));
  }

  #[test]
  fn system_key_wins_over_custom_collision() {
    let registry = AttributeRegistry::build([custom("role", AttributeType::Number, true)]);
    let def = registry.get("role").unwrap();
    assert_eq!(def.attr_type, AttributeType::Enumeration);
    assert_eq!(def.options, vec!["admin", "host", "member"]);
  }

  #[test]
  fn resolve_computes_system_attributes() {
    let registry = AttributeRegistry::default();
    let ctx = MeetingContext::default();
    let mut u = user();

    assert_eq!(
      registry.resolve(FieldSource::User, "role", &u, &ctx),
      Some(Value::from("host"))
    );
    assert_eq!(
      registry.resolve(FieldSource::User, "hosted_meeting_count", &u, &ctx),
      Some(Value::from(0))
    );
    assert_eq!(registry.resolve(FieldSource::User, "last_assigned_at", &u, &ctx), None);

    let at = Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap();
    u.assignments.push(AssignmentRecord {
      job_id:        Uuid::new_v4(),
      meeting_title: "Retro".into(),
      assigned_at:   at,
    });
    assert_eq!(
      registry.resolve(FieldSource::User, "last_assigned_at", &u, &ctx),
      Some(Value::String(at.to_rfc3339()))
    );
  }

  #[test]
  fn resolve_custom_attribute_and_absent_values() {
    let registry = AttributeRegistry::build([custom("team", AttributeType::Text, true)]);
    let ctx = MeetingContext::default();
    let u = user();

    assert_eq!(
      registry.resolve(FieldSource::User, "team", &u, &ctx),
      Some(Value::from("Platform"))
    );
    assert_eq!(registry.resolve(FieldSource::User, "cleared", &u, &ctx), None);
    assert_eq!(registry.resolve(FieldSource::User, "missing", &u, &ctx), None);
  }
}
