//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (nanosecond
//! precision, `Z` suffix) so that text order is time order. Maps, lists and
//! free-form values are compact JSON. UUIDs are hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use standin_core::{
  attribute::{AttributeDefinition, AttributeSource, AttributeType},
  constraint::{Constraint, ConstraintGroup, FieldSource, Operator},
  job::{Application, Job},
  meeting::{Meeting, MeetingSnapshot},
  setting::{SettingKind, SystemSetting},
  user::{AssignmentRecord, User, UserRole},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Nanos, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn unknown(kind: &'static str, value: &str) -> Error {
  Error::UnknownValue { kind, value: value.to_owned() }
}

pub fn encode_attribute_source(source: AttributeSource) -> &'static str {
  match source {
    AttributeSource::System => "system",
    AttributeSource::Custom => "custom",
  }
}

fn decode_attribute_source(s: &str) -> Result<AttributeSource> {
  match s {
    "system" => Ok(AttributeSource::System),
    "custom" => Ok(AttributeSource::Custom),
    other => Err(unknown("attribute source", other)),
  }
}

// ─── Users ───────────────────────────────────────────────────────────────────

pub struct RawAssignment {
  pub job_id:        String,
  pub meeting_title: String,
  pub assigned_at:   String,
}

impl RawAssignment {
  pub fn into_record(self) -> Result<AssignmentRecord> {
    Ok(AssignmentRecord {
      job_id:        decode_uuid(&self.job_id)?,
      meeting_title: self.meeting_title,
      assigned_at:   decode_dt(&self.assigned_at)?,
    })
  }
}

/// A `users` row plus its `assignments` rows, oldest first.
pub struct RawUser {
  pub user_id:     String,
  pub name:        String,
  pub email:       String,
  pub role:        String,
  pub created_at:  String,
  pub attributes:  String,
  pub assignments: Vec<RawAssignment>,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:     decode_uuid(&self.user_id)?,
      name:        self.name,
      email:       self.email,
      role:        UserRole::parse(&self.role).ok_or_else(|| unknown("role", &self.role))?,
      created_at:  decode_dt(&self.created_at)?,
      attributes:  serde_json::from_str(&self.attributes)?,
      assignments: self
        .assignments
        .into_iter()
        .map(RawAssignment::into_record)
        .collect::<Result<_>>()?,
    })
  }
}

// ─── Attribute definitions ───────────────────────────────────────────────────

pub struct RawDefinition {
  pub key:           String,
  pub label:         String,
  pub attr_type:     String,
  pub options:       String,
  pub user_editable: bool,
  pub source:        String,
  pub active:        bool,
}

impl RawDefinition {
  pub fn into_definition(self) -> Result<AttributeDefinition> {
    Ok(AttributeDefinition {
      attr_type:     AttributeType::parse(&self.attr_type)
        .ok_or_else(|| unknown("attribute type", &self.attr_type))?,
      options:       serde_json::from_str(&self.options)?,
      source:        decode_attribute_source(&self.source)?,
      key:           self.key,
      label:         self.label,
      user_editable: self.user_editable,
      active:        self.active,
    })
  }
}

// ─── Constraints ─────────────────────────────────────────────────────────────

pub struct RawConstraint {
  pub constraint_id: String,
  pub name:          String,
  pub description:   Option<String>,
  pub field_source:  String,
  pub field_key:     String,
  pub operator:      String,
  pub value_json:    String,
  pub required:      bool,
  pub active:        bool,
}

impl RawConstraint {
  /// Unrecognised operator names decode to [`Operator::Unknown`], which the
  /// evaluator fails closed on.
  pub fn into_constraint(self) -> Result<Constraint> {
    Ok(Constraint {
      constraint_id: decode_uuid(&self.constraint_id)?,
      field_source:  FieldSource::parse(&self.field_source)
        .ok_or_else(|| unknown("field source", &self.field_source))?,
      operator:      Operator::parse(&self.operator),
      value:         serde_json::from_str(&self.value_json)?,
      name:          self.name,
      description:   self.description,
      field_key:     self.field_key,
      required:      self.required,
      active:        self.active,
    })
  }
}

pub struct RawGroup {
  pub group_id:       String,
  pub name:           String,
  pub constraint_ids: Vec<String>,
}

impl RawGroup {
  pub fn into_group(self) -> Result<ConstraintGroup> {
    Ok(ConstraintGroup {
      group_id:       decode_uuid(&self.group_id)?,
      name:           self.name,
      constraint_ids: self
        .constraint_ids
        .iter()
        .map(|id| decode_uuid(id))
        .collect::<Result<_>>()?,
    })
  }
}

// ─── Meetings ────────────────────────────────────────────────────────────────

pub struct RawMeeting {
  pub meeting_id:                   String,
  pub title:                        String,
  pub event_id:                     String,
  pub recurring_event_id:           Option<String>,
  pub legacy_event_id:              Option<String>,
  pub starts_at:                    String,
  pub ends_at:                      String,
  pub workload_balance_window_days: Option<u32>,
  pub fields:                       String,
  pub group_ids:                    Vec<String>,
}

impl RawMeeting {
  pub fn into_meeting(self) -> Result<Meeting> {
    Ok(Meeting {
      meeting_id:                   decode_uuid(&self.meeting_id)?,
      title:                        self.title,
      event_id:                     self.event_id,
      recurring_event_id:           self.recurring_event_id,
      legacy_event_id:              self.legacy_event_id,
      starts_at:                    decode_dt(&self.starts_at)?,
      ends_at:                      decode_dt(&self.ends_at)?,
      constraint_group_ids:         self
        .group_ids
        .iter()
        .map(|id| decode_uuid(id))
        .collect::<Result<_>>()?,
      workload_balance_window_days: self.workload_balance_window_days,
      fields:                       serde_json::from_str(&self.fields)?,
    })
  }
}

// ─── Jobs ────────────────────────────────────────────────────────────────────

pub struct RawApplication {
  pub user_id:    String,
  pub applied_at: String,
}

impl RawApplication {
  pub fn into_application(self) -> Result<Application> {
    Ok(Application {
      user_id:    decode_uuid(&self.user_id)?,
      applied_at: decode_dt(&self.applied_at)?,
    })
  }
}

/// A `jobs` row plus its applications in submission order.
pub struct RawJob {
  pub job_id:                    String,
  pub active:                    bool,
  pub title:                     String,
  pub event_id:                  String,
  pub recurring_event_id:        Option<String>,
  pub legacy_event_id:           Option<String>,
  pub starts_at:                 String,
  pub ends_at:                   String,
  pub created_by:                String,
  pub created_at:                String,
  pub assigned_to:               Option<String>,
  pub assigned_at:               Option<String>,
  pub posted_notice_sent:        bool,
  pub no_applicants_notice_sent: bool,
  pub applications:              Vec<RawApplication>,
}

impl RawJob {
  pub fn into_job(self) -> Result<Job> {
    Ok(Job {
      job_id:                    decode_uuid(&self.job_id)?,
      active:                    self.active,
      meeting:                   MeetingSnapshot {
        title:              self.title,
        event_id:           self.event_id,
        recurring_event_id: self.recurring_event_id,
        legacy_event_id:    self.legacy_event_id,
        starts_at:          decode_dt(&self.starts_at)?,
        ends_at:            decode_dt(&self.ends_at)?,
      },
      created_by:                decode_uuid(&self.created_by)?,
      created_at:                decode_dt(&self.created_at)?,
      applications:              self
        .applications
        .into_iter()
        .map(RawApplication::into_application)
        .collect::<Result<_>>()?,
      assigned_to:               self.assigned_to.as_deref().map(decode_uuid).transpose()?,
      assigned_at:               self.assigned_at.as_deref().map(decode_dt).transpose()?,
      posted_notice_sent:        self.posted_notice_sent,
      no_applicants_notice_sent: self.no_applicants_notice_sent,
    })
  }
}

// ─── Settings ────────────────────────────────────────────────────────────────

pub struct RawSetting {
  pub key:         String,
  pub value_json:  String,
  pub kind:        String,
  pub description: Option<String>,
  pub updated_at:  String,
}

impl RawSetting {
  pub fn into_setting(self) -> Result<SystemSetting> {
    let value: Value = serde_json::from_str(&self.value_json)?;
    Ok(SystemSetting {
      kind: SettingKind::parse(&self.kind).ok_or_else(|| unknown("setting kind", &self.kind))?,
      key: self.key,
      value,
      description: self.description,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}
