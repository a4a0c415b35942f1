//! Meetings, the snapshots jobs take of them, and the context map
//! meeting-sourced constraints are evaluated against.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{attribute::AttributeType, evaluate::parse_date};

// ─── Stored meeting ──────────────────────────────────────────────────────────

/// A recurring or one-off event that jobs are opened for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
  pub meeting_id:                   Uuid,
  pub title:                        String,
  /// Primary calendar event identifier.
  pub event_id:                     String,
  pub recurring_event_id:           Option<String>,
  pub legacy_event_id:              Option<String>,
  pub starts_at:                    DateTime<Utc>,
  pub ends_at:                      DateTime<Utc>,
  #[serde(default)]
  pub constraint_group_ids:         Vec<Uuid>,
  /// Lookback used by the recency-balance score; falls back to the
  /// system-wide default when absent.
  pub workload_balance_window_days: Option<u32>,
  /// Free-form values exposed to meeting-sourced constraints.
  #[serde(default)]
  pub fields:                       BTreeMap<String, Value>,
}

impl Meeting {
  /// Take the immutable snapshot stored on a job.
  pub fn snapshot(&self) -> MeetingSnapshot {
    MeetingSnapshot {
      title:              self.title.clone(),
      event_id:           self.event_id.clone(),
      recurring_event_id: self.recurring_event_id.clone(),
      legacy_event_id:    self.legacy_event_id.clone(),
      starts_at:          self.starts_at,
      ends_at:            self.ends_at,
    }
  }
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// The copy of a meeting a job takes at creation time. Later edits to the
/// meeting never touch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingSnapshot {
  pub title:              String,
  pub event_id:           String,
  pub recurring_event_id: Option<String>,
  pub legacy_event_id:    Option<String>,
  pub starts_at:          DateTime<Utc>,
  pub ends_at:            DateTime<Utc>,
}

impl MeetingSnapshot {
  /// Recorded event identifiers in lookup priority order: primary,
  /// recurring series, legacy. Blank identifiers are skipped.
  pub fn event_ids(&self) -> Vec<String> {
    std::iter::once(Some(&self.event_id))
      .chain([self.recurring_event_id.as_ref(), self.legacy_event_id.as_ref()])
      .flatten()
      .filter(|id| !id.trim().is_empty())
      .cloned()
      .collect()
  }

  pub fn has_started(&self, now: DateTime<Utc>) -> bool { self.starts_at <= now }
}

// ─── Resolved meeting ────────────────────────────────────────────────────────

/// The meeting a job resolved to.
///
/// Jobs created straight from a calendar event have no backing meeting
/// record; they resolve to [`ResolvedMeeting::Synthetic`], which carries no
/// constraints and makes every candidate eligible.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedMeeting {
  Real(Meeting),
  Synthetic(MeetingSnapshot),
}

impl ResolvedMeeting {
  pub fn meeting_id(&self) -> Option<Uuid> {
    match self {
      ResolvedMeeting::Real(m) => Some(m.meeting_id),
      ResolvedMeeting::Synthetic(_) => None,
    }
  }

  pub fn title(&self) -> &str {
    match self {
      ResolvedMeeting::Real(m) => &m.title,
      ResolvedMeeting::Synthetic(s) => &s.title,
    }
  }

  pub fn is_synthetic(&self) -> bool { matches!(self, ResolvedMeeting::Synthetic(_)) }

  pub fn workload_balance_window_days(&self) -> Option<u32> {
    match self {
      ResolvedMeeting::Real(m) => m.workload_balance_window_days,
      ResolvedMeeting::Synthetic(_) => None,
    }
  }

  pub fn context(&self) -> MeetingContext {
    match self {
      ResolvedMeeting::Real(m) => {
        MeetingContext::build(&m.title, m.starts_at, m.ends_at, &m.fields)
      }
      ResolvedMeeting::Synthetic(s) => {
        MeetingContext::build(&s.title, s.starts_at, s.ends_at, &BTreeMap::new())
      }
    }
  }
}

// ─── Context ─────────────────────────────────────────────────────────────────

/// Values and types visible to constraints with `field_source = meeting`.
///
/// Built-in keys: `title`, `starts_at`, `ends_at`, `duration` (seconds) and
/// `weekday`. Custom fields are typed from their JSON shape and never shadow
/// a built-in key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeetingContext {
  values: BTreeMap<String, Value>,
  types:  BTreeMap<String, AttributeType>,
}

impl MeetingContext {
  pub fn build(
    title:     &str,
    starts_at: DateTime<Utc>,
    ends_at:   DateTime<Utc>,
    fields:    &BTreeMap<String, Value>,
  ) -> Self {
    let mut ctx = Self::default();

    for (key, value) in fields {
      if let Some(ty) = infer_type(value) {
        ctx.insert(key, value.clone(), ty);
      }
    }

    let duration = (ends_at - starts_at).num_seconds().max(0);
    let weekday = starts_at.format("%A").to_string().to_lowercase();

    ctx.insert("title", Value::String(title.to_owned()), AttributeType::Text);
    ctx.insert("starts_at", Value::String(starts_at.to_rfc3339()), AttributeType::Date);
    ctx.insert("ends_at", Value::String(ends_at.to_rfc3339()), AttributeType::Date);
    ctx.insert("duration", Value::from(duration), AttributeType::Duration);
    ctx.insert("weekday", Value::String(weekday), AttributeType::Enumeration);
    ctx
  }

  fn insert(&mut self, key: &str, value: Value, ty: AttributeType) {
    self.values.insert(key.to_owned(), value);
    self.types.insert(key.to_owned(), ty);
  }

  pub fn get(&self, key: &str) -> Option<&Value> { self.values.get(key) }

  pub fn attribute_type(&self, key: &str) -> Option<AttributeType> {
    self.types.get(key).copied()
  }
}

fn infer_type(value: &Value) -> Option<AttributeType> {
  match value {
    Value::Bool(_) => Some(AttributeType::Boolean),
    Value::Number(_) => Some(AttributeType::Number),
    Value::String(s) if parse_date(s.trim()).is_some() => Some(AttributeType::Date),
    Value::String(_) => Some(AttributeType::Text),
    Value::Null | Value::Array(_) | Value::Object(_) => None,
  }
}
