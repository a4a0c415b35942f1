//! Validation and normalisation of constraints at authoring time.
//!
//! Duration values are authored in minutes and stored in seconds; this is
//! the only place that scaling happens.

use chrono::{DateTime, Utc};
use serde_json::{Number, Value};
use uuid::Uuid;

use crate::{
  Error, Result,
  attribute::{AttributeRegistry, AttributeType},
  constraint::{Constraint, ConstraintDraft, FieldSource, Operator},
  evaluate::{Behavior, behavior, parse_list, parse_range},
  meeting::MeetingContext,
};

const SECONDS_PER_MINUTE: f64 = 60.0;

/// Turn a draft into a storable [`Constraint`] with a fresh id.
///
/// User-sourced keys must exist in `registry`. Meeting-sourced keys are only
/// type-checked when they name a built-in meeting key, since custom meeting
/// fields vary per meeting.
pub fn author_constraint(
  draft:    ConstraintDraft,
  registry: &AttributeRegistry,
) -> Result<Constraint> {
  if draft.operator == Operator::Unknown {
    return Err(Error::InvalidConstraint("unknown operator".into()));
  }

  let attr_type = match draft.field_source {
    FieldSource::User => Some(
      registry
        .attribute_type(&draft.field_key)
        .ok_or_else(|| Error::UnknownAttribute(draft.field_key.clone()))?,
    ),
    FieldSource::Meeting => builtin_meeting_context().attribute_type(&draft.field_key),
  };

  let mut value = draft.value;
  if let Some(ty) = attr_type {
    let shape = behavior(draft.operator, ty);
    if shape == Behavior::Unsupported {
      return Err(Error::InvalidConstraint(format!(
        "operator {} is not supported for {} attributes",
        draft.operator.as_str(),
        ty.as_str()
      )));
    }
    check_shape(shape, &value)?;
    if ty == AttributeType::Duration {
      value = scale_minutes(&value, shape);
    }
  }

  Ok(Constraint {
    constraint_id: Uuid::new_v4(),
    name:          draft.name,
    description:   draft.description,
    field_source:  draft.field_source,
    field_key:     draft.field_key,
    operator:      draft.operator,
    value,
    required:      draft.required,
    active:        draft.active,
  })
}

fn builtin_meeting_context() -> MeetingContext {
  let epoch = DateTime::<Utc>::UNIX_EPOCH;
  MeetingContext::build("", epoch, epoch, &Default::default())
}

fn check_shape(shape: Behavior, value: &Value) -> Result<()> {
  match shape {
    Behavior::Membership if parse_list(value).is_empty() => {
      Err(Error::InvalidConstraint("list operators need at least one value".into()))
    }
    Behavior::Range if parse_range(value).is_none() => {
      Err(Error::InvalidConstraint("between needs exactly two bounds".into()))
    }
    _ => Ok(()),
  }
}

/// Scale every numeric leaf of a duration comparison value from minutes to
/// seconds. Non-numeric leaves are left alone so they still fail at
/// evaluation time.
fn scale_minutes(value: &Value, shape: Behavior) -> Value {
  match shape {
    Behavior::Membership => Value::Array(parse_list(value).iter().map(scale_scalar).collect()),
    Behavior::Range => match parse_range(value) {
      Some((lo, hi)) => Value::Array(vec![scale_scalar(&lo), scale_scalar(&hi)]),
      None => value.clone(),
    },
    _ => scale_scalar(value),
  }
}

fn scale_scalar(value: &Value) -> Value {
  let minutes = match value {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse::<f64>().ok(),
    _ => None,
  };
  match minutes.map(|m| m * SECONDS_PER_MINUTE) {
    Some(secs) if secs.fract() == 0.0 && secs.abs() < i64::MAX as f64 => Value::from(secs as i64),
    Some(secs) => Number::from_f64(secs).map(Value::Number).unwrap_or_else(|| value.clone()),
    None => value.clone(),
  }
}
