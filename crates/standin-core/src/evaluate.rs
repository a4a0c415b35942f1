//! Constraint evaluation: type-aware coercion plus operator semantics.
//!
//! Evaluation is driven by an explicit (operator × attribute type) table,
//! [`behavior`], so each combination can be reasoned about and tested on its
//! own. Anything the table does not support, and any value that fails to
//! coerce, evaluates to `false`: absent or malformed data never satisfies a
//! constraint.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Number, Value};

use crate::{
  attribute::AttributeType,
  constraint::{Constraint, Operator},
};

// ─── Coercion ────────────────────────────────────────────────────────────────

/// A value coerced to an attribute type.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
  /// Lower-cased; used for text and enumeration attributes.
  Text(String),
  /// Used for number and duration attributes.
  Number(f64),
  Boolean(bool),
  Date(DateTime<Utc>),
}

impl Coerced {
  fn compare(&self, other: &Coerced) -> Option<Ordering> {
    match (self, other) {
      (Coerced::Text(a), Coerced::Text(b)) => Some(a.cmp(b)),
      (Coerced::Number(a), Coerced::Number(b)) => a.partial_cmp(b),
      (Coerced::Boolean(a), Coerced::Boolean(b)) => Some(a.cmp(b)),
      (Coerced::Date(a), Coerced::Date(b)) => Some(a.cmp(b)),
      _ => None,
    }
  }
}

/// Coerce a raw JSON value to `ty`. `None` means "no usable value".
pub fn coerce(raw: &Value, ty: AttributeType) -> Option<Coerced> {
  if raw.is_null() {
    return None;
  }
  match ty {
    AttributeType::Number | AttributeType::Duration => coerce_number(raw).map(Coerced::Number),
    AttributeType::Boolean => Some(Coerced::Boolean(coerce_bool(raw))),
    AttributeType::Date => coerce_date(raw).map(Coerced::Date),
    AttributeType::Text | AttributeType::Enumeration => coerce_text(raw).map(Coerced::Text),
  }
}

fn coerce_number(raw: &Value) -> Option<f64> {
  let n = match raw {
    Value::Number(n) => n.as_f64()?,
    Value::String(s) => {
      let s = s.trim();
      if s.is_empty() {
        return None;
      }
      s.parse::<f64>().ok()?
    }
    _ => return None,
  };
  n.is_finite().then_some(n)
}

fn coerce_bool(raw: &Value) -> bool {
  match raw {
    Value::Bool(b) => *b,
    Value::String(s) => matches!(s.trim(), "true" | "1"),
    Value::Number(n) => n.as_f64() == Some(1.0),
    _ => false,
  }
}

fn coerce_date(raw: &Value) -> Option<DateTime<Utc>> {
  match raw {
    Value::String(s) => parse_date(s.trim()),
    Value::Number(n) => DateTime::from_timestamp_millis(n.as_i64()?),
    _ => None,
  }
}

/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` (taken as UTC), or a bare
/// `YYYY-MM-DD` (midnight UTC).
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
    return Some(dt.and_utc());
  }
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|dt| dt.and_utc())
}

fn coerce_text(raw: &Value) -> Option<String> {
  match raw {
    Value::String(s) => Some(s.to_lowercase()),
    Value::Number(n) => Some(number_text(n)),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}

/// Whole floats render without a fractional part so `5.0` matches `"5"`.
fn number_text(n: &Number) -> String {
  match n.as_f64() {
    Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
    _ => n.to_string(),
  }
}

// ─── Comparison-value shaping ────────────────────────────────────────────────

/// Parse a list comparison value: a JSON array, a string holding a JSON
/// array, or a comma-delimited string.
pub fn parse_list(value: &Value) -> Vec<Value> {
  match value {
    Value::Array(items) => items.clone(),
    Value::String(s) => {
      let trimmed = s.trim();
      if trimmed.starts_with('[')
        && let Ok(items) = serde_json::from_str::<Vec<Value>>(trimmed)
      {
        return items;
      }
      trimmed
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| Value::String(part.to_owned()))
        .collect()
    }
    Value::Null => Vec::new(),
    scalar => vec![scalar.clone()],
  }
}

/// Parse a `between` comparison value into its two bounds: anything
/// [`parse_list`] yields exactly two items for, or `{"min": .., "max": ..}`.
pub fn parse_range(value: &Value) -> Option<(Value, Value)> {
  if let Value::Object(map) = value {
    return Some((map.get("min")?.clone(), map.get("max")?.clone()));
  }
  let mut items = parse_list(value).into_iter();
  match (items.next(), items.next(), items.next()) {
    (Some(lo), Some(hi), None) => Some((lo, hi)),
    _ => None,
  }
}

// ─── Dispatch table ──────────────────────────────────────────────────────────

/// How an operator applies to a given attribute type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
  /// Type-aware equality against a scalar.
  Equality,
  /// Native ordering against a scalar.
  Ordering,
  /// Case-insensitive substring test.
  Substring,
  /// Membership in a parsed list.
  Membership,
  /// Inclusive bounds check against a parsed pair.
  Range,
  /// The combination is meaningless; always fails.
  Unsupported,
}

/// The (operator × type) dispatch table.
pub fn behavior(operator: Operator, ty: AttributeType) -> Behavior {
  use AttributeType as T;
  use Operator as O;

  match (operator, ty) {
    (O::Equals | O::NotEquals, _) => Behavior::Equality,

    (
      O::GreaterThan | O::GreaterThanOrEqual | O::LessThan | O::LessThanOrEqual,
      T::Number | T::Duration | T::Date | T::Text,
    ) => Behavior::Ordering,
    (
      O::GreaterThan | O::GreaterThanOrEqual | O::LessThan | O::LessThanOrEqual,
      T::Boolean | T::Enumeration,
    ) => Behavior::Unsupported,

    (O::Contains | O::NotContains, T::Text | T::Enumeration) => Behavior::Substring,
    (O::Contains | O::NotContains, T::Number | T::Duration | T::Boolean | T::Date) => {
      Behavior::Unsupported
    }

    (O::In | O::NotIn, _) => Behavior::Membership,

    (O::Between, T::Number | T::Duration | T::Date) => Behavior::Range,
    (O::Between, T::Text | T::Enumeration | T::Boolean) => Behavior::Unsupported,

    (O::Unknown, _) => Behavior::Unsupported,
  }
}

// ─── Evaluation ──────────────────────────────────────────────────────────────

/// Decide whether `raw` (the resolved subject value, if any) satisfies
/// `constraint` when interpreted as `ty`.
pub fn evaluate(constraint: &Constraint, raw: Option<&Value>, ty: AttributeType) -> bool {
  let Some(subject) = raw.and_then(|v| coerce(v, ty)) else {
    return false;
  };
  let operator = constraint.operator;
  let expected = &constraint.value;

  match behavior(operator, ty) {
    Behavior::Equality => match coerce(expected, ty) {
      Some(target) => (subject == target) != operator.is_negated(),
      None => false,
    },
    Behavior::Ordering => {
      let Some(ord) = coerce(expected, ty).and_then(|target| subject.compare(&target)) else {
        return false;
      };
      match operator {
        Operator::GreaterThan => ord.is_gt(),
        Operator::GreaterThanOrEqual => ord.is_ge(),
        Operator::LessThan => ord.is_lt(),
        Operator::LessThanOrEqual => ord.is_le(),
        _ => false,
      }
    }
    Behavior::Substring => match (&subject, coerce(expected, ty)) {
      (Coerced::Text(haystack), Some(Coerced::Text(needle))) => {
        haystack.contains(needle.as_str()) != operator.is_negated()
      }
      _ => false,
    },
    Behavior::Membership => {
      let member = parse_list(expected)
        .iter()
        .filter_map(|item| coerce(item, ty))
        .any(|item| item == subject);
      member != operator.is_negated()
    }
    Behavior::Range => {
      let Some((lo, hi)) = parse_range(expected) else {
        return false;
      };
      match (coerce(&lo, ty), coerce(&hi, ty)) {
        (Some(lo), Some(hi)) => {
          subject.compare(&lo).is_some_and(Ordering::is_ge)
            && subject.compare(&hi).is_some_and(Ordering::is_le)
        }
        _ => false,
      }
    }
    Behavior::Unsupported => false,
  }
}
