//! Bootstrapping administrative records from a JSON document.
//!
//! ```json
//! {
//!   "attributes":  [{"key": "team", "label": "Team", "type": "enumeration", "options": ["a", "b"]}],
//!   "constraints": [{"constraint_id": "..", "name": "On team a", "field_key": "team",
//!                    "operator": "equals", "value": "a", "required": true}],
//!   "groups":      [{"group_id": "..", "name": "Core", "constraint_ids": [".."]}],
//!   "meetings":    [..],
//!   "users":       [..],
//!   "settings":    [{"key": "default_workload_balance_window_days", "value": 14, "kind": "number"}]
//! }
//! ```
//!
//! Constraints pass through the same validation and duration scaling as any
//! other authored constraint, but keep the id given in the document so
//! groups can refer to them.

use serde::Deserialize;
use standin_core::{
  Error, Result,
  attribute::{AttributeDefinition, AttributeRegistry},
  authoring::author_constraint,
  constraint::{ConstraintDraft, ConstraintGroup},
  meeting::Meeting,
  setting::SystemSetting,
  store::JobStore,
  user::User,
};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SeedConstraint {
  pub constraint_id: Uuid,
  #[serde(flatten)]
  pub draft:         ConstraintDraft,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedDocument {
  pub attributes:  Vec<AttributeDefinition>,
  pub constraints: Vec<SeedConstraint>,
  pub groups:      Vec<ConstraintGroup>,
  pub meetings:    Vec<Meeting>,
  pub users:       Vec<User>,
  pub settings:    Vec<SystemSetting>,
}

/// How many records of each kind were written.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
  pub attributes:  usize,
  pub constraints: usize,
  pub groups:      usize,
  pub meetings:    usize,
  pub users:       usize,
  pub settings:    usize,
}

/// Write every record in `doc` to `store`, replacing records with the same
/// key. Stops at the first invalid constraint.
pub async fn load<S: JobStore>(store: &S, doc: SeedDocument) -> Result<SeedSummary> {
  let mut summary = SeedSummary::default();

  let existing = store.list_attribute_definitions().await.map_err(Error::store)?;
  let registry = AttributeRegistry::build(existing.into_iter().chain(doc.attributes.iter().cloned()));

  for def in doc.attributes {
    debug!(key = %def.key, "seeding attribute");
    store.put_attribute_definition(def).await.map_err(Error::store)?;
    summary.attributes += 1;
  }

  for seed in doc.constraints {
    let mut constraint = author_constraint(seed.draft, &registry)?;
    constraint.constraint_id = seed.constraint_id;
    store.put_constraint(constraint).await.map_err(Error::store)?;
    summary.constraints += 1;
  }

  for group in doc.groups {
    store.put_constraint_group(group).await.map_err(Error::store)?;
    summary.groups += 1;
  }

  for meeting in doc.meetings {
    store.put_meeting(meeting).await.map_err(Error::store)?;
    summary.meetings += 1;
  }

  for user in doc.users {
    store.put_user(user).await.map_err(Error::store)?;
    summary.users += 1;
  }

  for setting in doc.settings {
    store.put_system_setting(setting).await.map_err(Error::store)?;
    summary.settings += 1;
  }

  info!(
    attributes = summary.attributes,
    constraints = summary.constraints,
    groups = summary.groups,
    meetings = summary.meetings,
    users = summary.users,
    settings = summary.settings,
    "seed loaded"
  );
  Ok(summary)
}
