//! Constraint resolution: job snapshot → meeting → groups → constraints.

use std::collections::HashSet;

use tracing::debug;

use crate::{
  Error, Result,
  constraint::Constraint,
  job::Job,
  meeting::ResolvedMeeting,
  store::JobStore,
};

/// The meeting a job resolved to and the active constraints attached to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConstraints {
  pub meeting:     ResolvedMeeting,
  pub constraints: Vec<Constraint>,
}

/// Resolve the constraint set for `job`.
///
/// A job whose snapshot matches no stored meeting resolves to a synthetic
/// meeting with no constraints. Constraint ids shared between groups are
/// loaded once, in first-seen order; ids of deleted or inactive constraints
/// simply drop out.
pub async fn constraints_for<S: JobStore>(store: &S, job: &Job) -> Result<ResolvedConstraints> {
  let meeting = store
    .find_meeting_by_any_event_id(job.meeting.event_ids())
    .await
    .map_err(Error::store)?;

  let Some(meeting) = meeting else {
    debug!(job_id = %job.job_id, "no meeting record for job; treating as unconstrained");
    return Ok(ResolvedConstraints {
      meeting:     ResolvedMeeting::Synthetic(job.meeting.clone()),
      constraints: Vec::new(),
    });
  };

  if meeting.constraint_group_ids.is_empty() {
    return Ok(ResolvedConstraints {
      meeting:     ResolvedMeeting::Real(meeting),
      constraints: Vec::new(),
    });
  }

  let groups = store
    .find_constraint_groups_by_ids(meeting.constraint_group_ids.clone())
    .await
    .map_err(Error::store)?;

  let mut seen = HashSet::new();
  let ids: Vec<_> = groups
    .iter()
    .flat_map(|g| g.constraint_ids.iter().copied())
    .filter(|id| seen.insert(*id))
    .collect();

  let constraints = if ids.is_empty() {
    Vec::new()
  } else {
    store.find_constraints_by_ids(ids, true).await.map_err(Error::store)?
  };

  debug!(
    job_id = %job.job_id,
    meeting_id = %meeting.meeting_id,
    groups = groups.len(),
    constraints = constraints.len(),
    "resolved constraints"
  );

  Ok(ResolvedConstraints { meeting: ResolvedMeeting::Real(meeting), constraints })
}
