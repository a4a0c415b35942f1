//! The `JobStore` trait: the read/write contract the engine needs from the
//! storage layer.
//!
//! The trait is implemented by storage backends (e.g.
//! `standin-store-sqlite`). Backend errors stay opaque to the engine; the
//! outcomes the engine has to branch on (a duplicate application, a lost
//! assignment race) come back as `Ok` values instead.

use std::future::Future;

use uuid::Uuid;

use crate::{
  attribute::AttributeDefinition,
  constraint::{Constraint, ConstraintGroup},
  job::{Application, Job},
  meeting::Meeting,
  setting::SystemSetting,
  user::{AssignmentRecord, User},
};

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// Result of [`JobStore::insert_job`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertJobOutcome {
  Inserted,
  /// An active job for the same meeting instance and creator already exists.
  Conflict(Uuid),
}

/// Result of [`JobStore::append_application`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
  Applied,
  Duplicate,
  JobNotFound,
  JobClosed,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Standin storage backend.
///
/// Every method returning `bool` is a guarded conditional write: `true` means
/// this call changed the row, `false` means the guard did not hold (already
/// assigned, already notified, already gone) and nothing was written.
pub trait JobStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Jobs ──────────────────────────────────────────────────────────────

  /// Insert `job` unless an active job for the same meeting instance
  /// (primary event id and start time) and creator exists. The check and the
  /// insert are one atomic step.
  fn insert_job(
    &self,
    job: Job,
  ) -> impl Future<Output = Result<InsertJobOutcome, Self::Error>> + Send + '_;

  fn find_job_by_id(
    &self,
    job_id: Uuid,
  ) -> impl Future<Output = Result<Option<Job>, Self::Error>> + Send + '_;

  /// All jobs with `active = true AND assigned_to IS NULL`, oldest first.
  fn find_jobs_active_unassigned(
    &self,
  ) -> impl Future<Output = Result<Vec<Job>, Self::Error>> + Send + '_;

  /// Active jobs whose snapshot carries any of `event_ids`, newest first.
  fn find_active_jobs_by_event_ids(
    &self,
    event_ids: Vec<String>,
  ) -> impl Future<Output = Result<Vec<Job>, Self::Error>> + Send + '_;

  /// Append `application` to an active job, rejecting a second application
  /// by the same user.
  fn append_application(
    &self,
    job_id: Uuid,
    application: Application,
  ) -> impl Future<Output = Result<ApplyOutcome, Self::Error>> + Send + '_;

  /// Remove one application from an active job. Closed jobs keep their
  /// applications.
  fn remove_application(
    &self,
    job_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Set `active = false, assigned_to, assigned_at` only where
  /// `active = true AND assigned_to IS NULL`, and append `record` to the
  /// winner's history in the same transaction.
  fn update_job_assignment(
    &self,
    job_id: Uuid,
    user_id: Uuid,
    record: AssignmentRecord,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Close an active, unassigned job without assigning it.
  fn close_job(&self, job_id: Uuid) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Flip the one-shot "no applicants" flag on an active job.
  fn mark_no_applicants_notified(
    &self,
    job_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn delete_job(&self, job_id: Uuid) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Meetings & constraints ────────────────────────────────────────────

  fn put_meeting(
    &self,
    meeting: Meeting,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn find_meeting_by_id(
    &self,
    meeting_id: Uuid,
  ) -> impl Future<Output = Result<Option<Meeting>, Self::Error>> + Send + '_;

  /// Try each id in order against the meetings' primary, recurring and
  /// legacy event ids; the first match wins.
  fn find_meeting_by_any_event_id(
    &self,
    event_ids: Vec<String>,
  ) -> impl Future<Output = Result<Option<Meeting>, Self::Error>> + Send + '_;

  fn put_constraint(
    &self,
    constraint: Constraint,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Groups keep their references to a deleted constraint.
  fn delete_constraint(
    &self,
    constraint_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn put_constraint_group(
    &self,
    group: ConstraintGroup,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn find_constraint_groups_by_ids(
    &self,
    group_ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<Vec<ConstraintGroup>, Self::Error>> + Send + '_;

  /// Missing ids are skipped; with `active_only`, so are inactive rows.
  fn find_constraints_by_ids(
    &self,
    constraint_ids: Vec<Uuid>,
    active_only: bool,
  ) -> impl Future<Output = Result<Vec<Constraint>, Self::Error>> + Send + '_;

  fn put_attribute_definition(
    &self,
    definition: AttributeDefinition,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn list_attribute_definitions(
    &self,
  ) -> impl Future<Output = Result<Vec<AttributeDefinition>, Self::Error>> + Send + '_;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Upsert the profile and custom attributes; history entries carried on
  /// `user` are added if not already present.
  fn put_user(&self, user: User) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn find_user_by_id(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Every user with their assignment history loaded.
  fn find_all_users(&self) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  fn get_user_assignment_history(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<AssignmentRecord>, Self::Error>> + Send + '_;

  // ── Settings ──────────────────────────────────────────────────────────

  fn get_system_setting(
    &self,
    key: String,
  ) -> impl Future<Output = Result<Option<SystemSetting>, Self::Error>> + Send + '_;

  fn put_system_setting(
    &self,
    setting: SystemSetting,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

