//! Error types for `standin-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("job not found: {0}")]
  JobNotFound(Uuid),

  #[error("meeting not found: {0}")]
  MeetingNotFound(Uuid),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("meeting {0} has no open job")]
  NoOpenJob(Uuid),

  #[error("user {user_id} has already applied to job {job_id}")]
  DuplicateApplication { job_id: Uuid, user_id: Uuid },

  #[error("an open job already exists for this meeting instance: {0}")]
  JobConflict(Uuid),

  #[error("job {0} is no longer open")]
  JobClosed(Uuid),

  #[error("user {actor} may not {action} job {job_id}")]
  Unauthorized {
    actor:  Uuid,
    job_id: Uuid,
    action: &'static str,
  },

  #[error("unknown attribute key: {0:?}")]
  UnknownAttribute(String),

  #[error("invalid constraint: {0}")]
  InvalidConstraint(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  /// Stable machine-readable code so callers can tell failures apart without
  /// parsing messages.
  pub fn code(&self) -> &'static str {
    match self {
      Error::JobNotFound(_) => "job-not-found",
      Error::MeetingNotFound(_) => "meeting-not-found",
      Error::UserNotFound(_) => "user-not-found",
      Error::NoOpenJob(_) => "no-open-job",
      Error::DuplicateApplication { .. } => "duplicate-application",
      Error::JobConflict(_) => "job-conflict",
      Error::JobClosed(_) => "job-closed",
      Error::Unauthorized { .. } => "unauthorized",
      Error::UnknownAttribute(_) => "unknown-attribute",
      Error::InvalidConstraint(_) => "invalid-constraint",
      Error::Store(_) => "store-error",
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
