//! Handlers for `/jobs` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/jobs` | Body: `{"source":{"kind":"meeting","meeting_id":..},"created_by":..}` |
//! | `GET`    | `/jobs/:id` | Job plus its derived `state` |
//! | `DELETE` | `/jobs/:id?actor_id=` | Cancel; creator or admin only |
//! | `POST`   | `/jobs/:id/applications` | Body: `{"user_id":..}` |
//! | `DELETE` | `/jobs/:id/applications/:user_id` | Withdraw one application |
//! | `POST`   | `/jobs/:id/run` | Body: `{"actor_id":..}` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use standin_core::{
  job::{AssignmentResult, Job, JobState, NewJob},
  notify::{CalendarGateway, Notifier},
  store::JobStore,
};
use uuid::Uuid;

use crate::{Service, error::ApiError};

/// A job as returned over the wire.
#[derive(Debug, Serialize)]
pub struct JobView {
  #[serde(flatten)]
  pub job:   Job,
  pub state: JobState,
}

impl From<Job> for JobView {
  fn from(job: Job) -> Self {
    let state = job.state();
    Self { job, state }
  }
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /jobs`
pub async fn create<S, N, C>(
  State(service): State<Service<S, N, C>>,
  Json(body): Json<NewJob>,
) -> Result<impl IntoResponse, ApiError>
where
  S: JobStore,
  N: Notifier,
  C: CalendarGateway,
{
  let job = service.create_job(body).await?;
  Ok((StatusCode::CREATED, Json(JobView::from(job))))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /jobs/:id`
pub async fn get_one<S, N, C>(
  State(service): State<Service<S, N, C>>,
  Path(id): Path<Uuid>,
) -> Result<Json<JobView>, ApiError>
where
  S: JobStore,
  N: Notifier,
  C: CalendarGateway,
{
  Ok(Json(service.get_job(id).await?.into()))
}

// ─── Cancel ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ActorParams {
  pub actor_id: Uuid,
}

/// `DELETE /jobs/:id?actor_id=<uuid>`
pub async fn cancel<S, N, C>(
  State(service): State<Service<S, N, C>>,
  Path(id): Path<Uuid>,
  Query(params): Query<ActorParams>,
) -> Result<StatusCode, ApiError>
where
  S: JobStore,
  N: Notifier,
  C: CalendarGateway,
{
  service.cancel(id, params.actor_id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Applications ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ApplyBody {
  pub user_id: Uuid,
}

/// `POST /jobs/:id/applications`
pub async fn apply<S, N, C>(
  State(service): State<Service<S, N, C>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ApplyBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: JobStore,
  N: Notifier,
  C: CalendarGateway,
{
  let job = service.apply(id, body.user_id).await?;
  Ok((StatusCode::CREATED, Json(JobView::from(job))))
}

/// `DELETE /jobs/:id/applications/:user_id`
pub async fn decline<S, N, C>(
  State(service): State<Service<S, N, C>>,
  Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<JobView>, ApiError>
where
  S: JobStore,
  N: Notifier,
  C: CalendarGateway,
{
  Ok(Json(service.decline(id, user_id).await?.into()))
}

// ─── Run ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RunBody {
  pub actor_id: Uuid,
}

/// `POST /jobs/:id/run`
pub async fn run<S, N, C>(
  State(service): State<Service<S, N, C>>,
  Path(id): Path<Uuid>,
  Json(body): Json<RunBody>,
) -> Result<Json<AssignmentResult>, ApiError>
where
  S: JobStore,
  N: Notifier,
  C: CalendarGateway,
{
  Ok(Json(service.run_job(id, body.actor_id).await?))
}
