//! Read-only ranking previews.
//!
//! `GET /jobs/:id/dry-run` and `GET /meetings/:id/dry-run`, both taking an
//! optional `?mode=applicants|all` (default `applicants`).

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;
use standin_core::{
  engine::{candidates::CandidateMode, report::DryRunReport},
  notify::{CalendarGateway, Notifier},
  store::JobStore,
};
use uuid::Uuid;

use crate::{Service, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct ModeParams {
  #[serde(default)]
  pub mode: CandidateMode,
}

/// `GET /jobs/:id/dry-run[?mode=<mode>]`
pub async fn for_job<S, N, C>(
  State(service): State<Service<S, N, C>>,
  Path(id): Path<Uuid>,
  Query(params): Query<ModeParams>,
) -> Result<Json<DryRunReport>, ApiError>
where
  S: JobStore,
  N: Notifier,
  C: CalendarGateway,
{
  Ok(Json(service.preview(id, params.mode).await?))
}

/// `GET /meetings/:id/dry-run[?mode=<mode>]`
pub async fn for_meeting<S, N, C>(
  State(service): State<Service<S, N, C>>,
  Path(id): Path<Uuid>,
  Query(params): Query<ModeParams>,
) -> Result<Json<DryRunReport>, ApiError>
where
  S: JobStore,
  N: Notifier,
  C: CalendarGateway,
{
  Ok(Json(service.preview_meeting(id, params.mode).await?))
}
