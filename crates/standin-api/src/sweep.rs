//! `POST /sweep`: run one sweep pass now and return its counters.

use axum::{Json, extract::State};
use standin_core::{
  notify::{CalendarGateway, Notifier},
  service::SweepSummary,
  store::JobStore,
};

use crate::{Service, error::ApiError};

pub async fn handler<S, N, C>(
  State(service): State<Service<S, N, C>>,
) -> Result<Json<SweepSummary>, ApiError>
where
  S: JobStore,
  N: Notifier,
  C: CalendarGateway,
{
  Ok(Json(service.sweep().await?))
}
