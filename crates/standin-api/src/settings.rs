//! Handlers for `/settings/:key`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/settings/:key` | 404 if unset |
//! | `PUT`  | `/settings/:key` | Body: `{"value":..,"kind":"number","description":..}` |
//!
//! Writes go through the service so the cached value is dropped at once.

use axum::{
  Json,
  extract::{Path, State},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use standin_core::{
  notify::{CalendarGateway, Notifier},
  setting::{SettingKind, SystemSetting},
  store::JobStore,
};

use crate::{Service, error::ApiError};

/// `GET /settings/:key`
pub async fn get_one<S, N, C>(
  State(service): State<Service<S, N, C>>,
  Path(key): Path<String>,
) -> Result<Json<SystemSetting>, ApiError>
where
  S: JobStore,
  N: Notifier,
  C: CalendarGateway,
{
  service
    .setting(&key)
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("setting {key}")))
}

#[derive(Debug, Deserialize)]
pub struct PutBody {
  pub value:       Value,
  #[serde(default)]
  pub kind:        SettingKind,
  pub description: Option<String>,
}

/// `PUT /settings/:key`
pub async fn put_one<S, N, C>(
  State(service): State<Service<S, N, C>>,
  Path(key): Path<String>,
  Json(body): Json<PutBody>,
) -> Result<Json<SystemSetting>, ApiError>
where
  S: JobStore,
  N: Notifier,
  C: CalendarGateway,
{
  if key.trim().is_empty() {
    return Err(ApiError::BadRequest("setting key must not be empty".into()));
  }
  let setting = SystemSetting {
    key,
    value: body.value,
    kind: body.kind,
    description: body.description,
    updated_at: Utc::now(),
  };
  service.put_setting(setting.clone()).await?;
  Ok(Json(setting))
}
