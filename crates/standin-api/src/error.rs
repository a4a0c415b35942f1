//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use standin_core::Error as CoreError;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Engine(#[from] CoreError),
}

impl ApiError {
  fn status(&self) -> StatusCode {
    match self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Engine(e) => match e {
        CoreError::JobNotFound(_)
        | CoreError::MeetingNotFound(_)
        | CoreError::UserNotFound(_)
        | CoreError::NoOpenJob(_) => StatusCode::NOT_FOUND,
        CoreError::DuplicateApplication { .. }
        | CoreError::JobConflict(_)
        | CoreError::JobClosed(_) => StatusCode::CONFLICT,
        CoreError::Unauthorized { .. } => StatusCode::FORBIDDEN,
        CoreError::UnknownAttribute(_) | CoreError::InvalidConstraint(_) => {
          StatusCode::UNPROCESSABLE_ENTITY
        }
        CoreError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }

  fn code(&self) -> &'static str {
    match self {
      ApiError::NotFound(_) => "not-found",
      ApiError::BadRequest(_) => "bad-request",
      ApiError::Engine(e) => e.code(),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    let body = json!({ "error": self.to_string(), "code": self.code() });
    (status, Json(body)).into_response()
  }
}
