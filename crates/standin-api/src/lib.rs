//! JSON REST API for Standin.
//!
//! Exposes an axum [`Router`] over a [`JobService`]. Authentication is the
//! caller's responsibility; endpoints that need an acting user take its id
//! explicitly and let the service authorise it.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", standin_api::api_router(Arc::new(service)))
//! ```

pub mod dry_run;
pub mod error;
pub mod jobs;
pub mod settings;
pub mod sweep;


use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use standin_core::{notify::{CalendarGateway, Notifier}, service::JobService, store::JobStore};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Shared handler state.
pub type Service<S, N, C> = Arc<JobService<S, N, C>>;

/// Build a fully-materialised API router for `service`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, N, C>(service: Service<S, N, C>) -> Router<()>
where
  S: JobStore + 'static,
  N: Notifier + 'static,
  C: CalendarGateway + 'static,
{
  Router::new()
    // Jobs
    .route("/jobs", post(jobs::create::<S, N, C>))
    .route("/jobs/{id}", get(jobs::get_one::<S, N, C>).delete(jobs::cancel::<S, N, C>))
    .route("/jobs/{id}/applications", post(jobs::apply::<S, N, C>))
    .route("/jobs/{id}/applications/{user_id}", delete(jobs::decline::<S, N, C>))
    .route("/jobs/{id}/run", post(jobs::run::<S, N, C>))
    // Dry run
    .route("/jobs/{id}/dry-run", get(dry_run::for_job::<S, N, C>))
    .route("/meetings/{id}/dry-run", get(dry_run::for_meeting::<S, N, C>))
    // Sweep
    .route("/sweep", post(sweep::handler::<S, N, C>))
    // Settings
    .route("/settings/{key}", get(settings::get_one::<S, N, C>).put(settings::put_one::<S, N, C>))
    .layer(TraceLayer::new_for_http())
    .with_state(service)
}
