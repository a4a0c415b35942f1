//! The periodic sweep task.

use std::{sync::Arc, time::Duration};

use standin_core::{
  notify::{CalendarGateway, Notifier},
  service::JobService,
  store::JobStore,
};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};

/// Sweep every `period` until the task is dropped. A failed pass is logged
/// and the next tick tries again.
pub async fn run<S, N, C>(service: Arc<JobService<S, N, C>>, period: Duration)
where
  S: JobStore,
  N: Notifier,
  C: CalendarGateway,
{
  info!(?period, "periodic sweep started");
  let mut ticker = interval(period);
  ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
  loop {
    ticker.tick().await;
    if let Err(e) = service.sweep().await {
      warn!(error = %e, code = e.code(), "sweep pass failed");
    }
  }
}
