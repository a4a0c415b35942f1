//! standin server binary.
//!
//! Reads `standin.toml` (or the path given with `--config`), opens the SQLite
//! store, starts the periodic sweep, and serves the JSON API under `/api`.
//!
//! ```
//! cargo run -p standin-server -- --seed fixtures.json --sweep-once
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::Router;
use clap::Parser;
use standin_core::{
  service::{JobService, ServiceConfig},
  setting::SettingsCache,
};
use standin_server::{
  ServerConfig, expand_tilde, seed, sweep,
  transport::{ChatNotifier, LogCalendar},
};
use standin_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Standin substitute-matching server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "standin.toml")]
  config: PathBuf,

  /// Load administrative fixtures from a JSON file before starting.
  #[arg(long)]
  seed: Option<PathBuf>,

  /// Run a single sweep, print its summary, and exit.
  #[arg(long)]
  sweep_once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = ServerConfig::load(&cli.config).context("failed to load configuration")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if let Some(path) = &cli.seed {
    let raw = tokio::fs::read_to_string(path)
      .await
      .with_context(|| format!("failed to read seed file {path:?}"))?;
    let doc = serde_json::from_str(&raw).context("failed to parse seed document")?;
    seed::load(&store, doc).await.context("failed to load seed document")?;
  }

  let notifier = ChatNotifier::from_config(
    server_cfg.webhook_url.as_deref(),
    server_cfg.notify_timeout(),
  )
  .context("failed to build webhook client")?;

  let service = Arc::new(JobService::new(
    Arc::new(store),
    Arc::new(notifier),
    Arc::new(LogCalendar),
    SettingsCache::new(server_cfg.settings_ttl()),
    ServiceConfig { side_effect_timeout: server_cfg.notify_timeout() },
  ));

  if cli.sweep_once {
    let summary = service.sweep().await.context("sweep failed")?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    return Ok(());
  }

  if let Some(period) = server_cfg.sweep_interval() {
    tokio::spawn(sweep::run(Arc::clone(&service), period));
  } else {
    tracing::info!("periodic sweep disabled");
  }

  let app = Router::new().nest("/api", standin_api::api_router(service));
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      let _ = tokio::signal::ctrl_c().await;
    })
    .await
    .context("server error")?;

  Ok(())
}
