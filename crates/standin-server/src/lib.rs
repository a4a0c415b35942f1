//! Wiring for the Standin server binary: configuration, outbound
//! transports, the periodic sweep, and fixture seeding.

pub mod seed;
pub mod sweep;
pub mod transport;

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use serde::Deserialize;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `standin.toml` layered
/// under `STANDIN_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  #[serde(default = "default_store_path")]
  pub store_path:          PathBuf,
  /// Seconds between sweeps; `0` disables the periodic sweep.
  #[serde(default = "default_sweep_interval")]
  pub sweep_interval_secs: u64,
  #[serde(default = "default_settings_ttl")]
  pub settings_ttl_secs:   u64,
  /// Chat webhook for notices. Notices are only logged when unset.
  #[serde(default)]
  pub webhook_url:         Option<String>,
  #[serde(default = "default_notify_timeout")]
  pub notify_timeout_secs: u64,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("standin.db") }
fn default_sweep_interval() -> u64 { 300 }
fn default_settings_ttl() -> u64 { 300 }
fn default_notify_timeout() -> u64 { 10 }

impl ServerConfig {
  /// Load from an optional TOML file, then the environment.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("STANDIN").try_parsing(true))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn sweep_interval(&self) -> Option<Duration> {
    (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
  }

  pub fn settings_ttl(&self) -> Duration { Duration::from_secs(self.settings_ttl_secs) }

  pub fn notify_timeout(&self) -> Duration { Duration::from_secs(self.notify_timeout_secs) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
