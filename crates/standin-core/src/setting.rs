//! Global key/value settings and their read-through TTL cache.
//!
//! Settings change rarely, so a few minutes of staleness is acceptable.
//! Writes made through [`SettingsCache::put`] invalidate the cached key
//! immediately.

use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::JobStore;

/// Fallback lookback (days) for the recency-balance score when a meeting
/// does not set its own. Absent or zero disables that axis.
pub const DEFAULT_WORKLOAD_WINDOW_DAYS: &str = "default_workload_balance_window_days";

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SettingKind {
  #[default]
  String,
  Number,
  Boolean,
  Json,
}

impl SettingKind {
  pub fn as_str(self) -> &'static str {
    match self {
      SettingKind::String => "string",
      SettingKind::Number => "number",
      SettingKind::Boolean => "boolean",
      SettingKind::Json => "json",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    serde_json::from_value(Value::String(s.to_owned())).ok()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSetting {
  pub key:         String,
  pub value:       Value,
  #[serde(default)]
  pub kind:        SettingKind,
  pub description: Option<String>,
  #[serde(default = "Utc::now")]
  pub updated_at:  DateTime<Utc>,
}

impl SystemSetting {
  /// Interpret the value as a non-negative whole number, accepting numeric
  /// strings.
  pub fn as_u32(&self) -> Option<u32> {
    match &self.value {
      Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
      Value::String(s) => s.trim().parse().ok(),
      _ => None,
    }
  }
}

/// Read-through cache in front of [`JobStore::get_system_setting`].
///
/// Cloning is cheap; clones share the same cache.
#[derive(Clone)]
pub struct SettingsCache {
  cache: Cache<String, Option<SystemSetting>>,
  ttl:   Duration,
}

impl SettingsCache {
  pub fn new(ttl: Duration) -> Self {
    let cache = Cache::builder().time_to_live(ttl).max_capacity(1_024).build();
    Self { cache, ttl }
  }

  pub fn ttl(&self) -> Duration { self.ttl }

  pub async fn get<S: JobStore>(
    &self,
    store: &S,
    key:   &str,
  ) -> Result<Option<SystemSetting>, S::Error> {
    if let Some(hit) = self.cache.get(key).await {
      return Ok(hit);
    }
    let loaded = store.get_system_setting(key.to_owned()).await?;
    self.cache.insert(key.to_owned(), loaded.clone()).await;
    Ok(loaded)
  }

  /// Write through to the store and drop the cached entry.
  pub async fn put<S: JobStore>(&self, store: &S, setting: SystemSetting) -> Result<(), S::Error> {
    let key = setting.key.clone();
    store.put_system_setting(setting).await?;
    self.cache.invalidate(&key).await;
    Ok(())
  }

  pub async fn invalidate(&self, key: &str) { self.cache.invalidate(key).await; }

  /// The configured default workload-balance window, if any.
  pub async fn default_window_days<S: JobStore>(&self, store: &S) -> Result<Option<u32>, S::Error> {
    Ok(
      self
        .get(store, DEFAULT_WORKLOAD_WINDOW_DAYS)
        .await?
        .and_then(|s| s.as_u32())
        .filter(|days| *days > 0),
    )
  }
}
