//! Bridge configuration.

use serde::{Deserialize, Serialize};

use crate::bridge::error::BridgeError;

/// Default loopback port the two bridge endpoints meet on.
pub const DEFAULT_PORT: u16 = 19532;

/// Configuration for the host-side bridge client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
  /// Loopback port of the listener endpoint.
  #[serde(default = "default_port")]
  pub port: u16,

  /// Fixed delay between reconnect attempts, in milliseconds.
  #[serde(default = "default_reconnect_delay")]
  pub reconnect_delay_ms: u64,

  /// Initial cadence of periodic progress updates, in milliseconds.
  /// The connected peer may retune this at runtime.
  #[serde(default = "default_progress_interval")]
  pub progress_interval_ms: u64,

  /// Public base URL that `image:` cover asset references resolve against.
  #[serde(default = "default_cover_base_url")]
  pub cover_base_url: String,

  /// Metadata endpoint for the artist background lookup; `None` disables
  /// the enrichment entirely.
  #[serde(default)]
  pub background_endpoint: Option<String>,
}

fn default_port() -> u16 {
  DEFAULT_PORT
}

fn default_reconnect_delay() -> u64 {
  1000
}

fn default_progress_interval() -> u64 {
  1000
}

fn default_cover_base_url() -> String {
  "https://i.scdn.co/image/".to_string()
}

impl Default for BridgeConfig {
  fn default() -> Self {
    Self {
      port: default_port(),
      reconnect_delay_ms: default_reconnect_delay(),
      progress_interval_ms: default_progress_interval(),
      cover_base_url: default_cover_base_url(),
      background_endpoint: None,
    }
  }
}

impl BridgeConfig {
  /// Validate configuration values.
  pub fn validate(&self) -> Result<(), BridgeError> {
    if self.progress_interval_ms == 0 {
      return Err(BridgeError::InvalidConfig(
        "progress interval must be at least 1 ms".into(),
      ));
    }
    if self.reconnect_delay_ms == 0 {
      return Err(BridgeError::InvalidConfig(
        "reconnect delay must be at least 1 ms".into(),
      ));
    }
    if self.cover_base_url.is_empty() {
      return Err(BridgeError::InvalidConfig(
        "cover base URL cannot be empty".into(),
      ));
    }
    Ok(())
  }
}
