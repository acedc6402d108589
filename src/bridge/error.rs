//! Bridge error types.

use thiserror::Error;

/// Errors produced by the bridge endpoints.
///
/// Only `PortInUse` is expected to reach the application as a hard error
/// (another listener instance already owns the endpoint). Everything else
/// either feeds the client's retry loop or ends a single connection's
/// event sequence.
#[derive(Debug, Error)]
pub enum BridgeError {
  #[error("port {port} is already in use by another listener instance")]
  PortInUse { port: u16 },

  #[error("bind failed: {0}")]
  Bind(#[source] std::io::Error),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("WebSocket error: {0}")]
  WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

  #[error("malformed frame: {0}")]
  Decode(String),

  #[error("invalid configuration: {0}")]
  InvalidConfig(String),
}

impl From<serde_json::Error> for BridgeError {
  fn from(err: serde_json::Error) -> Self {
    BridgeError::Decode(err.to_string())
  }
}
