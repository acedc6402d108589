//! Consumer-side endpoint: accepts the host connection and yields events.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

use super::error::BridgeError;
use super::protocol::{ControlMessage, Event};
use crate::config::DEFAULT_PORT;

/// Consumer-side endpoint of the bridge.
///
/// Binds once, then hands out one [`BridgeConnection`] per accepted peer.
/// Serves a single peer at a time; a second connection attempt waits in
/// the OS accept backlog until the next `accept_next` call. Dropping the
/// listener closes the socket and unblocks a pending accept.
#[derive(Debug)]
pub struct BridgeListener {
  listener: TcpListener,
}

impl BridgeListener {
  /// Bind 127.0.0.1 on the default bridge port.
  pub async fn bind_default() -> Result<Self, BridgeError> {
    Self::bind_local(DEFAULT_PORT).await
  }

  /// Bind 127.0.0.1 on a custom port.
  pub async fn bind_local(port: u16) -> Result<Self, BridgeError> {
    Self::bind(SocketAddr::from(([127, 0, 0, 1], port))).await
  }

  /// Bind an explicit address.
  ///
  /// A port-in-use failure means another listener instance already owns
  /// the endpoint; callers should surface it and exit rather than retry.
  pub async fn bind(addr: SocketAddr) -> Result<Self, BridgeError> {
    let listener = TcpListener::bind(addr).await.map_err(|e| {
      if e.kind() == std::io::ErrorKind::AddrInUse {
        BridgeError::PortInUse { port: addr.port() }
      } else {
        BridgeError::Bind(e)
      }
    })?;

    if let Ok(local) = listener.local_addr() {
      log::info!("bridge listener bound on {}", local);
    }
    Ok(Self { listener })
  }

  /// Local address actually bound (useful when binding port 0).
  pub fn local_addr(&self) -> Result<SocketAddr, BridgeError> {
    Ok(self.listener.local_addr()?)
  }

  /// Wait for the host peer to connect and complete the WebSocket
  /// handshake. Call in a loop for the lifetime of the application: the
  /// peer reconnects whenever the player restarts, and every ended
  /// connection is followed by a fresh one here.
  pub async fn accept_next(&self) -> Result<BridgeConnection, BridgeError> {
    let (stream, peer) = self.listener.accept().await?;
    let ws = accept_async(stream).await?;
    log::debug!("accepted bridge peer {}", peer);
    Ok(BridgeConnection {
      ws,
      poisoned: false,
    })
  }
}

/// One accepted host connection: a finite sequence of decoded events plus
/// the outbound control channel.
pub struct BridgeConnection {
  ws: WebSocketStream<TcpStream>,
  poisoned: bool,
}

impl BridgeConnection {
  /// Next event from the host.
  ///
  /// Returns `None` once the peer is gone, and `Some(Err(..))` exactly
  /// once for a malformed frame or transport failure. Either ends this
  /// connection's sequence, after which the caller goes back to
  /// [`BridgeListener::accept_next`].
  pub async fn next_event(&mut self) -> Option<Result<Event, BridgeError>> {
    if self.poisoned {
      return None;
    }

    loop {
      match self.ws.next().await? {
        Ok(Message::Text(text)) => {
          return match Event::decode(&text) {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
              log::warn!("bad frame from bridge peer: {}", e);
              self.poisoned = true;
              Some(Err(e))
            }
          };
        }
        Ok(Message::Close(_)) => return None,
        Ok(Message::Binary(_)) => {
          self.poisoned = true;
          return Some(Err(BridgeError::Decode(
            "unsupported non-text frame".into(),
          )));
        }
        // Ping/pong are answered by the transport.
        Ok(_) => continue,
        Err(e) => {
          self.poisoned = true;
          return Some(Err(e.into()));
        }
      }
    }
  }

  /// Ask the host to retune its progress-update cadence. Best-effort; no
  /// acknowledgment is awaited.
  pub async fn send_cadence(&mut self, interval: Duration) -> Result<(), BridgeError> {
    let message = ControlMessage::SetProgressInterval {
      interval_ms: interval.as_millis() as u64,
    };
    let json = message.encode()?;
    self.ws.send(Message::Text(json.into())).await?;
    Ok(())
  }
}
