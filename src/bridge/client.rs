//! Host-side bridge client.
//!
//! Owns the socket to the local listener, retries on disconnect with a
//! fixed backoff, re-announces the last known track on every (re)connect,
//! forwards events in production order, and applies cadence control
//! received from the peer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{Sink, SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use super::error::BridgeError;
use super::protocol::{ControlMessage, Event};
use super::ticker;
use crate::config::BridgeConfig;
use crate::player::detector::ChangeDetector;
use crate::player::enrich::{BackgroundLookup, MetadataClient, SnapshotResolver};
use crate::player::types::{PlaybackState, RawSnapshot, Track};
use crate::player::PlayerApi;

/// State shared between the caller context, the connection task, and the
/// ticker task. The control-message handler is the only cadence writer.
pub(crate) struct ClientShared {
  detector: Mutex<ChangeDetector>,
  progress_interval_ms: AtomicU64,
  connected: RwLock<bool>,
}

impl ClientShared {
  fn new(progress_interval_ms: u64) -> Self {
    Self {
      detector: Mutex::new(ChangeDetector::new()),
      progress_interval_ms: AtomicU64::new(progress_interval_ms),
      connected: RwLock::new(false),
    }
  }

  pub(crate) fn progress_interval(&self) -> Duration {
    Duration::from_millis(self.progress_interval_ms.load(Ordering::SeqCst))
  }

  fn set_progress_interval_ms(&self, interval_ms: u64) {
    self.progress_interval_ms.store(interval_ms, Ordering::SeqCst);
  }

  pub(crate) fn is_connected(&self) -> bool {
    *self.connected.read()
  }

  fn set_connected(&self, up: bool) {
    *self.connected.write() = up;
  }

  pub(crate) fn playback_state(&self) -> PlaybackState {
    self.detector.lock().state()
  }

  fn last_track(&self) -> Option<Track> {
    self.detector.lock().last_track().cloned()
  }
}

/// Host-side endpoint of the bridge.
///
/// Spawning a client starts two tasks: the connection loop (connect,
/// forward, reconnect forever) and the progress ticker. The host feeds
/// player observations through [`publish_snapshot`](Self::publish_snapshot);
/// everything else is driven by the tasks.
pub struct BridgeClient {
  shared: Arc<ClientShared>,
  resolver: SnapshotResolver,
  event_tx: async_channel::Sender<Event>,
  cancel: CancellationToken,
  tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl BridgeClient {
  /// Validate the configuration, then spawn the connection and ticker
  /// tasks. Must be called from within a tokio runtime.
  ///
  /// `lookup` overrides the background-image source; when `None`, a
  /// [`MetadataClient`] is built from `config.background_endpoint` (and the
  /// enrichment is disabled if that is also unset).
  pub fn spawn(
    config: BridgeConfig,
    player: Arc<dyn PlayerApi>,
    lookup: Option<Arc<dyn BackgroundLookup>>,
  ) -> Result<Self, BridgeError> {
    config.validate()?;

    let shared = Arc::new(ClientShared::new(config.progress_interval_ms));
    let (event_tx, event_rx) = async_channel::unbounded();
    let cancel = CancellationToken::new();

    let lookup = lookup.or_else(|| {
      config.background_endpoint.as_ref().map(|endpoint| {
        Arc::new(MetadataClient::new(endpoint.clone())) as Arc<dyn BackgroundLookup>
      })
    });
    let resolver = SnapshotResolver::new(config.cover_base_url.clone(), lookup);

    let conn_task = tokio::spawn(connection_loop(
      config.port,
      Duration::from_millis(config.reconnect_delay_ms),
      shared.clone(),
      event_rx,
      cancel.clone(),
    ));
    let ticker_task = tokio::spawn(ticker::progress_loop(
      shared.clone(),
      player,
      event_tx.clone(),
      cancel.clone(),
    ));

    Ok(Self {
      shared,
      resolver,
      event_tx,
      cancel,
      tasks: Mutex::new(vec![conn_task, ticker_task]),
    })
  }

  /// Feed one raw player observation through change detection. The host
  /// calls this from its state-change handler; duplicates are cheap no-ops.
  pub async fn publish_snapshot(&self, raw: RawSnapshot) {
    let Some((track, state)) = self.resolver.resolve(&raw).await else {
      return;
    };
    let events = self.shared.detector.lock().observe(track, state, raw.progress);
    if events.is_empty() || !self.shared.is_connected() {
      // The detector has already retained the track; it will be
      // re-announced when the connection comes (back) up.
      return;
    }
    for event in events {
      let _ = self.event_tx.send(event).await;
    }
  }

  /// Current progress-update cadence, as possibly retuned by the peer.
  pub fn progress_interval(&self) -> Duration {
    self.shared.progress_interval()
  }

  /// Whether a listener connection is currently established.
  pub fn is_connected(&self) -> bool {
    self.shared.is_connected()
  }

  /// Proactively close the connection and stop both tasks. Does not
  /// trigger the reconnect path; this is the host-teardown exit.
  pub async fn shutdown(&self) {
    self.cancel.cancel();
    let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
    for task in tasks {
      let _ = tokio::time::timeout(Duration::from_secs(2), task).await;
    }
  }
}

/// How a served connection ended.
enum ConnectionEnd {
  /// Cancellation token fired; do not reconnect.
  Shutdown,
  /// Peer went away or the transport failed; reconnect after backoff.
  Lost,
}

async fn connection_loop(
  port: u16,
  backoff_delay: Duration,
  shared: Arc<ClientShared>,
  event_rx: async_channel::Receiver<Event>,
  cancel: CancellationToken,
) {
  let url = format!("ws://127.0.0.1:{port}");

  loop {
    let ws = tokio::select! {
      _ = cancel.cancelled() => break,
      result = connect_async(url.as_str()) => match result {
        Ok((ws, _)) => ws,
        Err(e) => {
          log::debug!("bridge connect to {} failed: {}", url, e);
          if backoff(&cancel, backoff_delay).await {
            continue;
          }
          break;
        }
      }
    };

    log::info!("bridge connected to {}", url);
    let end = drive_connection(ws, &shared, &event_rx, &cancel).await;
    shared.set_connected(false);

    match end {
      ConnectionEnd::Shutdown => break,
      ConnectionEnd::Lost => {
        log::info!("bridge connection lost, retrying in {:?}", backoff_delay);
        if !backoff(&cancel, backoff_delay).await {
          break;
        }
      }
    }
  }

  log::debug!("bridge connection loop stopped");
}

/// Serve one established connection until it ends.
async fn drive_connection(
  ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
  shared: &ClientShared,
  event_rx: &async_channel::Receiver<Event>,
  cancel: &CancellationToken,
) -> ConnectionEnd {
  let (mut write, mut read) = ws.split();

  // Events raised during the outage are stale; only the retained track
  // survives, re-announced so a late-joining consumer gets an identity.
  while event_rx.try_recv().is_ok() {}
  if let Some(track) = shared.last_track() {
    if let Err(e) = send_event(&mut write, &Event::TrackChanged(track)).await {
      log::warn!("re-announcing retained track failed: {}", e);
      return ConnectionEnd::Lost;
    }
  }
  shared.set_connected(true);

  loop {
    tokio::select! {
      _ = cancel.cancelled() => {
        let _ = write.close().await;
        return ConnectionEnd::Shutdown;
      }
      event = event_rx.recv() => {
        match event {
          Ok(event) => {
            if let Err(e) = send_event(&mut write, &event).await {
              log::warn!("bridge send failed: {}", e);
              return ConnectionEnd::Lost;
            }
          }
          // All senders gone: the client handle was dropped.
          Err(_) => {
            let _ = write.close().await;
            return ConnectionEnd::Shutdown;
          }
        }
      }
      inbound = read.next() => {
        match inbound {
          Some(Ok(Message::Text(text))) => apply_control(shared, &text),
          Some(Ok(Message::Close(_))) | None => {
            log::info!("bridge peer closed the connection");
            return ConnectionEnd::Lost;
          }
          Some(Ok(_)) => {}
          Some(Err(e)) => {
            log::warn!("bridge read error: {}", e);
            return ConnectionEnd::Lost;
          }
        }
      }
    }
  }
}

async fn send_event<S>(sink: &mut S, event: &Event) -> Result<(), BridgeError>
where
  S: Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
  let json = event.encode()?;
  sink.send(Message::Text(json.into())).await?;
  Ok(())
}

/// Apply an inbound control frame. Malformed or unknown records are
/// ignored; the event stream is never interrupted for them.
fn apply_control(shared: &ClientShared, text: &str) {
  match ControlMessage::decode(text) {
    Ok(ControlMessage::SetProgressInterval { interval_ms }) => {
      if interval_ms == 0 {
        log::debug!("ignoring zero progress interval from peer");
        return;
      }
      log::info!("peer set progress interval to {} ms", interval_ms);
      shared.set_progress_interval_ms(interval_ms);
    }
    Err(e) => {
      log::debug!("ignoring unrecognized control frame: {}", e);
    }
  }
}

/// Wait out the reconnect delay. Returns `false` when cancelled.
async fn backoff(cancel: &CancellationToken, delay: Duration) -> bool {
  tokio::select! {
    _ = cancel.cancelled() => false,
    _ = tokio::time::sleep(delay) => true,
  }
}
