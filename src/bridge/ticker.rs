//! Periodic progress updates while playback is active.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::client::ClientShared;
use super::protocol::Event;
use crate::player::types::PlaybackState;
use crate::player::PlayerApi;

/// Client-owned ticker task. Re-reads the cadence on every pass, so a
/// peer retune takes effect on the next tick without restarting anything.
/// Ticks are best-effort: a single loop never overlaps itself, and a tick
/// with nothing to say (not connected, not playing, no position) is
/// skipped rather than queued.
pub(crate) async fn progress_loop(
  shared: Arc<ClientShared>,
  player: Arc<dyn PlayerApi>,
  events: async_channel::Sender<Event>,
  cancel: CancellationToken,
) {
  log::debug!("progress ticker started");

  loop {
    let interval = shared.progress_interval();
    tokio::select! {
      _ = cancel.cancelled() => break,
      _ = tokio::time::sleep(interval) => {}
    }

    if !shared.is_connected() || shared.playback_state() != PlaybackState::Playing {
      continue;
    }
    let Some(fraction) = player.progress().await else {
      continue;
    };
    let _ = events
      .send(Event::ProgressChanged(fraction.clamp(0.0, 1.0)))
      .await;
  }

  log::debug!("progress ticker stopped");
}
