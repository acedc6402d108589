//! Now-playing data model.
//!
//! These types carry what the consumer side ultimately sees; `RawSnapshot`
//! is the host-player-facing input they are resolved from.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Playback state of the host player.
///
/// The wire representation is the bare integer code; unknown codes read
/// back as `Stopped`.
#[repr(u32)]
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum PlaybackState {
  #[default]
  Stopped = 0,
  Paused = 1,
  Playing = 2,
}

impl From<u32> for PlaybackState {
  fn from(code: u32) -> Self {
    match code {
      2 => Self::Playing,
      1 => Self::Paused,
      _ => Self::Stopped,
    }
  }
}

impl From<PlaybackState> for u32 {
  fn from(state: PlaybackState) -> Self {
    state as u32
  }
}

impl PlaybackState {
  /// Integer code used on the wire.
  pub fn code(self) -> u32 {
    self.into()
  }
}

impl fmt::Display for PlaybackState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PlaybackState::Stopped => write!(f, "Stopped"),
      PlaybackState::Paused => write!(f, "Paused"),
      PlaybackState::Playing => write!(f, "Playing"),
    }
  }
}

/// Identity and metadata of the track loaded in the player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
  /// Opaque per-play identifier; changes whenever the underlying track
  /// changes, even on repeat of the same song.
  pub uid: String,

  /// Stable track identifier.
  pub uri: String,

  /// Title; empty when the player does not know it.
  #[serde(default)]
  pub title: String,

  /// Album; empty when the player does not know it.
  #[serde(default)]
  pub album: String,

  /// Artist; empty when the player does not know it.
  #[serde(default)]
  pub artist: String,

  /// Track length in milliseconds, when the player reports one.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub duration_ms: Option<u64>,

  /// Public cover art URL; absent when the asset has no public form
  /// (e.g. a local file).
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cover_url: Option<String>,

  /// Artist background image URL from the metadata lookup; absent when
  /// the lookup failed or was disabled.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub background_url: Option<String>,
}

impl Track {
  /// Whether both tracks belong to the same play. Identity is the per-play
  /// `uid` alone; metadata differences do not count.
  pub fn same_play(&self, other: &Track) -> bool {
    self.uid == other.uid
  }

  /// Track length as a `Duration`, when known.
  pub fn duration(&self) -> Option<Duration> {
    self.duration_ms.map(Duration::from_millis)
  }
}

/// One observation of the host player, as delivered by its API.
///
/// Everything here is raw: the cover is still an asset reference, no
/// background has been looked up, and `uid` may be absent while the player
/// is between tracks.
#[derive(Debug, Clone, Default)]
pub struct RawSnapshot {
  /// Per-play identifier; `None` while the player has no resolvable track.
  pub uid: Option<String>,
  /// Stable track identifier.
  pub uri: String,
  pub title: String,
  pub album: String,
  pub artist: String,
  /// Track length in milliseconds, when reported.
  pub duration_ms: Option<u64>,
  /// Raw cover art asset reference in the player's own scheme.
  pub cover_ref: Option<String>,
  /// Whether the player is actively playing (as opposed to paused).
  pub playing: bool,
  /// Position as a fraction of the track duration in `[0, 1]`.
  pub progress: f64,
}

impl RawSnapshot {
  /// Playback state this observation amounts to.
  pub fn state(&self) -> PlaybackState {
    if self.uid.is_none() {
      PlaybackState::Stopped
    } else if self.playing {
      PlaybackState::Playing
    } else {
      PlaybackState::Paused
    }
  }
}
