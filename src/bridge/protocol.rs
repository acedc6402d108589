//! Wire model for the bridge.
//!
//! Every message is one JSON object per WebSocket text frame. Events use an
//! envelope of `{"event": <tag>, "data": <payload>}`; control records going
//! the other way use `{"command": <tag>, ...}`. Hosts running older script
//! revisions still send `;`-delimited plain-text lines, which the decoder
//! accepts as a fallback; the encoder only ever produces JSON, since the
//! delimiter form cannot carry a title containing the delimiter itself.

use serde::{Deserialize, Serialize};

use super::error::BridgeError;
use crate::player::types::{PlaybackState, Track};

/// Sentinel used for absent art fields in the legacy line format.
const LEGACY_NONE: &str = "NONE";

/// A now-playing event relayed from the host player to the consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum Event {
  /// The player moved to a different per-play `uid`.
  TrackChanged(Track),
  /// Playback state flipped without a track change.
  StateChanged(PlaybackState),
  /// Position within the current track, as a fraction in `[0, 1]`.
  ProgressChanged(f64),
}

impl Event {
  /// Encode as a single JSON text frame.
  pub fn encode(&self) -> Result<String, BridgeError> {
    Ok(serde_json::to_string(self)?)
  }

  /// Decode a single frame. JSON is canonical; legacy delimiter-joined
  /// lines are accepted best-effort.
  pub fn decode(raw: &str) -> Result<Self, BridgeError> {
    let raw = raw.trim();
    if raw.starts_with('{') {
      Ok(serde_json::from_str(raw)?)
    } else {
      Self::decode_legacy(raw)
    }
  }

  fn decode_legacy(line: &str) -> Result<Self, BridgeError> {
    let mut fields = line.split(';').collect::<Vec<_>>();
    if fields.is_empty() {
      return Err(BridgeError::Decode("empty frame".into()));
    }

    match fields.remove(0) {
      // uid;uri;state;duration;title;album;artist;cover;background
      "TRACK_CHANGED" if fields.len() >= 9 => Ok(Event::TrackChanged(Track {
        uid: fields[0].to_string(),
        uri: fields[1].to_string(),
        title: fields[4].to_string(),
        album: fields[5].to_string(),
        artist: fields[6].to_string(),
        duration_ms: fields[3].parse().ok(),
        cover_url: legacy_art(fields[7]),
        background_url: legacy_art(fields[8]),
      })),
      "STATE_CHANGED" if !fields.is_empty() => {
        let code = fields[0].parse().unwrap_or(0);
        Ok(Event::StateChanged(PlaybackState::from(code)))
      }
      "PROGRESS_CHANGED" if !fields.is_empty() => {
        let fraction = fields[0].parse().unwrap_or(0.0);
        Ok(Event::ProgressChanged(fraction))
      }
      tag => Err(BridgeError::Decode(format!(
        "unrecognized or truncated frame: {tag}"
      ))),
    }
  }
}

fn legacy_art(field: &str) -> Option<String> {
  Some(field.to_string()).filter(|it| !it.is_empty() && it != LEGACY_NONE)
}

/// Control record sent from the consumer back to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command")]
pub enum ControlMessage {
  /// Change the cadence of periodic progress updates.
  #[serde(rename_all = "camelCase")]
  SetProgressInterval { interval_ms: u64 },
}

impl ControlMessage {
  /// Encode as a single JSON text frame.
  pub fn encode(&self) -> Result<String, BridgeError> {
    Ok(serde_json::to_string(self)?)
  }

  /// Decode a control frame. Unknown commands are an error; the client
  /// ignores them rather than dropping the connection.
  pub fn decode(raw: &str) -> Result<Self, BridgeError> {
    Ok(serde_json::from_str(raw.trim())?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample_track() -> Track {
    Track {
      uid: "play-1".into(),
      uri: "track:1234".into(),
      title: "Some Title".into(),
      album: "Some Album".into(),
      artist: "Some Artist".into(),
      duration_ms: Some(215_000),
      cover_url: Some("https://covers.example/abc".into()),
      background_url: None,
    }
  }

  #[test]
  fn track_round_trip_preserves_delimiter_heavy_fields() {
    let original = Event::TrackChanged(Track {
      title: "semi;colon; \"quoted\"; more".into(),
      artist: "A;B;C".into(),
      ..sample_track()
    });
    let json = original.encode().unwrap();
    assert_eq!(Event::decode(&json).unwrap(), original);
  }

  #[test]
  fn state_uses_integer_codes_on_the_wire() {
    let json = Event::StateChanged(PlaybackState::Playing).encode().unwrap();
    assert!(json.contains("\"data\":2"), "unexpected encoding: {json}");
    assert_eq!(
      Event::decode(&json).unwrap(),
      Event::StateChanged(PlaybackState::Playing)
    );
  }

  #[test]
  fn progress_round_trip() {
    let json = Event::ProgressChanged(0.25).encode().unwrap();
    assert_eq!(Event::decode(&json).unwrap(), Event::ProgressChanged(0.25));
  }

  #[test]
  fn unknown_state_code_reads_as_stopped() {
    let decoded = Event::decode(r#"{"event":"StateChanged","data":7}"#).unwrap();
    assert_eq!(decoded, Event::StateChanged(PlaybackState::Stopped));
  }

  #[test]
  fn legacy_track_line_decodes() {
    let line = "TRACK_CHANGED;play-1;track:1234;2;215000;Title;Album;Artist;https://covers.example/abc;NONE";
    match Event::decode(line).unwrap() {
      Event::TrackChanged(track) => {
        assert_eq!(track.uid, "play-1");
        assert_eq!(track.uri, "track:1234");
        assert_eq!(track.title, "Title");
        assert_eq!(track.duration_ms, Some(215_000));
        assert_eq!(track.cover_url.as_deref(), Some("https://covers.example/abc"));
        assert_eq!(track.background_url, None);
      }
      other => panic!("expected TrackChanged, got {other:?}"),
    }
  }

  #[test]
  fn legacy_state_and_progress_lines_decode() {
    assert_eq!(
      Event::decode("STATE_CHANGED;1").unwrap(),
      Event::StateChanged(PlaybackState::Paused)
    );
    assert_eq!(
      Event::decode("PROGRESS_CHANGED;0.5").unwrap(),
      Event::ProgressChanged(0.5)
    );
  }

  #[test]
  fn malformed_frames_are_errors() {
    assert!(Event::decode("WHO_KNOWS;x").is_err());
    assert!(Event::decode(r#"{"event":"Nope","data":1}"#).is_err());
    assert!(Event::decode("{not json").is_err());
  }

  #[test]
  fn control_round_trip() {
    let msg = ControlMessage::SetProgressInterval { interval_ms: 250 };
    let json = msg.encode().unwrap();
    assert!(json.contains("SetProgressInterval"));
    assert!(json.contains("intervalMs"));
    assert_eq!(ControlMessage::decode(&json).unwrap(), msg);
  }

  #[test]
  fn unknown_control_is_an_error() {
    assert!(ControlMessage::decode(r#"{"command":"SelfDestruct"}"#).is_err());
    assert!(ControlMessage::decode("gibberish").is_err());
  }
}
