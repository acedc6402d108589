//! Change detection over successive player snapshots.

use crate::bridge::protocol::Event;
use crate::player::types::{PlaybackState, Track};

/// Last accepted track + state, the baseline every new candidate is
/// compared against.
#[derive(Debug, Clone)]
struct Snapshot {
  track: Track,
  state: PlaybackState,
}

/// Decides which events a newly resolved snapshot warrants.
///
/// The detector is a pure state machine over (stored snapshot, candidate):
/// no I/O, no clocks. A new `uid` always supersedes the stored snapshot and
/// subsumes any simultaneous state change; a state flip on the same `uid`
/// updates the stored state only; an exact duplicate produces nothing.
/// Metadata edits without a `uid` change are deliberately invisible, since
/// the `uid` is defined to change whenever the underlying track does.
#[derive(Debug, Default)]
pub struct ChangeDetector {
  snapshot: Option<Snapshot>,
}

impl ChangeDetector {
  pub fn new() -> Self {
    Self { snapshot: None }
  }

  /// Consume one resolved candidate and return the events it warrants, in
  /// emission order. `progress` is the position fraction carried by the
  /// triggering observation, used for the courtesy update when playback
  /// leaves `Playing`.
  pub fn observe(&mut self, candidate: Track, state: PlaybackState, progress: f64) -> Vec<Event> {
    match &mut self.snapshot {
      Some(snapshot) if snapshot.track.same_play(&candidate) => {
        if snapshot.state == state {
          return Vec::new();
        }
        snapshot.state = state;
        let mut events = vec![Event::StateChanged(state)];
        if state != PlaybackState::Playing {
          // The ticker is suspended outside Playing; send one last
          // position so consumers are not left stale.
          events.push(Event::ProgressChanged(progress.clamp(0.0, 1.0)));
        }
        events
      }
      _ => {
        let event = Event::TrackChanged(candidate.clone());
        self.snapshot = Some(Snapshot {
          track: candidate,
          state,
        });
        vec![event]
      }
    }
  }

  /// Track of the last accepted snapshot, if any.
  pub fn last_track(&self) -> Option<&Track> {
    self.snapshot.as_ref().map(|snapshot| &snapshot.track)
  }

  /// State of the last accepted snapshot; `Stopped` before the first track.
  pub fn state(&self) -> PlaybackState {
    self
      .snapshot
      .as_ref()
      .map(|snapshot| snapshot.state)
      .unwrap_or_default()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn track(uid: &str, title: &str) -> Track {
    Track {
      uid: uid.into(),
      uri: format!("track:{uid}"),
      title: title.into(),
      ..Track::default()
    }
  }

  #[test]
  fn first_snapshot_emits_track_changed() {
    let mut detector = ChangeDetector::new();
    let events = detector.observe(track("a", "X"), PlaybackState::Playing, 0.0);
    assert_eq!(events, vec![Event::TrackChanged(track("a", "X"))]);
    assert_eq!(detector.state(), PlaybackState::Playing);
  }

  #[test]
  fn exact_duplicates_are_suppressed() {
    let mut detector = ChangeDetector::new();
    detector.observe(track("a", "X"), PlaybackState::Playing, 0.0);
    for _ in 0..3 {
      let events = detector.observe(track("a", "X"), PlaybackState::Playing, 0.4);
      assert!(events.is_empty());
    }
  }

  #[test]
  fn metadata_change_without_new_uid_is_ignored() {
    let mut detector = ChangeDetector::new();
    detector.observe(track("a", "X"), PlaybackState::Playing, 0.0);
    let events = detector.observe(track("a", "renamed"), PlaybackState::Playing, 0.0);
    assert!(events.is_empty());
  }

  #[test]
  fn uid_change_subsumes_simultaneous_state_change() {
    let mut detector = ChangeDetector::new();
    detector.observe(track("a", "X"), PlaybackState::Playing, 0.0);
    let events = detector.observe(track("b", "Y"), PlaybackState::Paused, 0.4);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], Event::TrackChanged(ref t) if t.uid == "b"));
    assert_eq!(detector.state(), PlaybackState::Paused);
  }

  #[test]
  fn pause_emits_state_then_courtesy_progress() {
    let mut detector = ChangeDetector::new();
    detector.observe(track("a", "X"), PlaybackState::Playing, 0.0);
    let events = detector.observe(track("a", "X"), PlaybackState::Paused, 0.3);
    assert_eq!(
      events,
      vec![
        Event::StateChanged(PlaybackState::Paused),
        Event::ProgressChanged(0.3),
      ]
    );
  }

  #[test]
  fn resume_emits_state_only() {
    let mut detector = ChangeDetector::new();
    detector.observe(track("a", "X"), PlaybackState::Playing, 0.0);
    detector.observe(track("a", "X"), PlaybackState::Paused, 0.3);
    let events = detector.observe(track("a", "X"), PlaybackState::Playing, 0.3);
    assert_eq!(events, vec![Event::StateChanged(PlaybackState::Playing)]);
  }

  #[test]
  fn courtesy_progress_is_clamped() {
    let mut detector = ChangeDetector::new();
    detector.observe(track("a", "X"), PlaybackState::Playing, 0.0);
    let events = detector.observe(track("a", "X"), PlaybackState::Paused, 1.7);
    assert_eq!(
      events,
      vec![
        Event::StateChanged(PlaybackState::Paused),
        Event::ProgressChanged(1.0),
      ]
    );
  }

  #[test]
  fn snapshot_stream_example() {
    let mut detector = ChangeDetector::new();
    let mut all = Vec::new();
    all.extend(detector.observe(track("a", "X"), PlaybackState::Playing, 0.0));
    all.extend(detector.observe(track("a", "X"), PlaybackState::Paused, 0.6));
    all.extend(detector.observe(track("b", "Y"), PlaybackState::Playing, 0.0));
    assert_eq!(
      all,
      vec![
        Event::TrackChanged(track("a", "X")),
        Event::StateChanged(PlaybackState::Paused),
        Event::ProgressChanged(0.6),
        Event::TrackChanged(track("b", "Y")),
      ]
    );
  }
}
