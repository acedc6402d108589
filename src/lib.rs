//! Relays a media player's now-playing state to locally connected consumer
//! applications over a loopback WebSocket.
//!
//! Two endpoints cooperate. [`BridgeClient`] runs beside the host player:
//! it watches player snapshots, deduplicates them into [`Event`]s, pushes
//! them to whoever is listening, and reconnects forever with a fixed
//! backoff when nobody is. [`BridgeListener`] is embedded in a consumer
//! application (a visualizer, an overlay): it owns the loopback endpoint,
//! serves one connection at a time, and yields each connection's events as
//! a finite typed sequence. The consumer can retune the progress-update
//! cadence over the same socket via [`BridgeConnection::send_cadence`].
//!
//! ```no_run
//! use trackwire::{BridgeError, BridgeListener, Event};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), BridgeError> {
//!   let listener = BridgeListener::bind_default().await?;
//!
//!   // Keep accepting: the player-side peer reconnects whenever the
//!   // player restarts.
//!   while let Ok(mut connection) = listener.accept_next().await {
//!     while let Some(Ok(event)) = connection.next_event().await {
//!       match event {
//!         Event::TrackChanged(track) => println!("now playing: {}", track.title),
//!         Event::StateChanged(state) => println!("state: {}", state),
//!         Event::ProgressChanged(fraction) => println!("progress: {:.2}", fraction),
//!       }
//!     }
//!   }
//!   Ok(())
//! }
//! ```

mod bridge;
mod config;
mod player;

pub use bridge::client::BridgeClient;
pub use bridge::error::BridgeError;
pub use bridge::listener::{BridgeConnection, BridgeListener};
pub use bridge::protocol::{ControlMessage, Event};
pub use config::{BridgeConfig, DEFAULT_PORT};
pub use player::detector::ChangeDetector;
pub use player::enrich::{resolve_cover, BackgroundLookup, MetadataClient, SnapshotResolver};
pub use player::types::{PlaybackState, RawSnapshot, Track};
pub use player::PlayerApi;
