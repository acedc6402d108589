//! Host-player boundary: snapshot model, change detection, enrichment.
//!
//! - `types.rs` - Track/PlaybackState/RawSnapshot data model
//! - `detector.rs` - change detection and duplicate suppression
//! - `enrich.rs` - cover rewriting and the artist background lookup

pub mod detector;
pub mod enrich;
pub mod types;

use async_trait::async_trait;

/// Boundary to the host player API, as needed by the progress ticker.
///
/// The host feeds full snapshots through `BridgeClient::publish_snapshot`;
/// this trait only covers the live position the ticker polls in between.
#[async_trait]
pub trait PlayerApi: Send + Sync {
  /// Current position as a fraction of the track duration, when a track is
  /// loaded and the player reports progress.
  async fn progress(&self) -> Option<f64>;
}
