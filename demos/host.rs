//! Host-side demo: a scripted fake player driving the bridge client.
//!
//! Loops a tiny playlist, pausing briefly between tracks, so the
//! `incoming` demo has something to show.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use trackwire::{BridgeClient, BridgeConfig, BridgeError, PlayerApi, RawSnapshot};
use uuid::Uuid;

struct ScriptedPlayer {
  progress: RwLock<f64>,
}

#[async_trait]
impl PlayerApi for ScriptedPlayer {
  async fn progress(&self) -> Option<f64> {
    Some(*self.progress.read())
  }
}

#[tokio::main]
async fn main() -> Result<(), BridgeError> {
  env_logger::init();

  let player = Arc::new(ScriptedPlayer {
    progress: RwLock::new(0.0),
  });
  let client = BridgeClient::spawn(BridgeConfig::default(), player.clone(), None)?;

  let playlist = [
    ("Blue in Green", "Miles Davis", "Kind of Blue"),
    ("Naima", "John Coltrane", "Giant Steps"),
    ("Goodbye Pork Pie Hat", "Charles Mingus", "Mingus Ah Um"),
  ];

  loop {
    for (title, artist, album) in playlist {
      let uid = Uuid::new_v4().to_string();
      *player.progress.write() = 0.0;

      let snapshot = RawSnapshot {
        uid: Some(uid),
        uri: format!("demo:{}", title.to_lowercase().replace(' ', "-")),
        title: title.to_string(),
        artist: artist.to_string(),
        album: album.to_string(),
        duration_ms: Some(20_000),
        playing: true,
        ..RawSnapshot::default()
      };
      client.publish_snapshot(snapshot.clone()).await;

      for step in 1..=20 {
        tokio::time::sleep(Duration::from_secs(1)).await;
        *player.progress.write() = f64::from(step) / 20.0;
      }

      // Brief pause between tracks, so state changes show up too.
      client
        .publish_snapshot(RawSnapshot {
          playing: false,
          progress: 1.0,
          ..snapshot
        })
        .await;
      tokio::time::sleep(Duration::from_secs(2)).await;
    }
  }
}
