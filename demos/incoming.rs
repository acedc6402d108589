//! Minimal consumer: print every event coming over the bridge.
//!
//! Run the `host` demo in another terminal to feed it.

use std::time::Duration;

use trackwire::{BridgeError, BridgeListener, Event, DEFAULT_PORT};

#[tokio::main]
async fn main() -> Result<(), BridgeError> {
  env_logger::init();

  let listener = BridgeListener::bind_default().await?;
  println!("listening on 127.0.0.1:{DEFAULT_PORT}");

  // Keep accepting: the player-side peer reconnects whenever it restarts.
  while let Ok(mut connection) = listener.accept_next().await {
    println!("player connected");

    // Ask for snappier progress updates while we are attached.
    if let Err(e) = connection.send_cadence(Duration::from_millis(250)).await {
      eprintln!("cadence request failed: {e}");
    }

    while let Some(event) = connection.next_event().await {
      match event {
        Ok(Event::TrackChanged(track)) => {
          println!("track: {} - {} [{}]", track.artist, track.title, track.album);
        }
        Ok(Event::StateChanged(state)) => println!("state: {state}"),
        Ok(Event::ProgressChanged(fraction)) => {
          println!("progress: {:5.1}%", fraction * 100.0);
        }
        Err(e) => eprintln!("bad frame: {e}"),
      }
    }
    println!("player disconnected");
  }

  Ok(())
}
