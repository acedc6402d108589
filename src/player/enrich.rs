//! Snapshot resolution: cover asset rewriting and artist background lookup.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;

use crate::player::types::{PlaybackState, RawSnapshot, Track};

/// Best-effort source of artist background imagery.
///
/// Implementations must absorb their own failures; a lookup that cannot
/// produce a URL returns `None`, it never delays or fails the event that
/// triggered it.
#[async_trait]
pub trait BackgroundLookup: Send + Sync {
  /// Background image URL for an artist, if one can be found.
  async fn background_url(&self, artist: &str) -> Option<String>;
}

/// `BackgroundLookup` backed by an HTTP metadata endpoint.
///
/// The endpoint is queried as `GET <endpoint>?artist=<name>` and is
/// expected to answer with a JSON body carrying an `imageUrl` field.
pub struct MetadataClient {
  http: reqwest::Client,
  endpoint: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackgroundResponse {
  #[serde(default)]
  image_url: Option<String>,
}

impl MetadataClient {
  pub fn new(endpoint: impl Into<String>) -> Self {
    Self {
      http: reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("Failed to create HTTP client"),
      endpoint: endpoint.into(),
    }
  }

  async fn fetch(&self, artist: &str) -> Result<Option<String>, reqwest::Error> {
    let response = self
      .http
      .get(&self.endpoint)
      .query(&[("artist", artist)])
      .send()
      .await?
      .error_for_status()?;

    let body: BackgroundResponse = response.json().await?;
    Ok(body.image_url)
  }
}

#[async_trait]
impl BackgroundLookup for MetadataClient {
  async fn background_url(&self, artist: &str) -> Option<String> {
    if artist.is_empty() {
      return None;
    }
    match self.fetch(artist).await {
      Ok(url) => url,
      Err(e) => {
        log::debug!("background lookup for '{}' failed: {}", artist, e);
        None
      }
    }
  }
}

/// Rewrite a raw cover asset reference into a public URL.
///
/// References using the player's `image:<id>` asset scheme resolve against
/// `base_url`; `http(s)` URLs pass through unchanged; local files and
/// unrecognized schemes have no public form.
pub fn resolve_cover(cover_ref: &str, base_url: &str) -> Option<String> {
  if let Some(id) = cover_ref.strip_prefix("image:") {
    Some(format!("{base_url}{id}"))
  } else if cover_ref.starts_with("http://") || cover_ref.starts_with("https://") {
    Some(cover_ref.to_string())
  } else {
    None
  }
}

/// Resolves raw player snapshots into wire-ready candidates.
pub struct SnapshotResolver {
  cover_base_url: String,
  lookup: Option<Arc<dyn BackgroundLookup>>,
  // Latest artist -> background result, so pause/resume snapshots of the
  // same track don't re-query the endpoint.
  background_memo: Mutex<Option<(String, Option<String>)>>,
}

impl SnapshotResolver {
  pub fn new(cover_base_url: String, lookup: Option<Arc<dyn BackgroundLookup>>) -> Self {
    Self {
      cover_base_url,
      lookup,
      background_memo: Mutex::new(None),
    }
  }

  /// Build the candidate track + state for a raw snapshot, or nothing when
  /// the player reports no resolvable track.
  pub async fn resolve(&self, raw: &RawSnapshot) -> Option<(Track, PlaybackState)> {
    let uid = raw.uid.as_deref().filter(|uid| !uid.is_empty())?;

    let cover_url = raw
      .cover_ref
      .as_deref()
      .and_then(|reference| resolve_cover(reference, &self.cover_base_url));
    let background_url = self.background_for(&raw.artist).await;

    Some((
      Track {
        uid: uid.to_string(),
        uri: raw.uri.clone(),
        title: raw.title.clone(),
        album: raw.album.clone(),
        artist: raw.artist.clone(),
        duration_ms: raw.duration_ms,
        cover_url,
        background_url,
      },
      raw.state(),
    ))
  }

  async fn background_for(&self, artist: &str) -> Option<String> {
    let lookup = self.lookup.as_ref()?;
    if artist.is_empty() {
      return None;
    }

    {
      let memo = self.background_memo.lock();
      if let Some((memo_artist, url)) = memo.as_ref() {
        if memo_artist == artist {
          return url.clone();
        }
      }
    }

    let url = lookup.background_url(artist).await;
    *self.background_memo.lock() = Some((artist.to_string(), url.clone()));
    url
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};

  struct FixedLookup {
    url: Option<String>,
    calls: AtomicUsize,
  }

  impl FixedLookup {
    fn new(url: Option<&str>) -> Self {
      Self {
        url: url.map(str::to_string),
        calls: AtomicUsize::new(0),
      }
    }
  }

  #[async_trait]
  impl BackgroundLookup for FixedLookup {
    async fn background_url(&self, _artist: &str) -> Option<String> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      self.url.clone()
    }
  }

  #[test]
  fn cover_scheme_rewrites_to_public_url() {
    assert_eq!(
      resolve_cover("image:abc123", "https://img.example/").as_deref(),
      Some("https://img.example/abc123")
    );
  }

  #[test]
  fn http_cover_passes_through() {
    assert_eq!(
      resolve_cover("https://cdn.example/x.jpg", "https://img.example/").as_deref(),
      Some("https://cdn.example/x.jpg")
    );
  }

  #[test]
  fn local_file_cover_has_no_public_url() {
    assert_eq!(resolve_cover("file:///home/u/a.jpg", "https://img.example/"), None);
    assert_eq!(resolve_cover("weird:ref", "https://img.example/"), None);
  }

  #[tokio::test]
  async fn snapshot_without_uid_resolves_to_nothing() {
    let resolver = SnapshotResolver::new("https://img.example/".into(), None);
    assert!(resolver.resolve(&RawSnapshot::default()).await.is_none());

    let blank_uid = RawSnapshot {
      uid: Some(String::new()),
      ..RawSnapshot::default()
    };
    assert!(resolver.resolve(&blank_uid).await.is_none());
  }

  #[tokio::test]
  async fn enrichment_lands_on_the_track() {
    let lookup = Arc::new(FixedLookup::new(Some("https://bg.example/x")));
    let resolver = SnapshotResolver::new("https://img.example/".into(), Some(lookup));

    let raw = RawSnapshot {
      uid: Some("u1".into()),
      uri: "track:u1".into(),
      artist: "Someone".into(),
      cover_ref: Some("image:abc".into()),
      playing: true,
      ..RawSnapshot::default()
    };
    let (track, state) = resolver.resolve(&raw).await.unwrap();
    assert_eq!(track.cover_url.as_deref(), Some("https://img.example/abc"));
    assert_eq!(track.background_url.as_deref(), Some("https://bg.example/x"));
    assert_eq!(state, PlaybackState::Playing);
  }

  #[tokio::test]
  async fn failed_lookup_resolves_to_absent() {
    let lookup = Arc::new(FixedLookup::new(None));
    let resolver = SnapshotResolver::new("https://img.example/".into(), Some(lookup));

    let raw = RawSnapshot {
      uid: Some("u1".into()),
      artist: "Someone".into(),
      playing: true,
      ..RawSnapshot::default()
    };
    let (track, _) = resolver.resolve(&raw).await.unwrap();
    assert_eq!(track.background_url, None);
  }

  #[tokio::test]
  async fn repeated_snapshots_reuse_the_memoized_lookup() {
    let lookup = Arc::new(FixedLookup::new(Some("https://bg.example/x")));
    let resolver = SnapshotResolver::new("https://img.example/".into(), Some(lookup.clone()));

    let raw = RawSnapshot {
      uid: Some("u1".into()),
      artist: "Someone".into(),
      playing: true,
      ..RawSnapshot::default()
    };
    resolver.resolve(&raw).await.unwrap();
    resolver.resolve(&raw).await.unwrap();
    assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
  }
}
